//! XML operations: request documents, output documents, and error bodies.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::StatusCode;
    use http::header::CONTENT_TYPE;
    use opstack_core::{SdkResult, UnknownServiceError};
    use opstack_middleware::{ErrorBinding, ErrorMatch, OperationStack, ResponseBinding};
    use opstack_readwrite::ReadWriteError;
    use opstack_xml::{
        Document, NodeInfo, Reader, Writer, XmlError, list_writer, value_writer, xml_document_reading_closure,
        xml_document_writing_closure,
    };

    use crate::{Harness, QueueError, Reply, ScriptedResponse, test_config};

    #[derive(Debug, Clone, PartialEq)]
    struct CreateQueue {
        queue_name: String,
        tags: Vec<String>,
        delay_seconds: Option<i32>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct CreateQueueResult {
        queue_url: String,
    }

    fn write_create_queue(value: &CreateQueue, writer: &mut Writer<'_>) -> Result<(), XmlError> {
        writer.child("QueueName").write(Some(value.queue_name.as_str()))?;
        list_writer(value_writer::<String>(), NodeInfo::new("Tag"), false)(&value.tags, &mut writer.child("Tags"))?;
        writer.child("DelaySeconds").write(value.delay_seconds.as_ref())?;
        Ok(())
    }

    fn read_create_queue_result(reader: &mut Reader<'_>) -> Result<CreateQueueResult, XmlError> {
        Ok(CreateQueueResult {
            queue_url: reader.child("QueueUrl").value()?,
        })
    }

    /// `<ErrorResponse><Error><Code/><Message/></Error></ErrorResponse>`
    fn xml_errors() -> ErrorBinding<QueueError> {
        ErrorBinding::new(|_, body| {
            let mut doc = Document::parse(body)?;
            let mut root = Reader::new(&mut doc);
            let mut error = root.child("Error");
            let code: Option<String> = error.child("Code").read()?;
            let message: Option<String> = error.child("Message").read()?;
            Ok(match code.as_deref() {
                Some("AWS.SimpleQueueService.NonExistentQueue" | "QueueDoesNotExist") => {
                    ErrorMatch::Modeled(QueueError::QueueDoesNotExist(message.unwrap_or_default()))
                }
                Some("OverLimit") => ErrorMatch::Modeled(QueueError::OverLimit),
                _ => ErrorMatch::Unknown(UnknownServiceError::new(code, message)),
            })
        })
    }

    fn create_queue_stack(harness: &Harness) -> OperationStack<CreateQueue, CreateQueueResult, QueueError> {
        harness.stack(
            "CreateQueue",
            xml_document_writing_closure(NodeInfo::new("CreateQueueRequest"), Arc::new(write_create_queue)),
            opstack_xml::CONTENT_TYPE,
            ResponseBinding::from_document(xml_document_reading_closure(
                NodeInfo::new("CreateQueueResult"),
                Arc::new(read_create_queue_result),
            )),
            xml_errors(),
        )
    }

    async fn create_queue(harness: &Harness, input: CreateQueue) -> SdkResult<CreateQueueResult, QueueError> {
        let stack = create_queue_stack(harness);
        let handler = harness.handler();
        let mut ctx = harness.context("CreateQueue");
        ctx.set_method(http::Method::POST);
        stack.execute(&mut ctx, input, &handler).await
    }

    fn input() -> CreateQueue {
        CreateQueue {
            queue_name: "jobs".to_owned(),
            tags: vec!["team-a".to_owned(), "batch".to_owned()],
            delay_seconds: None,
        }
    }

    fn xml_reply(status: StatusCode, body: &'static str) -> Reply {
        ScriptedResponse::new(status)
            .with_header("content-type", "application/xml")
            .with_body(body)
            .into()
    }

    #[tokio::test]
    async fn test_should_send_xml_document_and_read_result() {
        let harness = Harness::new(
            test_config(),
            vec![xml_reply(
                StatusCode::OK,
                "<CreateQueueResult><QueueUrl>https://svc.example.com/jobs</QueueUrl></CreateQueueResult>",
            )],
        );

        let output = create_queue(&harness, input()).await.expect("operation should succeed");

        assert_eq!(output.queue_url, "https://svc.example.com/jobs");
        let request = &harness.engine.requests()[0];
        assert_eq!(
            request.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/xml")
        );
        let body = request.body().as_bytes().expect("buffered body").clone();
        assert_eq!(
            std::str::from_utf8(&body).expect("utf8 body"),
            "<CreateQueueRequest><QueueName>jobs</QueueName>\
             <Tags><Tag>team-a</Tag><Tag>batch</Tag></Tags></CreateQueueRequest>"
        );
    }

    #[tokio::test]
    async fn test_should_reject_result_with_wrong_root() {
        let harness = Harness::new(
            test_config(),
            vec![xml_reply(StatusCode::OK, "<DeleteQueueResult/>")],
        );

        let err = create_queue(&harness, input()).await.expect_err("wrong root");

        assert!(
            matches!(err.as_client_error(), Some(opstack_core::ClientError::DeserializationFailed(m)) if m.contains("DeleteQueueResult")),
            "unexpected error: {err}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_bind_modeled_error_from_xml_body() {
        let harness = Harness::new(
            test_config(),
            vec![xml_reply(
                StatusCode::BAD_REQUEST,
                "<ErrorResponse><Error><Type>Sender</Type>\
                 <Code>AWS.SimpleQueueService.NonExistentQueue</Code>\
                 <Message>queue jobs is gone</Message></Error></ErrorResponse>",
            )],
        );

        let err = create_queue(&harness, input()).await.expect_err("modeled error");

        assert_eq!(harness.engine.calls(), 1);
        assert_eq!(
            err.into_service_error().ok(),
            Some(QueueError::QueueDoesNotExist("queue jobs is gone".to_owned()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_unknown_xml_error_on_server_status() {
        let harness = Harness::new(
            test_config(),
            vec![
                xml_reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "<ErrorResponse><Error><Code>InternalFailure</Code></Error></ErrorResponse>",
                ),
                xml_reply(
                    StatusCode::OK,
                    "<CreateQueueResult><QueueUrl>https://svc.example.com/jobs</QueueUrl></CreateQueueResult>",
                ),
            ],
        );

        let output = create_queue(&harness, input()).await.expect("retry should succeed");

        assert_eq!(output.queue_url, "https://svc.example.com/jobs");
        assert_eq!(harness.engine.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_keep_status_when_error_body_is_not_xml() {
        let harness = Harness::new(
            test_config(),
            vec![xml_reply(StatusCode::FORBIDDEN, "<html>denied")],
        );

        let err = create_queue(&harness, input()).await.expect_err("unparseable error body");

        assert_eq!(harness.engine.calls(), 1);
        assert_eq!(err.response().map(|r| r.status), Some(StatusCode::FORBIDDEN));
        assert!(matches!(err, opstack_core::SdkError::UnknownService { .. }));
    }

    #[test]
    fn test_should_map_xml_errors_into_read_write_errors() {
        let err: ReadWriteError = XmlError::missing("QueueUrl").into();
        assert!(matches!(err, ReadWriteError::MissingValue(name) if name == "QueueUrl"));
    }
}
