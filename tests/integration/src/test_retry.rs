//! Retry behavior of complete operations.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::StatusCode;
    use opstack_core::{ClientConfig, ClientError, RetryError, SdkError};
    use opstack_middleware::stages::{INVOCATION_ID_HEADER, REQUEST_HEADER};
    use serde_json::json;

    use crate::{Harness, QueueError, Reply, ScriptedResponse, SendMessage, test_config};

    const PARTITION: &str = "svc.us-west-2.example.com";

    fn header(request: &opstack_http::SdkHttpRequest, name: &str) -> String {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    }

    fn with_retries(max_retries: u32, capacity: u32) -> ClientConfig {
        ClientConfig {
            max_retries,
            initial_bucket_capacity: capacity,
            ..test_config()
        }
    }

    fn sent() -> Reply {
        Reply::json(&json!({ "MessageId": "m-1" }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_return_third_error_after_two_retries() {
        let harness = Harness::new(
            with_retries(2, 500),
            vec![
                Reply::network("connection reset 1"),
                Reply::network("connection reset 2"),
                Reply::network("connection reset 3"),
                sent(),
            ],
        );

        let err = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect_err("retries should run out");

        assert_eq!(harness.engine.calls(), 3);
        assert!(matches!(err.as_client_error(), Some(ClientError::Network(_))));
        assert!(err.to_string().contains("connection reset 3"), "unexpected error: {err}");
        assert_eq!(harness.strategy.pool().capacity(PARTITION), 480);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_recover_after_server_error() {
        let harness = Harness::new(test_config(), vec![Reply::status(StatusCode::SERVICE_UNAVAILABLE), sent()]);

        let output = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("second attempt should succeed");

        assert_eq!(output.message_id, "m-1");
        let requests = harness.engine.requests();
        assert_eq!(requests.len(), 2);
        let invocation = header(&requests[0], INVOCATION_ID_HEADER);
        assert!(!invocation.is_empty());
        assert_eq!(header(&requests[1], INVOCATION_ID_HEADER), invocation);
        assert_eq!(header(&requests[0], REQUEST_HEADER), "attempt=1; max=4");
        assert_eq!(header(&requests[1], REQUEST_HEADER), "attempt=2; max=4");
        assert_eq!(harness.strategy.pool().capacity(PARTITION), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_wait_for_retry_after_hint() {
        let harness = Harness::new(
            test_config(),
            vec![
                ScriptedResponse::new(StatusCode::SERVICE_UNAVAILABLE)
                    .with_header("x-retry-after", "1.5")
                    .into(),
                sent(),
            ],
        );
        let started = tokio::time::Instant::now();

        harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("retry should succeed");

        assert_eq!(started.elapsed(), Duration::from_millis(1500));
        assert_eq!(harness.engine.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_not_retry_modeled_client_error() {
        let harness = Harness::new(
            test_config(),
            vec![
                ScriptedResponse::new(StatusCode::BAD_REQUEST)
                    .with_body(json!({ "__type": "QueueDoesNotExist", "message": "no queue 'jobs'" }).to_string())
                    .into(),
            ],
        );

        let err = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect_err("modeled error");

        assert_eq!(harness.engine.calls(), 1);
        assert_eq!(err.code(), Some("QueueDoesNotExist"));
        assert_eq!(
            err.into_service_error().ok(),
            Some(QueueError::QueueDoesNotExist("no queue 'jobs'".to_owned()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_modeled_error_with_retry_after_header() {
        let harness = Harness::new(
            test_config(),
            vec![
                ScriptedResponse::new(StatusCode::BAD_REQUEST)
                    .with_header("x-amz-retry-after", "0.5")
                    .with_body(json!({ "__type": "QueueDoesNotExist" }).to_string())
                    .into(),
                sent(),
            ],
        );

        harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("hinted retry should succeed");
        assert_eq!(harness.engine.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_throttling_from_error_type_header() {
        let harness = Harness::new(
            test_config(),
            vec![
                ScriptedResponse::new(StatusCode::BAD_REQUEST)
                    .with_header("x-amzn-errortype", "OverLimit:http://internal.example.com/")
                    .into(),
                ScriptedResponse::new(StatusCode::TOO_MANY_REQUESTS)
                    .with_header("x-amzn-errortype", "ThrottlingException")
                    .into(),
                sent(),
            ],
        );

        harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("throttled attempts should be retried");
        assert_eq!(harness.engine.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_share_capacity_across_operations_in_partition() {
        let harness = Harness::new(
            with_retries(3, 10),
            vec![Reply::network("reset"), Reply::network("reset")],
        );

        let first = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect_err("bucket should run dry");
        assert!(matches!(first.as_client_error(), Some(ClientError::Network(_))));
        assert_eq!(harness.engine.calls(), 2);
        assert_eq!(harness.strategy.pool().capacity(PARTITION), 0);

        let second = harness
            .send_message(SendMessage::new("jobs", "again"))
            .await
            .expect_err("no capacity for a first attempt");
        assert!(matches!(
            second,
            SdkError::Retry(RetryError::NoCapacity { ref partition_id }) if partition_id == PARTITION
        ));
        assert_eq!(harness.engine.calls(), 2);
    }
}
