//! Phase ordering, context sharing, and stack assembly.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use opstack_core::{ClientError, SdkResult, ServiceError};
    use opstack_middleware::stages::{CONTENT_MD5, ContentMd5Middleware};
    use opstack_middleware::{Context, Middleware, Next, OperationOutput, Position, StackError};
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::{Harness, QueueError, Reply, SendMessage, SendMessageOutput, test_config};

    type Log = Arc<Mutex<Vec<&'static str>>>;
    type Out = OperationOutput<SendMessageOutput>;

    /// Records its label whenever it runs.
    #[derive(Debug, Clone)]
    struct Trace {
        log: Log,
        label: &'static str,
    }

    impl<I, O, E> Middleware<I, O, E> for Trace
    where
        I: Send + 'static,
        O: Send + 'static,
        E: ServiceError,
    {
        fn id(&self) -> &str {
            self.label
        }

        fn handle<'a>(&'a self, ctx: &'a mut Context, input: I, next: Next<'a, I, O, E>) -> BoxFuture<'a, SdkResult<O, E>> {
            self.log.lock().push(self.label);
            next.run(ctx, input)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Tenant(&'static str);

    fn sent() -> Reply {
        Reply::json(&json!({ "MessageId": "m-1" }))
    }

    fn trace(log: &Log, label: &'static str) -> Trace {
        Trace {
            log: log.clone(),
            label,
        }
    }

    #[tokio::test]
    async fn test_should_run_phases_in_fixed_order() {
        let harness = Harness::new(test_config(), vec![sent()]);
        let log = Log::default();
        let mut stack = harness.send_message_stack();
        stack.deserialize.intercept(Position::Before, trace(&log, "deserialize"));
        stack.finalize.intercept(Position::Before, trace(&log, "finalize"));
        stack.build.intercept(Position::Before, trace(&log, "build"));
        stack.serialize.intercept(Position::Before, trace(&log, "serialize"));
        stack.initialize.intercept(Position::Before, trace(&log, "initialize"));

        let mut ctx = harness.context("SendMessage");
        let output = stack
            .execute(&mut ctx, SendMessage::new("jobs", "hello"), &harness.handler())
            .await
            .expect("operation should succeed");

        assert_eq!(output.message_id, "m-1");
        assert_eq!(*log.lock(), vec!["initialize", "serialize", "build", "finalize", "deserialize"]);
    }

    #[tokio::test]
    async fn test_should_rerun_inner_finalize_middleware_per_attempt() {
        let harness = Harness::new(test_config(), vec![Reply::network("reset"), sent()]);
        let log = Log::default();
        let mut stack = harness.send_message_stack();
        stack
            .finalize
            .intercept_after("Retry", trace(&log, "attempt"))
            .expect("retry middleware is installed");
        stack.build.intercept(Position::After, trace(&log, "build"));

        let mut ctx = harness.context("SendMessage");
        stack
            .execute(&mut ctx, SendMessage::new("jobs", "hello"), &harness.handler())
            .await
            .expect("second attempt should succeed");

        assert_eq!(*log.lock(), vec!["build", "attempt", "attempt"]);
        assert_eq!(ctx.attempt(), 2);
    }

    #[tokio::test]
    async fn test_should_stamp_body_and_framing_headers() {
        let harness = Harness::new(test_config(), vec![sent()]);

        harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("operation should succeed");

        let request = &harness.engine.requests()[0];
        let body = request.body().as_bytes().expect("buffered body").clone();
        let sent: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(sent, json!({ "QueueName": "jobs", "MessageBody": "hello" }));
        assert_eq!(
            request.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        let length = body.len().to_string();
        assert_eq!(
            request.headers().get(CONTENT_LENGTH).and_then(|v| v.to_str().ok()),
            Some(length.as_str())
        );
        assert_eq!(request.headers().get(CONTENT_MD5).map(|v| v.len()), Some(24));
    }

    #[tokio::test]
    async fn test_should_share_context_across_phases() {
        let harness = Harness::new(test_config(), vec![sent()]);
        let seen = Log::default();
        let mut stack = harness.send_message_stack();
        stack.initialize.intercept_fn(Position::Before, "SetTenant", |ctx, input, next| {
            ctx.extensions_mut().insert(Tenant("acme"));
            next.run(ctx, input)
        });
        let reader = seen.clone();
        stack
            .deserialize
            .intercept_fn(Position::Before, "ReadTenant", move |ctx, input, next| {
                if let Some(Tenant(name)) = ctx.extensions().get::<Tenant>() {
                    reader.lock().push(name);
                }
                next.run(ctx, input)
            });

        let mut ctx = harness.context("SendMessage");
        stack
            .execute(&mut ctx, SendMessage::new("jobs", "hello"), &harness.handler())
            .await
            .expect("operation should succeed");

        assert_eq!(*seen.lock(), vec!["acme"]);
        assert_eq!(ctx.extensions().get::<Tenant>(), Some(&Tenant("acme")));
    }

    #[tokio::test]
    async fn test_should_short_circuit_without_transport() {
        let harness = Harness::new(test_config(), vec![sent()]);
        let log = Log::default();
        let mut stack = harness.send_message_stack();
        stack.build.intercept_fn(Position::Before, "Deny", |_ctx, _input, _next| {
            let denied: SdkResult<Out, QueueError> = Err(ClientError::Auth("denied".to_owned()).into());
            Box::pin(async move { denied })
        });
        stack.finalize.intercept(Position::Before, trace(&log, "finalize"));

        let mut ctx = harness.context("SendMessage");
        let err = stack
            .execute(&mut ctx, SendMessage::new("jobs", "hello"), &harness.handler())
            .await
            .expect_err("denied");

        assert!(matches!(err.as_client_error(), Some(ClientError::Auth(_))));
        assert!(log.lock().is_empty());
        assert_eq!(harness.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_should_edit_steps_by_id() {
        let harness = Harness::new(test_config(), vec![sent()]);
        let log = Log::default();
        let mut stack = harness.send_message_stack();

        assert!(stack.build.remove(ContentMd5Middleware::ID).is_some());
        stack
            .finalize
            .intercept_before("Signer", trace(&log, "BeforeSign"))
            .expect("signer is installed");
        assert_eq!(stack.finalize.ids(), vec!["Retry", "ContentLength", "BeforeSign", "Signer"]);
        assert_eq!(
            stack.finalize.intercept_before("Missing", trace(&log, "Orphan")),
            Err(StackError::MiddlewareNotFound {
                step: "Finalize".to_owned(),
                id: "Missing".to_owned(),
            })
        );

        let mut ctx = harness.context("SendMessage");
        stack
            .execute(&mut ctx, SendMessage::new("jobs", "hello"), &harness.handler())
            .await
            .expect("operation should succeed");
        assert!(!harness.engine.requests()[0].headers().contains_key(CONTENT_MD5));
        assert_eq!(*log.lock(), vec!["BeforeSign"]);
    }
}
