//! Response handle behavior seen through complete operations.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::StatusCode;
    use opstack_core::ClientConfig;
    use serde_json::json;

    use crate::{Harness, Reply, ScriptedResponse, SendMessage, test_config};

    fn settling(status: StatusCode, delay: Duration) -> Reply {
        ScriptedResponse::new(status)
            .with_body(json!({ "MessageId": "late" }).to_string())
            .settle_after(delay)
            .into()
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_wait_for_final_status_before_decoding() {
        let harness = Harness::new(test_config(), vec![settling(StatusCode::OK, Duration::from_millis(250))]);
        let started = tokio::time::Instant::now();

        let output = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("operation should succeed");

        assert_eq!(output.message_id, "late");
        assert_eq!(started.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_classify_late_error_status() {
        let harness = Harness::new(
            test_config(),
            vec![
                settling(StatusCode::SERVICE_UNAVAILABLE, Duration::from_millis(100)),
                Reply::json(&json!({ "MessageId": "m-2" })),
            ],
        );

        let output = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("retry should succeed");

        assert_eq!(output.message_id, "m-2");
        assert_eq!(harness.engine.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_time_out_each_attempt_separately() {
        let config = ClientConfig {
            socket_timeout: Some(Duration::from_secs(1)),
            ..test_config()
        };
        let harness = Harness::new(
            config,
            vec![
                Reply::Stall(Duration::from_secs(30)),
                settling(StatusCode::OK, Duration::from_millis(900)),
            ],
        );

        let output = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("second attempt fits in its own window");

        assert_eq!(output.message_id, "late");
        assert_eq!(harness.engine.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_give_up_when_every_attempt_times_out() {
        let config = ClientConfig {
            socket_timeout: Some(Duration::from_millis(200)),
            max_retries: 1,
            ..test_config()
        };
        let harness = Harness::new(
            config,
            vec![Reply::Stall(Duration::from_secs(5)), Reply::Stall(Duration::from_secs(5))],
        );

        let err = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect_err("both attempts time out");

        assert!(matches!(
            err.as_client_error(),
            Some(opstack_core::ClientError::Timeout(timeout)) if *timeout == Duration::from_millis(200)
        ));
        assert_eq!(harness.engine.calls(), 2);
    }
}
