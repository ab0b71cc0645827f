//! Endpoint resolution inside complete operations.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use opstack_core::{ClientConfig, ClientError};
    use opstack_endpoint::{CredentialScope, DefaultEndpointResolver, ServiceEndpointMetadata};
    use opstack_http::{AuthScheme, ProtocolType, SdkHttpRequestBuilder, Signer, SigningParams};
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::{HOST_TEMPLATE, Harness, Reply, SERVICE, SendMessage, test_config};

    fn sent() -> Reply {
        Reply::json(&json!({ "MessageId": "m-1" }))
    }

    #[derive(Debug, Default)]
    struct RecordingSigner {
        params: Mutex<Vec<SigningParams>>,
    }

    #[async_trait]
    impl Signer for RecordingSigner {
        async fn sign(
            &self,
            request: SdkHttpRequestBuilder,
            params: &SigningParams,
        ) -> Result<SdkHttpRequestBuilder, ClientError> {
            self.params.lock().push(params.clone());
            Ok(request)
        }
    }

    #[tokio::test]
    async fn test_should_resolve_host_template_with_default_protocol() {
        let harness = Harness::new(test_config(), vec![sent()]);

        harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("operation should succeed");

        let request = &harness.engine.requests()[0];
        assert_eq!(request.host(), "svc.us-west-2.example.com");
        assert_eq!(request.endpoint().protocol, ProtocolType::Https);
        assert_eq!(request.path(), "/");
        assert_eq!(request.method(), &http::Method::POST);
    }

    #[tokio::test]
    async fn test_should_prefix_host_but_not_partition() {
        let harness = Harness::new(test_config(), vec![sent()]);
        let stack = harness.send_message_stack();
        let handler = harness.handler();
        let mut ctx = harness.context("SendMessage");
        ctx.set_host_prefix("tenant-a.");

        stack
            .execute(&mut ctx, SendMessage::new("jobs", "hello"), &handler)
            .await
            .expect("operation should succeed");

        assert_eq!(harness.engine.requests()[0].host(), "tenant-a.svc.us-west-2.example.com");
        assert_eq!(ctx.partition_id(), "svc.us-west-2.example.com");
        assert_eq!(
            ctx.endpoint().map(|e| e.endpoint.host.as_str()),
            Some("svc.us-west-2.example.com")
        );
    }

    #[tokio::test]
    async fn test_should_use_explicit_endpoint_url() {
        let config = ClientConfig {
            endpoint: Some("http://localhost:4566/base".to_owned()),
            ..test_config()
        };
        let harness = Harness::new(config, vec![sent()]);

        harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect("operation should succeed");

        let request = &harness.engine.requests()[0];
        assert_eq!(request.host(), "localhost");
        assert_eq!(request.endpoint().port, Some(4566));
        assert_eq!(request.endpoint().protocol, ProtocolType::Http);
        assert_eq!(request.path(), "/base/");
    }

    #[tokio::test]
    async fn test_should_fail_without_region_and_skip_transport() {
        let config = ClientConfig {
            region: None,
            ..test_config()
        };
        let harness = Harness::new(config, vec![sent()]);

        let err = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect_err("template needs a region");

        assert!(matches!(err.as_client_error(), Some(ClientError::EndpointResolution(m)) if m.contains("region")));
        assert_eq!(harness.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_should_fail_without_hostname() {
        let harness = Harness::new(test_config(), vec![sent()])
            .with_resolver(DefaultEndpointResolver::new(ServiceEndpointMetadata::default()));

        let err = harness
            .send_message(SendMessage::new("jobs", "hello"))
            .await
            .expect_err("no host name");

        assert!(matches!(err.as_client_error(), Some(ClientError::EndpointResolution(_))));
        assert_eq!(harness.engine.calls(), 0);
    }

    #[tokio::test]
    async fn test_should_sign_with_credential_scope() {
        let metadata = ServiceEndpointMetadata {
            credential_scope: Some(CredentialScope {
                region: Some("us-east-1".to_owned()),
                service_id: Some("queue-signing".to_owned()),
            }),
            signature_versions: vec!["v4".to_owned()],
            ..ServiceEndpointMetadata::with_host_name(HOST_TEMPLATE)
        };
        let harness = Harness::new(test_config(), vec![sent(), sent()])
            .with_resolver(DefaultEndpointResolver::new(metadata));
        let signer = Arc::new(RecordingSigner::default());
        let stack = harness.send_message_stack();
        let handler = harness.handler();
        let mut ctx = opstack_middleware::Context::builder()
            .operation("SendMessage")
            .service_name(SERVICE)
            .region("us-west-2")
            .auth_schemes(vec![AuthScheme::new("sigv4", signer.clone())])
            .build();

        stack
            .execute(&mut ctx, SendMessage::new("jobs", "hello"), &handler)
            .await
            .expect("operation should succeed");

        let params = signer.params.lock();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].signing_name, "queue-signing");
        assert_eq!(params[0].signing_region, "us-east-1");
        assert_eq!(params[0].signature_version, "v4");
        assert_eq!(harness.engine.requests()[0].host(), "svc.us-west-2.example.com");
    }
}
