//! Transport capability and the timeout-applying client wrapper.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opstack_core::{ClientConfig, ClientError};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::endpoint::ProtocolType;
use crate::request::SdkHttpRequest;
use crate::response::HttpResponse;

/// Sends requests over the wire. Implemented by callers; this crate performs
/// no socket or TLS I/O itself.
///
/// An engine may return the response handle before its status code is final
/// and keep updating it from another task.
#[async_trait]
pub trait HttpClientEngine: Send + Sync + fmt::Debug {
    /// Send one request.
    async fn send(&self, request: SdkHttpRequest) -> Result<HttpResponse, ClientError>;
}

/// Transport settings derived from [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Default, TypedBuilder)]
pub struct HttpClientConfiguration {
    /// Timeout applied to each attempt separately.
    #[builder(default, setter(strip_option))]
    pub socket_timeout: Option<Duration>,

    /// Protocol used when a request does not specify one.
    #[builder(default)]
    pub protocol_type: ProtocolType,
}

impl HttpClientConfiguration {
    /// Derive transport settings from a client configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            socket_timeout: config.socket_timeout,
            protocol_type: ProtocolType::Https,
        }
    }
}

/// Wraps an [`HttpClientEngine`], applying the per-attempt timeout and waiting
/// for the final status code before handing the response back.
#[derive(Debug, Clone)]
pub struct SdkHttpClient {
    engine: Arc<dyn HttpClientEngine>,
    config: HttpClientConfiguration,
}

impl SdkHttpClient {
    /// Create a client over an engine.
    #[must_use]
    pub fn new(engine: Arc<dyn HttpClientEngine>, config: HttpClientConfiguration) -> Self {
        Self { engine, config }
    }

    /// The transport settings.
    #[must_use]
    pub fn config(&self) -> &HttpClientConfiguration {
        &self.config
    }

    /// Send a request and wait for its final status.
    ///
    /// Each call gets a fresh timeout window; the timeout covers both the
    /// engine call and the wait for a final status code.
    pub async fn send(&self, request: SdkHttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(method = %request.method(), host = request.host(), path = request.path(), "sending request");
        let attempt = async {
            let response = self.engine.send(request).await?;
            let status = response.wait_for_final_status_code().await;
            debug!(status = status.as_u16(), "received final status");
            Ok(response)
        };

        match self.config.socket_timeout {
            Some(timeout) => tokio::time::timeout(timeout, attempt).await.unwrap_or_else(|_| {
                warn!(?timeout, "request attempt timed out");
                Err(ClientError::Timeout(timeout))
            }),
            None => attempt.await,
        }
    }
}
