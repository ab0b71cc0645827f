//! End-to-end tests for the opstack runtime.
//!
//! Operations run through fully assembled stacks against [`ScriptedEngine`],
//! an in-memory transport that replays scripted replies and records every
//! request it receives. No network access is needed:
//!
//! ```text
//! cargo test -p opstack-integration
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use opstack_core::{ClientConfig, ClientError, ErrorFault, SdkResult, ServiceError, UnknownServiceError};
use opstack_endpoint::{DefaultEndpointResolver, EndpointResolver, ServiceEndpointMetadata};
use opstack_http::{ByteStream, HttpClientConfiguration, HttpClientEngine, HttpResponse, SdkHttpClient, SdkHttpRequest};
use opstack_middleware::stages::{
    BodyMiddleware, ContentLengthMiddleware, ContentMd5Middleware, DeserializeMiddleware, EndpointResolverMiddleware,
    LoggerMiddleware, RetryMiddleware, SignerMiddleware,
};
use opstack_middleware::{
    Context, ErrorBinding, ErrorMatch, HttpClientHandler, OperationStack, Position, ResponseBinding,
    error_type_from_header,
};
use opstack_readwrite::DocumentWritingClosure;
use opstack_retry::{DefaultRetryStrategy, RetryStrategyOptions};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Service name of the test queue service.
pub const SERVICE: &str = "queue";

/// Host template of the test queue service.
pub const HOST_TEMPLATE: &str = "svc.{region}.example.com";

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with a response.
    Response(ScriptedResponse),
    /// Fail the attempt with a network error.
    Network(String),
    /// Hang for the given time, then answer `200 OK`.
    Stall(Duration),
}

impl Reply {
    /// An empty response with `status`.
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        ScriptedResponse::new(status).into()
    }

    /// A `200 OK` response with a JSON body.
    #[must_use]
    pub fn json(body: &serde_json::Value) -> Self {
        ScriptedResponse::new(StatusCode::OK).with_body(body.to_string()).into()
    }

    /// A network failure.
    #[must_use]
    pub fn network(message: &str) -> Self {
        Self::Network(message.to_owned())
    }
}

/// A scripted response.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    settle_after: Option<Duration>,
}

impl ScriptedResponse {
    /// An empty response with `status`.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            settle_after: None,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .append(HeaderName::from_static(name), HeaderValue::from_static(value));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Hand the response out as `100 Continue` and make the status final
    /// only after `delay`.
    #[must_use]
    pub fn settle_after(mut self, delay: Duration) -> Self {
        self.settle_after = Some(delay);
        self
    }

    fn into_response(self) -> HttpResponse {
        let Some(delay) = self.settle_after else {
            return HttpResponse::new(self.headers, ByteStream::Data(self.body), self.status);
        };
        let response = HttpResponse::new(self.headers, ByteStream::Data(self.body), StatusCode::CONTINUE);
        let producer = response.clone();
        let status = self.status;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            producer.set_status_code(status);
        });
        response
    }
}

impl From<ScriptedResponse> for Reply {
    fn from(response: ScriptedResponse) -> Self {
        Self::Response(response)
    }
}

/// In-memory transport replaying [`Reply`] values in order. Once the script
/// runs out, every request gets an empty `200 OK`.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<SdkHttpRequest>>,
}

impl ScriptedEngine {
    /// An engine over `replies`.
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SdkHttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpClientEngine for ScriptedEngine {
    async fn send(&self, request: SdkHttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.lock().push(request);
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Reply::status(StatusCode::OK));
        match reply {
            Reply::Response(response) => Ok(response.into_response()),
            Reply::Network(message) => Err(ClientError::network(std::io::Error::other(message))),
            Reply::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse::new(HeaderMap::new(), ByteStream::NoStream, StatusCode::OK))
            }
        }
    }
}

/// Input of the `SendMessage` test operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessage {
    /// Target queue.
    pub queue_name: String,
    /// Message text.
    pub message_body: String,
}

impl SendMessage {
    /// A message for `queue_name`.
    #[must_use]
    pub fn new(queue_name: &str, message_body: &str) -> Self {
        Self {
            queue_name: queue_name.to_owned(),
            message_body: message_body.to_owned(),
        }
    }
}

/// Output of the `SendMessage` test operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageOutput {
    /// Id assigned to the message.
    pub message_id: String,
}

/// Modeled errors of the test queue service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue is unknown.
    #[error("queue does not exist: {0}")]
    QueueDoesNotExist(String),
    /// The caller exceeded its request rate.
    #[error("request rate exceeded")]
    OverLimit,
}

impl ServiceError for QueueError {
    fn type_name(&self) -> Option<&str> {
        Some(match self {
            Self::QueueDoesNotExist(_) => "QueueDoesNotExist",
            Self::OverLimit => "OverLimit",
        })
    }

    fn message(&self) -> Option<&str> {
        match self {
            Self::QueueDoesNotExist(message) => Some(message),
            Self::OverLimit => None,
        }
    }

    fn fault(&self) -> ErrorFault {
        ErrorFault::Client
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::OverLimit)
    }

    fn is_throttling(&self) -> bool {
        matches!(self, Self::OverLimit)
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(rename = "__type")]
    kind: Option<String>,
    message: Option<String>,
}

/// Error binding of the test queue service: a JSON body with `__type` and
/// `message`, or just the error type header.
#[must_use]
pub fn queue_errors() -> ErrorBinding<QueueError> {
    ErrorBinding::new(|response, body| {
        let wire: WireError = if body.is_empty() {
            WireError::default()
        } else {
            serde_json::from_slice(body)?
        };
        let kind = wire.kind.or_else(|| error_type_from_header(response));
        Ok(match kind.as_deref() {
            Some("QueueDoesNotExist") => ErrorMatch::Modeled(QueueError::QueueDoesNotExist(wire.message.unwrap_or_default())),
            Some("OverLimit") => ErrorMatch::Modeled(QueueError::OverLimit),
            _ => ErrorMatch::Unknown(UnknownServiceError::new(kind.clone(), wire.message)),
        })
    })
}

/// Endpoint metadata of the test queue service.
#[must_use]
pub fn queue_metadata() -> ServiceEndpointMetadata {
    ServiceEndpointMetadata::with_host_name(HOST_TEMPLATE)
}

/// A client configuration with fast, jitter-free backoff.
#[must_use]
pub fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .region("us-west-2")
        .backoff_scale_factor(Duration::from_millis(10))
        .jitter_mode(opstack_core::JitterMode::None)
        .build()
}

/// A client over a scripted engine: shared retry strategy, endpoint
/// resolver, and transport, plus helpers assembling the standard stack.
#[derive(Debug)]
pub struct Harness {
    /// The configuration every operation context is seeded from.
    pub config: ClientConfig,
    /// The scripted transport.
    pub engine: Arc<ScriptedEngine>,
    /// The retry strategy shared by every operation.
    pub strategy: Arc<DefaultRetryStrategy>,
    resolver: Arc<dyn EndpointResolver>,
}

impl Harness {
    /// A harness replaying `replies`.
    pub fn new(config: ClientConfig, replies: impl IntoIterator<Item = Reply>) -> Self {
        init_tracing();
        Self {
            engine: Arc::new(ScriptedEngine::new(replies)),
            strategy: Arc::new(DefaultRetryStrategy::new(RetryStrategyOptions::from_config(&config))),
            resolver: Arc::new(DefaultEndpointResolver::new(queue_metadata())),
            config,
        }
    }

    /// Replace the endpoint resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl EndpointResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// A fresh context for `operation`.
    #[must_use]
    pub fn context(&self, operation: &str) -> Context {
        Context::for_operation(&self.config, SERVICE, operation)
    }

    /// The transport handler.
    #[must_use]
    pub fn handler(&self) -> HttpClientHandler {
        HttpClientHandler::new(SdkHttpClient::new(
            self.engine.clone(),
            HttpClientConfiguration::from_config(&self.config),
        ))
    }

    /// The standard stack: body serialization, endpoint resolution, MD5,
    /// retry, content length, signing, logging, and deserialization.
    pub fn stack<I, O, E>(
        &self,
        operation: &str,
        body: DocumentWritingClosure<I>,
        content_type: &'static str,
        response: ResponseBinding<O>,
        error: ErrorBinding<E>,
    ) -> OperationStack<I, O, E>
    where
        I: Send + 'static,
        O: Send + 'static,
        E: ServiceError,
    {
        let mut stack = OperationStack::new(operation);
        stack
            .serialize
            .intercept(Position::After, BodyMiddleware::new(body, content_type));
        stack
            .build
            .intercept(Position::After, EndpointResolverMiddleware::new(self.resolver.clone()));
        stack.build.intercept(Position::After, ContentMd5Middleware);
        stack
            .finalize
            .intercept(Position::After, RetryMiddleware::new(self.strategy.clone()));
        stack.finalize.intercept(Position::After, ContentLengthMiddleware);
        stack.finalize.intercept(Position::After, SignerMiddleware);
        stack.deserialize.intercept(Position::After, LoggerMiddleware);
        stack
            .deserialize
            .intercept(Position::After, DeserializeMiddleware::new(response, error));
        stack
    }

    /// The stack of the JSON `SendMessage` operation.
    #[must_use]
    pub fn send_message_stack(&self) -> OperationStack<SendMessage, SendMessageOutput, QueueError> {
        self.stack(
            "SendMessage",
            opstack_readwrite::json::writing_closure::<SendMessage>(),
            opstack_readwrite::json::CONTENT_TYPE,
            ResponseBinding::from_document(opstack_readwrite::json::reading_closure::<SendMessageOutput>()),
            queue_errors(),
        )
    }

    /// Run `SendMessage` through the standard stack.
    pub async fn send_message(&self, input: SendMessage) -> SdkResult<SendMessageOutput, QueueError> {
        let stack = self.send_message_stack();
        let handler = self.handler();
        let mut ctx = self.context("SendMessage");
        ctx.set_method(Method::POST);
        stack.execute(&mut ctx, input, &handler).await
    }
}

mod test_endpoint;
mod test_pipeline;
mod test_response;
mod test_retry;
mod test_xml;
