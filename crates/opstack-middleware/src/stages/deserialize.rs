//! Deserialize-step middleware: wire logging and response decoding.

use futures::future::BoxFuture;
use opstack_core::{SdkResult, ServiceError};
use opstack_http::{ByteStream, SdkHttpRequest};
use tracing::debug;

use crate::binding::{ErrorBinding, ResponseBinding};
use crate::context::Context;
use crate::middleware::{Middleware, Next};
use crate::stack::OperationOutput;

fn body_text(body: &ByteStream) -> Option<String> {
    body.as_bytes().map(|data| String::from_utf8_lossy(data).into_owned())
}

/// Logs requests and responses as selected by the context's log mode.
///
/// Only buffered bodies are logged; streams are left unread.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerMiddleware;

impl LoggerMiddleware {
    /// Middleware id.
    pub const ID: &str = "Logger";
}

impl<O, E> Middleware<SdkHttpRequest, OperationOutput<O>, E> for LoggerMiddleware
where
    O: Send + 'static,
    E: ServiceError,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SdkHttpRequest,
        next: Next<'a, SdkHttpRequest, OperationOutput<O>, E>,
    ) -> BoxFuture<'a, SdkResult<OperationOutput<O>, E>> {
        let mode = ctx.log_mode();
        if mode.logs_request() {
            debug!(
                attempt = ctx.attempt(),
                method = %input.method(),
                host = input.host(),
                path = input.path(),
                headers = ?input.headers(),
                "request"
            );
        }
        if mode.logs_request_body() {
            if let Some(body) = body_text(input.body()) {
                debug!(body = %body, "request body");
            }
        }

        Box::pin(async move {
            let result = next.run(ctx, input).await;
            if let Ok(output) = &result {
                let response = &output.http_response;
                if mode.logs_response() {
                    debug!(status = response.status_code().as_u16(), headers = ?response.headers(), "response");
                }
                if mode.logs_response_body() {
                    if let Some(body) = body_text(&response.body()) {
                        debug!(body = %body, "response body");
                    }
                }
            }
            result
        })
    }
}

/// Turns the transport response into the operation output or error.
///
/// Success statuses are decoded with the response binding. Every other status
/// becomes a service error through the error binding, so the retry middleware
/// can classify it.
pub struct DeserializeMiddleware<O, E> {
    response: ResponseBinding<O>,
    error: ErrorBinding<E>,
}

impl<O, E> DeserializeMiddleware<O, E> {
    /// Middleware id.
    pub const ID: &str = "Deserialize";

    /// Create the middleware.
    #[must_use]
    pub fn new(response: ResponseBinding<O>, error: ErrorBinding<E>) -> Self {
        Self { response, error }
    }
}

impl<O, E> std::fmt::Debug for DeserializeMiddleware<O, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeserializeMiddleware")
            .field("response", &self.response)
            .field("error", &self.error)
            .finish()
    }
}

impl<O, E> Middleware<SdkHttpRequest, OperationOutput<O>, E> for DeserializeMiddleware<O, E>
where
    O: Send + 'static,
    E: ServiceError,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SdkHttpRequest,
        next: Next<'a, SdkHttpRequest, OperationOutput<O>, E>,
    ) -> BoxFuture<'a, SdkResult<OperationOutput<O>, E>> {
        Box::pin(async move {
            let mut output = next.run(ctx, input).await?;
            let status = output.http_response.status_code();
            if !status.is_success() {
                debug!(status = status.as_u16(), "decoding error response");
                return Err(self.error.bind(&output.http_response).await);
            }
            if output.output.is_none() {
                output.output = Some(self.response.bind(&output.http_response).await?);
            }
            Ok(output)
        })
    }
}
