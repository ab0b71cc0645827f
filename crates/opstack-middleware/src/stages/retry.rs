//! Retry middleware.

use std::sync::Arc;

use futures::future::BoxFuture;
use http::HeaderValue;
use opstack_core::{ClientError, SdkResult, ServiceError};
use opstack_http::SdkHttpRequestBuilder;
use opstack_retry::{DefaultRetryErrorInfoProvider, RetryErrorInfoProvider, RetryStrategy};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::Context;
use crate::middleware::{Middleware, Next};

/// Header carrying an id shared by every attempt of one invocation.
pub const INVOCATION_ID_HEADER: &str = "amz-sdk-invocation-id";

/// Header carrying the attempt number and the attempt limit.
pub const REQUEST_HEADER: &str = "amz-sdk-request";

/// Re-runs the rest of the stack while the strategy grants retries.
///
/// Every attempt starts from a copy of the request as it entered this
/// middleware, so inner middleware (signing, content length) run again per
/// attempt. When the strategy refuses a retry, the last error is returned
/// unchanged. A request with a streaming body is never retried: the first
/// attempt consumes the stream.
#[derive(Debug, Clone)]
pub struct RetryMiddleware<P = DefaultRetryErrorInfoProvider> {
    strategy: Arc<dyn RetryStrategy>,
    provider: P,
}

impl RetryMiddleware {
    /// Create the middleware with the standard error classification.
    #[must_use]
    pub fn new(strategy: Arc<dyn RetryStrategy>) -> Self {
        Self::with_provider(strategy, DefaultRetryErrorInfoProvider)
    }
}

impl<P> RetryMiddleware<P> {
    /// Middleware id.
    pub const ID: &str = "Retry";

    /// Create the middleware with a custom error classification.
    pub fn with_provider(strategy: Arc<dyn RetryStrategy>, provider: P) -> Self {
        Self { strategy, provider }
    }

    /// The retry strategy.
    #[must_use]
    pub fn strategy(&self) -> &Arc<dyn RetryStrategy> {
        &self.strategy
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|e| ClientError::Unknown(format!("invalid retry header '{value}': {e}")))
}

impl<P> RetryMiddleware<P>
where
    P: RetryErrorInfoProvider,
{
    async fn attempt_all<O, E>(
        &self,
        ctx: &mut Context,
        mut input: SdkHttpRequestBuilder,
        next: Next<'_, SdkHttpRequestBuilder, O, E>,
    ) -> SdkResult<O, E>
    where
        O: Send + 'static,
        E: ServiceError,
    {
        let partition_id = ctx.partition_id().to_owned();
        let mut token = self.strategy.acquire_token(&partition_id).await?;
        let max_attempts = self.strategy.max_retries().saturating_add(1);
        input
            .headers_mut()
            .insert(INVOCATION_ID_HEADER, header_value(&Uuid::new_v4().to_string())?);

        loop {
            let attempt = token.retry_count().saturating_add(1);
            ctx.set_attempt(attempt);
            let mut request = input.clone();
            request
                .headers_mut()
                .insert(REQUEST_HEADER, header_value(&format!("attempt={attempt}; max={max_attempts}"))?);

            let err = match next.run(ctx, request).await {
                Ok(output) => {
                    self.strategy.record_success(token);
                    return Ok(output);
                }
                Err(err) => err,
            };

            let Some(info) = self.provider.error_info(&err) else {
                debug!(attempt, error = %err, "error is not retryable");
                return Err(err);
            };
            if input.body().is_stream() {
                debug!(attempt, error = %err, "streaming body cannot be replayed");
                return Err(err);
            }
            token = match self.strategy.schedule_retry(token, info).await {
                Ok(token) => token,
                Err(refused) => {
                    warn!(attempt, partition_id = %partition_id, reason = %refused, error = %err, "giving up on retries");
                    return Err(err);
                }
            };
            info!(attempt, error_type = ?info.error_type, delay = ?token.last_delay(), "retrying operation");
        }
    }
}

impl<O, E, P> Middleware<SdkHttpRequestBuilder, O, E> for RetryMiddleware<P>
where
    O: Send + 'static,
    E: ServiceError,
    P: RetryErrorInfoProvider,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SdkHttpRequestBuilder,
        next: Next<'a, SdkHttpRequestBuilder, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        Box::pin(self.attempt_all(ctx, input, next))
    }
}
