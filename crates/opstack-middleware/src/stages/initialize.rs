//! Initialize-step middleware: prepare the operation input and the request
//! line.

use std::fmt;

use futures::future::BoxFuture;
use opstack_core::{ClientError, SdkResult, ServiceError};
use tracing::debug;

use crate::context::Context;
use crate::middleware::{Middleware, Next};

/// Sets the context path from the operation input.
///
/// The input renders its own path (with bound labels already escaped); the
/// middleware prepends a fixed prefix.
pub struct UrlPathMiddleware<F> {
    prefix: String,
    url_path: F,
}

impl<F> UrlPathMiddleware<F> {
    /// Middleware id.
    pub const ID: &str = "UrlPath";

    /// Create the middleware. `url_path` returns `None` when a required path
    /// label is missing from the input.
    pub fn new<I>(prefix: impl Into<String>, url_path: F) -> Self
    where
        F: Fn(&I) -> Option<String> + Send + Sync,
    {
        Self {
            prefix: prefix.into(),
            url_path,
        }
    }
}

impl<F> fmt::Debug for UrlPathMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlPathMiddleware")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

impl<I, O, E, F> Middleware<I, O, E> for UrlPathMiddleware<F>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
    F: Fn(&I) -> Option<String> + Send + Sync,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(&'a self, ctx: &'a mut Context, input: I, next: Next<'a, I, O, E>) -> BoxFuture<'a, SdkResult<O, E>> {
        let Some(path) = (self.url_path)(&input) else {
            let operation = ctx.operation().to_owned();
            return Box::pin(async move {
                Err(ClientError::SerializationFailed(format!("failed to build URL path for '{operation}'")).into())
            });
        };
        ctx.set_path(join_path(&self.prefix, &path));
        debug!(path = ctx.path(), "resolved request path");
        next.run(ctx, input)
    }
}

/// Fills an absent idempotency token on the operation input.
pub struct IdempotencyTokenMiddleware<F> {
    token: F,
}

impl<F> IdempotencyTokenMiddleware<F> {
    /// Middleware id.
    pub const ID: &str = "IdempotencyToken";

    /// Create the middleware over an accessor for the input's token field.
    pub fn new<I>(token: F) -> Self
    where
        F: Fn(&mut I) -> &mut Option<String> + Send + Sync,
    {
        Self { token }
    }
}

impl<F> fmt::Debug for IdempotencyTokenMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdempotencyTokenMiddleware").finish_non_exhaustive()
    }
}

impl<I, O, E, F> Middleware<I, O, E> for IdempotencyTokenMiddleware<F>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
    F: Fn(&mut I) -> &mut Option<String> + Send + Sync,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        mut input: I,
        next: Next<'a, I, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        let slot = (self.token)(&mut input);
        if slot.is_none() {
            *slot = Some(ctx.idempotency_token_generator().generate_token());
        }
        next.run(ctx, input)
    }
}
