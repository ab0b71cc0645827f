//! Handler and middleware traits.
//!
//! A step folds its middleware around a terminal [`Handler`]. Each
//! [`Middleware`] receives the context, the in-flight value, and a [`Next`]
//! continuation; calling [`Next::run`] continues the chain, returning without
//! calling it short-circuits.
//!
//! # Example
//!
//! ```ignore
//! struct Tag;
//!
//! impl<O: Send + 'static, E: ServiceError> Middleware<SdkHttpRequestBuilder, O, E> for Tag {
//!     fn id(&self) -> &str {
//!         "Tag"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         ctx: &'a mut Context,
//!         input: SdkHttpRequestBuilder,
//!         next: Next<'a, SdkHttpRequestBuilder, O, E>,
//!     ) -> BoxFuture<'a, SdkResult<O, E>> {
//!         Box::pin(async move { next.run(ctx, input.with_header(NAME, VALUE)).await })
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use opstack_core::{SdkResult, ServiceError};

use crate::context::Context;

/// The innermost callee of a step.
pub trait Handler<I, O, E: ServiceError>: Send + Sync {
    /// Handle `input`, producing the step's output.
    fn handle<'a>(&'a self, ctx: &'a mut Context, input: I) -> BoxFuture<'a, SdkResult<O, E>>;
}

/// A composable wrapper around the rest of a step.
///
/// Middleware must call `next.run()` at most once per invocation, except the
/// retry middleware, which re-enters the remaining chain for every attempt.
pub trait Middleware<I, O, E: ServiceError>: Send + Sync {
    /// Identifier used for relative insertion and removal.
    fn id(&self) -> &str;

    /// Process `input`, usually by calling `next`.
    fn handle<'a>(&'a self, ctx: &'a mut Context, input: I, next: Next<'a, I, O, E>) -> BoxFuture<'a, SdkResult<O, E>>;
}

/// The remaining middleware of a step and its terminal handler.
pub struct Next<'a, I, O, E: ServiceError> {
    chain: &'a [Arc<dyn Middleware<I, O, E>>],
    terminal: &'a dyn Handler<I, O, E>,
}

impl<'a, I, O, E: ServiceError> Next<'a, I, O, E> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware<I, O, E>>], terminal: &'a dyn Handler<I, O, E>) -> Self {
        Self { chain, terminal }
    }

    /// Number of middleware left before the terminal handler.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Invoke the next middleware, or the terminal handler at the end of the
    /// chain.
    pub fn run<'b>(self, ctx: &'b mut Context, input: I) -> BoxFuture<'b, SdkResult<O, E>>
    where
        'a: 'b,
    {
        match self.chain.split_first() {
            Some((first, rest)) => first.handle(
                ctx,
                input,
                Next {
                    chain: rest,
                    terminal: self.terminal,
                },
            ),
            None => self.terminal.handle(ctx, input),
        }
    }
}

impl<I, O, E: ServiceError> Clone for Next<'_, I, O, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O, E: ServiceError> Copy for Next<'_, I, O, E> {}

impl<I, O, E: ServiceError> fmt::Debug for Next<'_, I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("chain", &self.chain.iter().map(|m| m.id()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A middleware created from a function.
///
/// ```ignore
/// let timing = FnMiddleware::new("Timing", |ctx, input, next| {
///     Box::pin(async move {
///         let start = Instant::now();
///         let result = next.run(ctx, input).await;
///         debug!(elapsed = ?start.elapsed(), "step finished");
///         result
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    id: String,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Create a function-based middleware.
    pub fn new<I, O, E>(id: impl Into<String>, func: F) -> Self
    where
        E: ServiceError,
        F: for<'a> Fn(&'a mut Context, I, Next<'a, I, O, E>) -> BoxFuture<'a, SdkResult<O, E>> + Send + Sync,
    {
        Self { id: id.into(), func }
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<I, O, E, F> Middleware<I, O, E> for FnMiddleware<F>
where
    E: ServiceError,
    F: for<'a> Fn(&'a mut Context, I, Next<'a, I, O, E>) -> BoxFuture<'a, SdkResult<O, E>> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn handle<'a>(&'a self, ctx: &'a mut Context, input: I, next: Next<'a, I, O, E>) -> BoxFuture<'a, SdkResult<O, E>> {
        (self.func)(ctx, input, next)
    }
}

/// A terminal handler created from a function.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Create a function-based handler.
    pub fn new<I, O, E>(func: F) -> Self
    where
        E: ServiceError,
        F: for<'a> Fn(&'a mut Context, I) -> BoxFuture<'a, SdkResult<O, E>> + Send + Sync,
    {
        Self { func }
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<I, O, E, F> Handler<I, O, E> for FnHandler<F>
where
    E: ServiceError,
    F: for<'a> Fn(&'a mut Context, I) -> BoxFuture<'a, SdkResult<O, E>> + Send + Sync,
{
    fn handle<'a>(&'a self, ctx: &'a mut Context, input: I) -> BoxFuture<'a, SdkResult<O, E>> {
        (self.func)(ctx, input)
    }
}
