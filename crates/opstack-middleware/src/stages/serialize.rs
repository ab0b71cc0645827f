//! Serialize-step middleware: turn the operation input into request parts.

use std::fmt;

use futures::future::BoxFuture;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use opstack_core::{ClientError, SdkResult, ServiceError};
use opstack_http::{ByteStream, QueryItem};
use opstack_readwrite::DocumentWritingClosure;
use tracing::trace;

use crate::context::Context;
use crate::middleware::{Middleware, Next};
use crate::stack::SerializeStepInput;

/// Encodes the whole input as the request body with a document writing
/// closure.
pub struct BodyMiddleware<I> {
    writing: DocumentWritingClosure<I>,
    content_type: HeaderValue,
}

impl<I> BodyMiddleware<I> {
    /// Middleware id.
    pub const ID: &str = "Body";

    /// Create the middleware. The content type is set unless the request
    /// already carries one.
    #[must_use]
    pub fn new(writing: DocumentWritingClosure<I>, content_type: &'static str) -> Self {
        Self {
            writing,
            content_type: HeaderValue::from_static(content_type),
        }
    }
}

impl<I> fmt::Debug for BodyMiddleware<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyMiddleware")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl<I, O, E> Middleware<SerializeStepInput<I>, O, E> for BodyMiddleware<I>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        mut input: SerializeStepInput<I>,
        next: Next<'a, SerializeStepInput<I>, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        let body = match (self.writing)(&input.operation_input) {
            Ok(body) => body,
            Err(err) => {
                return Box::pin(async move { Err(ClientError::SerializationFailed(err.to_string()).into()) });
            }
        };
        trace!(bytes = body.len(), "serialized request body");
        let headers = input.builder.headers_mut();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, self.content_type.clone());
        }
        input.builder.set_body(ByteStream::Data(body));
        next.run(ctx, input)
    }
}

/// Copies headers bound to input members onto the request.
pub struct HeaderMiddleware<F> {
    headers: F,
}

impl<F> HeaderMiddleware<F> {
    /// Middleware id.
    pub const ID: &str = "Header";

    /// Create the middleware over a function rendering the input's headers.
    pub fn new<I>(headers: F) -> Self
    where
        F: Fn(&I) -> Result<HeaderMap, ClientError> + Send + Sync,
    {
        Self { headers }
    }
}

impl<F> fmt::Debug for HeaderMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderMiddleware").finish_non_exhaustive()
    }
}

impl<I, O, E, F> Middleware<SerializeStepInput<I>, O, E> for HeaderMiddleware<F>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
    F: Fn(&I) -> Result<HeaderMap, ClientError> + Send + Sync,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        mut input: SerializeStepInput<I>,
        next: Next<'a, SerializeStepInput<I>, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        match (self.headers)(&input.operation_input) {
            Ok(headers) => {
                input.builder.headers_mut().extend(headers);
                next.run(ctx, input)
            }
            Err(err) => Box::pin(async move { Err(err.into()) }),
        }
    }
}

/// Appends query items bound to input members.
pub struct QueryItemMiddleware<F> {
    items: F,
}

impl<F> QueryItemMiddleware<F> {
    /// Middleware id.
    pub const ID: &str = "QueryItem";

    /// Create the middleware over a function rendering the input's query
    /// items.
    pub fn new<I>(items: F) -> Self
    where
        F: Fn(&I) -> Vec<QueryItem> + Send + Sync,
    {
        Self { items }
    }
}

impl<F> fmt::Debug for QueryItemMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryItemMiddleware").finish_non_exhaustive()
    }
}

impl<I, O, E, F> Middleware<SerializeStepInput<I>, O, E> for QueryItemMiddleware<F>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
    F: Fn(&I) -> Vec<QueryItem> + Send + Sync,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SerializeStepInput<I>,
        next: Next<'a, SerializeStepInput<I>, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        let SerializeStepInput {
            operation_input,
            builder,
        } = input;
        let builder = builder.with_query_items((self.items)(&operation_input));
        next.run(
            ctx,
            SerializeStepInput {
                operation_input,
                builder,
            },
        )
    }
}
