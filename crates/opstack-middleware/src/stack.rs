//! The five-step operation stack.
//!
//! ```text
//! Initialize(I) -> Serialize(I + builder) -> Build(builder) -> Finalize(builder)
//!     -> Deserialize(request) -> terminal handler
//! ```
//!
//! Each step's terminal handler is a link that converts the value into the
//! next step's input and runs that step. The last link freezes the request
//! builder and runs the deserialize step around the caller's handler.

use futures::future::BoxFuture;
use opstack_core::{ClientError, SdkResult, ServiceError};
use opstack_http::{HttpResponse, SdkHttpRequest, SdkHttpRequestBuilder};
use tracing::{Instrument, debug, warn};

use crate::context::Context;
use crate::middleware::Handler;
use crate::step::Step;

/// The response of one attempt, with the typed output once deserialized.
#[derive(Debug, Clone)]
pub struct OperationOutput<O> {
    /// The raw response.
    pub http_response: HttpResponse,
    /// The typed output, set by the deserialize middleware.
    pub output: Option<O>,
}

impl<O> OperationOutput<O> {
    /// A response without typed output.
    #[must_use]
    pub fn new(http_response: HttpResponse) -> Self {
        Self {
            http_response,
            output: None,
        }
    }
}

/// Input of the serialize step: the operation input and the request being
/// built from it.
#[derive(Debug)]
pub struct SerializeStepInput<I> {
    /// The operation input.
    pub operation_input: I,
    /// The request under construction.
    pub builder: SdkHttpRequestBuilder,
}

/// Handler type of a stack's terminal transport call.
pub type TerminalHandler<O, E> = dyn Handler<SdkHttpRequest, OperationOutput<O>, E>;

/// The middleware of one operation, grouped by step.
#[derive(Debug)]
pub struct OperationStack<I, O, E: ServiceError> {
    id: String,
    /// Prepares the operation input.
    pub initialize: Step<I, OperationOutput<O>, E>,
    /// Turns the input into a request.
    pub serialize: Step<SerializeStepInput<I>, OperationOutput<O>, E>,
    /// Adds destination and request-wide headers.
    pub build: Step<SdkHttpRequestBuilder, OperationOutput<O>, E>,
    /// Retries, signs, and finishes the request.
    pub finalize: Step<SdkHttpRequestBuilder, OperationOutput<O>, E>,
    /// Turns the response into the output.
    pub deserialize: Step<SdkHttpRequest, OperationOutput<O>, E>,
}

impl<I, O, E> OperationStack<I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
{
    /// An empty stack.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initialize: Step::new("Initialize"),
            serialize: Step::new("Serialize"),
            build: Step::new("Build"),
            finalize: Step::new("Finalize"),
            deserialize: Step::new("Deserialize"),
        }
    }

    /// The stack's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run every step around `handler`, returning the last attempt's output.
    pub async fn handle_middleware(
        &self,
        ctx: &mut Context,
        input: I,
        handler: &TerminalHandler<O, E>,
    ) -> SdkResult<OperationOutput<O>, E> {
        let span = ctx.span().clone();
        async {
            debug!(stack = %self.id, operation = ctx.operation(), "executing operation");
            let link = SerializeLink { stack: self, handler };
            let result = self.initialize.run(ctx, input, &link).await;
            match &result {
                Ok(output) => debug!(
                    status = output.http_response.status_code().as_u16(),
                    attempts = ctx.attempt(),
                    "operation succeeded"
                ),
                Err(err) => warn!(error = %err, attempts = ctx.attempt(), "operation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Run the operation and return its typed output.
    pub async fn execute(&self, ctx: &mut Context, input: I, handler: &TerminalHandler<O, E>) -> SdkResult<O, E> {
        let output = self.handle_middleware(ctx, input, handler).await?;
        output.output.ok_or_else(|| {
            ClientError::DataNotFound(format!("operation '{}' produced no output", ctx.operation())).into()
        })
    }
}

/// Terminal of Initialize: creates the request builder and runs Serialize.
struct SerializeLink<'s, I, O, E: ServiceError> {
    stack: &'s OperationStack<I, O, E>,
    handler: &'s TerminalHandler<O, E>,
}

impl<I, O, E> Handler<I, OperationOutput<O>, E> for SerializeLink<'_, I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
{
    fn handle<'a>(&'a self, ctx: &'a mut Context, input: I) -> BoxFuture<'a, SdkResult<OperationOutput<O>, E>> {
        let builder = SdkHttpRequestBuilder::new()
            .with_method(ctx.method().clone())
            .with_path(ctx.path());
        let input = SerializeStepInput {
            operation_input: input,
            builder,
        };
        Box::pin(async move {
            let link = BuildLink {
                stack: self.stack,
                handler: self.handler,
            };
            self.stack.serialize.run(ctx, input, &link).await
        })
    }
}

/// Terminal of Serialize: drops the operation input and runs Build.
struct BuildLink<'s, I, O, E: ServiceError> {
    stack: &'s OperationStack<I, O, E>,
    handler: &'s TerminalHandler<O, E>,
}

impl<I, O, E> Handler<SerializeStepInput<I>, OperationOutput<O>, E> for BuildLink<'_, I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
{
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SerializeStepInput<I>,
    ) -> BoxFuture<'a, SdkResult<OperationOutput<O>, E>> {
        Box::pin(async move {
            let link = FinalizeLink {
                stack: self.stack,
                handler: self.handler,
            };
            self.stack.build.run(ctx, input.builder, &link).await
        })
    }
}

/// Terminal of Build: runs Finalize.
struct FinalizeLink<'s, I, O, E: ServiceError> {
    stack: &'s OperationStack<I, O, E>,
    handler: &'s TerminalHandler<O, E>,
}

impl<I, O, E> Handler<SdkHttpRequestBuilder, OperationOutput<O>, E> for FinalizeLink<'_, I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
{
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SdkHttpRequestBuilder,
    ) -> BoxFuture<'a, SdkResult<OperationOutput<O>, E>> {
        Box::pin(async move {
            let link = DeserializeLink {
                stack: self.stack,
                handler: self.handler,
            };
            self.stack.finalize.run(ctx, input, &link).await
        })
    }
}

/// Terminal of Finalize: freezes the request and runs Deserialize around the
/// transport handler.
struct DeserializeLink<'s, I, O, E: ServiceError> {
    stack: &'s OperationStack<I, O, E>,
    handler: &'s TerminalHandler<O, E>,
}

impl<I, O, E> Handler<SdkHttpRequestBuilder, OperationOutput<O>, E> for DeserializeLink<'_, I, O, E>
where
    I: Send + 'static,
    O: Send + 'static,
    E: ServiceError,
{
    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SdkHttpRequestBuilder,
    ) -> BoxFuture<'a, SdkResult<OperationOutput<O>, E>> {
        self.stack.deserialize.run(ctx, input.build(), self.handler)
    }
}
