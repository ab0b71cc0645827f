//! Operation context, phased middleware, and built-in middleware for the
//! opstack runtime.
//!
//! An operation runs through an [`OperationStack`] of five [`Step`]s:
//!
//! | Step | Value | Built-in middleware |
//! |------|-------|---------------------|
//! | Initialize | operation input | [`stages::UrlPathMiddleware`], [`stages::IdempotencyTokenMiddleware`] |
//! | Serialize | input + request builder | [`stages::BodyMiddleware`], [`stages::HeaderMiddleware`], [`stages::QueryItemMiddleware`] |
//! | Build | request builder | [`stages::EndpointResolverMiddleware`], [`stages::ContentMd5Middleware`] |
//! | Finalize | request builder | [`stages::RetryMiddleware`], [`stages::ContentLengthMiddleware`], [`stages::SignerMiddleware`] |
//! | Deserialize | request | [`stages::LoggerMiddleware`], [`stages::DeserializeMiddleware`] |
//!
//! The stack bottoms out in a transport [`Handler`], normally an
//! [`HttpClientHandler`]. Every step shares one mutable [`Context`].

mod binding;
mod context;
mod error;
mod handler;
mod middleware;
mod stack;
pub mod stages;
mod step;

pub use binding::{ERROR_TYPE_HEADER, ErrorBinding, ErrorMatch, ResponseBinding, error_type_from_header};
pub use context::{Context, IdempotencyTokenGenerator, UuidIdempotencyTokenGenerator};
pub use error::StackError;
pub use handler::HttpClientHandler;
pub use middleware::{FnHandler, FnMiddleware, Handler, Middleware, Next};
pub use stack::{OperationOutput, OperationStack, SerializeStepInput, TerminalHandler};
pub use step::{Position, Step};
