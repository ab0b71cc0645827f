//! Core types, errors, and configuration for the opstack client runtime.
//!
//! This crate provides the foundational building blocks shared by every other
//! opstack crate: the error taxonomy every operation resolves to, the small
//! value types threaded through the pipeline, and the client configuration
//! that seeds retry, transport, and logging behavior.

mod config;
mod error;
mod types;

pub use config::ClientConfig;
pub use error::{
    BoxError, ClientError, ErrorFault, RetryError, SdkError, SdkResult, ServiceError,
    UnknownServiceError,
};
pub use types::{ClientLogMode, FlowType, JitterMode, ParseEnumError, ResponseParts};
