//! HTTP message types and transport capabilities for the opstack runtime.
//!
//! This crate provides:
//!
//! - [`SdkHttpRequest`] and its mutable [`SdkHttpRequestBuilder`] form, which the
//!   middleware pipeline threads through its build and finalize phases.
//! - [`ByteStream`], the buffered-or-streaming body model.
//! - [`HttpResponse`], an observable response handle whose status code may be
//!   provisional before it becomes final.
//! - The [`HttpClientEngine`] and [`Signer`] capabilities, injected by callers,
//!   and [`SdkHttpClient`], which applies per-attempt timeouts around an engine.

mod auth;
mod body;
mod client;
mod endpoint;
mod request;
mod response;

pub use auth::{AuthScheme, NoAuthSigner, Signer, SigningParams};
pub use body::ByteStream;
pub use client::{HttpClientConfiguration, HttpClientEngine, SdkHttpClient};
pub use endpoint::{Endpoint, ProtocolType};
pub use request::{QueryItem, SdkHttpRequest, SdkHttpRequestBuilder};
pub use response::HttpResponse;
