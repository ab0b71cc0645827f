//! Endpoint resolution for the opstack runtime.
//!
//! Endpoint metadata supplied for a call is merged field-by-field with the
//! service defaults ([`ServiceEndpointMetadata::resolve`]), yielding one
//! [`ResolvedEndpoint`]. Resolution is a pure function of its inputs, so it is
//! safe to repeat on every retry or to memoize.

mod error;
mod metadata;
mod resolver;
mod template;

pub use error::EndpointError;
pub use metadata::{
    CredentialScope, DEFAULT_PROTOCOL, DEFAULT_SIGNER, PROTOCOL_PRIORITY, ResolvedEndpoint,
    SIGNER_PRIORITY, ServiceEndpointMetadata,
};
pub use resolver::{DefaultEndpointResolver, EndpointParams, EndpointResolver};
pub use template::render_host_template;
