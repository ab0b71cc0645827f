//! Endpoint resolution errors.

use opstack_core::ClientError;

/// Errors raised while resolving an endpoint. All of them are configuration
/// defects and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// Neither the call metadata nor the defaults provide a host name.
    #[error("endpoint hostname is missing from both call and default metadata")]
    HostnameMissing,

    /// A host template references a variable with no value.
    #[error("host template variable '{0}' has no value")]
    UnresolvedVariable(String),

    /// A host template is malformed.
    #[error("malformed host template '{0}'")]
    MalformedTemplate(String),

    /// An explicit endpoint URL could not be parsed.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

impl From<EndpointError> for ClientError {
    fn from(err: EndpointError) -> Self {
        Self::EndpointResolution(err.to_string())
    }
}
