//! Error taxonomy for operations executed through the opstack pipeline.
//!
//! Every operation resolves to either its typed output or an [`SdkError`]:
//!
//! - [`ClientError`]: a local failure (serialization, endpoint resolution,
//!   transport faults, timeouts).
//! - A modeled service error `E` implementing [`ServiceError`], parsed from the
//!   peer's error response.
//! - [`UnknownServiceError`]: the peer returned an error the deserializer could
//!   not match to any modeled type.
//! - [`RetryError`]: the retry budget refused to grant an attempt.

use std::fmt;
use std::time::Duration;

use crate::types::ResponseParts;

/// Boxed error used for opaque transport and stream failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience result type for a single operation.
pub type SdkResult<T, E> = Result<T, SdkError<E>>;

/// Local failures that never reached, or never came back from, the remote peer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The operation input could not be serialized into a request.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// The response body could not be deserialized into the operation output.
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),

    /// The transport failed to deliver the request or receive the response.
    #[error("network error: {0}")]
    Network(#[source] BoxError),

    /// A single transport attempt exceeded its timeout window.
    #[error("request attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint could not be resolved. This is a configuration defect and
    /// is never retried.
    #[error("endpoint resolution failed: {0}")]
    EndpointResolution(String),

    /// The signer rejected or failed to sign the request.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Data required to build the request or read the response was absent.
    #[error("data not found: {0}")]
    DataNotFound(String),

    /// A one-shot streaming body was read a second time.
    #[error("streaming body has already been consumed")]
    StreamConsumed,

    /// Any other local failure.
    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    /// Wrap any transport error as a [`ClientError::Network`].
    pub fn network(err: impl Into<BoxError>) -> Self {
        Self::Network(err.into())
    }

    /// Whether this error represents a transport fault that may succeed on a
    /// fresh attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// Whether this error represents an attempt timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Which side of the exchange a service error blames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorFault {
    /// The request was invalid.
    Client,
    /// The service failed to process a valid request.
    #[default]
    Server,
}

impl fmt::Display for ErrorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Server => f.write_str("server"),
        }
    }
}

/// A modeled error returned by the remote peer.
///
/// Generated operation error types implement this trait so the retry
/// subsystem can inspect them without knowing the concrete type.
pub trait ServiceError: std::error::Error + Send + Sync + 'static {
    /// The error code or modeled type name (e.g. `ThrottlingException`).
    fn type_name(&self) -> Option<&str>;

    /// The human-readable message carried by the error, if any.
    fn message(&self) -> Option<&str> {
        None
    }

    /// Which side of the exchange is at fault.
    fn fault(&self) -> ErrorFault {
        ErrorFault::Server
    }

    /// Whether the model marks this error as retryable.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Whether the model marks this error as a throttling error.
    fn is_throttling(&self) -> bool {
        false
    }
}

/// A service error the deserializer could not match to any modeled type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnknownServiceError {
    /// The error type name reported by the peer, if any.
    pub type_name: Option<String>,
    /// The error message reported by the peer, if any.
    pub message: Option<String>,
}

impl UnknownServiceError {
    /// Create an unknown service error from optional type name and message.
    #[must_use]
    pub fn new(type_name: Option<String>, message: Option<String>) -> Self {
        Self { type_name, message }
    }
}

impl fmt::Display for UnknownServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.type_name, &self.message) {
            (Some(t), Some(m)) => write!(f, "{t}: {m}"),
            (Some(t), None) => f.write_str(t),
            (None, Some(m)) => f.write_str(m),
            (None, None) => f.write_str("unknown service error"),
        }
    }
}

impl std::error::Error for UnknownServiceError {}

impl ServiceError for UnknownServiceError {
    fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Failures raised by the retry budget itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    /// The partition's shared capacity bucket cannot pay for another attempt.
    #[error("no retry capacity left in partition '{partition_id}'")]
    NoCapacity {
        /// The partition whose bucket is exhausted.
        partition_id: String,
    },

    /// The per-operation retry limit has been reached.
    #[error("maximum retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Total attempts made, including the first.
        attempts: u32,
    },
}

/// The error returned by an operation.
#[derive(Debug, thiserror::Error)]
pub enum SdkError<E: ServiceError> {
    /// A local failure.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A modeled service error.
    #[error("service error: {error}")]
    Service {
        /// The modeled error.
        #[source]
        error: E,
        /// Status and headers of the response carrying the error.
        response: ResponseParts,
    },

    /// An error response that matched no modeled type.
    #[error("unknown service error: {error}")]
    UnknownService {
        /// The minimal error description.
        #[source]
        error: UnknownServiceError,
        /// Status and headers of the response carrying the error.
        response: ResponseParts,
    },

    /// The retry budget refused to grant an attempt.
    #[error(transparent)]
    Retry(#[from] RetryError),
}

impl<E: ServiceError> SdkError<E> {
    /// The error code reported by the peer, for service errors.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { error, .. } => error.type_name(),
            Self::UnknownService { error, .. } => error.type_name(),
            Self::Client(_) | Self::Retry(_) => None,
        }
    }

    /// The response snapshot attached to service errors.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseParts> {
        match self {
            Self::Service { response, .. } | Self::UnknownService { response, .. } => {
                Some(response)
            }
            Self::Client(_) | Self::Retry(_) => None,
        }
    }

    /// The modeled service error, if this is one.
    #[must_use]
    pub fn as_service_error(&self) -> Option<&E> {
        match self {
            Self::Service { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The client error, if this is one.
    #[must_use]
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(err) => Some(err),
            _ => None,
        }
    }

    /// Consume the error, returning the modeled service error if present.
    pub fn into_service_error(self) -> Result<E, Self> {
        match self {
            Self::Service { error, .. } => Ok(error),
            other => Err(other),
        }
    }
}
