//! Bindings from a response to an operation output or error.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use opstack_core::{ClientError, SdkError, ServiceError, UnknownServiceError};
use opstack_http::HttpResponse;
use opstack_readwrite::{DocumentReadingClosure, ReadWriteError};
use tracing::debug;

/// Header naming the error type of an error response.
pub const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

type ResponseFn<T> = Arc<dyn Fn(&HttpResponse, &[u8]) -> Result<T, ReadWriteError> + Send + Sync>;

async fn body_bytes(response: &HttpResponse) -> Result<Bytes, ClientError> {
    Ok(response.body().read_data().await?.unwrap_or_default())
}

/// Decodes a successful response into the operation output.
pub struct ResponseBinding<O> {
    bind: ResponseFn<O>,
}

impl<O> Clone for ResponseBinding<O> {
    fn clone(&self) -> Self {
        Self {
            bind: Arc::clone(&self.bind),
        }
    }
}

impl<O> fmt::Debug for ResponseBinding<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBinding").finish_non_exhaustive()
    }
}

impl<O: 'static> ResponseBinding<O> {
    /// A binding reading both the response head and the collected body.
    pub fn new<F>(bind: F) -> Self
    where
        F: Fn(&HttpResponse, &[u8]) -> Result<O, ReadWriteError> + Send + Sync + 'static,
    {
        Self { bind: Arc::new(bind) }
    }

    /// A binding that decodes the body alone.
    #[must_use]
    pub fn from_document(reading: DocumentReadingClosure<O>) -> Self {
        Self::new(move |_, body| reading(body))
    }

    /// Collect the body and decode it.
    pub async fn bind(&self, response: &HttpResponse) -> Result<O, ClientError> {
        let body = body_bytes(response).await?;
        (self.bind)(response, &body).map_err(|e| ClientError::DeserializationFailed(e.to_string()))
    }
}

/// Outcome of matching an error response against the modeled errors.
#[derive(Debug)]
pub enum ErrorMatch<E> {
    /// The response is a modeled error.
    Modeled(E),
    /// The response matched no modeled error.
    Unknown(UnknownServiceError),
}

/// Decodes an error response into a service error.
pub struct ErrorBinding<E> {
    bind: ResponseFn<ErrorMatch<E>>,
}

impl<E> Clone for ErrorBinding<E> {
    fn clone(&self) -> Self {
        Self {
            bind: Arc::clone(&self.bind),
        }
    }
}

impl<E> fmt::Debug for ErrorBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBinding").finish_non_exhaustive()
    }
}

/// Error type named by the [`ERROR_TYPE_HEADER`], without any `:`-separated
/// suffix.
#[must_use]
pub fn error_type_from_header(response: &HttpResponse) -> Option<String> {
    response.header(ERROR_TYPE_HEADER).and_then(|value| {
        let name = value.split(':').next().unwrap_or_default().trim();
        (!name.is_empty()).then(|| name.to_owned())
    })
}

impl<E: ServiceError> ErrorBinding<E> {
    /// A binding over a matcher reading the response head and collected body.
    pub fn new<F>(bind: F) -> Self
    where
        F: Fn(&HttpResponse, &[u8]) -> Result<ErrorMatch<E>, ReadWriteError> + Send + Sync + 'static,
    {
        Self { bind: Arc::new(bind) }
    }

    /// A binding for operations without modeled errors. The error type comes
    /// from the [`ERROR_TYPE_HEADER`].
    #[must_use]
    pub fn unmodeled() -> Self {
        Self::new(|response, _| Ok(ErrorMatch::Unknown(UnknownServiceError::new(error_type_from_header(response), None))))
    }

    /// Turn an error response into the operation error.
    ///
    /// A body that cannot be parsed still yields an unknown service error so
    /// status-based retry classification applies to it.
    pub async fn bind(&self, response: &HttpResponse) -> SdkError<E> {
        let body = match body_bytes(response).await {
            Ok(body) => body,
            Err(err) => return err.into(),
        };
        let parts = response.parts();
        match (self.bind)(response, &body) {
            Ok(ErrorMatch::Modeled(error)) => SdkError::Service { error, response: parts },
            Ok(ErrorMatch::Unknown(error)) => SdkError::UnknownService { error, response: parts },
            Err(err) => {
                debug!(status = parts.status.as_u16(), error = %err, "unparseable error response");
                let error = UnknownServiceError::new(error_type_from_header(response), Some(err.to_string()));
                SdkError::UnknownService { error, response: parts }
            }
        }
    }
}
