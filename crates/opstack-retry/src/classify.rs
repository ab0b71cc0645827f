//! Error classification for retry decisions.

use std::time::Duration;

use http::{HeaderMap, StatusCode};
use opstack_core::{ClientError, ErrorFault, ResponseParts, SdkError, ServiceError};

/// Error codes that always classify as throttling.
pub const THROTTLING_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "TransactionInProgressException",
    "RequestLimitExceeded",
    "BandwidthLimitExceeded",
    "LimitExceededException",
    "RequestThrottled",
    "SlowDown",
    "PriorRequestNotComplete",
    "EC2ThrottledException",
];

/// Error codes that always classify as transient.
pub const TRANSIENT_ERROR_CODES: &[&str] = &["RequestTimeout", "InternalError", "RequestTimeoutException"];

/// Status codes retried as server errors.
pub const TRANSIENT_STATUS_CODES: &[StatusCode] = &[
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Response headers carrying a retry delay hint in (possibly fractional) seconds.
pub const RETRY_AFTER_HEADERS: &[&str] = &["x-retry-after", "x-amz-retry-after"];

/// Retry category of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryErrorType {
    /// A connection-level fault or timeout.
    Transient,
    /// The service asked the caller to slow down.
    Throttling,
    /// The service failed to process a valid request.
    ServerError,
    /// The request was rejected as invalid but marked retryable.
    ClientError,
}

/// How, and whether, to retry an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryErrorInfo {
    /// Retry category.
    pub error_type: RetryErrorType,
    /// Delay requested by the service, overriding computed backoff.
    pub retry_after_hint: Option<Duration>,
    /// Whether the attempt timed out.
    pub is_timeout: bool,
}

impl RetryErrorInfo {
    /// Info without hint or timeout flag.
    #[must_use]
    pub fn new(error_type: RetryErrorType) -> Self {
        Self {
            error_type,
            retry_after_hint: None,
            is_timeout: false,
        }
    }
}

/// Classifies operation errors for the retry middleware.
pub trait RetryErrorInfoProvider: Send + Sync + std::fmt::Debug {
    /// Retry info for `error`, or `None` when it must not be retried.
    fn error_info<E: ServiceError>(&self, error: &SdkError<E>) -> Option<RetryErrorInfo>;
}

/// The standard classifier.
///
/// For service errors the checks run in this order; the first match wins:
///
/// 1. The error code is in [`THROTTLING_ERROR_CODES`] or [`TRANSIENT_ERROR_CODES`].
/// 2. For modeled errors: a retryable error classifies as throttling or by its
///    fault side. A non-retryable one is retried only when a retry-after
///    header is present.
/// 3. For unmodeled errors: the status code is in [`TRANSIENT_STATUS_CODES`]
///    or a retry-after header is present (classified as a server error).
///
/// Any retry-after header is attached as the hint. Network faults and
/// timeouts are transient; every other client error, including endpoint
/// resolution failures, is never retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryErrorInfoProvider;

impl RetryErrorInfoProvider for DefaultRetryErrorInfoProvider {
    fn error_info<E: ServiceError>(&self, error: &SdkError<E>) -> Option<RetryErrorInfo> {
        match error {
            SdkError::Client(err) => classify_client_error(err),
            SdkError::Service { error, response } => classify_response(error.type_name(), Some(error), response),
            SdkError::UnknownService { error, response } => {
                classify_response::<E>(error.type_name.as_deref(), None, response)
            }
            SdkError::Retry(_) => None,
        }
    }
}

fn classify_client_error(err: &ClientError) -> Option<RetryErrorInfo> {
    match err {
        ClientError::Network(_) => Some(RetryErrorInfo::new(RetryErrorType::Transient)),
        ClientError::Timeout(_) => Some(RetryErrorInfo {
            is_timeout: true,
            ..RetryErrorInfo::new(RetryErrorType::Transient)
        }),
        _ => None,
    }
}

fn classify_response<E: ServiceError>(
    code: Option<&str>,
    modeled: Option<&E>,
    response: &ResponseParts,
) -> Option<RetryErrorInfo> {
    let hint = retry_after_hint(&response.headers);
    let has_hint_header = RETRY_AFTER_HEADERS
        .iter()
        .any(|name| response.headers.contains_key(*name));

    let error_type = if let Some(error_type) = code.and_then(error_type_for_code) {
        error_type
    } else if let Some(modeled) = modeled {
        if modeled.is_retryable() {
            modeled_error_type(modeled)
        } else if has_hint_header {
            RetryErrorType::ServerError
        } else {
            return None;
        }
    } else if TRANSIENT_STATUS_CODES.contains(&response.status) || has_hint_header {
        RetryErrorType::ServerError
    } else {
        return None;
    };

    Some(RetryErrorInfo {
        error_type,
        retry_after_hint: hint,
        is_timeout: false,
    })
}

fn error_type_for_code(code: &str) -> Option<RetryErrorType> {
    if THROTTLING_ERROR_CODES.iter().any(|c| *c == code) {
        Some(RetryErrorType::Throttling)
    } else if TRANSIENT_ERROR_CODES.iter().any(|c| *c == code) {
        Some(RetryErrorType::Transient)
    } else {
        None
    }
}

fn modeled_error_type<E: ServiceError>(error: &E) -> RetryErrorType {
    if error.is_throttling() {
        return RetryErrorType::Throttling;
    }
    match error.fault() {
        ErrorFault::Client => RetryErrorType::ClientError,
        ErrorFault::Server => RetryErrorType::ServerError,
    }
}

/// Parse the first valid retry-after header as fractional seconds.
fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    RETRY_AFTER_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        let secs: f64 = value.trim().parse().ok()?;
        Duration::try_from_secs_f64(secs).ok()
    })
}
