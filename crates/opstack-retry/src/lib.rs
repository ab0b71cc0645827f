//! Retry subsystem for the opstack runtime.
//!
//! Three pieces cooperate to decide whether and when a failed attempt is
//! retried:
//!
//! - [`DefaultRetryErrorInfoProvider`] classifies an error into a
//!   [`RetryErrorType`] (or "do not retry") and extracts any retry-after hint.
//! - [`TokenBucketPool`] holds one shared capacity bucket per partition, so
//!   retry storms across concurrent calls to one destination are throttled
//!   together.
//! - [`DefaultRetryStrategy`] hands out [`RetryToken`]s, charges the bucket on
//!   each scheduled retry, waits out the backoff, and refunds on success.

mod backoff;
mod bucket;
mod classify;
mod strategy;

pub use backoff::{BackoffStrategy, ExponentialBackoff};
pub use bucket::{TokenBucket, TokenBucketPool};
pub use classify::{
    DefaultRetryErrorInfoProvider, RETRY_AFTER_HEADERS, RetryErrorInfo, RetryErrorInfoProvider,
    RetryErrorType, THROTTLING_ERROR_CODES, TRANSIENT_ERROR_CODES, TRANSIENT_STATUS_CODES,
};
pub use strategy::{DefaultRetryStrategy, RetryStrategy, RetryStrategyOptions, RetryToken};
