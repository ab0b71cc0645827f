//! Token-based retry strategy.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opstack_core::{ClientConfig, RetryError};
use parking_lot::Mutex;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::backoff::{BackoffStrategy, ExponentialBackoff};
use crate::bucket::{TokenBucket, TokenBucketPool};
use crate::classify::{RetryErrorInfo, RetryErrorType};

/// Capacity charged for retrying a transient failure or timeout.
const TIMEOUT_RETRY_COST: u32 = 10;

/// Capacity charged for retrying any other failure.
const RETRY_COST: u32 = 5;

/// Capacity returned after a success that needed no retry.
const NO_RETRY_INCREMENT: u32 = 1;

/// Permission to make an attempt, bound to a partition's bucket.
#[derive(Debug)]
pub struct RetryToken {
    partition_id: String,
    bucket: Arc<Mutex<TokenBucket>>,
    retry_count: u32,
    last_cost: Option<u32>,
    last_delay: Duration,
}

impl RetryToken {
    /// The partition this token draws from.
    #[must_use]
    pub fn partition_id(&self) -> &str {
        &self.partition_id
    }

    /// Retries already made with this token's lineage.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Delay waited before the attempt this token grants.
    #[must_use]
    pub fn last_delay(&self) -> Duration {
        self.last_delay
    }
}

/// Decides whether and when an operation is retried.
///
/// Lifecycle per operation: [`acquire_token`](Self::acquire_token) once, then
/// after every failure either [`schedule_retry`](Self::schedule_retry) (which
/// waits out the backoff and yields the next token) or give up; after a
/// success, [`record_success`](Self::record_success) exactly once.
#[async_trait]
pub trait RetryStrategy: Send + Sync + fmt::Debug {
    /// Maximum retries per operation, excluding the first attempt.
    fn max_retries(&self) -> u32;

    /// Obtain the token for the first attempt.
    async fn acquire_token(&self, partition_id: &str) -> Result<RetryToken, RetryError>;

    /// Charge the bucket for a retry, wait out the delay, and return the token
    /// for the next attempt.
    ///
    /// Dropping the returned future during the wait abandons the retry.
    async fn schedule_retry(&self, token: RetryToken, info: RetryErrorInfo) -> Result<RetryToken, RetryError>;

    /// Replenish capacity after a successful attempt.
    fn record_success(&self, token: RetryToken);
}

/// Retry settings derived from [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct RetryStrategyOptions {
    /// Maximum retries per operation.
    #[builder(default = 3)]
    pub max_retries: u32,

    /// Starting (and maximum) capacity of each partition bucket.
    #[builder(default = 500)]
    pub initial_bucket_capacity: u32,

    /// Base backoff delay.
    #[builder(default = Duration::from_millis(25))]
    pub backoff_scale_factor: Duration,

    /// Maximum backoff delay.
    #[builder(default = Duration::from_secs(20))]
    pub max_backoff: Duration,

    /// Jitter mode.
    #[builder(default)]
    pub jitter_mode: opstack_core::JitterMode,
}

impl Default for RetryStrategyOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryStrategyOptions {
    /// Derive retry settings from a client configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_bucket_capacity: config.initial_bucket_capacity,
            backoff_scale_factor: config.backoff_scale_factor,
            max_backoff: config.max_backoff,
            jitter_mode: config.jitter_mode,
        }
    }
}

/// The standard strategy: per-partition token buckets plus a pluggable
/// backoff (exponential with jitter by default).
#[derive(Debug)]
pub struct DefaultRetryStrategy {
    options: RetryStrategyOptions,
    pool: TokenBucketPool,
    backoff: Box<dyn BackoffStrategy>,
}

impl DefaultRetryStrategy {
    /// Create a strategy with exponential backoff built from `options`.
    #[must_use]
    pub fn new(options: RetryStrategyOptions) -> Self {
        let backoff = ExponentialBackoff::new(options.backoff_scale_factor, options.max_backoff, options.jitter_mode);
        Self::with_backoff(options, backoff)
    }

    /// Create a strategy with a custom backoff.
    pub fn with_backoff(options: RetryStrategyOptions, backoff: impl BackoffStrategy + 'static) -> Self {
        Self {
            pool: TokenBucketPool::new(options.initial_bucket_capacity),
            options,
            backoff: Box::new(backoff),
        }
    }

    /// The options.
    #[must_use]
    pub fn options(&self) -> &RetryStrategyOptions {
        &self.options
    }

    /// The bucket pool, for inspecting partition capacity.
    #[must_use]
    pub fn pool(&self) -> &TokenBucketPool {
        &self.pool
    }
}

fn retry_cost(info: &RetryErrorInfo) -> u32 {
    if info.is_timeout || info.error_type == RetryErrorType::Transient {
        TIMEOUT_RETRY_COST
    } else {
        RETRY_COST
    }
}

#[async_trait]
impl RetryStrategy for DefaultRetryStrategy {
    fn max_retries(&self) -> u32 {
        self.options.max_retries
    }

    async fn acquire_token(&self, partition_id: &str) -> Result<RetryToken, RetryError> {
        let bucket = self.pool.bucket(partition_id);
        // A bucket that cannot pay the cheapest retry is exhausted.
        if !bucket.lock().can_afford(RETRY_COST) {
            warn!(partition_id, "retry bucket is exhausted");
            return Err(RetryError::NoCapacity {
                partition_id: partition_id.to_owned(),
            });
        }
        Ok(RetryToken {
            partition_id: partition_id.to_owned(),
            bucket,
            retry_count: 0,
            last_cost: None,
            last_delay: Duration::ZERO,
        })
    }

    async fn schedule_retry(&self, token: RetryToken, info: RetryErrorInfo) -> Result<RetryToken, RetryError> {
        if token.retry_count >= self.options.max_retries {
            return Err(RetryError::MaxRetriesExceeded {
                attempts: token.retry_count.saturating_add(1),
            });
        }

        let cost = retry_cost(&info);
        let remaining = {
            let mut bucket = token.bucket.lock();
            if !bucket.try_consume(cost) {
                return Err(RetryError::NoCapacity {
                    partition_id: token.partition_id,
                });
            }
            bucket.capacity()
        };

        let delay = info
            .retry_after_hint
            .unwrap_or_else(|| self.backoff.compute_delay(token.retry_count, token.last_delay));
        debug!(
            partition_id = %token.partition_id,
            retry = token.retry_count.saturating_add(1),
            error_type = ?info.error_type,
            cost,
            remaining,
            ?delay,
            "scheduling retry"
        );
        tokio::time::sleep(delay).await;

        Ok(RetryToken {
            retry_count: token.retry_count.saturating_add(1),
            last_cost: Some(cost),
            last_delay: delay,
            ..token
        })
    }

    fn record_success(&self, token: RetryToken) {
        let mut bucket = token.bucket.lock();
        bucket.refill(token.last_cost.unwrap_or(NO_RETRY_INCREMENT));
        debug!(partition_id = %token.partition_id, capacity = bucket.capacity(), "recorded success");
    }
}
