//! Backoff delay computation.

use std::fmt;
use std::time::Duration;

use opstack_core::JitterMode;

/// Computes the delay before a retry.
///
/// `attempt` is the number of retries already made (0 for the first retry);
/// `previous` is the delay used before the last retry (zero initially).
pub trait BackoffStrategy: Send + Sync + fmt::Debug {
    /// The delay before the next retry.
    fn compute_delay(&self, attempt: u32, previous: Duration) -> Duration;
}

/// Exponential backoff `scale_factor * 2^attempt`, capped at `max_backoff`,
/// with configurable jitter.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    scale_factor: Duration,
    max_backoff: Duration,
    jitter: JitterMode,
    random: fn() -> f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(25), Duration::from_secs(20), JitterMode::Full)
    }
}

impl ExponentialBackoff {
    /// Create a backoff with the thread-local random source.
    #[must_use]
    pub fn new(scale_factor: Duration, max_backoff: Duration, jitter: JitterMode) -> Self {
        Self {
            scale_factor,
            max_backoff,
            jitter,
            random: unit_random,
        }
    }

    /// Replace the random source. It must return values in `[0, 1)`.
    #[must_use]
    pub fn with_random(mut self, random: fn() -> f64) -> Self {
        self.random = random;
        self
    }

    /// The uncapped-then-capped exponential delay for `attempt`.
    fn exponential(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.scale_factor
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn compute_delay(&self, attempt: u32, previous: Duration) -> Duration {
        let base = self.exponential(attempt);
        let r = (self.random)().clamp(0.0, 1.0);
        match self.jitter {
            JitterMode::None => base,
            JitterMode::Full => base.mul_f64(r),
            JitterMode::Decorrelated => {
                // Uniform in [scale, max(scale, previous * 3)].
                let low = self.scale_factor;
                let high = previous.saturating_mul(3).max(low);
                (low + (high - low).mul_f64(r)).min(self.max_backoff)
            }
        }
    }
}

/// A uniform random value in `[0, 1)`.
fn unit_random() -> f64 {
    rand::random::<f64>()
}
