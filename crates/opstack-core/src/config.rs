//! Client configuration.
//!
//! Provides [`ClientConfig`], the single configuration value a client is
//! created from. Retry, transport, and per-operation settings are derived
//! from it by the crates that own those concerns.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::types::{ClientLogMode, JitterMode};

/// Client configuration shared by every operation a client executes.
///
/// # Examples
///
/// ```
/// use opstack_core::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.max_retries, 3);
/// assert_eq!(config.initial_bucket_capacity, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Region the client talks to.
    #[builder(default, setter(strip_option, into))]
    pub region: Option<String>,

    /// Explicit endpoint URL overriding endpoint resolution.
    #[builder(default, setter(strip_option, into))]
    pub endpoint: Option<String>,

    /// Partition over which retry capacity is shared. Falls back to the
    /// resolved host when unset.
    #[builder(default, setter(strip_option, into))]
    pub partition_id: Option<String>,

    /// Maximum retries per operation, excluding the first attempt.
    #[builder(default = 3)]
    pub max_retries: u32,

    /// Starting (and maximum) capacity of each partition's retry bucket.
    #[builder(default = 500)]
    pub initial_bucket_capacity: u32,

    /// Base delay multiplied by `2^attempt` when backing off.
    #[builder(default = Duration::from_millis(25))]
    pub backoff_scale_factor: Duration,

    /// Upper bound on any single backoff delay.
    #[builder(default = Duration::from_secs(20))]
    pub max_backoff: Duration,

    /// Jitter applied to backoff delays.
    #[builder(default)]
    pub jitter_mode: JitterMode,

    /// Timeout for a single transport attempt. `None` disables it.
    #[builder(default, setter(strip_option))]
    pub socket_timeout: Option<Duration>,

    /// What the logger middleware records.
    #[builder(default)]
    pub log_mode: ClientLogMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            partition_id: None,
            max_retries: 3,
            initial_bucket_capacity: 500,
            backoff_scale_factor: Duration::from_millis(25),
            max_backoff: Duration::from_secs(20),
            jitter_mode: JitterMode::Full,
            socket_timeout: None,
            log_mode: ClientLogMode::None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults,
    /// and ignoring values that fail to parse):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `REGION` | unset |
    /// | `ENDPOINT_URL` | unset |
    /// | `PARTITION_ID` | unset |
    /// | `MAX_RETRIES` | `3` |
    /// | `RETRY_INITIAL_BUCKET_CAPACITY` | `500` |
    /// | `RETRY_BACKOFF_SCALE_MS` | `25` |
    /// | `RETRY_MAX_BACKOFF_MS` | `20000` |
    /// | `RETRY_JITTER_MODE` | `full` |
    /// | `SOCKET_TIMEOUT_MS` | unset |
    /// | `CLIENT_LOG_MODE` | `none` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("REGION") {
            config.region = Some(v);
        }
        if let Some(v) = lookup("ENDPOINT_URL") {
            config.endpoint = Some(v);
        }
        if let Some(v) = lookup("PARTITION_ID") {
            config.partition_id = Some(v);
        }
        if let Some(n) = lookup("MAX_RETRIES").and_then(|v| v.parse().ok()) {
            config.max_retries = n;
        }
        if let Some(n) = lookup("RETRY_INITIAL_BUCKET_CAPACITY").and_then(|v| v.parse().ok()) {
            config.initial_bucket_capacity = n;
        }
        if let Some(ms) = lookup("RETRY_BACKOFF_SCALE_MS").and_then(|v| v.parse().ok()) {
            config.backoff_scale_factor = Duration::from_millis(ms);
        }
        if let Some(ms) = lookup("RETRY_MAX_BACKOFF_MS").and_then(|v| v.parse().ok()) {
            config.max_backoff = Duration::from_millis(ms);
        }
        if let Some(mode) = lookup("RETRY_JITTER_MODE").and_then(|v| v.parse().ok()) {
            config.jitter_mode = mode;
        }
        if let Some(ms) = lookup("SOCKET_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            config.socket_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(mode) = lookup("CLIENT_LOG_MODE").and_then(|v| v.parse().ok()) {
            config.log_mode = mode;
        }

        config
    }
}
