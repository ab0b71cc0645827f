//! Per-partition retry capacity buckets.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

/// Retry capacity shared by every call to one partition.
///
/// Capacity starts full, is charged when a retry is scheduled, and refilled
/// (never above the maximum) when an attempt succeeds.
#[derive(Debug)]
pub struct TokenBucket {
    /// Current capacity.
    capacity: u32,

    /// Maximum capacity.
    max_capacity: u32,
}

impl TokenBucket {
    /// Create a full bucket.
    #[must_use]
    pub fn new(max_capacity: u32) -> Self {
        Self {
            capacity: max_capacity,
            max_capacity,
        }
    }

    /// Create a bucket with a given starting capacity.
    #[must_use]
    pub fn with_initial(max_capacity: u32, initial: u32) -> Self {
        Self {
            capacity: initial.min(max_capacity),
            max_capacity,
        }
    }

    /// Current capacity.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Maximum capacity.
    #[must_use]
    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    /// Whether the bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    /// Whether `cost` units are available.
    #[must_use]
    pub fn can_afford(&self, cost: u32) -> bool {
        self.capacity >= cost
    }

    /// Try to take `cost` units.
    ///
    /// Returns `true` if capacity was available and consumed, `false`
    /// otherwise (nothing is consumed).
    pub fn try_consume(&mut self, cost: u32) -> bool {
        if self.can_afford(cost) {
            self.capacity -= cost;
            true
        } else {
            false
        }
    }

    /// Return `amount` units, capped at the maximum.
    pub fn refill(&mut self, amount: u32) {
        self.capacity = self.capacity.saturating_add(amount).min(self.max_capacity);
    }
}

/// Lazily created buckets keyed by partition id.
#[derive(Debug)]
pub struct TokenBucketPool {
    buckets: DashMap<String, Arc<Mutex<TokenBucket>>>,
    initial_capacity: u32,
}

impl TokenBucketPool {
    /// Create a pool whose buckets start (and max out) at `initial_capacity`.
    #[must_use]
    pub fn new(initial_capacity: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            initial_capacity,
        }
    }

    /// The bucket for `partition_id`, created full on first use.
    #[must_use]
    pub fn bucket(&self, partition_id: &str) -> Arc<Mutex<TokenBucket>> {
        if let Some(bucket) = self.buckets.get(partition_id) {
            return Arc::clone(bucket.value());
        }
        Arc::clone(
            self.buckets
                .entry(partition_id.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::new(self.initial_capacity))))
                .value(),
        )
    }

    /// Current capacity of a partition, or the initial capacity if the
    /// partition has not been used yet.
    #[must_use]
    pub fn capacity(&self, partition_id: &str) -> u32 {
        self.buckets
            .get(partition_id)
            .map_or(self.initial_capacity, |bucket| bucket.lock().capacity())
    }

    /// Number of partitions with a bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no partition has a bucket yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
