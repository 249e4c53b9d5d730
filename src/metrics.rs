//! In-process counters for observing classification and rehoming activity.
//!
//! Runtime classification failures never abort the node, so they must be
//! countable by operators. These are plain atomics; exporting them is up to
//! the embedding process.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter at zero.
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Increment the counter by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters for snitch and rehoming activity.
#[derive(Debug, Default)]
pub struct SnitchMetrics {
    /// Metadata service fetches that failed.
    pub metadata_failures: Counter,

    /// Peer zone strings that failed classification.
    pub malformed_zones: Counter,

    /// Peers switched from their public to their private address.
    pub peers_rehomed: Counter,

    /// Peers reverted from their private to their public address.
    pub peers_reverted: Counter,
}

impl SnitchMetrics {
    /// Create a fresh metrics set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            metadata_failures: self.metadata_failures.get(),
            malformed_zones: self.malformed_zones.get(),
            peers_rehomed: self.peers_rehomed.get(),
            peers_reverted: self.peers_reverted.get(),
        }
    }
}

/// Point-in-time snapshot of [`SnitchMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub metadata_failures: u64,
    pub malformed_zones: u64,
    pub peers_rehomed: u64,
    pub peers_reverted: u64,
}
