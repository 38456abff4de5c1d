//! Driver metrics
//!
//! Counters are updated with Relaxed ordering. They are observational only
//! and never used to synchronize anything.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live driver counters, owned by the database
#[derive(Debug, Default)]
pub struct DriverMetrics {
    attempts: AtomicU64,
    committed: AtomicU64,
    unchanged: AtomicU64,
    conflicts: AtomicU64,
    rejected: AtomicU64,
    exhausted: AtomicU64,
}

impl DriverMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unchanged(&self) {
        self.unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhaustion(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> TransactionMetrics {
        TransactionMetrics {
            attempts: self.attempts.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Transaction metrics
///
/// Provides statistics about mutation attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionMetrics {
    /// Attempts started (every read of a mutation loop)
    pub attempts: u64,
    /// Mutations that committed a write
    pub committed: u64,
    /// Mutations that resolved without writing
    pub unchanged: u64,
    /// Attempts that lost a version race
    pub conflicts: u64,
    /// Mutations rejected by a domain rule or a missing entity
    pub rejected: u64,
    /// Mutations that ran out of attempts
    pub exhausted: u64,
}

impl TransactionMetrics {
    /// Mutations that reached a final outcome
    pub fn total_completed(&self) -> u64 {
        self.committed + self.unchanged + self.rejected + self.exhausted
    }

    /// Conflict rate (conflicts / attempts)
    pub fn conflict_rate(&self) -> f64 {
        if self.attempts > 0 {
            self.conflicts as f64 / self.attempts as f64
        } else {
            0.0
        }
    }
}
