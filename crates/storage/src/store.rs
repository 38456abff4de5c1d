//! The versioned record store contract
//!
//! Any engine that can read a record together with a version token and
//! apply a batch of writes only if a set of version checks still hold
//! satisfies [`Store`]. Two backends ship with this crate:
//!
//! | Backend | Versioning | Commit |
//! |---------|------------|--------|
//! | [`crate::KvStore`] | global versionstamp | one ordered map under one lock |
//! | [`crate::DocumentStore`] | per-document revision | striped locks, read-then-conditional-update |
//!
//! ## Contract
//!
//! - `get` returns the current bytes and a token capturing their version.
//! - `commit_batch` applies every write iff every check holds, otherwise
//!   nothing. A failed check is reported as [`CommitOutcome::Conflict`], not
//!   as an error: under contention it is the expected outcome.
//! - Once `close` is called every operation fails with `Error::Closed`.

use crate::transaction::{Transaction, WriteBatch};
use fable_core::{Key, KeyPrefix, Result, VersionToken};

/// A record as read from a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRecord {
    /// Stored bytes
    pub value: Vec<u8>,
    /// Version of those bytes
    pub version: VersionToken,
}

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every check held and every write was applied
    Committed,
    /// A check failed; no write was applied
    Conflict {
        /// First key whose check failed
        key: Key,
    },
}

impl CommitOutcome {
    /// Check if the commit was applied
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed)
    }
}

/// Key/value store with optimistic compare-and-swap commits
pub trait Store: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &'static str;

    /// Point read
    ///
    /// `None` means no record exists at `key`.
    fn get(&self, key: &Key) -> Result<Option<VersionedRecord>>;

    /// Every record under `prefix`, in key order
    fn scan_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<(Key, VersionedRecord)>>;

    /// Atomically validate checks and apply writes
    fn commit_batch(&self, batch: WriteBatch) -> Result<CommitOutcome>;

    /// Open a staging context bound to this store
    fn begin_transaction(&self) -> Transaction<'_>;

    /// Reject every later operation
    fn close(&self);

    /// Check if `close` was called
    fn is_closed(&self) -> bool;
}
