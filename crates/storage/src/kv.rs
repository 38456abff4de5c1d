//! Ordered key/value backend
//!
//! All records live in one `BTreeMap` behind a single `RwLock`. Every
//! successful commit bumps a store-wide versionstamp and stamps each written
//! record with it, so a record's version is the commit that last touched it. A
//! staged delete removes the record outright.
//!
//! Readers never block each other. A commit holds the write lock for the
//! duration of validation and apply, which is what makes the check-and-set
//! atomic.

use crate::store::{CommitOutcome, Store, VersionedRecord};
use crate::transaction::{Transaction, WriteBatch, WriteOp};
use fable_core::{Error, Key, KeyPrefix, Result, VersionToken};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

#[derive(Debug, Default)]
struct KvState {
    records: BTreeMap<Key, VersionedRecord>,
    versionstamp: u64,
}

/// In-memory ordered store with a global versionstamp
#[derive(Debug, Default)]
pub struct KvStore {
    state: RwLock<KvState>,
    closed: AtomicBool,
}

impl KvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Versionstamp of the last successful commit
    pub fn versionstamp(&self) -> u64 {
        self.state.read().versionstamp
    }

    /// Number of stored records, primary and index
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

impl Store for KvStore {
    fn name(&self) -> &'static str {
        "kv"
    }

    fn get(&self, key: &Key) -> Result<Option<VersionedRecord>> {
        self.ensure_open()?;
        Ok(self.state.read().records.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<(Key, VersionedRecord)>> {
        self.ensure_open()?;
        let state = self.state.read();
        Ok(state
            .records
            .range(prefix.lower_bound()..)
            .take_while(|(k, _)| prefix.matches(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit_batch(&self, batch: WriteBatch) -> Result<CommitOutcome> {
        self.ensure_open()?;
        let mut state = self.state.write();

        for check in &batch.checks {
            let current = state.records.get(&check.key).map(|r| r.version);
            if current != check.expected {
                trace!(
                    target: "fable::store",
                    key = %check.key,
                    "kv check failed"
                );
                return Ok(CommitOutcome::Conflict {
                    key: check.key.clone(),
                });
            }
        }

        if batch.writes.is_empty() {
            return Ok(CommitOutcome::Committed);
        }

        state.versionstamp += 1;
        let version = VersionToken::from_raw(state.versionstamp);
        let count = batch.writes.len();
        for (key, op) in batch.writes {
            match op {
                WriteOp::Put(value) => {
                    state.records.insert(key, VersionedRecord { value, version });
                }
                WriteOp::Delete => {
                    state.records.remove(&key);
                }
            }
        }

        trace!(
            target: "fable::store",
            versionstamp = state.versionstamp,
            writes = count,
            "kv commit"
        );
        Ok(CommitOutcome::Committed)
    }

    fn begin_transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fable_core::EntityKind;

    fn key(id: &str) -> Key {
        Key::primary(EntityKind::User, "global", id)
    }

    #[test]
    fn test_versionstamp_advances_once_per_commit() {
        let store = KvStore::new();
        let mut txn = store.begin_transaction();
        txn.set(key("a"), vec![1]).set(key("b"), vec![2]);
        assert!(txn.commit().unwrap().is_committed());

        assert_eq!(store.versionstamp(), 1);
        let a = store.get(&key("a")).unwrap().unwrap();
        let b = store.get(&key("b")).unwrap().unwrap();
        assert_eq!(a.version, b.version);
    }

    #[test]
    fn test_failed_check_leaves_versionstamp() {
        let store = KvStore::new();
        let mut txn = store.begin_transaction();
        txn.check(key("a"), Some(VersionToken::from_raw(9)))
            .set(key("a"), vec![1]);
        let outcome = txn.commit().unwrap();

        assert_eq!(outcome, CommitOutcome::Conflict { key: key("a") });
        assert_eq!(store.versionstamp(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_check_only_batch_commits_without_stamping() {
        let store = KvStore::new();
        let mut txn = store.begin_transaction();
        txn.check(key("a"), None);
        assert!(txn.commit().unwrap().is_committed());
        assert_eq!(store.versionstamp(), 0);
    }

    #[test]
    fn test_closed_store_rejects_reads() {
        let store = KvStore::new();
        store.close();
        assert!(store.is_closed());
        assert!(matches!(store.get(&key("a")), Err(Error::Closed)));
    }
}
