//! Staging context for compare-and-swap commits
//!
//! A [`Transaction`] collects version checks, writes and deletes, then hands
//! them to its store as one [`WriteBatch`]. Nothing is visible until commit,
//! and a dropped transaction has no effect.
//!
//! ```text
//! let mut txn = store.begin_transaction();
//! txn.check(primary.clone(), Some(token))
//!     .set(primary, bytes.clone())
//!     .set(index, bytes);
//! match txn.commit()? {
//!     CommitOutcome::Committed => ...,
//!     CommitOutcome::Conflict { key } => ...,
//! }
//! ```

use crate::store::{CommitOutcome, Store};
use fable_core::{Key, Result, VersionToken};

/// A commit precondition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Key to validate
    pub key: Key,
    /// Version the key must still have; `None` means it must not exist
    pub expected: Option<VersionToken>,
}

/// A staged change to one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create or overwrite with these bytes
    Put(Vec<u8>),
    /// Remove the key; deleting an absent key is a no-op
    Delete,
}

/// Checks and writes applied together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    /// Preconditions, validated before any write
    pub checks: Vec<Check>,
    /// Writes in staging order; a later write to the same key wins
    pub writes: Vec<(Key, WriteOp)>,
}

impl WriteBatch {
    /// Check if the batch has no writes
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Every key the batch touches, checks first
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.checks
            .iter()
            .map(|c| &c.key)
            .chain(self.writes.iter().map(|(k, _)| k))
    }
}

/// Staging context bound to one store
pub struct Transaction<'s> {
    store: &'s dyn Store,
    batch: WriteBatch,
}

impl<'s> Transaction<'s> {
    /// Open an empty transaction against `store`
    pub fn new(store: &'s dyn Store) -> Self {
        Self {
            store,
            batch: WriteBatch::default(),
        }
    }

    /// Require `key` to still be at `expected` when committing
    pub fn check(&mut self, key: Key, expected: Option<VersionToken>) -> &mut Self {
        self.batch.checks.push(Check { key, expected });
        self
    }

    /// Stage a create-or-overwrite
    pub fn set(&mut self, key: Key, value: Vec<u8>) -> &mut Self {
        self.batch.writes.push((key, WriteOp::Put(value)));
        self
    }

    /// Stage a removal
    pub fn delete(&mut self, key: Key) -> &mut Self {
        self.batch.writes.push((key, WriteOp::Delete));
        self
    }

    /// Number of staged writes, deletes included
    pub fn write_count(&self) -> usize {
        self.batch.writes.len()
    }

    /// Apply all staged writes iff all checks hold
    pub fn commit(self) -> Result<CommitOutcome> {
        self.store.commit_batch(self.batch)
    }

    /// Take the staged batch without committing
    pub fn into_batch(self) -> WriteBatch {
        self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KvStore;
    use fable_core::EntityKind;

    #[test]
    fn test_staging_order_is_preserved() {
        let store = KvStore::new();
        let a = Key::primary(EntityKind::User, "global", "a");
        let b = Key::primary(EntityKind::User, "global", "b");

        let mut txn = store.begin_transaction();
        txn.check(a.clone(), None)
            .set(a.clone(), vec![1])
            .set(b.clone(), vec![2]);
        assert_eq!(txn.write_count(), 2);

        let batch = txn.into_batch();
        let keys: Vec<_> = batch.keys().cloned().collect();
        assert_eq!(keys, vec![a.clone(), a, b]);
    }

    #[test]
    fn test_dropped_transaction_has_no_effect() {
        let store = KvStore::new();
        let key = Key::primary(EntityKind::User, "global", "a");
        {
            let mut txn = store.begin_transaction();
            txn.set(key.clone(), vec![1]);
        }
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_delete_is_staged_as_a_write() {
        let store = KvStore::new();
        let a = Key::primary(EntityKind::User, "global", "a");

        let mut txn = store.begin_transaction();
        txn.set(a.clone(), vec![1]).delete(a.clone());
        assert_eq!(txn.write_count(), 2);

        let batch = txn.into_batch();
        assert_eq!(batch.writes[1], (a, WriteOp::Delete));
    }
}
