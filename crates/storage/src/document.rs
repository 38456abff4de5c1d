//! Document-database backend
//!
//! Records are documents with their own revision counter, spread over a
//! fixed number of lock stripes chosen by key hash. A commit:
//!
//! 1. Collects the stripes every key of the batch lands on
//! 2. Locks them in ascending stripe order (no lock-order inversion between
//!    concurrent commits)
//! 3. Compares each checked document's revision with the expected token
//! 4. Writes every document, bumping its revision, or drops it on delete
//!
//! Unlike [`crate::KvStore`] there is no global version. Two documents
//! written by one commit carry unrelated revisions.
//!
//! `scan_prefix` visits stripes one at a time and is not a snapshot across
//! stripes.

use crate::store::{CommitOutcome, Store, VersionedRecord};
use crate::transaction::{Transaction, WriteBatch, WriteOp};
use fable_core::{Error, Key, KeyPrefix, Result, VersionToken};
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Default number of lock stripes
pub const DEFAULT_STRIPES: usize = 16;

#[derive(Debug, Clone)]
struct Document {
    bytes: Vec<u8>,
    revision: u64,
}

impl Document {
    fn record(&self) -> VersionedRecord {
        VersionedRecord {
            value: self.bytes.clone(),
            version: VersionToken::from_raw(self.revision),
        }
    }
}

type Stripe = FxHashMap<Key, Document>;

/// Striped document store with per-document revisions
#[derive(Debug)]
pub struct DocumentStore {
    stripes: Box<[Mutex<Stripe>]>,
    closed: AtomicBool,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create an empty store with [`DEFAULT_STRIPES`] stripes
    pub fn new() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }

    /// Create an empty store with `count` stripes (at least one)
    pub fn with_stripes(count: usize) -> Self {
        let stripes = (0..count.max(1))
            .map(|_| Mutex::new(Stripe::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            stripes,
            closed: AtomicBool::new(false),
        }
    }

    /// Number of lock stripes
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.stripes.iter().map(|s| s.lock().len()).sum()
    }

    /// Check if the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn stripe_of(&self, key: &Key) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.stripes.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

/// Locked stripes of one commit, sorted by stripe index
struct LockedStripes<'a> {
    guards: Vec<(usize, MutexGuard<'a, Stripe>)>,
}

impl<'a> LockedStripes<'a> {
    fn stripe_mut(&mut self, idx: usize) -> Result<&mut Stripe> {
        match self.guards.binary_search_by_key(&idx, |(i, _)| *i) {
            Ok(pos) => Ok(&mut self.guards[pos].1),
            Err(_) => Err(Error::Internal(format!("stripe {idx} was not locked"))),
        }
    }
}

impl Store for DocumentStore {
    fn name(&self) -> &'static str {
        "document"
    }

    fn get(&self, key: &Key) -> Result<Option<VersionedRecord>> {
        self.ensure_open()?;
        let stripe = self.stripes[self.stripe_of(key)].lock();
        Ok(stripe.get(key).map(Document::record))
    }

    fn scan_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<(Key, VersionedRecord)>> {
        self.ensure_open()?;
        let mut out = Vec::new();
        for stripe in self.stripes.iter() {
            let stripe = stripe.lock();
            out.extend(
                stripe
                    .iter()
                    .filter(|(k, _)| prefix.matches(k))
                    .map(|(k, d)| (k.clone(), d.record())),
            );
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn commit_batch(&self, batch: WriteBatch) -> Result<CommitOutcome> {
        self.ensure_open()?;

        let mut indices: Vec<usize> = batch.keys().map(|k| self.stripe_of(k)).collect();
        indices.sort_unstable();
        indices.dedup();

        let mut locked = LockedStripes {
            guards: indices
                .into_iter()
                .map(|i| (i, self.stripes[i].lock()))
                .collect(),
        };

        for check in &batch.checks {
            let idx = self.stripe_of(&check.key);
            let current = locked
                .stripe_mut(idx)?
                .get(&check.key)
                .map(|d| VersionToken::from_raw(d.revision));
            if current != check.expected {
                trace!(
                    target: "fable::store",
                    key = %check.key,
                    "document revision mismatch"
                );
                return Ok(CommitOutcome::Conflict {
                    key: check.key.clone(),
                });
            }
        }

        let count = batch.writes.len();
        for (key, op) in batch.writes {
            let idx = self.stripe_of(&key);
            let stripe = locked.stripe_mut(idx)?;
            match op {
                WriteOp::Put(bytes) => match stripe.get_mut(&key) {
                    Some(doc) => {
                        doc.bytes = bytes;
                        doc.revision += 1;
                    }
                    None => {
                        stripe.insert(key, Document { bytes, revision: 1 });
                    }
                },
                WriteOp::Delete => {
                    stripe.remove(&key);
                }
            }
        }

        trace!(target: "fable::store", writes = count, "document commit");
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
