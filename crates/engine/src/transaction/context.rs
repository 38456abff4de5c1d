//! Multi-entity mutation context
//!
//! [`MutationContext`] is what [`crate::RetryDriver::run_many`] hands its
//! closure on every attempt. Reads record the version token of each entity;
//! writes stage the entity under its full index plan. On commit every read
//! token is checked, entities written or not, so a decision based on one
//! record cannot land after that record changed.
//!
//! ```text
//! driver.run_many(&user_key, |ctx| {
//!     let mut user: User = ctx.read(&user_key)?;
//!     let mut inventory: Inventory = ctx.read(&inventory_key)?;
//!     ...
//!     ctx.write(&user)?;
//!     ctx.write(&inventory)?;
//!     Ok(())
//! })?;
//! ```

use crate::index::{IndexMaintainer, IndexPlan, IndexUpdate};
use fable_core::{codec, Entity, Error, Key, Result, VersionToken};
use fable_storage::{CommitOutcome, Store};

struct ReadEntry {
    key: Key,
    token: VersionToken,
    plan: IndexPlan,
}

struct StagedWrite {
    update: IndexUpdate,
    bytes: Vec<u8>,
}

/// Reads and staged writes of one attempt
pub struct MutationContext<'s> {
    store: &'s dyn Store,
    reads: Vec<ReadEntry>,
    writes: Vec<StagedWrite>,
}

impl<'s> MutationContext<'s> {
    pub(crate) fn new(store: &'s dyn Store) -> Self {
        Self {
            store,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Read the entity stored at its primary key
    ///
    /// Reading a key twice returns the current record, but the attempt
    /// conflicts if it changed since the first read.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if nothing is stored at `key`.
    pub fn read<E: Entity>(&mut self, key: &Key) -> Result<E> {
        let record = self
            .store
            .get(key)?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;
        let entity: E = codec::decode(&record.value)?;

        match self.reads.iter().find(|r| r.key == *key) {
            Some(prev) if prev.token != record.version => {
                return Err(Error::Conflict { key: key.clone() });
            }
            Some(_) => {}
            None => self.reads.push(ReadEntry {
                key: key.clone(),
                token: record.version,
                plan: IndexMaintainer::plan(&entity),
            }),
        }
        Ok(entity)
    }

    /// Stage `entity` for the commit
    ///
    /// The entity must have been read in this attempt. Index entries its
    /// mutation moved are deleted. Writing the same entity again replaces
    /// the earlier staging.
    pub fn write<E: Entity>(&mut self, entity: &E) -> Result<()> {
        let plan = IndexMaintainer::plan(entity);
        let read = self
            .reads
            .iter()
            .find(|r| r.key == plan.primary)
            .ok_or_else(|| {
                Error::Internal(format!("{} written without being read", plan.primary))
            })?;
        let stale = plan.stale_from(&read.plan);
        let staged = StagedWrite {
            update: IndexUpdate { plan, stale },
            bytes: codec::encode(entity)?,
        };

        match self
            .writes
            .iter_mut()
            .find(|w| w.update.plan.primary == staged.update.plan.primary)
        {
            Some(existing) => *existing = staged,
            None => self.writes.push(staged),
        }
        Ok(())
    }

    /// Number of entities read
    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    /// Number of entities staged
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub(crate) fn commit(self) -> Result<CommitOutcome> {
        let mut txn = self.store.begin_transaction();
        for read in &self.reads {
            txn.check(read.key.clone(), Some(read.token));
        }
        for write in &self.writes {
            write.update.stage(&mut txn, &write.bytes);
        }
        txn.commit()
    }
}
