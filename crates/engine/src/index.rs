//! Secondary index maintenance
//!
//! Every entity is stored once under its primary key and once more under
//! each secondary index it declares, each copy holding the same bytes. The
//! [`IndexPlan`] of an entity is the full list of keys a write must touch,
//! derived from the entity's state alone:
//!
//! ```text
//! characters/g1/pack:alice                      <- primary
//! characters#by_inventory/g1:u1/pack:alice      <- secondaries, in
//! characters#by_media/g1:pack:show/pack:alice      declaration order
//! ```
//!
//! Plans are always computed from the post-mutation entity. When a mutation
//! changes an indexed field, such as a character's owner, the secondaries of
//! the pre-mutation state that the new plan no longer has are deleted in the
//! same commit ([`IndexUpdate`]). The primary key never moves: a mutation
//! that changes scope or id is refused.

use fable_core::{Entity, Key};
use fable_storage::Transaction;
use smallvec::SmallVec;

/// Keys one entity is written under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPlan {
    /// Primary key
    pub primary: Key,
    /// Secondary index keys in declaration order
    pub secondaries: SmallVec<[Key; 2]>,
}

impl IndexPlan {
    /// Compute the plan of an entity
    pub fn for_entity<E: Entity>(entity: &E) -> Self {
        let id = entity.index_id();
        let secondaries = entity
            .indexes()
            .into_iter()
            .map(|entry| Key::index(E::KIND, entry.name, entry.value, id))
            .collect();
        Self {
            primary: entity.primary_key(),
            secondaries,
        }
    }

    /// Every key, primary first
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    /// Number of keys a write touches
    pub fn len(&self) -> usize {
        1 + self.secondaries.len()
    }

    /// Always false; a plan has at least its primary key
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Secondaries of `before` that this plan no longer writes
    pub fn stale_from(&self, before: &IndexPlan) -> SmallVec<[Key; 2]> {
        before
            .secondaries
            .iter()
            .filter(|key| !self.secondaries.contains(key))
            .cloned()
            .collect()
    }

    /// Stage `bytes` under every key of the plan
    pub fn stage(&self, txn: &mut Transaction<'_>, bytes: &[u8]) {
        for key in self.keys() {
            txn.set(key.clone(), bytes.to_vec());
        }
    }
}

/// Plan of a mutated entity plus the index entries it leaves behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUpdate {
    /// Keys of the post-mutation entity
    pub plan: IndexPlan,
    /// Old secondary keys to delete
    pub stale: SmallVec<[Key; 2]>,
}

impl IndexUpdate {
    /// Check if an indexed field changed
    pub fn relocates(&self) -> bool {
        !self.stale.is_empty()
    }

    /// Stage the deletes, then `bytes` under every key of the plan
    pub fn stage(&self, txn: &mut Transaction<'_>, bytes: &[u8]) {
        for key in &self.stale {
            txn.delete(key.clone());
        }
        self.plan.stage(txn, bytes);
    }
}

/// Entry point used by the driver and the create path
pub struct IndexMaintainer;

impl IndexMaintainer {
    /// Plan for the given post-mutation state
    pub fn plan<E: Entity>(entity: &E) -> IndexPlan {
        IndexPlan::for_entity(entity)
    }

    /// Update from `before` to `after`
    ///
    /// Fails with the new primary key if the mutation changed it.
    pub fn plan_update<E: Entity>(before: &E, after: &E) -> std::result::Result<IndexUpdate, Key> {
        let old = IndexPlan::for_entity(before);
        let new = IndexPlan::for_entity(after);
        if new.primary != old.primary {
            return Err(new.primary);
        }
        let stale = new.stale_from(&old);
        Ok(IndexUpdate { plan: new, stale })
    }
}
