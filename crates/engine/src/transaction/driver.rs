//! The mutation retry driver
//!
//! Every entity mutation runs the same loop:
//!
//! ```text
//!          +------------------------------------------------+
//!          v                                                |
//!   read entity + token --> mutator --> stage writes --> commit
//!          |                   |                            |
//!      NotFound           DomainError /               Conflict: retry
//!      (Rejected)         Unchanged (resolved)        (until max_attempts)
//! ```
//!
//! Each pass produces an [`AttemptOutcome`]. `Committed` and `Rejected`
//! end the loop; `Conflict` starts a fresh attempt from a new read, so a
//! mutator never sees state older than its own attempt. After
//! `max_attempts` conflicts the driver gives up with
//! `Error::TransactionExhausted`, having made exactly that many attempts.
//!
//! Writes always cover the primary key and every secondary index key of
//! the post-mutation entity, with the same bytes, in one commit guarded by
//! the token read in the same attempt. Index entries the mutation moved away
//! from are deleted in that commit.
//!
//! [`RetryDriver::run_many`] runs the same loop over a [`MutationContext`]
//! for changes spanning several entities.

use crate::database::RetryConfig;
use crate::index::{IndexMaintainer, IndexUpdate};
use crate::transaction::context::MutationContext;
use crate::transaction::metrics::DriverMetrics;
use crate::transaction::outcome::{AttemptOutcome, Mutated, MutationResult};
use fable_core::{codec, DomainError, Entity, Error, Key, Result, VersionToken};
use fable_storage::{CommitOutcome, Store};
use tracing::{debug, trace, warn};

type MutatorResult<O> = std::result::Result<Mutated<O>, DomainError>;

/// Retry driver bound to one database
///
/// Obtained from [`crate::Database::driver`]. Cheap to create; holds only
/// borrows.
pub struct RetryDriver<'db> {
    store: &'db dyn Store,
    retry: &'db RetryConfig,
    metrics: &'db DriverMetrics,
}

impl<'db> RetryDriver<'db> {
    pub(crate) fn new(
        store: &'db dyn Store,
        retry: &'db RetryConfig,
        metrics: &'db DriverMetrics,
    ) -> Self {
        Self {
            store,
            retry,
            metrics,
        }
    }

    /// Retry policy in effect
    pub fn retry_config(&self) -> &RetryConfig {
        self.retry
    }

    /// Mutate the entity at `lookup`
    ///
    /// The mutator receives a private copy of the entity for each attempt.
    /// It may be called more than once and must not have side effects
    /// beyond that copy.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if nothing is stored at `lookup`
    /// - `Error::Domain` if the mutator rejects the entity
    /// - `Error::KeyChanged` if the mutation changes scope or id
    /// - `Error::TransactionExhausted` after `max_attempts` conflicts
    pub fn run<E, O, F>(&self, lookup: &Key, mut mutator: F) -> Result<MutationResult<E, O>>
    where
        E: Entity,
        F: FnMut(&mut E) -> MutatorResult<O>,
    {
        let ((entity, output, changed), attempts) = self.drive(lookup, || {
            AttemptOutcome::from_result(self.attempt(lookup, &mut mutator))
        })?;
        self.record_resolution(changed);
        Ok(MutationResult {
            entity,
            output,
            attempts,
            changed,
        })
    }

    /// Mutate the entity at `lookup`, reading a related entity alongside
    ///
    /// The related entity is read-only. Its token is checked on commit, so
    /// the mutation only lands if the related entity did not change in
    /// between.
    pub fn run_with<E, R, O, F>(
        &self,
        lookup: &Key,
        related: &Key,
        mut mutator: F,
    ) -> Result<MutationResult<E, O>>
    where
        E: Entity,
        R: Entity,
        F: FnMut(&mut E, &R) -> MutatorResult<O>,
    {
        let ((entity, output, changed), attempts) = self.drive(lookup, || {
            AttemptOutcome::from_result(self.attempt_with(lookup, related, &mut mutator))
        })?;
        self.record_resolution(changed);
        Ok(MutationResult {
            entity,
            output,
            attempts,
            changed,
        })
    }

    /// Mutate several entities in one commit
    ///
    /// `body` reads and writes through the [`MutationContext`] of each
    /// attempt. Every token it read is checked on commit; a conflict on any
    /// of them discards the attempt and runs `body` again from fresh reads.
    /// When nothing was written the attempt resolves without a commit.
    /// `lookup` names the mutation in logs and in exhaustion errors.
    pub fn run_many<O, F>(&self, lookup: &Key, mut body: F) -> Result<MutationResult<(), O>>
    where
        F: FnMut(&mut MutationContext<'_>) -> Result<O>,
    {
        let ((output, changed), attempts) = self.drive(lookup, || {
            AttemptOutcome::from_result(self.attempt_many(&mut body))
        })?;
        self.record_resolution(changed);
        Ok(MutationResult {
            entity: (),
            output,
            attempts,
            changed,
        })
    }

    /// Insert a new entity
    ///
    /// The commit asserts the primary key is absent. A single attempt is
    /// made: losing the race means the entity exists.
    ///
    /// # Errors
    ///
    /// `Error::AlreadyExists` if the primary key is taken.
    pub fn create<E: Entity>(&self, entity: E) -> Result<E> {
        self.metrics.record_attempt();
        match self.insert(&entity) {
            Ok(CommitOutcome::Committed) => {
                self.metrics.record_commit();
                Ok(entity)
            }
            Ok(CommitOutcome::Conflict { key }) => {
                self.metrics.record_rejection();
                Err(Error::AlreadyExists { key })
            }
            Err(e) => {
                self.metrics.record_rejection();
                Err(e)
            }
        }
    }

    /// Read the entity at `key`, creating it with `make` if absent
    ///
    /// `output` of the result is `true` when this call created the entity.
    /// Losing a creation race counts as a conflict and the next attempt
    /// reads the winner's entity.
    pub fn get_or_create<E, F>(&self, key: &Key, make: F) -> Result<MutationResult<E, bool>>
    where
        E: Entity,
        F: Fn() -> E,
    {
        let ((entity, created), attempts) = self.drive(key, || {
            AttemptOutcome::from_result(self.attempt_get_or_create(key, &make))
        })?;
        self.record_resolution(created);
        Ok(MutationResult {
            entity,
            output: created,
            attempts,
            changed: created,
        })
    }

    // ========================================================================
    // Attempt loop
    // ========================================================================

    fn drive<T>(
        &self,
        lookup: &Key,
        mut attempt: impl FnMut() -> AttemptOutcome<T>,
    ) -> Result<(T, usize)> {
        let max_attempts = self.retry.attempts();
        let mut rng = rand::thread_rng();

        for n in 1..=max_attempts {
            self.metrics.record_attempt();
            match attempt() {
                AttemptOutcome::Committed(value) => {
                    trace!(target: "fable::txn", key = %lookup, attempts = n, "mutation resolved");
                    return Ok((value, n));
                }
                AttemptOutcome::Conflict(key) => {
                    self.metrics.record_conflict();
                    debug!(
                        target: "fable::txn",
                        lookup = %lookup,
                        key = %key,
                        attempt = n,
                        "version conflict"
                    );
                    if n < max_attempts {
                        let delay = self.retry.jittered_delay(n - 1, &mut rng);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
                AttemptOutcome::Rejected(e) => {
                    self.metrics.record_rejection();
                    return Err(e);
                }
            }
        }

        self.metrics.record_exhaustion();
        warn!(
            target: "fable::txn",
            key = %lookup,
            attempts = max_attempts,
            "mutation exhausted its attempts"
        );
        Err(Error::TransactionExhausted {
            key: lookup.clone(),
            attempts: max_attempts,
        })
    }

    fn attempt<E, O, F>(&self, lookup: &Key, mutator: &mut F) -> Result<AttemptOutcome<(E, O, bool)>>
    where
        E: Entity,
        F: FnMut(&mut E) -> MutatorResult<O>,
    {
        let (before, token) = self.read::<E>(lookup)?;
        let mut after = before.clone();

        match mutator(&mut after)? {
            Mutated::Unchanged(output) => Ok(AttemptOutcome::Committed((before, output, false))),
            Mutated::Changed(output) => {
                let plan = self.plan(&before, &after)?;
                let outcome = self.write(&plan, &after, &[(lookup, token)])?;
                Ok(match outcome {
                    CommitOutcome::Committed => AttemptOutcome::Committed((after, output, true)),
                    CommitOutcome::Conflict { key } => AttemptOutcome::Conflict(key),
                })
            }
        }
    }

    fn attempt_with<E, R, O, F>(
        &self,
        lookup: &Key,
        related: &Key,
        mutator: &mut F,
    ) -> Result<AttemptOutcome<(E, O, bool)>>
    where
        E: Entity,
        R: Entity,
        F: FnMut(&mut E, &R) -> MutatorResult<O>,
    {
        let (before, token) = self.read::<E>(lookup)?;
        let (other, other_token) = self.read::<R>(related)?;
        let mut after = before.clone();

        match mutator(&mut after, &other)? {
            Mutated::Unchanged(output) => Ok(AttemptOutcome::Committed((before, output, false))),
            Mutated::Changed(output) => {
                let plan = self.plan(&before, &after)?;
                let outcome =
                    self.write(&plan, &after, &[(lookup, token), (related, other_token)])?;
                Ok(match outcome {
                    CommitOutcome::Committed => AttemptOutcome::Committed((after, output, true)),
                    CommitOutcome::Conflict { key } => AttemptOutcome::Conflict(key),
                })
            }
        }
    }

    fn attempt_many<O, F>(&self, body: &mut F) -> Result<AttemptOutcome<(O, bool)>>
    where
        F: FnMut(&mut MutationContext<'_>) -> Result<O>,
    {
        let mut ctx = MutationContext::new(self.store);
        let output = body(&mut ctx)?;
        if ctx.write_count() == 0 {
            return Ok(AttemptOutcome::Committed((output, false)));
        }

        trace!(
            target: "fable::txn",
            reads = ctx.read_count(),
            writes = ctx.write_count(),
            "committing multi-entity mutation"
        );
        Ok(match ctx.commit()? {
            CommitOutcome::Committed => AttemptOutcome::Committed((output, true)),
            CommitOutcome::Conflict { key } => AttemptOutcome::Conflict(key),
        })
    }

    fn attempt_get_or_create<E, F>(&self, key: &Key, make: &F) -> Result<AttemptOutcome<(E, bool)>>
    where
        E: Entity,
        F: Fn() -> E,
    {
        if let Some(record) = self.store.get(key)? {
            return Ok(AttemptOutcome::Committed((codec::decode(&record.value)?, false)));
        }

        let entity = make();
        Ok(match self.insert(&entity)? {
            CommitOutcome::Committed => AttemptOutcome::Committed((entity, true)),
            CommitOutcome::Conflict { key } => AttemptOutcome::Conflict(key),
        })
    }

    // ========================================================================
    // Store access
    // ========================================================================

    fn read<E: Entity>(&self, key: &Key) -> Result<(E, VersionToken)> {
        let record = self
            .store
            .get(key)?
            .ok_or_else(|| Error::NotFound { key: key.clone() })?;
        Ok((codec::decode(&record.value)?, record.version))
    }

    fn plan<E: Entity>(&self, before: &E, after: &E) -> Result<IndexUpdate> {
        let update = IndexMaintainer::plan_update(before, after).map_err(|to| {
            let key = before.primary_key();
            warn!(
                target: "fable::txn",
                key = %key,
                to = %to,
                "mutation would change the primary key"
            );
            Error::KeyChanged { key, to }
        })?;
        if update.relocates() {
            debug!(
                target: "fable::txn",
                key = %update.plan.primary,
                stale = update.stale.len(),
                "moving index entries"
            );
        }
        Ok(update)
    }

    fn write<E: Entity>(
        &self,
        update: &IndexUpdate,
        entity: &E,
        checks: &[(&Key, VersionToken)],
    ) -> Result<CommitOutcome> {
        let bytes = codec::encode(entity)?;
        let mut txn = self.store.begin_transaction();
        for (key, token) in checks {
            txn.check((*key).clone(), Some(*token));
        }
        update.stage(&mut txn, &bytes);
        txn.commit()
    }

    fn insert<E: Entity>(&self, entity: &E) -> Result<CommitOutcome> {
        let plan = IndexMaintainer::plan(entity);
        let bytes = codec::encode(entity)?;
        let mut txn = self.store.begin_transaction();
        txn.check(plan.primary.clone(), None);
        plan.stage(&mut txn, &bytes);
        txn.commit()
    }

    fn record_resolution(&self, changed: bool) {
        if changed {
            self.metrics.record_commit();
        } else {
            self.metrics.record_unchanged();
        }
    }
}
