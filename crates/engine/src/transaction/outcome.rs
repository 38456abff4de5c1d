//! Values exchanged between mutators, attempts and callers

use fable_core::{Error, Key};

/// What a mutator did to the entity it was handed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutated<O> {
    /// The entity changed and must be written back
    Changed(O),
    /// Nothing to write; resolve immediately
    Unchanged(O),
}

impl<O> Mutated<O> {
    /// Output regardless of variant
    pub fn into_output(self) -> O {
        match self {
            Mutated::Changed(o) | Mutated::Unchanged(o) => o,
        }
    }

    /// Check if a write is needed
    pub fn is_changed(&self) -> bool {
        matches!(self, Mutated::Changed(_))
    }
}

/// Result of a resolved mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult<E, O> {
    /// Entity as committed (or as read, if unchanged)
    pub entity: E,
    /// Value returned by the mutator
    pub output: O,
    /// Attempts it took, starting at 1
    pub attempts: usize,
    /// Whether a write was committed
    pub changed: bool,
}

impl<E, O> MutationResult<E, O> {
    /// Drop the output, keep the entity
    pub fn into_entity(self) -> E {
        self.entity
    }
}

/// Outcome of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// Resolved; stop retrying
    Committed(T),
    /// Lost a version race on the given key; retry
    Conflict(Key),
    /// Failed for a reason retrying cannot fix
    Rejected(Error),
}

impl<T> AttemptOutcome<T> {
    /// Fold an attempt's errors into the outcome
    ///
    /// `Error::Conflict` becomes [`AttemptOutcome::Conflict`]; every other
    /// error rejects the mutation.
    pub fn from_result(result: fable_core::Result<AttemptOutcome<T>>) -> Self {
        match result {
            Ok(outcome) => outcome,
            Err(Error::Conflict { key }) => AttemptOutcome::Conflict(key),
            Err(e) => AttemptOutcome::Rejected(e),
        }
    }
}
