//! Optimistic mutation of stored entities
//!
//! - [`RetryDriver`]: read, mutate, commit, retry on conflict
//! - [`MutationContext`]: reads and writes of a multi-entity attempt
//! - [`Mutated`] / [`MutationResult`]: mutator and caller facing results
//! - [`AttemptOutcome`]: per-attempt state
//! - [`DriverMetrics`] / [`TransactionMetrics`]: attempt counters

mod context;
mod driver;
mod metrics;
mod outcome;

pub use context::MutationContext;
pub use driver::RetryDriver;
pub use metrics::{DriverMetrics, TransactionMetrics};
pub use outcome::{AttemptOutcome, Mutated, MutationResult};
