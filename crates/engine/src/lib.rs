//! Mutation engine for FableDB
//!
//! This crate sits on top of the store and owns every write:
//! - Database: store backend, configuration, lifecycle
//! - index: the keys each entity is mirrored to
//! - transaction: the read-mutate-commit retry driver
//! - mutators: pure domain rules over loaded entities
//! - ops: per-entity facades (Characters, Inventories, Guilds, Users)
//!
//! The engine is the only component that knows about:
//! - Secondary index layout
//! - Retry and backoff policy
//! - Game rules

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod index;
pub mod mutators;
pub mod ops;
pub mod transaction;

pub use database::{Backend, Database, FableConfig, GameConfig, RetryConfig, CONFIG_FILE_NAME};
pub use index::{IndexMaintainer, IndexPlan, IndexUpdate};
pub use ops::{Characters, Guilds, Inventories, PartyExp, Users};
pub use transaction::{
    AttemptOutcome, DriverMetrics, Mutated, MutationContext, MutationResult, RetryDriver,
    TransactionMetrics,
};
