//! FableDB - game state for a collectible RPG bot
//!
//! FableDB stores characters, inventories, guilds and users in a versioned
//! record store and applies every change through an optimistic
//! read-mutate-commit loop. Concurrent commands on the same record never
//! lose updates: the loser of a race re-reads and re-validates.
//!
//! # Quick Start
//!
//! ```ignore
//! use fabledb::{Database, model::Character};
//!
//! let db = Database::ephemeral();
//!
//! db.characters().add(Character::new("guild", "user", "pack:alice", "pack:show", 4))?;
//! db.characters().init_stats("guild", "pack:alice")?;
//! db.inventories().assign_party("guild", "user", "pack:alice", Some(1))?;
//! ```
//!
//! # Architecture
//!
//! - `fable-core`: keys, version tokens, entity schemas, errors
//! - `fable-storage`: the [`Store`] contract and its KV and document backends
//! - `fable-engine`: retry driver, index maintenance, mutators, facades

pub use fable_core::{model, DomainError, Entity, EntityKind, Error, Key, KeyPrefix, Result};
pub use fable_engine::*;
pub use fable_storage::{DocumentStore, KvStore, Store};
