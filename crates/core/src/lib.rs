//! Core types for FableDB
//!
//! This crate defines the foundational types used throughout the system:
//! - Key / KeyPrefix / EntityKind: the persisted key layout
//! - VersionToken: opaque optimistic-concurrency marker
//! - Entity: trait implemented by every stored record
//! - model: Character, Inventory, Guild, User schemas
//! - codec: MessagePack encoding of records
//! - Error / DomainError: error hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod entity;
pub mod error;
pub mod model;
pub mod types;
pub mod version;

pub use entity::{Entity, IndexEntry};
pub use error::{DomainError, Error, Result};
pub use types::{EntityKind, Key, KeyPrefix, GLOBAL_SCOPE};
pub use version::VersionToken;
