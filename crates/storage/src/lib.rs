//! Storage layer for FableDB
//!
//! This crate implements the versioned record store:
//! - Store: trait for get / scan / compare-and-swap commit
//! - Transaction / WriteBatch: staged checks and writes
//! - KvStore: ordered map with a global versionstamp
//! - DocumentStore: striped documents with per-document revisions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod kv;
pub mod store;
pub mod transaction;

pub use document::DocumentStore;
pub use kv::KvStore;
pub use store::{CommitOutcome, Store, VersionedRecord};
pub use transaction::{Check, Transaction, WriteBatch, WriteOp};
