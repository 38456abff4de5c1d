//! The `Entity` trait
//!
//! Every persisted record type implements [`Entity`]. The trait supplies the
//! primary key and the list of secondary indexes the record must be mirrored
//! to. Index values are pure functions of the record's fields.

use crate::types::{EntityKind, Key};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// One secondary index a record is mirrored to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Index name
    pub name: &'static str,
    /// Indexed field value
    pub value: String,
}

impl IndexEntry {
    /// Create an index entry
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// A versioned domain record
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Collection this entity lives in
    const KIND: EntityKind;

    /// Owning scope (guild id, or [`crate::GLOBAL_SCOPE`])
    fn scope(&self) -> &str;

    /// Id within the scope
    fn id(&self) -> &str;

    /// Secondary indexes, in a fixed declaration order
    fn indexes(&self) -> Vec<IndexEntry>;

    /// Id component of this entity's index keys
    ///
    /// Must be unique among entities sharing an index value.
    fn index_id(&self) -> &str {
        self.id()
    }

    /// Primary storage key
    fn primary_key(&self) -> Key {
        Key::primary(Self::KIND, self.scope(), self.id())
    }
}
