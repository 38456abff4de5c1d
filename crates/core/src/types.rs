//! Core key types for FableDB
//!
//! This module defines the persisted layout:
//! - EntityKind: discriminates entity collections
//! - Key: primary `(kind, scope, id)` or index `(kind, index, value, id)`
//! - KeyPrefix: ordered range selectors used by prefix scans
//!
//! Keys order by variant first (every primary key sorts before every index
//! key), then field by field. Prefix scans rely on that ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope used by entities that are not owned by a guild
pub const GLOBAL_SCOPE: &str = "global";

/// Entity collection discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Collectible characters, scoped to a guild
    Character,
    /// Per-user, per-guild inventories
    Inventory,
    /// Guild settings
    Guild,
    /// Discord users
    User,
}

impl EntityKind {
    /// Collection name used in key rendering
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Character => "characters",
            EntityKind::Inventory => "inventories",
            EntityKind::Guild => "guilds",
            EntityKind::User => "users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage key
///
/// Every entity lives under exactly one primary key plus one index key per
/// secondary index it declares. Each index key holds a full copy of the
/// entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    /// `(entityType, scopeId, entityId)`
    Primary {
        /// Entity collection
        kind: EntityKind,
        /// Owning scope (guild id or [`GLOBAL_SCOPE`])
        scope: String,
        /// Entity id within the scope
        id: String,
    },
    /// `(entityType, indexName, indexedFieldValue, entityId)`
    Index {
        /// Entity collection
        kind: EntityKind,
        /// Index name
        index: String,
        /// Value of the indexed field(s)
        value: String,
        /// Entity id
        id: String,
    },
}

impl Key {
    /// Build a primary key
    pub fn primary(kind: EntityKind, scope: impl Into<String>, id: impl Into<String>) -> Self {
        Key::Primary {
            kind,
            scope: scope.into(),
            id: id.into(),
        }
    }

    /// Build a secondary index key
    pub fn index(
        kind: EntityKind,
        index: impl Into<String>,
        value: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Key::Index {
            kind,
            index: index.into(),
            value: value.into(),
            id: id.into(),
        }
    }

    /// Entity collection of this key
    pub fn kind(&self) -> EntityKind {
        match self {
            Key::Primary { kind, .. } | Key::Index { kind, .. } => *kind,
        }
    }

    /// Entity id component
    pub fn id(&self) -> &str {
        match self {
            Key::Primary { id, .. } | Key::Index { id, .. } => id,
        }
    }

    /// Check if this is a primary key
    pub fn is_primary(&self) -> bool {
        matches!(self, Key::Primary { .. })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Primary { kind, scope, id } => write!(f, "{}/{}/{}", kind, scope, id),
            Key::Index {
                kind,
                index,
                value,
                id,
            } => write!(f, "{}#{}/{}/{}", kind, index, value, id),
        }
    }
}

/// Range selector for prefix scans
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPrefix {
    /// Every primary key of a kind
    Kind(EntityKind),
    /// Every primary key of a kind within one scope
    Scope {
        /// Entity collection
        kind: EntityKind,
        /// Scope id
        scope: String,
    },
    /// Every entry of one index value
    Index {
        /// Entity collection
        kind: EntityKind,
        /// Index name
        index: String,
        /// Indexed value
        value: String,
    },
}

impl KeyPrefix {
    /// Prefix over one scope
    pub fn scope(kind: EntityKind, scope: impl Into<String>) -> Self {
        KeyPrefix::Scope {
            kind,
            scope: scope.into(),
        }
    }

    /// Prefix over one index value
    pub fn index(kind: EntityKind, index: impl Into<String>, value: impl Into<String>) -> Self {
        KeyPrefix::Index {
            kind,
            index: index.into(),
            value: value.into(),
        }
    }

    /// Smallest key that can match this prefix
    ///
    /// Ordered stores start a range scan here and stop at the first key for
    /// which [`KeyPrefix::matches`] is false.
    pub fn lower_bound(&self) -> Key {
        match self {
            KeyPrefix::Kind(kind) => Key::primary(*kind, "", ""),
            KeyPrefix::Scope { kind, scope } => Key::primary(*kind, scope.clone(), ""),
            KeyPrefix::Index { kind, index, value } => {
                Key::index(*kind, index.clone(), value.clone(), "")
            }
        }
    }

    /// Check whether `key` falls under this prefix
    pub fn matches(&self, key: &Key) -> bool {
        match (self, key) {
            (KeyPrefix::Kind(k), Key::Primary { kind, .. }) => k == kind,
            (KeyPrefix::Scope { kind: k, scope: s }, Key::Primary { kind, scope, .. }) => {
                k == kind && s == scope
            }
            (
                KeyPrefix::Index {
                    kind: k,
                    index: i,
                    value: v,
                },
                Key::Index {
                    kind, index, value, ..
                },
            ) => k == kind && i == index && v == value,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = Key::primary(EntityKind::Inventory, "g1", "u1");
        assert_eq!(key.to_string(), "inventories/g1/u1");

        let key = Key::index(EntityKind::Character, "by_media", "g1:m1", "pack:c1");
        assert_eq!(key.to_string(), "characters#by_media/g1:m1/pack:c1");
    }

    #[test]
    fn test_primary_sorts_before_index() {
        let primary = Key::primary(EntityKind::User, "z", "z");
        let index = Key::index(EntityKind::Character, "a", "a", "a");
        assert!(primary < index);
    }

    #[test]
    fn test_lower_bound_precedes_matches() {
        let prefix = KeyPrefix::index(EntityKind::Character, "by_inventory", "g1:u1");
        let key = Key::index(EntityKind::Character, "by_inventory", "g1:u1", "pack:a");
        assert!(prefix.lower_bound() <= key);
        assert!(prefix.matches(&key));
    }

    #[test]
    fn test_prefix_rejects_neighbours() {
        let prefix = KeyPrefix::scope(EntityKind::Character, "g1");
        assert!(prefix.matches(&Key::primary(EntityKind::Character, "g1", "x")));
        assert!(!prefix.matches(&Key::primary(EntityKind::Character, "g10", "x")));
        assert!(!prefix.matches(&Key::primary(EntityKind::Inventory, "g1", "x")));
        assert!(!prefix.matches(&Key::index(EntityKind::Character, "g1", "x", "y")));
    }

    #[test]
    fn test_kind_prefix() {
        let prefix = KeyPrefix::Kind(EntityKind::Guild);
        assert!(prefix.matches(&Key::primary(EntityKind::Guild, GLOBAL_SCOPE, "g1")));
        assert!(!prefix.matches(&Key::primary(EntityKind::User, GLOBAL_SCOPE, "g1")));
    }

    #[test]
    fn test_key_accessors() {
        let key = Key::index(EntityKind::Inventory, "by_user", "u1", "g1");
        assert_eq!(key.kind(), EntityKind::Inventory);
        assert_eq!(key.id(), "g1");
        assert!(!key.is_primary());
    }

    mod ordering {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scope_lower_bound_precedes_members(
                scope in "[a-z0-9]{0,8}",
                id in "[a-z0-9:]{0,12}",
            ) {
                let prefix = KeyPrefix::scope(EntityKind::Character, scope.clone());
                let key = Key::primary(EntityKind::Character, scope, id);
                prop_assert!(prefix.matches(&key));
                prop_assert!(prefix.lower_bound() <= key);
            }

            #[test]
            fn index_lower_bound_precedes_members(
                value in "[a-z0-9:]{0,12}",
                id in "[a-z0-9:]{0,12}",
            ) {
                let prefix = KeyPrefix::index(EntityKind::Character, "by_media", value.clone());
                let key = Key::index(EntityKind::Character, "by_media", value, id);
                prop_assert!(prefix.matches(&key));
                prop_assert!(prefix.lower_bound() <= key);
            }
        }
    }
}
