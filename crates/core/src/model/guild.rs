//! Guild settings schema

use crate::entity::{Entity, IndexEntry};
use crate::types::{EntityKind, GLOBAL_SCOPE};
use serde::{Deserialize, Serialize};

/// Per-guild settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Discord guild id
    pub guild_id: String,
    /// Excluded from global rankings
    #[serde(default)]
    pub excluded: bool,
    /// Built-in packs disabled
    #[serde(default)]
    pub builtins_disabled: bool,
    /// Installed community packs, in install order
    #[serde(default)]
    pub pack_ids: Vec<String>,
}

impl Guild {
    /// Default settings for a guild seen for the first time
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            excluded: false,
            builtins_disabled: false,
            pack_ids: Vec::new(),
        }
    }
}

impl Entity for Guild {
    const KIND: EntityKind = EntityKind::Guild;

    fn scope(&self) -> &str {
        GLOBAL_SCOPE
    }

    fn id(&self) -> &str {
        &self.guild_id
    }

    fn indexes(&self) -> Vec<IndexEntry> {
        Vec::new()
    }
}
