//! User schema

use crate::entity::{Entity, IndexEntry};
use crate::types::{EntityKind, GLOBAL_SCOPE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Discord user, shared across guilds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Discord user id
    pub user_id: String,
    /// Vote tokens
    #[serde(default)]
    pub available_tokens: u32,
    /// Start of the daily token window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_timestamp: Option<DateTime<Utc>>,
    /// Guaranteed pull ratings
    #[serde(default)]
    pub guarantees: Vec<u8>,
    /// Followed characters and media
    #[serde(default)]
    pub likes: Vec<Like>,
}

/// Something a user follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Like {
    /// A character id
    Character(String),
    /// A media id
    Media(String),
}

impl User {
    /// A user seen for the first time
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            available_tokens: 0,
            daily_timestamp: None,
            guarantees: Vec::new(),
            likes: Vec::new(),
        }
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn scope(&self) -> &str {
        GLOBAL_SCOPE
    }

    fn id(&self) -> &str {
        &self.user_id
    }

    fn indexes(&self) -> Vec<IndexEntry> {
        Vec::new()
    }
}
