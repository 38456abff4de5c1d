//! Character schema
//!
//! A character is one collected copy of a pack character, owned by one user
//! inside one guild. Besides its primary key it is mirrored to two indexes:
//! - `by_inventory` (`guild:user`): lists a user's collection in a guild
//! - `by_media` (`guild:media`): lists every owned character of a media

use crate::entity::{Entity, IndexEntry};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of characters by owning inventory
pub const CHARACTERS_BY_INVENTORY: &str = "by_inventory";
/// Index of characters by media within a guild
pub const CHARACTERS_BY_MEDIA: &str = "by_media";

/// A collected character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Pack-qualified character id (`pack:id`)
    pub character_id: String,
    /// Guild the character was pulled in
    pub guild_id: String,
    /// Owning user
    pub user_id: String,
    /// Media the character appears in
    pub media_id: String,
    /// Star rating, 1 through 5
    pub rating: u8,
    /// Custom nickname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Custom image url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Combat progression
    #[serde(default)]
    pub combat: CharacterCombat,
}

/// Combat progression of a character
///
/// `base_stats` is `None` until stats are initialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCombat {
    /// Experience toward the next level
    #[serde(default)]
    pub exp: u32,
    /// Current level, 0 before initialization
    #[serde(default)]
    pub level: u32,
    /// Unclaimed skill points
    #[serde(default)]
    pub skill_points: u32,
    /// Acquired skills by catalog key
    #[serde(default)]
    pub skills: BTreeMap<String, AcquiredSkill>,
    /// Unclaimed stat points
    #[serde(default)]
    pub unclaimed_stats_points: u32,
    /// Stats rolled at initialization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_stats: Option<CharacterStats>,
    /// Stats after level-up growth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cur_stats: Option<CharacterStats>,
}

/// Combat stat block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    /// Attack
    pub attack: u32,
    /// Defense
    pub defense: u32,
    /// Speed
    pub speed: u32,
    /// Hit points
    pub hp: u32,
}

impl CharacterStats {
    /// Sum of attack, defense and speed
    pub fn allocated(&self) -> u32 {
        self.attack + self.defense + self.speed
    }
}

/// Level of an acquired skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquiredSkill {
    /// Current level, starting at 1
    pub level: u32,
}

impl Character {
    /// Create a freshly pulled character with empty combat state
    pub fn new(
        guild_id: impl Into<String>,
        user_id: impl Into<String>,
        character_id: impl Into<String>,
        media_id: impl Into<String>,
        rating: u8,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            guild_id: guild_id.into(),
            user_id: user_id.into(),
            media_id: media_id.into(),
            rating,
            nickname: None,
            image: None,
            combat: CharacterCombat::default(),
        }
    }

    /// `by_inventory` index value for a guild/user pair
    pub fn inventory_index_value(guild_id: &str, user_id: &str) -> String {
        format!("{}:{}", guild_id, user_id)
    }

    /// `by_media` index value for a guild/media pair
    pub fn media_index_value(guild_id: &str, media_id: &str) -> String {
        format!("{}:{}", guild_id, media_id)
    }

    /// Check whether stats were rolled
    pub fn has_stats(&self) -> bool {
        self.combat.base_stats.is_some()
    }
}

impl Entity for Character {
    const KIND: EntityKind = EntityKind::Character;

    fn scope(&self) -> &str {
        &self.guild_id
    }

    fn id(&self) -> &str {
        &self.character_id
    }

    fn indexes(&self) -> Vec<IndexEntry> {
        vec![
            IndexEntry::new(
                CHARACTERS_BY_INVENTORY,
                Self::inventory_index_value(&self.guild_id, &self.user_id),
            ),
            IndexEntry::new(
                CHARACTERS_BY_MEDIA,
                Self::media_index_value(&self.guild_id, &self.media_id),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Key;

    #[test]
    fn test_primary_key_is_guild_scoped() {
        let c = Character::new("g1", "u1", "pack:alice", "pack:show", 4);
        assert_eq!(
            c.primary_key(),
            Key::primary(EntityKind::Character, "g1", "pack:alice")
        );
    }

    #[test]
    fn test_index_order_is_fixed() {
        let c = Character::new("g1", "u1", "pack:alice", "pack:show", 4);
        let names: Vec<_> = c.indexes().iter().map(|e| e.name).collect();
        assert_eq!(names, vec![CHARACTERS_BY_INVENTORY, CHARACTERS_BY_MEDIA]);
        assert_eq!(c.indexes()[0].value, "g1:u1");
        assert_eq!(c.indexes()[1].value, "g1:pack:show");
    }

    #[test]
    fn test_new_character_has_no_stats() {
        let c = Character::new("g1", "u1", "pack:alice", "pack:show", 1);
        assert!(!c.has_stats());
        assert_eq!(c.combat.level, 0);
        assert!(c.combat.skills.is_empty());
    }
}
