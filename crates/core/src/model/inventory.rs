//! Inventory schema
//!
//! One inventory exists per (guild, user). It holds consumable balances,
//! tower progress and the five-slot battle party. It is mirrored to the
//! `by_user` index so a user's inventories can be listed across guilds.

use crate::entity::{Entity, IndexEntry};
use crate::types::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index of inventories by user
pub const INVENTORIES_BY_USER: &str = "by_user";

/// Number of party slots
pub const PARTY_SIZE: usize = 5;

/// A user's inventory within one guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Guild id
    pub guild_id: String,
    /// User id
    pub user_id: String,
    /// Gacha pulls available
    pub available_pulls: u32,
    /// Tower keys available
    pub available_keys: u32,
    /// Tower sweeps available
    #[serde(default)]
    pub available_sweeps: u32,
    /// Highest tower floor cleared
    #[serde(default)]
    pub floors_cleared: u32,
    /// Last pull
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pull: Option<DateTime<Utc>>,
    /// Start of the running pull recharge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recharge_timestamp: Option<DateTime<Utc>>,
    /// Start of the running key recharge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys_timestamp: Option<DateTime<Utc>>,
    /// Last time keys were consumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key_use: Option<DateTime<Utc>>,
    /// Last tower activity of any kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    /// Start of the running sweep recharge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweeps_timestamp: Option<DateTime<Utc>>,
    /// Last sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sweep: Option<DateTime<Utc>>,
    /// End of the steal cooldown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steal_timestamp: Option<DateTime<Utc>>,
    /// Battle party
    #[serde(default)]
    pub party: Party,
}

impl Inventory {
    /// Create an inventory with starting balances
    pub fn new(
        guild_id: impl Into<String>,
        user_id: impl Into<String>,
        pulls: u32,
        keys: u32,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            user_id: user_id.into(),
            available_pulls: pulls,
            available_keys: keys,
            available_sweeps: 0,
            floors_cleared: 0,
            last_pull: None,
            recharge_timestamp: None,
            keys_timestamp: None,
            last_key_use: None,
            last_activity: None,
            sweeps_timestamp: None,
            last_sweep: None,
            steal_timestamp: None,
            party: Party::default(),
        }
    }
}

impl Entity for Inventory {
    const KIND: EntityKind = EntityKind::Inventory;

    fn scope(&self) -> &str {
        &self.guild_id
    }

    fn id(&self) -> &str {
        &self.user_id
    }

    fn indexes(&self) -> Vec<IndexEntry> {
        vec![IndexEntry::new(INVENTORIES_BY_USER, self.user_id.clone())]
    }

    fn index_id(&self) -> &str {
        &self.guild_id
    }
}

/// Five party slots holding character ids
///
/// Slots are addressed 1 through 5, matching how players refer to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    members: [Option<String>; PARTY_SIZE],
}

impl Party {
    /// Occupant of a 1-based spot
    pub fn get(&self, spot: usize) -> Option<&str> {
        spot.checked_sub(1)
            .and_then(|i| self.members.get(i))
            .and_then(|m| m.as_deref())
    }

    /// Replace the occupant of a 1-based spot, returning the previous one
    ///
    /// Out-of-range spots are ignored and return `None`.
    pub fn set(&mut self, spot: usize, member: Option<String>) -> Option<String> {
        match spot.checked_sub(1).and_then(|i| self.members.get_mut(i)) {
            Some(slot) => std::mem::replace(slot, member),
            None => None,
        }
    }

    /// 1-based spot holding `character_id`
    pub fn position(&self, character_id: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.as_deref() == Some(character_id))
            .map(|i| i + 1)
    }

    /// First empty 1-based spot
    pub fn first_open(&self) -> Option<usize> {
        self.members.iter().position(Option::is_none).map(|i| i + 1)
    }

    /// Clear every slot holding `character_id`
    pub fn remove(&mut self, character_id: &str) {
        for slot in self.members.iter_mut() {
            if slot.as_deref() == Some(character_id) {
                *slot = None;
            }
        }
    }

    /// Swap two 1-based spots
    pub fn swap(&mut self, a: usize, b: usize) {
        if (1..=PARTY_SIZE).contains(&a) && (1..=PARTY_SIZE).contains(&b) {
            self.members.swap(a - 1, b - 1);
        }
    }

    /// Slots in order
    pub fn members(&self) -> &[Option<String>; PARTY_SIZE] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_spots_are_one_based() {
        let mut party = Party::default();
        assert_eq!(party.set(1, Some("a".into())), None);
        assert_eq!(party.get(1), Some("a"));
        assert_eq!(party.get(0), None);
        assert_eq!(party.get(6), None);
        assert_eq!(party.set(6, Some("x".into())), None);
    }

    #[test]
    fn test_first_open_and_position() {
        let mut party = Party::default();
        party.set(1, Some("a".into()));
        party.set(3, Some("c".into()));
        assert_eq!(party.first_open(), Some(2));
        assert_eq!(party.position("c"), Some(3));
        assert_eq!(party.position("z"), None);
    }

    #[test]
    fn test_remove_and_swap() {
        let mut party = Party::default();
        party.set(2, Some("b".into()));
        party.set(4, Some("d".into()));
        party.swap(2, 4);
        assert_eq!(party.get(2), Some("d"));
        assert_eq!(party.get(4), Some("b"));
        party.remove("b");
        assert_eq!(party.get(4), None);
    }

    #[test]
    fn test_inventory_is_indexed_by_user() {
        let inv = Inventory::new("g1", "u1", 10, 5);
        let indexes = inv.indexes();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].name, INVENTORIES_BY_USER);
        assert_eq!(indexes[0].value, "u1");
    }
}
