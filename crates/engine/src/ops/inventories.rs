//! Inventories: consumables, tower progress and the battle party
//!
//! Inventories are created on first use with the configured starting
//! balances, so every operation below works for a user seen for the first
//! time in a guild.
//!
//! Mutators that stamp times read the clock inside the mutator, so a retried
//! attempt records the time of the attempt that committed.

use crate::database::Database;
use crate::mutators::{self, ExpGain, Recharged};
use crate::ops::characters::Characters;
use crate::transaction::{Mutated, MutationResult};
use chrono::{DateTime, Utc};
use fable_core::model::{Character, Inventory, INVENTORIES_BY_USER};
use fable_core::{EntityKind, Key, KeyPrefix, Result};
use std::sync::Arc;

/// Experience one party member received from a climb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyExp {
    /// Character id
    pub character_id: String,
    /// Experience added
    pub exp_gained: u32,
    /// Level-ups it paid for
    pub gain: ExpGain,
}

/// Inventory operations
#[derive(Clone)]
pub struct Inventories {
    db: Arc<Database>,
}

impl Inventories {
    /// Create new Inventories instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Primary key of an inventory
    pub fn key(guild_id: &str, user_id: &str) -> Key {
        Key::primary(EntityKind::Inventory, guild_id, user_id)
    }

    // ========== Reads ==========

    /// Get an inventory without creating it
    pub fn get(&self, guild_id: &str, user_id: &str) -> Result<Option<Inventory>> {
        self.db.get(&Self::key(guild_id, user_id))
    }

    /// Get an inventory, creating it with starting balances if absent
    pub fn get_or_create(&self, guild_id: &str, user_id: &str) -> Result<Inventory> {
        let game = &self.db.config().game;
        let result = self.db.driver()?.get_or_create(&Self::key(guild_id, user_id), || {
            Inventory::new(guild_id, user_id, game.max_new_pulls, game.max_keys)
        })?;
        Ok(result.entity)
    }

    /// Every inventory of a user, across guilds
    pub fn by_user(&self, user_id: &str) -> Result<Vec<Inventory>> {
        self.db.scan(&KeyPrefix::index(
            EntityKind::Inventory,
            INVENTORIES_BY_USER,
            user_id,
        ))
    }

    /// Party members in slot order, `None` for empty slots
    ///
    /// A slot whose character no longer exists reads as empty.
    pub fn party(&self, guild_id: &str, user_id: &str) -> Result<Vec<Option<Character>>> {
        let inventory = self.get_or_create(guild_id, user_id)?;
        inventory
            .party
            .members()
            .iter()
            .map(|member| match member {
                Some(id) => self.db.get(&Characters::key(guild_id, id)),
                None => Ok(None),
            })
            .collect()
    }

    // ========== Tower ==========

    /// Spend keys; `None` spends them all
    pub fn consume_keys(
        &self,
        guild_id: &str,
        user_id: &str,
        amount: Option<u32>,
    ) -> Result<MutationResult<Inventory, u32>> {
        self.get_or_create(guild_id, user_id)?;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                mutators::consume_keys(inventory, amount, Utc::now())
            })
    }

    /// Spend one sweep
    pub fn consume_sweep(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<MutationResult<Inventory, u32>> {
        self.get_or_create(guild_id, user_id)?;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                mutators::consume_sweep(inventory, Utc::now())
            })
    }

    /// Count one more cleared floor
    pub fn clear_floor(&self, guild_id: &str, user_id: &str) -> Result<MutationResult<Inventory, u32>> {
        self.get_or_create(guild_id, user_id)?;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                Ok(mutators::clear_floor(inventory))
            })
    }

    /// Climb `floor` with `keys` keys and share the experience
    ///
    /// The inventory spends the keys and records `floor` as cleared. Every
    /// party member the user still owns earns the floor's experience, with
    /// combat stats rolled first if needed. Inventory and party commit
    /// together.
    ///
    /// # Errors
    ///
    /// - `NoKeysAvailable` if the balance is below `keys` or `keys` is zero
    /// - `Error::NotFound` if a party slot names a missing character
    pub fn climb(
        &self,
        guild_id: &str,
        user_id: &str,
        floor: u32,
        keys: u32,
    ) -> Result<MutationResult<(), Vec<PartyExp>>> {
        self.get_or_create(guild_id, user_id)?;
        let key = Self::key(guild_id, user_id);
        let mut rng = rand::thread_rng();

        self.db.driver()?.run_many(&key, |ctx| {
            let mut inventory: Inventory = ctx.read(&key)?;
            let exp_gained = mutators::climb(&mut inventory, floor, keys, Utc::now())?;

            let mut party = Vec::new();
            for id in inventory.party.members().iter().flatten() {
                let mut character: Character = ctx.read(&Characters::key(guild_id, id))?;
                if character.user_id != user_id {
                    continue;
                }
                mutators::init_stats(&mut character, &mut rng);
                let gain = mutators::gain_exp(&mut character, exp_gained)?.into_output();
                ctx.write(&character)?;
                party.push(PartyExp {
                    character_id: id.clone(),
                    exp_gained,
                    gain,
                });
            }

            ctx.write(&inventory)?;
            Ok(party)
        })
    }

    /// Start the steal cooldown after a failed steal
    ///
    /// Returns the end of the cooldown.
    pub fn fail_steal(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<MutationResult<Inventory, DateTime<Utc>>> {
        self.get_or_create(guild_id, user_id)?;
        let cooldown_days = self.db.config().game.steal_cooldown_days;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                mutators::fail_steal(inventory, cooldown_days, Utc::now()).map(Mutated::Changed)
            })
    }

    /// Recharge pulls and keys as of now
    pub fn recharge(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<MutationResult<Inventory, Recharged>> {
        self.get_or_create(guild_id, user_id)?;
        let game = &self.db.config().game;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                Ok(mutators::recharge_consumables(inventory, game, Utc::now()))
            })
    }

    /// Recharge pulls and keys as of `now`
    pub fn recharge_at(
        &self,
        guild_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MutationResult<Inventory, Recharged>> {
        self.get_or_create(guild_id, user_id)?;
        let game = &self.db.config().game;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                Ok(mutators::recharge_consumables(inventory, game, now))
            })
    }

    // ========== Party ==========

    /// Put a character in the party, returning the slot it landed in
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the character does not exist in the guild
    /// - `CharacterNotOwned` if the user does not own it
    /// - `InvalidPartySpot` if `spot` is outside `1..=5`
    pub fn assign_party(
        &self,
        guild_id: &str,
        user_id: &str,
        character_id: &str,
        spot: Option<u8>,
    ) -> Result<MutationResult<Inventory, u8>> {
        self.get_or_create(guild_id, user_id)?;
        self.db.driver()?.run_with(
            &Self::key(guild_id, user_id),
            &Characters::key(guild_id, character_id),
            |inventory: &mut Inventory, character: &Character| {
                mutators::assign_party_spot(inventory, character, spot)
            },
        )
    }

    /// Exchange two party slots
    pub fn swap_party(
        &self,
        guild_id: &str,
        user_id: &str,
        a: u8,
        b: u8,
    ) -> Result<MutationResult<Inventory, ()>> {
        self.get_or_create(guild_id, user_id)?;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                mutators::swap_party_spots(inventory, a, b)
            })
    }

    /// Empty a party slot, returning its previous occupant
    pub fn unassign_party(
        &self,
        guild_id: &str,
        user_id: &str,
        spot: u8,
    ) -> Result<MutationResult<Inventory, Option<String>>> {
        self.get_or_create(guild_id, user_id)?;
        self.db
            .driver()?
            .run(&Self::key(guild_id, user_id), |inventory: &mut Inventory| {
                mutators::unassign_party_spot(inventory, spot)
            })
    }
}
