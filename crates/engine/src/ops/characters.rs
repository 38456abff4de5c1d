//! Characters: collected characters and their combat progression
//!
//! ## Design
//!
//! Characters is a stateless facade over the Database. It holds no
//! in-memory state beyond an `Arc<Database>` reference.
//!
//! ## Keys
//!
//! A character lives at `characters/{guild}/{character_id}` and is mirrored
//! to `by_inventory` (`{guild}:{user}`) and `by_media` (`{guild}:{media}`).
//! Every mutation below rewrites all three copies in one commit.
//!
//! ## API
//!
//! - `get`, `by_user`, `by_media` - reads
//! - `add` - insert a freshly pulled character
//! - `init_stats`, `acquire_skill`, `gain_exp` - combat progression
//! - `set_nickname`, `set_image` - customization
//! - `trade`, `steal` - ownership changes spanning several records

use crate::database::Database;
use crate::mutators::{self, customize, ExpGain};
use crate::ops::inventories::Inventories;
use crate::transaction::{Mutated, MutationResult};
use chrono::{DateTime, Utc};
use fable_core::model::{
    AcquiredSkill, Character, Inventory, CHARACTERS_BY_INVENTORY, CHARACTERS_BY_MEDIA,
};
use fable_core::{DomainError, EntityKind, Key, KeyPrefix, Result};
use rand::Rng;
use std::sync::Arc;

/// Ratings a character can have
pub const RATINGS: std::ops::RangeInclusive<u8> = 1..=5;

/// Character operations
///
/// # Example
///
/// ```ignore
/// let db = Database::ephemeral();
/// let characters = db.characters();
///
/// characters.add(Character::new("g1", "u1", "pack:alice", "pack:show", 4))?;
/// characters.init_stats("g1", "pack:alice")?;
/// characters.acquire_skill("g1", "u1", "pack:alice", "heal")?;
/// ```
#[derive(Clone)]
pub struct Characters {
    db: Arc<Database>,
}

impl Characters {
    /// Create new Characters instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Primary key of a character
    pub fn key(guild_id: &str, character_id: &str) -> Key {
        Key::primary(EntityKind::Character, guild_id, character_id)
    }

    // ========== Reads ==========

    /// Get a character by id
    pub fn get(&self, guild_id: &str, character_id: &str) -> Result<Option<Character>> {
        self.db.get(&Self::key(guild_id, character_id))
    }

    /// Every character a user owns in a guild
    pub fn by_user(&self, guild_id: &str, user_id: &str) -> Result<Vec<Character>> {
        self.db.scan(&KeyPrefix::index(
            EntityKind::Character,
            CHARACTERS_BY_INVENTORY,
            Character::inventory_index_value(guild_id, user_id),
        ))
    }

    /// Every owned character of a media in a guild
    pub fn by_media(&self, guild_id: &str, media_id: &str) -> Result<Vec<Character>> {
        self.db.scan(&KeyPrefix::index(
            EntityKind::Character,
            CHARACTERS_BY_MEDIA,
            Character::media_index_value(guild_id, media_id),
        ))
    }

    // ========== Mutations ==========

    /// Insert a new character
    ///
    /// # Errors
    ///
    /// - `InvalidRating` if the rating is outside `1..=5`
    /// - `Error::AlreadyExists` if the guild already has this character
    pub fn add(&self, character: Character) -> Result<Character> {
        if !RATINGS.contains(&character.rating) {
            return Err(DomainError::InvalidRating(character.rating).into());
        }
        self.db.driver()?.create(character)
    }

    /// Roll combat stats, once
    ///
    /// Returns the character unchanged if its stats are already set.
    pub fn init_stats(
        &self,
        guild_id: &str,
        character_id: &str,
    ) -> Result<MutationResult<Character, ()>> {
        self.init_stats_with(guild_id, character_id, &mut rand::thread_rng())
    }

    /// [`Characters::init_stats`] with a caller-supplied random source
    pub fn init_stats_with<R: Rng>(
        &self,
        guild_id: &str,
        character_id: &str,
        rng: &mut R,
    ) -> Result<MutationResult<Character, ()>> {
        self.db
            .driver()?
            .run(&Self::key(guild_id, character_id), |character: &mut Character| {
                Ok(mutators::init_stats(character, rng))
            })
    }

    /// Spend a skill point on `skill`
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the character does not exist
    /// - `CharacterNotOwned` if `user_id` is not the owner
    /// - `UnknownSkill`, `MaxLevel`, `InsufficientPoints` from the skill rules
    pub fn acquire_skill(
        &self,
        guild_id: &str,
        user_id: &str,
        character_id: &str,
        skill: &str,
    ) -> Result<MutationResult<Character, AcquiredSkill>> {
        self.db
            .driver()?
            .run(&Self::key(guild_id, character_id), |character: &mut Character| {
                customize::ensure_owner(character, user_id)?;
                mutators::acquire_skill(character, skill)
            })
    }

    /// Add experience and apply level-ups
    pub fn gain_exp(
        &self,
        guild_id: &str,
        character_id: &str,
        amount: u32,
    ) -> Result<MutationResult<Character, ExpGain>> {
        self.db
            .driver()?
            .run(&Self::key(guild_id, character_id), |character: &mut Character| {
                mutators::gain_exp(character, amount)
            })
    }

    /// Set or clear the nickname
    pub fn set_nickname(
        &self,
        guild_id: &str,
        user_id: &str,
        character_id: &str,
        nickname: Option<String>,
    ) -> Result<MutationResult<Character, ()>> {
        self.db
            .driver()?
            .run(&Self::key(guild_id, character_id), |character: &mut Character| {
                customize::set_nickname(character, user_id, nickname.clone())
            })
    }

    /// Set or clear the image url
    pub fn set_image(
        &self,
        guild_id: &str,
        user_id: &str,
        character_id: &str,
        image: Option<String>,
    ) -> Result<MutationResult<Character, ()>> {
        self.db
            .driver()?
            .run(&Self::key(guild_id, character_id), |character: &mut Character| {
                customize::set_image(character, user_id, image.clone())
            })
    }

    /// Swap characters between two users of a guild in one commit
    ///
    /// `give` moves from `a_user` to `b_user`, `take` the other way. The
    /// commit checks both inventories, so a party change racing the trade
    /// sends it back for re-validation.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if a character does not exist
    /// - `CharacterNotOwned` if a character is not held by its side
    /// - `CharacterInParty` if a character sits in its owner's party
    pub fn trade(
        &self,
        guild_id: &str,
        a_user: &str,
        b_user: &str,
        give: &[&str],
        take: &[&str],
    ) -> Result<MutationResult<(), ()>> {
        let inventories = self.db.inventories();
        inventories.get_or_create(guild_id, a_user)?;
        inventories.get_or_create(guild_id, b_user)?;
        let a_key = Inventories::key(guild_id, a_user);
        let b_key = Inventories::key(guild_id, b_user);

        self.db.driver()?.run_many(&a_key, |ctx| {
            let a: Inventory = ctx.read(&a_key)?;
            let b: Inventory = ctx.read(&b_key)?;
            let mut given = give
                .iter()
                .map(|id| ctx.read::<Character>(&Self::key(guild_id, id)))
                .collect::<Result<Vec<_>>>()?;
            let mut taken = take
                .iter()
                .map(|id| ctx.read::<Character>(&Self::key(guild_id, id)))
                .collect::<Result<Vec<_>>>()?;

            mutators::trade_characters(&a, &b, &mut given, &mut taken)?;
            for character in given.iter().chain(&taken) {
                ctx.write(character)?;
            }
            Ok(())
        })
    }

    /// Move a character from `victim` to `thief`
    ///
    /// Character, thief inventory and victim inventory are written in one
    /// commit. Returns the end of the thief's steal cooldown.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the character does not exist
    /// - `CharacterNotOwned` if `victim` does not own it
    /// - `StealOnCooldown` if the thief is still cooling down
    pub fn steal(
        &self,
        guild_id: &str,
        thief: &str,
        victim: &str,
        character_id: &str,
    ) -> Result<MutationResult<(), DateTime<Utc>>> {
        let inventories = self.db.inventories();
        inventories.get_or_create(guild_id, thief)?;
        inventories.get_or_create(guild_id, victim)?;
        let character_key = Self::key(guild_id, character_id);
        let thief_key = Inventories::key(guild_id, thief);
        let victim_key = Inventories::key(guild_id, victim);
        let cooldown_days = self.db.config().game.steal_cooldown_days;

        self.db.driver()?.run_many(&character_key, |ctx| {
            let mut character: Character = ctx.read(&character_key)?;
            let mut thief: Inventory = ctx.read(&thief_key)?;
            let mut victim: Inventory = ctx.read(&victim_key)?;

            let until = mutators::steal_character(
                &mut thief,
                &mut victim,
                &mut character,
                cooldown_days,
                Utc::now(),
            )?;
            ctx.write(&character)?;
            ctx.write(&thief)?;
            ctx.write(&victim)?;
            Ok(until)
        })
    }

    /// Read-modify-write with a custom mutator
    ///
    /// For operations this facade has no method for. The mutator follows the
    /// same rules as the built-in ones.
    pub fn update<O, F>(
        &self,
        guild_id: &str,
        character_id: &str,
        mutator: F,
    ) -> Result<MutationResult<Character, O>>
    where
        F: FnMut(&mut Character) -> std::result::Result<Mutated<O>, fable_core::DomainError>,
    {
        self.db
            .driver()?
            .run(&Self::key(guild_id, character_id), mutator)
    }
}
