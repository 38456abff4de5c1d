//! Users: token balance, shop purchases and likes
//!
//! Pulls and sweeps bought with tokens land in a guild inventory; the user
//! and the inventory are committed together.

use crate::database::Database;
use crate::mutators::{self, user};
use crate::ops::inventories::Inventories;
use crate::transaction::{Mutated, MutationResult};
use chrono::{DateTime, Utc};
use fable_core::model::{Inventory, Like, User};
use fable_core::{DomainError, EntityKind, Key, Result, GLOBAL_SCOPE};
use std::sync::Arc;

/// User operations
#[derive(Clone)]
pub struct Users {
    db: Arc<Database>,
}

impl Users {
    /// Create new Users instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Primary key of a user
    pub fn key(user_id: &str) -> Key {
        Key::primary(EntityKind::User, GLOBAL_SCOPE, user_id)
    }

    /// Get a user without creating it
    pub fn get(&self, user_id: &str) -> Result<Option<User>> {
        self.db.get(&Self::key(user_id))
    }

    /// Get a user, creating it if absent
    pub fn get_or_create(&self, user_id: &str) -> Result<User> {
        let result = self
            .db
            .driver()?
            .get_or_create(&Self::key(user_id), || User::new(user_id))?;
        Ok(result.entity)
    }

    /// Add tokens, returning the new balance
    pub fn add_tokens(&self, user_id: &str, amount: u32) -> Result<MutationResult<User, u32>> {
        self.get_or_create(user_id)?;
        self.db
            .driver()?
            .run(&Self::key(user_id), |u: &mut User| Ok(user::add_tokens(u, amount)))
    }

    /// Buy pulls in a guild at one token each, returning the new pull balance
    ///
    /// # Errors
    ///
    /// `InsufficientTokens` if the user has fewer than `amount` tokens.
    pub fn add_pulls(
        &self,
        guild_id: &str,
        user_id: &str,
        amount: u32,
    ) -> Result<MutationResult<(), u32>> {
        let game = &self.db.config().game;
        self.buy(guild_id, user_id, |u, inventory| {
            mutators::add_pulls(u, inventory, amount, game)
        })
    }

    /// Buy sweeps in a guild at one token each, returning the new sweep
    /// balance
    ///
    /// # Errors
    ///
    /// `InsufficientTokens` if the user has fewer than `amount` tokens.
    pub fn add_sweeps(
        &self,
        guild_id: &str,
        user_id: &str,
        amount: u32,
    ) -> Result<MutationResult<(), u32>> {
        let game = &self.db.config().game;
        self.buy(guild_id, user_id, |u, inventory| {
            mutators::add_sweeps(u, inventory, amount, game)
        })
    }

    /// Buy a guaranteed pull of `rating` stars, returning the tokens left
    ///
    /// # Errors
    ///
    /// - `InvalidGuarantee` for ratings other than 3, 4 and 5
    /// - `InsufficientTokens` if the user cannot pay for it
    pub fn add_guarantee(&self, user_id: &str, rating: u8) -> Result<MutationResult<User, u32>> {
        self.get_or_create(user_id)?;
        self.db
            .driver()?
            .run(&Self::key(user_id), |u: &mut User| mutators::add_guarantee(u, rating))
    }

    fn buy<F>(
        &self,
        guild_id: &str,
        user_id: &str,
        mut purchase: F,
    ) -> Result<MutationResult<(), u32>>
    where
        F: FnMut(&mut User, &mut Inventory) -> std::result::Result<Mutated<u32>, DomainError>,
    {
        self.get_or_create(user_id)?;
        self.db.inventories().get_or_create(guild_id, user_id)?;
        let user_key = Self::key(user_id);
        let inventory_key = Inventories::key(guild_id, user_id);

        self.db.driver()?.run_many(&user_key, |ctx| {
            let mut u: User = ctx.read(&user_key)?;
            let mut inventory: Inventory = ctx.read(&inventory_key)?;
            let bought = purchase(&mut u, &mut inventory)?;
            if bought.is_changed() {
                ctx.write(&u)?;
                ctx.write(&inventory)?;
            }
            Ok(bought.into_output())
        })
    }

    /// Claim the daily tokens as of `now`, returning how many were granted
    pub fn claim_daily_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MutationResult<User, u32>> {
        self.get_or_create(user_id)?;
        let game = &self.db.config().game;
        self.db.driver()?.run(&Self::key(user_id), |u: &mut User| {
            Ok(user::claim_daily_tokens(u, game, now))
        })
    }

    /// Like a character or media
    pub fn like(&self, user_id: &str, like: Like) -> Result<MutationResult<User, ()>> {
        self.get_or_create(user_id)?;
        self.db
            .driver()?
            .run(&Self::key(user_id), |u: &mut User| Ok(user::like(u, like.clone())))
    }

    /// Remove a like
    pub fn unlike(&self, user_id: &str, like: &Like) -> Result<MutationResult<User, ()>> {
        self.get_or_create(user_id)?;
        self.db
            .driver()?
            .run(&Self::key(user_id), |u: &mut User| Ok(user::unlike(u, like)))
    }
}
