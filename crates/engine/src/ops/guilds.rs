//! Guilds: installed packs and built-in pack toggle

use crate::database::Database;
use crate::mutators::guild;
use crate::transaction::MutationResult;
use fable_core::model::Guild;
use fable_core::{EntityKind, Key, Result, GLOBAL_SCOPE};
use std::sync::Arc;

/// Guild operations
#[derive(Clone)]
pub struct Guilds {
    db: Arc<Database>,
}

impl Guilds {
    /// Create new Guilds instance
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Primary key of a guild
    pub fn key(guild_id: &str) -> Key {
        Key::primary(EntityKind::Guild, GLOBAL_SCOPE, guild_id)
    }

    /// Get a guild without creating it
    pub fn get(&self, guild_id: &str) -> Result<Option<Guild>> {
        self.db.get(&Self::key(guild_id))
    }

    /// Get a guild, creating default settings if absent
    pub fn get_or_create(&self, guild_id: &str) -> Result<Guild> {
        let result = self
            .db
            .driver()?
            .get_or_create(&Self::key(guild_id), || Guild::new(guild_id))?;
        Ok(result.entity)
    }

    /// Install a community pack
    pub fn install_pack(&self, guild_id: &str, pack_id: &str) -> Result<MutationResult<Guild, ()>> {
        self.get_or_create(guild_id)?;
        self.db
            .driver()?
            .run(&Self::key(guild_id), |g: &mut Guild| guild::install_pack(g, pack_id))
    }

    /// Uninstall a community pack
    pub fn uninstall_pack(
        &self,
        guild_id: &str,
        pack_id: &str,
    ) -> Result<MutationResult<Guild, ()>> {
        self.get_or_create(guild_id)?;
        self.db
            .driver()?
            .run(&Self::key(guild_id), |g: &mut Guild| guild::uninstall_pack(g, pack_id))
    }

    /// Enable or disable the built-in packs
    pub fn set_builtins_disabled(
        &self,
        guild_id: &str,
        disabled: bool,
    ) -> Result<MutationResult<Guild, ()>> {
        self.get_or_create(guild_id)?;
        self.db.driver()?.run(&Self::key(guild_id), |g: &mut Guild| {
            Ok(guild::set_builtins_disabled(g, disabled))
        })
    }
}
