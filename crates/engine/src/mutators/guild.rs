//! Guild pack settings

use crate::transaction::Mutated;
use fable_core::model::Guild;
use fable_core::DomainError;

/// Install a community pack
///
/// # Errors
///
/// `PackAlreadyInstalled` if the pack is already installed.
pub fn install_pack(guild: &mut Guild, pack_id: &str) -> Result<Mutated<()>, DomainError> {
    if guild.pack_ids.iter().any(|p| p == pack_id) {
        return Err(DomainError::PackAlreadyInstalled(pack_id.to_string()));
    }
    guild.pack_ids.push(pack_id.to_string());
    Ok(Mutated::Changed(()))
}

/// Uninstall a community pack
///
/// # Errors
///
/// `PackNotInstalled` if the pack is not installed.
pub fn uninstall_pack(guild: &mut Guild, pack_id: &str) -> Result<Mutated<()>, DomainError> {
    let before = guild.pack_ids.len();
    guild.pack_ids.retain(|p| p != pack_id);
    if guild.pack_ids.len() == before {
        return Err(DomainError::PackNotInstalled(pack_id.to_string()));
    }
    Ok(Mutated::Changed(()))
}

/// Enable or disable the built-in packs
pub fn set_builtins_disabled(guild: &mut Guild, disabled: bool) -> Mutated<()> {
    if guild.builtins_disabled == disabled {
        return Mutated::Unchanged(());
    }
    guild.builtins_disabled = disabled;
    Mutated::Changed(())
}
