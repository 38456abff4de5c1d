//! Entity schemas
//!
//! One explicit record type per collection. Optional fields are `Option`
//! or `#[serde(default)]` so records written before a field existed still
//! decode.

mod character;
mod guild;
mod inventory;
mod user;

pub use character::{
    AcquiredSkill, Character, CharacterCombat, CharacterStats, CHARACTERS_BY_INVENTORY,
    CHARACTERS_BY_MEDIA,
};
pub use guild::Guild;
pub use inventory::{Inventory, Party, INVENTORIES_BY_USER, PARTY_SIZE};
pub use user::{Like, User};
