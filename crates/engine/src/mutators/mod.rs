//! Entity mutators
//!
//! Pure functions from a loaded entity (plus arguments) to a new entity
//! state. None of them touch the store: the retry driver loads the entity,
//! hands a copy to a mutator, and writes the copy back if the mutator
//! returned [`crate::Mutated::Changed`]. A mutator that returns an error must
//! leave the entity untouched.
//!
//! Mutators needing randomness or the clock take them as arguments.

pub mod customize;
pub mod guild;
pub mod party;
pub mod shop;
pub mod skills;
pub mod stats;
pub mod tower;
pub mod trade;
pub mod user;

pub use party::{assign_party_spot, swap_party_spots, unassign_party_spot};
pub use shop::{add_guarantee, add_pulls, add_sweeps, guarantee_cost};
pub use skills::{acquire_skill, find_skill, SkillDef, SKILLS};
pub use stats::{gain_exp, init_stats, ExpGain, MAX_LEVEL};
pub use tower::{
    climb, clear_floor, consume_keys, consume_sweep, floor_exp, recharge_consumables, Recharged,
};
pub use trade::{fail_steal, steal_character, trade_characters};
