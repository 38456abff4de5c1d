//! Per-entity facades
//!
//! Each facade is a cheap `Clone` view over an `Arc<Database>` and turns
//! caller arguments into a key plus a mutator for the retry driver.

mod characters;
mod guilds;
mod inventories;
mod users;

pub use characters::Characters;
pub use guilds::Guilds;
pub use inventories::{Inventories, PartyExp};
pub use users::Users;
