//! Tower consumables and progress
//!
//! Keys are spent to climb the tower, sweeps to replay a cleared floor.
//! Pulls and keys recharge over time up to a cap; the running recharge is
//! tracked by a timestamp that is advanced by whole intervals and cleared
//! once the balance is full again.

use crate::database::GameConfig;
use crate::transaction::Mutated;
use chrono::{DateTime, Duration, Utc};
use fable_core::model::Inventory;
use fable_core::DomainError;

/// Spend keys
///
/// `None` spends the whole balance. Returns the number of keys spent.
///
/// # Errors
///
/// `NoKeysAvailable` if the balance is below the request, or if nothing
/// would be spent.
pub fn consume_keys(
    inventory: &mut Inventory,
    amount: Option<u32>,
    now: DateTime<Utc>,
) -> Result<Mutated<u32>, DomainError> {
    let available = inventory.available_keys;
    let requested = amount.unwrap_or(available);

    if requested == 0 || available < requested {
        return Err(DomainError::NoKeysAvailable {
            available,
            requested,
        });
    }

    inventory.available_keys -= requested;
    inventory.last_key_use = Some(now);
    inventory.last_activity = Some(now);
    inventory.keys_timestamp.get_or_insert(now);

    Ok(Mutated::Changed(requested))
}

/// Spend one sweep
///
/// Returns the remaining sweeps.
///
/// # Errors
///
/// `NoSweepsAvailable` if no floor was cleared yet or the balance is empty.
pub fn consume_sweep(
    inventory: &mut Inventory,
    now: DateTime<Utc>,
) -> Result<Mutated<u32>, DomainError> {
    if inventory.floors_cleared == 0 || inventory.available_sweeps == 0 {
        return Err(DomainError::NoSweepsAvailable);
    }

    inventory.available_sweeps -= 1;
    inventory.last_sweep = Some(now);
    inventory.sweeps_timestamp.get_or_insert(now);

    Ok(Mutated::Changed(inventory.available_sweeps))
}

/// Record one more cleared floor, returning the new count
pub fn clear_floor(inventory: &mut Inventory) -> Mutated<u32> {
    inventory.floors_cleared += 1;
    Mutated::Changed(inventory.floors_cleared)
}

/// Experience one party member earns for `keys` runs of `floor`
///
/// Every ten floors form a tier worth one more base point. Within a tier,
/// floors 1-4 pay the base, 5 pays double, 6-9 one and a half times, and
/// the tenth floor triple. Floor 0 is paid as floor 1. Half points are
/// summed over all keys, then rounded down.
pub fn floor_exp(floor: u32, keys: u32) -> u32 {
    let floor = floor.max(1);
    let tier = if floor % 10 == 0 { floor / 10 } else { floor / 10 + 1 };
    let halves: u32 = match floor % 10 {
        1..=4 => 2,
        5 => 4,
        6..=9 => 3,
        _ => 6,
    };
    let total = u64::from(halves) * u64::from(tier) * u64::from(keys) / 2;
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Spend `keys` on `floor` and record it as the highest cleared
///
/// Returns the experience each party member earns.
///
/// # Errors
///
/// `NoKeysAvailable` if the balance is below `keys` or `keys` is zero.
pub fn climb(
    inventory: &mut Inventory,
    floor: u32,
    keys: u32,
    now: DateTime<Utc>,
) -> Result<u32, DomainError> {
    consume_keys(inventory, Some(keys), now)?;
    inventory.floors_cleared = floor;
    Ok(floor_exp(floor, keys))
}

/// Consumables restored by [`recharge_consumables`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recharged {
    /// Pulls added
    pub pulls: u32,
    /// Keys added
    pub keys: u32,
}

/// Restore pulls and keys for the time elapsed since their timestamps
///
/// A missing timestamp counts from `now`, so nothing recharges until a
/// recharge has been started.
pub fn recharge_consumables(
    inventory: &mut Inventory,
    game: &GameConfig,
    now: DateTime<Utc>,
) -> Mutated<Recharged> {
    let pulls_timestamp = inventory.recharge_timestamp.unwrap_or(now);
    let keys_timestamp = inventory.keys_timestamp.unwrap_or(now);

    let new_pulls = recharged(
        inventory.available_pulls,
        game.max_pulls,
        pulls_timestamp,
        game.recharge_mins,
        now,
    );
    let new_keys = recharged(
        inventory.available_keys,
        game.max_keys,
        keys_timestamp,
        game.recharge_keys_mins,
        now,
    );

    let summary = Recharged {
        pulls: new_pulls,
        keys: new_keys,
    };
    if new_pulls == 0 && new_keys == 0 {
        return Mutated::Unchanged(summary);
    }

    let pulls = inventory.available_pulls + new_pulls;
    let keys = inventory.available_keys + new_keys;
    inventory.available_pulls = pulls.min(game.balance_cap);
    inventory.available_keys = keys.min(game.balance_cap);

    inventory.recharge_timestamp = (pulls < game.max_pulls)
        .then(|| advance(pulls_timestamp, new_pulls, game.recharge_mins));
    inventory.keys_timestamp = (keys < game.max_keys)
        .then(|| advance(keys_timestamp, new_keys, game.recharge_keys_mins));

    Mutated::Changed(summary)
}

fn recharged(
    current: u32,
    max: u32,
    since: DateTime<Utc>,
    interval_mins: i64,
    now: DateTime<Utc>,
) -> u32 {
    let elapsed = (now - since).num_minutes();
    if elapsed <= 0 || interval_mins <= 0 {
        return 0;
    }
    let intervals = u32::try_from(elapsed / interval_mins).unwrap_or(u32::MAX);
    intervals.min(max.saturating_sub(current))
}

fn advance(since: DateTime<Utc>, intervals: u32, interval_mins: i64) -> DateTime<Utc> {
    since + Duration::minutes(i64::from(intervals) * interval_mins)
}
