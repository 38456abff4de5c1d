//! User tokens and likes

use crate::database::GameConfig;
use crate::transaction::Mutated;
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use fable_core::model::{Like, User};

/// Add tokens, returning the new balance
pub fn add_tokens(user: &mut User, amount: u32) -> Mutated<u32> {
    if amount == 0 {
        return Mutated::Unchanged(user.available_tokens);
    }
    user.available_tokens = user.available_tokens.saturating_add(amount);
    Mutated::Changed(user.available_tokens)
}

/// Grant the daily tokens if enough time has passed since the last claim
///
/// One token, two from Friday through Sunday. Returns the tokens granted.
pub fn claim_daily_tokens(user: &mut User, game: &GameConfig, now: DateTime<Utc>) -> Mutated<u32> {
    let due = match user.daily_timestamp {
        Some(last) => now - last >= Duration::hours(game.daily_tokens_hours),
        None => true,
    };
    if !due {
        return Mutated::Unchanged(0);
    }

    let granted = match now.weekday() {
        Weekday::Fri | Weekday::Sat | Weekday::Sun => 2,
        _ => 1,
    };
    user.available_tokens = user.available_tokens.saturating_add(granted);
    user.daily_timestamp = Some(now);
    Mutated::Changed(granted)
}

/// Add a like; liking twice is a no-op
pub fn like(user: &mut User, like: Like) -> Mutated<()> {
    if user.likes.contains(&like) {
        return Mutated::Unchanged(());
    }
    user.likes.push(like);
    Mutated::Changed(())
}

/// Remove a like; removing a missing like is a no-op
pub fn unlike(user: &mut User, like: &Like) -> Mutated<()> {
    let before = user.likes.len();
    user.likes.retain(|l| l != like);
    if user.likes.len() == before {
        Mutated::Unchanged(())
    } else {
        Mutated::Changed(())
    }
}
