//! Spending vote tokens
//!
//! | Item | Cost |
//! |------|------|
//! | Pull | 1 token each |
//! | Sweep | 1 token each |
//! | 3 star guarantee | 4 tokens |
//! | 4 star guarantee | 12 tokens |
//! | 5 star guarantee | 28 tokens |
//!
//! Pulls and sweeps land in a guild inventory, so buying them changes the
//! user and the inventory together. The caller commits both in one write.

use crate::database::GameConfig;
use crate::transaction::Mutated;
use fable_core::model::{Inventory, User};
use fable_core::DomainError;

/// Token cost of a guarantee for `rating` stars
pub fn guarantee_cost(rating: u8) -> Option<u32> {
    match rating {
        3 => Some(4),
        4 => Some(12),
        5 => Some(28),
        _ => None,
    }
}

fn spend_tokens(user: &mut User, cost: u32) -> Result<(), DomainError> {
    if user.available_tokens < cost {
        return Err(DomainError::InsufficientTokens {
            available: user.available_tokens,
            required: cost,
        });
    }
    user.available_tokens -= cost;
    Ok(())
}

/// Trade `amount` tokens for pulls, returning the new pull balance
///
/// Reaching the recharge cap stops the running pull recharge.
///
/// # Errors
///
/// `InsufficientTokens` if the user has fewer than `amount` tokens.
pub fn add_pulls(
    user: &mut User,
    inventory: &mut Inventory,
    amount: u32,
    game: &GameConfig,
) -> Result<Mutated<u32>, DomainError> {
    if amount == 0 {
        return Ok(Mutated::Unchanged(inventory.available_pulls));
    }
    spend_tokens(user, amount)?;

    let pulls = inventory.available_pulls.saturating_add(amount);
    inventory.available_pulls = pulls.min(game.balance_cap);
    if inventory.available_pulls >= game.max_pulls {
        inventory.recharge_timestamp = None;
    }
    Ok(Mutated::Changed(inventory.available_pulls))
}

/// Trade `amount` tokens for sweeps, returning the new sweep balance
///
/// # Errors
///
/// `InsufficientTokens` if the user has fewer than `amount` tokens.
pub fn add_sweeps(
    user: &mut User,
    inventory: &mut Inventory,
    amount: u32,
    game: &GameConfig,
) -> Result<Mutated<u32>, DomainError> {
    if amount == 0 {
        return Ok(Mutated::Unchanged(inventory.available_sweeps));
    }
    spend_tokens(user, amount)?;

    let sweeps = inventory.available_sweeps.saturating_add(amount);
    inventory.available_sweeps = sweeps.min(game.balance_cap);
    Ok(Mutated::Changed(inventory.available_sweeps))
}

/// Buy a guaranteed pull of `rating` stars, returning the tokens left
///
/// # Errors
///
/// - `InvalidGuarantee` for ratings other than 3, 4 and 5
/// - `InsufficientTokens` if the user cannot pay for it
pub fn add_guarantee(user: &mut User, rating: u8) -> Result<Mutated<u32>, DomainError> {
    let cost = guarantee_cost(rating).ok_or(DomainError::InvalidGuarantee(rating))?;
    spend_tokens(user, cost)?;
    user.guarantees.push(rating);
    Ok(Mutated::Changed(user.available_tokens))
}
