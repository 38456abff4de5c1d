//! Combat stat initialization and experience
//!
//! A character's combat state is rolled once, the first time it is needed:
//!
//! | Rating | Stat budget | Starting skills |
//! |--------|-------------|-----------------|
//! | 1 | 3 | 0 |
//! | 3 | 9 | 0 |
//! | 4 | 12 | 1 |
//! | 5 | 15 | 2 |
//!
//! The budget is split attack, then defense, then speed, each uniformly at
//! random from what is left, so the three always sum to the budget.
//!
//! Experience levels a character up to [`MAX_LEVEL`]. Each level grants a
//! skill point and three stat points; reaching the max level grants one more
//! skill point and six more stat points. New stat points are spread across
//! attack, defense and speed in proportion to the base stats.

use crate::mutators::skills::SKILLS;
use crate::transaction::Mutated;
use fable_core::model::{AcquiredSkill, Character, CharacterStats};
use fable_core::DomainError;
use rand::seq::SliceRandom;
use rand::Rng;

/// Hit points of a freshly initialized character
pub const BASE_HP: u32 = 10;

/// Highest reachable level
pub const MAX_LEVEL: u32 = 10;

/// Stat points granted per level
pub const STAT_POINTS_PER_LEVEL: u32 = 3;

/// Hit points granted per level
pub const HP_PER_LEVEL: u32 = 5;

/// Attack + defense + speed budget for a rating
pub fn stat_budget(rating: u8) -> u32 {
    u32::from(rating) * 3
}

/// Random skills granted at initialization
pub fn starting_skill_count(rating: u8) -> usize {
    usize::from(rating.saturating_sub(3))
}

/// Experience needed to go from `level` to the next one
pub fn exp_to_next_level(level: u32) -> u32 {
    level * 10
}

/// Roll combat stats and starting skills
///
/// A no-op when stats are already set, so calling it twice leaves the
/// first roll in place.
pub fn init_stats<R: Rng + ?Sized>(character: &mut Character, rng: &mut R) -> Mutated<()> {
    if character.has_stats() {
        return Mutated::Unchanged(());
    }

    let total = stat_budget(character.rating);
    let attack = rng.gen_range(0..=total);
    let defense = rng.gen_range(0..=total - attack);
    let speed = total - attack - defense;

    let stats = CharacterStats {
        attack,
        defense,
        speed,
        hp: BASE_HP,
    };

    let combat = &mut character.combat;
    combat.base_stats = Some(stats);
    combat.cur_stats = Some(stats);
    combat.level = 1;
    combat.exp = 0;

    let count = starting_skill_count(character.rating).min(SKILLS.len());
    for def in SKILLS.choose_multiple(rng, count) {
        combat
            .skills
            .insert(def.key.to_string(), AcquiredSkill { level: 1 });
    }

    Mutated::Changed(())
}

/// What a call to [`gain_exp`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpGain {
    /// Levels gained
    pub level_up: u32,
    /// Skill points granted
    pub skill_points: u32,
    /// Stat points distributed
    pub stat_points: u32,
    /// Experience carried toward the next level
    pub exp: u32,
    /// Experience the next level needs
    pub exp_to_level: u32,
}

/// Add experience, applying every level-up it pays for
///
/// # Errors
///
/// `StatsNotInitialized` if the character has no base stats yet.
pub fn gain_exp(character: &mut Character, amount: u32) -> Result<Mutated<ExpGain>, DomainError> {
    let not_initialized = || DomainError::StatsNotInitialized(character.character_id.clone());
    let base = character.combat.base_stats.ok_or_else(not_initialized)?;
    let mut cur = character.combat.cur_stats.unwrap_or(base);
    if character.combat.level == 0 {
        return Err(not_initialized());
    }

    if amount == 0 {
        return Ok(Mutated::Unchanged(ExpGain {
            exp: character.combat.exp,
            exp_to_level: exp_to_next_level(character.combat.level),
            ..Default::default()
        }));
    }

    let combat = &mut character.combat;
    let mut gain = ExpGain::default();
    combat.exp = combat.exp.saturating_add(amount);

    while combat.level < MAX_LEVEL && combat.exp >= exp_to_next_level(combat.level) {
        combat.exp -= exp_to_next_level(combat.level);
        combat.level += 1;
        combat.skill_points += 1;

        gain.level_up += 1;
        gain.skill_points += 1;
        gain.stat_points += STAT_POINTS_PER_LEVEL;

        if combat.level >= MAX_LEVEL {
            combat.skill_points += 1;
            gain.skill_points += 1;
            gain.stat_points += STAT_POINTS_PER_LEVEL * 2;
        }
    }

    if gain.stat_points > 0 {
        distribute_new_stats(&base, &mut cur, gain.stat_points, gain.level_up)
            .ok_or_else(|| DomainError::StatsNotInitialized(character.character_id.clone()))?;
        character.combat.cur_stats = Some(cur);
    }

    gain.exp = character.combat.exp;
    gain.exp_to_level = exp_to_next_level(character.combat.level);
    Ok(Mutated::Changed(gain))
}

/// Spread `points` across attack, defense and speed in proportion to `base`
///
/// Shares are rounded, then corrected one point at a time until they sum to
/// `points`: an excess is taken from the largest share, a shortfall given to
/// the smallest, speed first on ties. Hit points grow by
/// [`HP_PER_LEVEL`] per level gained.
///
/// Returns `None` if `base` has no attack, defense or speed to weigh by.
pub fn distribute_new_stats(
    base: &CharacterStats,
    cur: &mut CharacterStats,
    points: u32,
    level_up: u32,
) -> Option<()> {
    let total = base.allocated();
    if total == 0 {
        return None;
    }

    let share = |stat: u32| (f64::from(points) * f64::from(stat) / f64::from(total)).round() as u32;
    // speed, defense, attack: tie order
    let mut split = [share(base.speed), share(base.defense), share(base.attack)];

    while split.iter().sum::<u32>() > points {
        let max = split.iter().copied().max().unwrap_or(0);
        if let Some(slot) = split.iter_mut().find(|v| **v == max) {
            *slot -= 1;
        }
    }
    while split.iter().sum::<u32>() < points {
        let min = split.iter().copied().min().unwrap_or(0);
        if let Some(slot) = split.iter_mut().find(|v| **v == min) {
            *slot += 1;
        }
    }

    let [speed, defense, attack] = split;
    cur.attack += attack;
    cur.defense += defense;
    cur.speed += speed;
    cur.hp += HP_PER_LEVEL * level_up;
    Some(())
}
