//! Skill catalog and skill acquisition

use crate::transaction::Mutated;
use fable_core::model::{AcquiredSkill, Character};
use fable_core::DomainError;

/// Skill points spent per skill level
pub const SKILL_COST: u32 = 1;

/// A learnable skill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillDef {
    /// Catalog key, as stored on characters
    pub key: &'static str,
    /// Highest level, `None` if unbounded
    pub max_level: Option<u32>,
}

impl SkillDef {
    const fn capped(key: &'static str, max: u32) -> Self {
        Self {
            key,
            max_level: Some(max),
        }
    }

    const fn unbounded(key: &'static str) -> Self {
        Self {
            key,
            max_level: None,
        }
    }

    /// Check whether `level` is already the highest allowed
    pub fn is_maxed(&self, level: u32) -> bool {
        self.max_level.is_some_and(|max| level >= max)
    }
}

/// Every skill a character can learn
pub const SKILLS: &[SkillDef] = &[
    SkillDef::capped("crit", 3),
    SkillDef::unbounded("speed"),
    SkillDef::unbounded("defense"),
    SkillDef::unbounded("slow"),
    SkillDef::capped("enrage", 3),
    SkillDef::capped("heal", 3),
    SkillDef::capped("lifesteal", 3),
    SkillDef::capped("stun", 3),
    SkillDef::capped("chain", 1),
    SkillDef::capped("sneak", 1),
];

/// Look up a skill by key
pub fn find_skill(key: &str) -> Option<&'static SkillDef> {
    SKILLS.iter().find(|s| s.key == key)
}

/// Spend one skill point to learn `skill` or raise it by one level
///
/// Returns the skill's new level. Nothing changes on error.
///
/// # Errors
///
/// - `UnknownSkill` if `skill` is not in [`SKILLS`]
/// - `MaxLevel` if the skill is at its cap, whatever the point balance
/// - `InsufficientPoints` if the character has no point to spend
pub fn acquire_skill(
    character: &mut Character,
    skill: &str,
) -> Result<Mutated<AcquiredSkill>, DomainError> {
    let def = find_skill(skill).ok_or_else(|| DomainError::UnknownSkill(skill.to_string()))?;
    let combat = &mut character.combat;

    let current = combat.skills.get(def.key).map_or(0, |s| s.level);
    if def.is_maxed(current) {
        return Err(DomainError::MaxLevel {
            skill: def.key.to_string(),
            max: def.max_level.unwrap_or(current),
        });
    }

    if combat.skill_points < SKILL_COST {
        return Err(DomainError::InsufficientPoints {
            available: combat.skill_points,
            required: SKILL_COST,
        });
    }

    combat.skill_points -= SKILL_COST;
    let acquired = AcquiredSkill { level: current + 1 };
    combat.skills.insert(def.key.to_string(), acquired);

    Ok(Mutated::Changed(acquired))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(points: u32) -> Character {
        let mut c = Character::new("g1", "u1", "pack:a", "pack:m", 3);
        c.combat.skill_points = points;
        c.combat.level = 1;
        c
    }

    #[test]
    fn test_catalog_keys_are_unique() {
        for (i, a) in SKILLS.iter().enumerate() {
            assert!(SKILLS[i + 1..].iter().all(|b| b.key != a.key), "{}", a.key);
        }
    }

    #[test]
    fn test_first_acquire_starts_at_level_one() {
        let mut c = character(2);
        let acquired = acquire_skill(&mut c, "heal").unwrap();
        assert_eq!(acquired, Mutated::Changed(AcquiredSkill { level: 1 }));
        assert_eq!(c.combat.skill_points, 1);
    }

    #[test]
    fn test_acquire_raises_existing_level() {
        let mut c = character(2);
        c.combat.skills.insert("crit".into(), AcquiredSkill { level: 2 });
        acquire_skill(&mut c, "crit").unwrap();
        assert_eq!(c.combat.skills["crit"].level, 3);
        assert_eq!(c.combat.skill_points, 1);
    }

    #[test]
    fn test_maxed_rejected_even_with_points() {
        let mut c = character(999);
        c.combat.skills.insert("stun".into(), AcquiredSkill { level: 3 });
        let before = c.clone();

        let err = acquire_skill(&mut c, "stun").unwrap_err();
        assert_eq!(
            err,
            DomainError::MaxLevel {
                skill: "stun".into(),
                max: 3
            }
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_level_past_cap_reports_catalog_max() {
        let mut c = character(5);
        c.combat.skills.insert("crit".into(), AcquiredSkill { level: 7 });
        assert_eq!(
            acquire_skill(&mut c, "crit").unwrap_err(),
            DomainError::MaxLevel {
                skill: "crit".into(),
                max: 3
            }
        );
    }

    #[test]
    fn test_single_level_skill() {
        let mut c = character(5);
        acquire_skill(&mut c, "chain").unwrap();
        assert!(matches!(
            acquire_skill(&mut c, "chain"),
            Err(DomainError::MaxLevel { .. })
        ));
        assert_eq!(c.combat.skill_points, 4);
    }

    #[test]
    fn test_unbounded_skill_keeps_growing() {
        let mut c = character(50);
        for _ in 0..50 {
            acquire_skill(&mut c, "speed").unwrap();
        }
        assert_eq!(c.combat.skills["speed"].level, 50);
        assert_eq!(c.combat.skill_points, 0);
    }

    #[test]
    fn test_no_points_rejected() {
        let mut c = character(0);
        let before = c.clone();
        assert_eq!(
            acquire_skill(&mut c, "heal").unwrap_err(),
            DomainError::InsufficientPoints {
                available: 0,
                required: 1
            }
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_unknown_skill() {
        let mut c = character(3);
        assert_eq!(
            acquire_skill(&mut c, "fireball").unwrap_err(),
            DomainError::UnknownSkill("fireball".into())
        );
    }
}
