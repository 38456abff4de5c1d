//! Characters changing hands
//!
//! A trade swaps two lists of characters between two users of one guild.
//! A steal moves one character from its owner to the thief and pulls it out
//! of the victim's party. Both rewrite the character's owner, so the retry
//! driver moves its `by_inventory` entry in the same commit.

use chrono::{DateTime, Duration, Utc};
use fable_core::model::{Character, Inventory};
use fable_core::DomainError;

/// Exchange `give` (owned by `a`) for `take` (owned by `b`)
///
/// Every character is validated before any owner changes, so an error
/// leaves all of them untouched.
///
/// # Errors
///
/// - `CharacterNotOwned` if a character is not held by the expected side
/// - `CharacterInParty` if a character sits in its owner's party
pub fn trade_characters(
    a: &Inventory,
    b: &Inventory,
    give: &mut [Character],
    take: &mut [Character],
) -> Result<(), DomainError> {
    for (side, characters) in [(a, &*give), (b, &*take)] {
        for character in characters {
            if character.user_id != side.user_id {
                return Err(DomainError::CharacterNotOwned(character.character_id.clone()));
            }
        }
    }
    for (side, characters) in [(a, &*give), (b, &*take)] {
        if let Some(character) = characters
            .iter()
            .find(|c| side.party.position(&c.character_id).is_some())
        {
            return Err(DomainError::CharacterInParty(character.character_id.clone()));
        }
    }

    for character in give.iter_mut() {
        character.user_id = b.user_id.clone();
    }
    for character in take.iter_mut() {
        character.user_id = a.user_id.clone();
    }
    Ok(())
}

/// Start the thief's steal cooldown
///
/// # Errors
///
/// `StealOnCooldown` if the previous cooldown has not ended.
pub fn fail_steal(
    thief: &mut Inventory,
    cooldown_days: i64,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, DomainError> {
    if let Some(until) = thief.steal_timestamp.filter(|until| *until > now) {
        return Err(DomainError::StealOnCooldown(until));
    }
    let until = now + Duration::days(cooldown_days);
    thief.steal_timestamp = Some(until);
    Ok(until)
}

/// Move `character` from `victim` to `thief`
///
/// The character leaves the victim's party and the thief's cooldown
/// starts. Returns the end of the cooldown.
///
/// # Errors
///
/// - `StealOnCooldown` if the thief stole or failed too recently
/// - `CharacterNotOwned` if the victim does not own the character
pub fn steal_character(
    thief: &mut Inventory,
    victim: &mut Inventory,
    character: &mut Character,
    cooldown_days: i64,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, DomainError> {
    if character.user_id != victim.user_id {
        return Err(DomainError::CharacterNotOwned(character.character_id.clone()));
    }
    let until = fail_steal(thief, cooldown_days, now)?;

    character.user_id = thief.user_id.clone();
    victim.party.remove(&character.character_id);
    Ok(until)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn character(id: &str, owner: &str) -> Character {
        Character::new("g1", owner, id, "pack:show", 3)
    }

    #[test]
    fn test_trade_swaps_owners() {
        let a = Inventory::new("g1", "ua", 0, 0);
        let b = Inventory::new("g1", "ub", 0, 0);
        let mut give = vec![character("pack:x", "ua")];
        let mut take = vec![character("pack:y", "ub"), character("pack:z", "ub")];

        trade_characters(&a, &b, &mut give, &mut take).unwrap();
        assert_eq!(give[0].user_id, "ub");
        assert!(take.iter().all(|c| c.user_id == "ua"));
    }

    #[test]
    fn test_trade_rejects_party_member_without_changes() {
        let a = Inventory::new("g1", "ua", 0, 0);
        let mut b = Inventory::new("g1", "ub", 0, 0);
        b.party.set(4, Some("pack:y".into()));
        let mut give = vec![character("pack:x", "ua")];
        let mut take = vec![character("pack:y", "ub")];

        assert_eq!(
            trade_characters(&a, &b, &mut give, &mut take).unwrap_err(),
            DomainError::CharacterInParty("pack:y".into())
        );
        assert_eq!(give[0].user_id, "ua");
        assert_eq!(take[0].user_id, "ub");
    }

    #[test]
    fn test_trade_rejects_foreign_character() {
        let a = Inventory::new("g1", "ua", 0, 0);
        let b = Inventory::new("g1", "ub", 0, 0);
        let mut give = vec![character("pack:x", "uc")];

        assert_eq!(
            trade_characters(&a, &b, &mut give, &mut []).unwrap_err(),
            DomainError::CharacterNotOwned("pack:x".into())
        );
    }

    #[test]
    fn test_steal_moves_character_out_of_party() {
        let mut thief = Inventory::new("g1", "ua", 0, 0);
        let mut victim = Inventory::new("g1", "ub", 0, 0);
        victim.party.set(2, Some("pack:y".into()));
        let mut target = character("pack:y", "ub");

        let until = steal_character(&mut thief, &mut victim, &mut target, 3, now()).unwrap();
        assert_eq!(until, now() + Duration::days(3));
        assert_eq!(target.user_id, "ua");
        assert_eq!(victim.party.get(2), None);
        assert_eq!(thief.steal_timestamp, Some(until));
    }

    #[test]
    fn test_steal_on_cooldown_changes_nothing() {
        let mut thief = Inventory::new("g1", "ua", 0, 0);
        fail_steal(&mut thief, 3, now()).unwrap();
        let mut victim = Inventory::new("g1", "ub", 0, 0);
        let mut target = character("pack:y", "ub");

        let later = now() + Duration::days(1);
        assert_eq!(
            steal_character(&mut thief, &mut victim, &mut target, 3, later).unwrap_err(),
            DomainError::StealOnCooldown(now() + Duration::days(3))
        );
        assert_eq!(target.user_id, "ub");

        let after = now() + Duration::days(3);
        assert!(steal_character(&mut thief, &mut victim, &mut target, 3, after).is_ok());
    }

    #[test]
    fn test_steal_from_wrong_victim() {
        let mut thief = Inventory::new("g1", "ua", 0, 0);
        let mut victim = Inventory::new("g1", "ub", 0, 0);
        let mut target = character("pack:y", "uc");
        assert_eq!(
            steal_character(&mut thief, &mut victim, &mut target, 3, now()).unwrap_err(),
            DomainError::CharacterNotOwned("pack:y".into())
        );
        assert_eq!(thief.steal_timestamp, None);
    }
}
