//! Party slot assignment

use crate::transaction::Mutated;
use fable_core::model::{Character, Inventory, PARTY_SIZE};
use fable_core::DomainError;

fn validate_spot(spot: u8) -> Result<usize, DomainError> {
    let idx = usize::from(spot);
    if (1..=PARTY_SIZE).contains(&idx) {
        Ok(idx)
    } else {
        Err(DomainError::InvalidPartySpot(spot))
    }
}

/// Place `character` in the inventory's party
///
/// The character is first removed from whichever slot holds it. It then
/// goes to `spot` if given, otherwise to the first open slot, otherwise to
/// the last slot, replacing its occupant. Returns the slot used.
///
/// # Errors
///
/// - `InvalidPartySpot` if `spot` is outside `1..=5`
/// - `CharacterNotOwned` if the character belongs to another user or guild
pub fn assign_party_spot(
    inventory: &mut Inventory,
    character: &Character,
    spot: Option<u8>,
) -> Result<Mutated<u8>, DomainError> {
    let requested = spot.map(validate_spot).transpose()?;

    if character.user_id != inventory.user_id || character.guild_id != inventory.guild_id {
        return Err(DomainError::CharacterNotOwned(character.character_id.clone()));
    }

    let before = inventory.party.clone();
    inventory.party.remove(&character.character_id);

    let target = requested
        .or_else(|| inventory.party.first_open())
        .unwrap_or(PARTY_SIZE);
    inventory
        .party
        .set(target, Some(character.character_id.clone()));

    // PARTY_SIZE fits in a u8
    let slot = target as u8;
    if inventory.party == before {
        Ok(Mutated::Unchanged(slot))
    } else {
        Ok(Mutated::Changed(slot))
    }
}

/// Exchange the occupants of two slots
pub fn swap_party_spots(inventory: &mut Inventory, a: u8, b: u8) -> Result<Mutated<()>, DomainError> {
    let a = validate_spot(a)?;
    let b = validate_spot(b)?;
    if a == b || inventory.party.get(a) == inventory.party.get(b) {
        return Ok(Mutated::Unchanged(()));
    }
    inventory.party.swap(a, b);
    Ok(Mutated::Changed(()))
}

/// Empty a slot, returning the character that held it
pub fn unassign_party_spot(
    inventory: &mut Inventory,
    spot: u8,
) -> Result<Mutated<Option<String>>, DomainError> {
    let spot = validate_spot(spot)?;
    match inventory.party.set(spot, None) {
        Some(previous) => Ok(Mutated::Changed(Some(previous))),
        None => Ok(Mutated::Unchanged(None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory {
        Inventory::new("g1", "u1", 5, 5)
    }

    fn character(id: &str) -> Character {
        Character::new("g1", "u1", id, "pack:m", 3)
    }

    #[test]
    fn test_assign_to_first_open() {
        let mut inv = inventory();
        assert_eq!(
            assign_party_spot(&mut inv, &character("a"), None).unwrap(),
            Mutated::Changed(1)
        );
        assert_eq!(
            assign_party_spot(&mut inv, &character("b"), None).unwrap(),
            Mutated::Changed(2)
        );
    }

    #[test]
    fn test_move_between_spots() {
        let mut inv = inventory();
        let c = character("a");
        assign_party_spot(&mut inv, &c, Some(2)).unwrap();
        assign_party_spot(&mut inv, &c, Some(4)).unwrap();

        assert_eq!(inv.party.get(2), None);
        assert_eq!(inv.party.get(4), Some("a"));
        assert_eq!(inv.party.members().iter().flatten().count(), 1);
    }

    #[test]
    fn test_full_party_overwrites_last_spot() {
        let mut inv = inventory();
        for id in ["a", "b", "c", "d", "e"] {
            assign_party_spot(&mut inv, &character(id), None).unwrap();
        }
        assert_eq!(
            assign_party_spot(&mut inv, &character("f"), None).unwrap(),
            Mutated::Changed(5)
        );
        assert_eq!(inv.party.get(5), Some("f"));
        assert_eq!(inv.party.position("e"), None);
    }

    #[test]
    fn test_reassign_same_spot_is_unchanged() {
        let mut inv = inventory();
        let c = character("a");
        assign_party_spot(&mut inv, &c, Some(3)).unwrap();
        assert_eq!(
            assign_party_spot(&mut inv, &c, Some(3)).unwrap(),
            Mutated::Unchanged(3)
        );
    }

    #[test]
    fn test_foreign_character_rejected() {
        let mut inv = inventory();
        let other = Character::new("g1", "u2", "x", "pack:m", 3);
        assert_eq!(
            assign_party_spot(&mut inv, &other, None).unwrap_err(),
            DomainError::CharacterNotOwned("x".into())
        );
    }

    #[test]
    fn test_invalid_spots() {
        let mut inv = inventory();
        let c = character("a");
        for spot in [0u8, 6, 255] {
            assert_eq!(
                assign_party_spot(&mut inv, &c, Some(spot)).unwrap_err(),
                DomainError::InvalidPartySpot(spot)
            );
        }
        assert!(swap_party_spots(&mut inv, 1, 6).is_err());
        assert!(unassign_party_spot(&mut inv, 0).is_err());
    }

    #[test]
    fn test_swap_and_unassign() {
        let mut inv = inventory();
        assign_party_spot(&mut inv, &character("a"), Some(1)).unwrap();
        assign_party_spot(&mut inv, &character("b"), Some(5)).unwrap();

        assert!(swap_party_spots(&mut inv, 1, 5).unwrap().is_changed());
        assert_eq!(inv.party.get(1), Some("b"));
        assert_eq!(inv.party.get(5), Some("a"));

        assert_eq!(
            unassign_party_spot(&mut inv, 5).unwrap(),
            Mutated::Changed(Some("a".to_string()))
        );
        assert_eq!(unassign_party_spot(&mut inv, 5).unwrap(), Mutated::Unchanged(None));
        assert!(!swap_party_spots(&mut inv, 2, 3).unwrap().is_changed());
    }
}
