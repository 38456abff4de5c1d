//! Character nickname and image

use crate::transaction::Mutated;
use fable_core::model::Character;
use fable_core::DomainError;

/// Reject callers other than the owning user
///
/// # Errors
///
/// `CharacterNotOwned` if `user_id` does not own the character.
pub fn ensure_owner(character: &Character, user_id: &str) -> Result<(), DomainError> {
    if character.user_id != user_id {
        return Err(DomainError::CharacterNotOwned(character.character_id.clone()));
    }
    Ok(())
}

/// Set or clear the nickname
pub fn set_nickname(
    character: &mut Character,
    user_id: &str,
    nickname: Option<String>,
) -> Result<Mutated<()>, DomainError> {
    ensure_owner(character, user_id)?;
    if character.nickname == nickname {
        return Ok(Mutated::Unchanged(()));
    }
    character.nickname = nickname;
    Ok(Mutated::Changed(()))
}

/// Set or clear the image url
pub fn set_image(
    character: &mut Character,
    user_id: &str,
    image: Option<String>,
) -> Result<Mutated<()>, DomainError> {
    ensure_owner(character, user_id)?;
    if character.image == image {
        return Ok(Mutated::Unchanged(()));
    }
    character.image = image;
    Ok(Mutated::Changed(()))
}
