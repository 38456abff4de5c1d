//! Error types for FableDB
//!
//! Errors fall into four families:
//!
//! | Family | Variants | Retried by the driver |
//! |--------|----------|-----------------------|
//! | Not found | [`Error::NotFound`] | no |
//! | Domain validation | [`Error::Domain`] | no |
//! | Contention | [`Error::Conflict`], [`Error::TransactionExhausted`] | conflict only |
//! | Infrastructure | codec, closed store, config, I/O, internal | no |
//!
//! [`Error::Conflict`] never reaches callers of the engine: the retry driver
//! absorbs it and either commits on a later attempt or reports
//! [`Error::TransactionExhausted`]. That split lets callers tell
//! "you can't do this" ([`DomainError`]) apart from "try again later".
//!
//! We use `thiserror` for `Display` and `Error` implementations.

use crate::types::{EntityKind, Key};
use chrono::{DateTime, Utc};
use std::io;
use thiserror::Error;

/// Result type alias for FableDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for every layer of FableDB
#[derive(Debug, Error)]
pub enum Error {
    /// A required entity was absent at read time
    #[error("Entity not found: {key}")]
    NotFound {
        /// Key that was read
        key: Key,
    },

    /// A business rule rejected the mutation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A version check failed at commit time
    ///
    /// Only produced inside the retry driver.
    #[error("Version conflict on {key}")]
    Conflict {
        /// First key whose check failed
        key: Key,
    },

    /// Every attempt of a mutation lost a version race
    #[error("Transaction on {key} exhausted after {attempts} attempts")]
    TransactionExhausted {
        /// Lookup key of the mutation
        key: Key,
        /// Attempts made (equal to the configured bound)
        attempts: usize,
    },

    /// Create was called for a key that already holds a record
    #[error("Entity already exists: {key}")]
    AlreadyExists {
        /// Primary key of the entity
        key: Key,
    },

    /// A mutation changed the entity's scope or id
    ///
    /// Secondary index entries follow the entity; the primary key does not.
    #[error("Mutation of {key} would move it to {to}")]
    KeyChanged {
        /// Primary key the entity was read from
        key: Key,
        /// Primary key of the mutated entity
        to: Key,
    },

    /// Stored bytes could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// The store was closed before the operation
    #[error("Store is closed")]
    Closed,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Conflicts are the only retryable kind
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Check if this is a business-rule rejection
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain(_))
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Entity kind of a not-found key
    ///
    /// Lets callers distinguish "character not found" from "inventory not
    /// found" without matching on the key shape.
    pub fn not_found_kind(&self) -> Option<EntityKind> {
        match self {
            Error::NotFound { key } => Some(key.kind()),
            _ => None,
        }
    }

    /// Borrow the domain error, if this is one
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Error::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Business-rule violations raised by entity mutators
///
/// Mutators are pure, so these are never retried: re-reading the same state
/// would produce the same verdict. When the state did change, the next
/// user action re-validates against fresh data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Not enough unclaimed skill points
    #[error("Not enough skill points: have {available}, need {required}")]
    InsufficientPoints {
        /// Points on the character
        available: u32,
        /// Points the skill costs
        required: u32,
    },

    /// Skill already at its maximum level
    #[error("Skill {skill} is already at max level {max}")]
    MaxLevel {
        /// Skill key
        skill: String,
        /// Maximum level of the skill
        max: u32,
    },

    /// Skill key is not in the catalog
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// Key balance below the requested amount
    #[error("Not enough keys: have {available}, requested {requested}")]
    NoKeysAvailable {
        /// Keys in the inventory
        available: u32,
        /// Keys requested
        requested: u32,
    },

    /// No sweeps left, or no floor cleared yet
    #[error("No sweeps available")]
    NoSweepsAvailable,

    /// Character belongs to another user
    #[error("Character {0} is not owned by this user")]
    CharacterNotOwned(String),

    /// Party spots are numbered 1 through 5
    #[error("Invalid party spot {0}, expected 1..=5")]
    InvalidPartySpot(u8),

    /// Combat stats must be initialized first
    #[error("Combat stats of {0} are not initialized")]
    StatsNotInitialized(String),

    /// Pack already installed in the guild
    #[error("Pack {0} is already installed")]
    PackAlreadyInstalled(String),

    /// Pack not installed in the guild
    #[error("Pack {0} is not installed")]
    PackNotInstalled(String),

    /// Ratings go from 1 to 5 stars
    #[error("Invalid rating {0}, expected 1..=5")]
    InvalidRating(u8),

    /// Not enough vote tokens
    #[error("Not enough tokens: have {available}, need {required}")]
    InsufficientTokens {
        /// Tokens on the user
        available: u32,
        /// Tokens the purchase costs
        required: u32,
    },

    /// Guarantees exist for 3, 4 and 5 star pulls only
    #[error("Invalid guarantee {0}, expected 3..=5")]
    InvalidGuarantee(u8),

    /// Characters in a party cannot change hands
    #[error("Character {0} is in a party")]
    CharacterInParty(String),

    /// Steals need a steal cooldown to have passed
    #[error("Steal on cooldown until {0}")]
    StealOnCooldown(DateTime<Utc>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Key {
        Key::primary(EntityKind::Character, "guild", "pack:alice")
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound { key: key() };
        let msg = err.to_string();
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("pack:alice"));
    }

    #[test]
    fn test_error_display_exhausted() {
        let err = Error::TransactionExhausted {
            key: key(),
            attempts: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("exhausted"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: Error = DomainError::InsufficientPoints {
            available: 0,
            required: 1,
        }
        .into();
        assert_eq!(err.to_string(), "Not enough skill points: have 0, need 1");
        assert!(err.is_domain());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(Error::Conflict { key: key() }.is_retryable());
        assert!(!Error::NotFound { key: key() }.is_retryable());
        assert!(!Error::TransactionExhausted {
            key: key(),
            attempts: 1
        }
        .is_retryable());
        assert!(!Error::Closed.is_retryable());
    }

    #[test]
    fn test_not_found_kind() {
        let err = Error::NotFound { key: key() };
        assert!(err.is_not_found());
        assert_eq!(err.not_found_kind(), Some(EntityKind::Character));
        assert_eq!(Error::Closed.not_found_kind(), None);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_internal_is_not_retryable() {
        let err = Error::Internal("stripe 3 was not locked".into());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("stripe 3"));
    }

    #[test]
    fn test_as_domain() {
        let err: Error = DomainError::NoSweepsAvailable.into();
        assert_eq!(err.as_domain(), Some(&DomainError::NoSweepsAvailable));
        assert_eq!(Error::Closed.as_domain(), None);
    }
}
