//! Version tokens for optimistic concurrency
//!
//! A [`VersionToken`] is issued by a store on every read and captures the
//! exact stored version of one record. A transaction registers the token it
//! read with `check`; the store rejects the whole commit if the record has
//! been written since.
//!
//! Tokens are opaque to callers. Backends decide what the inner number means:
//! the KV backend uses a global commit versionstamp, the document backend a
//! per-document revision. Tokens from different keys are not comparable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque marker of a record's state at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(u64);

impl VersionToken {
    /// Wrap a backend-assigned version
    ///
    /// Only store backends should construct tokens.
    pub const fn from_raw(raw: u64) -> Self {
        VersionToken(raw)
    }

    /// Backend-assigned version
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:020x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(VersionToken::from_raw(255).to_string(), "000000000000000000ff");
    }

    #[test]
    fn test_round_trip_raw() {
        let token = VersionToken::from_raw(42);
        assert_eq!(token.as_raw(), 42);
        assert_eq!(token, VersionToken::from_raw(42));
        assert_ne!(token, VersionToken::from_raw(43));
    }
}
