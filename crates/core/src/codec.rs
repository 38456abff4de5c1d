//! Entity encoding
//!
//! Records are stored as MessagePack maps with named fields. Encoding is
//! deterministic for a given value, so the primary copy and every index copy
//! written in one commit are byte-identical.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value to stored bytes
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| Error::Codec(e.to_string()))
}

/// Decode stored bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::Codec(e.to_string()))
}
