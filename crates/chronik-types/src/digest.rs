use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::HistoryError;

/// The `prev_hash` of every world's first event: 64 zeros.
///
/// A published sentinel rather than a computed value, so any two conforming
/// implementations agree on where a chain starts.
pub const GENESIS_HASH: Digest = Digest([0u8; 32]);

/// A SHA-256 digest.
///
/// Digests identify event-chain links and snapshot checksums. On the wire
/// and in storage they are always 64 lowercase hexadecimal characters;
/// serde serialization uses that form directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Compute the SHA-256 digest of raw bytes.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create a digest from a pre-computed 32-byte hash.
    pub const fn from_raw(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Returns `true` if this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex representation (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, HistoryError> {
        let bytes =
            hex::decode(s).map_err(|e| HistoryError::Validation(format!("invalid hex: {e}")))?;
        if bytes.len() != 32 {
            return Err(HistoryError::Validation(format!(
                "digest must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_is_deterministic() {
        let d1 = Digest::of(b"hello world");
        let d2 = Digest::of(b"hello world");
        assert_eq!(d1, d2);
    }

    #[test]
    fn different_data_produces_different_digests() {
        assert_ne!(Digest::of(b"hello"), Digest::of(b"world"));
    }

    #[test]
    fn genesis_is_all_zeros() {
        assert!(GENESIS_HASH.is_genesis());
        assert_eq!(GENESIS_HASH.to_hex(), "0".repeat(64));
    }

    #[test]
    fn hex_roundtrip() {
        let d = Digest::of(b"test");
        let parsed = Digest::from_hex(&d.to_hex()).unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn display_is_64_lowercase_hex() {
        let shown = format!("{}", Digest::of(b"test"));
        assert_eq!(shown.len(), 64);
        assert_eq!(shown, shown.to_lowercase());
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(Digest::from_hex("abcd").is_err());
        assert!(Digest::from_hex("zz").is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let d = Digest::of(b"serde test");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
