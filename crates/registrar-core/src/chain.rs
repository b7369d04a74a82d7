//! Chain hashing: binding each entry to its predecessor.
//!
//! Chain-hash values serialize as strings: either the 64-char lowercase
//! hex SHA-256 digest of the preceding link, or the genesis sentinel.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Sha256Hash;

/// Sentinel standing in for "no predecessor" at the first entry.
///
/// Deliberately not a hex string, so it can never collide with a real
/// digest output.
pub const GENESIS_SENTINEL: &str = "registrar/genesis/v1";

/// The hash-chain value of a ledger position.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainHash {
    /// No predecessor: the first entry of the ledger.
    Genesis,
    /// Digest binding an entry to its predecessor.
    Link(Sha256Hash),
}

impl ChainHash {
    /// Compute the chain hash from the previous link and the entry's
    /// canonical bytes.
    ///
    /// The previous link enters the digest in its string form (hex or
    /// sentinel), followed by the canonical bytes. Total for well-formed
    /// input; no failure modes.
    pub fn compute(prev: &ChainHash, canonical: &[u8]) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(prev.to_string().as_bytes());
        hasher.update(canonical);
        Sha256Hash(hasher.finalize().into())
    }

    /// Whether this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        matches!(self, ChainHash::Genesis)
    }

    /// The digest, if this is a real link.
    pub fn digest(&self) -> Option<&Sha256Hash> {
        match self {
            ChainHash::Genesis => None,
            ChainHash::Link(hash) => Some(hash),
        }
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainHash::Genesis => write!(f, "{}", GENESIS_SENTINEL),
            ChainHash::Link(hash) => write!(f, "{}", hash.to_hex()),
        }
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainHash::Genesis => write!(f, "ChainHash(genesis)"),
            ChainHash::Link(hash) => write!(f, "ChainHash({}...)", &hash.to_hex()[..16]),
        }
    }
}

impl FromStr for ChainHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == GENESIS_SENTINEL {
            Ok(ChainHash::Genesis)
        } else {
            Sha256Hash::from_hex(s).map(ChainHash::Link)
        }
    }
}

impl From<Sha256Hash> for ChainHash {
    fn from(hash: Sha256Hash) -> Self {
        ChainHash::Link(hash)
    }
}

impl Serialize for ChainHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_deterministic() {
        let h1 = ChainHash::compute(&ChainHash::Genesis, b"entry bytes");
        let h2 = ChainHash::compute(&ChainHash::Genesis, b"entry bytes");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_compute_depends_on_prev() {
        let canonical = b"same canonical bytes";
        let from_genesis = ChainHash::compute(&ChainHash::Genesis, canonical);
        let prev = ChainHash::Link(Sha256Hash::hash(b"predecessor"));
        let from_link = ChainHash::compute(&prev, canonical);
        assert_ne!(from_genesis, from_link);
    }

    #[test]
    fn test_sentinel_is_not_hex() {
        // The sentinel must be unparseable as a digest.
        assert!(Sha256Hash::from_hex(GENESIS_SENTINEL).is_err());
    }

    #[test]
    fn test_string_roundtrip() {
        let genesis: ChainHash = GENESIS_SENTINEL.parse().unwrap();
        assert!(genesis.is_genesis());

        let link = ChainHash::Link(Sha256Hash::hash(b"link"));
        let recovered: ChainHash = link.to_string().parse().unwrap();
        assert_eq!(link, recovered);
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&ChainHash::Genesis).unwrap();
        assert_eq!(json, format!("\"{}\"", GENESIS_SENTINEL));

        let link = ChainHash::Link(Sha256Hash::hash(b"x"));
        let json = serde_json::to_string(&link).unwrap();
        let recovered: ChainHash = serde_json::from_str(&json).unwrap();
        assert_eq!(link, recovered);
    }
}
