//! Content digests and the pluggable hash function.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Digest size in bytes. Every supported algorithm produces 256-bit digests.
pub const HASH_SIZE: usize = 32;

/// A deterministic, collision-resistant digest function.
///
/// Implementations must be pure: the output depends only on `data`, and no
/// hashing state is shared between calls. The builder and resolver rely on
/// this for dedup and for safe concurrent use.
pub trait HashFunction: Send + Sync {
    /// Digest a byte slice.
    fn digest(&self, data: &[u8]) -> Hash;

    /// Stable name of the function (recorded in store configs).
    fn name(&self) -> &'static str;
}

/// Built-in hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// BLAKE3 with 256-bit output.
    #[default]
    Blake3,
    /// SHA-256.
    Sha256,
}

impl Algorithm {
    /// Returns the string representation of the algorithm (for config files).
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Blake3 => "blake3-256",
            Algorithm::Sha256 => "sha2-256",
        }
    }

    /// Parse algorithm from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blake3-256" => Ok(Algorithm::Blake3),
            "sha2-256" => Ok(Algorithm::Sha256),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }
}

impl HashFunction for Algorithm {
    fn digest(&self, data: &[u8]) -> Hash {
        match self {
            Algorithm::Blake3 => Hash(*blake3::hash(data).as_bytes()),
            Algorithm::Sha256 => {
                let mut out = [0u8; HASH_SIZE];
                out.copy_from_slice(&Sha256::digest(data));
                Hash(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

/// A 32-byte content digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a Hash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a Hash from a hex string (64 hex characters).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != HASH_SIZE * 2 {
            return Err(Error::invalid_hash(format!(
                "Expected {} hex characters, got {}",
                HASH_SIZE * 2,
                hex_str.len()
            )));
        }

        let mut hash = [0u8; HASH_SIZE];
        hex::decode_to_slice(hex_str, &mut hash)
            .map_err(|e| Error::invalid_hash(format!("Invalid hex: {}", e)))?;
        Ok(Hash(hash))
    }

    /// Convert to hex string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..6])
    }

    /// Get the first 2 hex characters (for directory sharding).
    pub fn prefix(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Get the remaining 62 hex characters (for filename).
    pub fn suffix(&self) -> String {
        hex::encode(&self.0[1..])
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty() {
        let hash = Algorithm::Blake3.digest(b"");
        assert_eq!(hash.to_hex().len(), 64);
    }

    #[test]
    fn test_blake3_hello_world() {
        let hash = Algorithm::Blake3.digest(b"hello world");
        assert_eq!(
            hash.to_hex(),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn test_sha256_hello_world() {
        let hash = Algorithm::Sha256.digest(b"hello world");
        assert_eq!(
            hash.to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_algorithms_disagree() {
        assert_ne!(
            Algorithm::Blake3.digest(b"same input"),
            Algorithm::Sha256.digest(b"same input")
        );
    }

    #[test]
    fn test_hash_from_hex_roundtrip() {
        let original = Algorithm::Blake3.digest(b"test data");
        let parsed = Hash::from_hex(&original.to_hex()).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_hash_from_hex_invalid() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("").is_err());
        assert!(Hash::from_hex(&"z".repeat(64)).is_err());
    }

    #[test]
    fn test_hash_prefix_suffix() {
        let hash = Algorithm::Blake3.digest(b"test");
        assert_eq!(hash.prefix().len(), 2);
        assert_eq!(hash.suffix().len(), 62);
        assert_eq!(format!("{}{}", hash.prefix(), hash.suffix()), hash.to_hex());
        assert!(hash.to_hex().starts_with(&hash.short_hex()));
    }

    #[test]
    fn test_hash_serializes_as_hex() {
        let hash = Algorithm::Blake3.digest(b"json");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
    }

    #[test]
    fn test_algorithm_names() {
        for algo in [Algorithm::Blake3, Algorithm::Sha256] {
            assert_eq!(Algorithm::parse(algo.as_str()).unwrap(), algo);
            assert_eq!(algo.name(), algo.as_str());
        }
        assert!(Algorithm::parse("md5").is_err());
        assert_eq!(Algorithm::default(), Algorithm::Blake3);
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Hashing the same data always produces the same hash
        #[test]
        fn prop_hash_deterministic(data: Vec<u8>) {
            for algo in [Algorithm::Blake3, Algorithm::Sha256] {
                prop_assert_eq!(algo.digest(&data), algo.digest(&data));
            }
        }

        /// Round-trip through hex preserves the hash
        #[test]
        fn prop_hex_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
            let hash = Hash::from_bytes(bytes);
            let parsed = Hash::from_hex(&hash.to_hex())?;
            prop_assert_eq!(hash, parsed);
        }

        /// Invalid hex length always fails
        #[test]
        fn prop_invalid_hex_length_fails(
            s in "[0-9a-f]{0,63}|[0-9a-f]{65,128}"
        ) {
            prop_assert!(Hash::from_hex(&s).is_err());
        }
    }
}
