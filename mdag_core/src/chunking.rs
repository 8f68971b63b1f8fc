//! Fixed-size chunking of oversized file content.

use crate::error::{Error, Result};

/// Default chunk threshold: 256 KiB.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 256 * 1024;

/// Configuration for the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum chunk size in bytes. Content at or below this size is never split.
    pub threshold: usize,
}

impl ChunkerConfig {
    /// Create a config with the given threshold (must be non-zero).
    pub fn new(threshold: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(Error::invalid_config("Chunk threshold must be > 0"));
        }
        Ok(Self { threshold })
    }

    /// Whether content of `len` bytes has to be split into a list.
    pub fn needs_split(&self, len: usize) -> bool {
        len > self.threshold
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CHUNK_THRESHOLD,
        }
    }
}

/// Split `data` into consecutive ranges of at most `threshold` bytes.
///
/// Only the last range may be shorter than `threshold`. Empty input yields a
/// single empty range.
pub fn split(data: &[u8], threshold: usize) -> Result<Vec<&[u8]>> {
    if threshold == 0 {
        return Err(Error::invalid_config("Chunk threshold must be > 0"));
    }

    if data.is_empty() {
        return Ok(vec![data]);
    }

    Ok(data.chunks(threshold).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_boundary() {
        let chunks = split(b"ABCDEFGHI", 4).unwrap();
        assert_eq!(chunks, vec![&b"ABCD"[..], &b"EFGH"[..], &b"I"[..]]);
    }

    #[test]
    fn test_split_exact_multiple() {
        let chunks = split(b"ABCDEFGH", 4).unwrap();
        assert_eq!(chunks, vec![&b"ABCD"[..], &b"EFGH"[..]]);
    }

    #[test]
    fn test_split_small_input() {
        let chunks = split(b"AB", 4).unwrap();
        assert_eq!(chunks, vec![&b"AB"[..]]);
    }

    #[test]
    fn test_split_empty_input() {
        let chunks = split(b"", 4).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
    }

    #[test]
    fn test_split_zero_threshold() {
        assert!(split(b"abc", 0).is_err());
        assert!(ChunkerConfig::new(0).is_err());
    }

    #[test]
    fn test_needs_split() {
        let config = ChunkerConfig::new(4).unwrap();
        assert!(!config.needs_split(0));
        assert!(!config.needs_split(4));
        assert!(config.needs_split(5));
        assert_eq!(ChunkerConfig::default().threshold, 262_144);
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Concatenating the chunks reproduces the input
        #[test]
        fn prop_split_concat(data in prop::collection::vec(any::<u8>(), 0..4096), threshold in 1usize..512) {
            let chunks = split(&data, threshold)?;
            prop_assert_eq!(chunks.concat(), data);
        }

        /// Every chunk is bounded and only the last may be short
        #[test]
        fn prop_split_bounds(data in prop::collection::vec(any::<u8>(), 1..4096), threshold in 1usize..512) {
            let chunks = split(&data, threshold)?;
            let (last, rest) = chunks.split_last().unwrap();
            prop_assert!(!last.is_empty() && last.len() <= threshold);
            for chunk in rest {
                prop_assert_eq!(chunk.len(), threshold);
            }
            prop_assert_eq!(chunks.len(), data.len().div_ceil(threshold));
        }
    }
}
