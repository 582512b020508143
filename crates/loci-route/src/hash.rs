//! Deterministic key hashing for partition selection.

use sha2::{Digest, Sha256};

/// Maps a string key to a `u32` for modulo-based partition selection.
///
/// Implementations must be deterministic across calls and processes, and
/// approximately uniform over the `u32` range so the modulo does not
/// systematically favor one partition. A trait rather than a free function
/// so tests can observe (or suppress) invocations.
pub trait KeyHasher: Send + Sync {
    /// Hash a key to a non-negative 32-bit value.
    fn hash_key(&self, key: &str) -> u32;
}

/// SHA-256-based [`KeyHasher`]: the first 4 bytes of the digest,
/// interpreted big-endian.
///
/// A cryptographic hash avoids the clustering a simple string hash shows
/// for keys sharing prefixes (sequential sample ids, adjacent genomic
/// coordinates). This is not a per-request hot path, so the cost is
/// irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256KeyHasher;

impl KeyHasher for Sha256KeyHasher {
    fn hash_key(&self, key: &str) -> u32 {
        let digest = Sha256::digest(key.as_bytes());
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

/// Select a partition index from a hash: `hash mod shard_count`.
///
/// `shard_count` must be non-zero; the resolver guarantees this by
/// checking candidate availability before hashing.
pub fn shard_index(hash: u32, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0, "shard_count must be non-zero");
    (hash as usize) % shard_count
}
