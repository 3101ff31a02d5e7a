//! Deterministic random-stream partitioning.
//!
//! A master seed is expanded into one sub-seed per block of trials via
//! BLAKE3, so every block draws from its own stream and the simulated sample
//! depends only on `(master_seed, block_index)`, never on which worker thread
//! ran the block or in which order.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Domain separator mixed into every sub-seed.
const STREAM_TAG: &[u8] = b"recovery-trial-block";

/// Build a generator from an optional seed, falling back to OS entropy.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Master seed plus per-block sub-stream derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for one block of trials. Independent of derivation order.
    pub fn block_seed(&self, block_index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(STREAM_TAG);
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(&block_index.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for_block(&self, block_index: u64) -> StdRng {
        StdRng::seed_from_u64(self.block_seed(block_index))
    }
}
