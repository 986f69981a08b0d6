//! State Hashing for Verification
//!
//! Provides deterministic hashing of board state for:
//! - Replay validation (same seed + same moves = same hash)
//! - Regression tests on cascade determinism

use sha2::{Sha256, Digest};
use super::position::Position;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with helpers for engine types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for board state.
    pub fn for_board_state() -> Self {
        Self::new(b"MATCH3_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a grid position (row then column, as u32).
    #[inline]
    pub fn update_position(&mut self, value: Position) {
        self.update_u32(value.row as u32);
        self.update_u32(value.column as u32);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for replay verification.
///
/// Called by `Match3::compute_hash()`. The closure adds the
/// board-specific data after the seed and round counter.
pub fn compute_state_hash<F>(rng_seed: u64, round: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_board_state();

    // Always hash seed and round first
    hasher.update_u64(rng_seed);
    hasher.update_u32(round);

    add_state(&mut hasher);

    hasher.finalize()
}
