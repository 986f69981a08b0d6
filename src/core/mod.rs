//! Core deterministic primitives.
//!
//! Everything the rules engine builds on: coordinates, the seeded RNG
//! and state hashing for replay verification.

pub mod position;
pub mod rng;
pub mod hash;

// Re-export core types
pub use position::Position;
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
