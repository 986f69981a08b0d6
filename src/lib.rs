//! # Match-3 Cascade Engine
//!
//! Deterministic rules engine for a match-3 board: matching, special
//! pieces, gravity, refill and the cascade sequencer that ties them
//! together, with an async bridge for presentation layers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MATCH-3 ENGINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── position.rs - Grid coordinates                          │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Rules (deterministic)                     │
//! │  ├── grid.rs     - Board storage                             │
//! │  ├── matching.rs - Match detection                           │
//! │  ├── gravity.rs  - Gravity, refill, setup                    │
//! │  ├── special.rs  - Special zones and chains                  │
//! │  ├── stats.rs    - Scoring                                   │
//! │  ├── process.rs  - Cascade sequencer                         │
//! │  └── actions.rs  - Swaps and taps                            │
//! │                                                              │
//! │  present.rs      - Async presentation bridge (tokio)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in rules code
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and the same moves, a session produces the same
//! grid, the same events and the same state hash.
//!
//! ## Example
//!
//! ```
//! use match3::{Match3, Match3Config};
//! use match3::game::process;
//!
//! let mut game = Match3::new(Match3Config::default(), 7).unwrap();
//! game.start_playing();
//! if let Some((from, to)) = game.find_hint() {
//!     assert!(game.try_move(from, to).valid);
//!     process::run_to_completion(&mut game);
//! }
//! assert!(!game.is_processing());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod present;

// Re-export commonly used types
pub use core::position::Position;
pub use core::rng::DeterministicRng;
pub use game::config::{ConfigError, Match3Config, Mode};
pub use game::events::{GameEvent, GameEventData};
pub use game::state::{GamePhase, Match3};
pub use game::actions::MoveResult;
pub use present::{Ack, Presenter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
