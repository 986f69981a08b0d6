//! Game Logic Module
//!
//! All rules code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `piece`: Piece types, special kinds, identities
//! - `grid`: Board storage and text form
//! - `config`: Session configuration and weighted pool
//! - `matching`: Match detection and refill exclusion
//! - `gravity`: Column compaction, refill, initial population
//! - `special`: Special zones, chains and promotion
//! - `stats`: Scoring and session totals
//! - `state`: The `Match3` session
//! - `process`: Cascade sequencer
//! - `actions`: Swaps, taps and hints
//! - `events`: Game events for presentation/replay

pub mod piece;
pub mod grid;
pub mod config;
pub mod matching;
pub mod gravity;
pub mod special;
pub mod stats;
pub mod state;
pub mod process;
pub mod actions;
pub mod events;

// Re-export key types
pub use piece::{Piece, PieceId, PieceType, SpecialKind};
pub use grid::{Grid, GridParseError};
pub use config::{ConfigError, Match3Config, Mode, RefillPolicy};
pub use matching::{find_matches, MatchGroup};
pub use state::{GamePhase, Match3};
pub use process::{ProcessStep, StepReport};
pub use actions::MoveResult;
pub use events::{GameEvent, GameEventData};
