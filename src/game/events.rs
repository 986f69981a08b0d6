//! Game Events
//!
//! Everything the presentation layer animates or the HUD shows is reported
//! as an event, stamped with the process round it happened in (0 outside
//! a cascade). Events are emitted in the exact order the grid changed.

use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::game::piece::{PieceId, PieceType, SpecialKind};
use crate::game::special::ActivationCause;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player attempted a swap
    Moved {
        from: Position,
        to: Position,
        valid: bool,
    },

    /// Matches found at the start of a round and scored
    Matched {
        matches: Vec<Vec<Position>>,
        combo: u32,
        points: u32,
    },

    /// A special fired
    SpecialActivated {
        position: Position,
        kind: SpecialKind,
        cause: ActivationCause,
    },

    /// A piece left the board
    Popped {
        piece_id: PieceId,
        piece_type: PieceType,
        position: Position,
        combo: u32,
        is_special: bool,
        caused_by_special: bool,
    },

    /// A matched piece was upgraded in place instead of popping
    Promoted {
        piece_id: PieceId,
        piece_type: PieceType,
        position: Position,
        kind: SpecialKind,
    },

    /// A piece fell
    Fell {
        piece_id: PieceId,
        from: Position,
        to: Position,
    },

    /// A new piece entered the board
    Spawned {
        piece_id: PieceId,
        piece_type: PieceType,
        position: Position,
    },

    /// Cascade began
    ProcessStarted,

    /// Cascade reached a stable grid (or was ended)
    ProcessComplete {
        rounds: u32,
    },
}

/// A game event with its round stamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Process round (combo level) when it happened
    pub round: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(round: u32, data: GameEventData) -> Self {
        Self { round, data }
    }

    /// Create move event.
    pub fn moved(from: Position, to: Position, valid: bool) -> Self {
        Self::new(0, GameEventData::Moved { from, to, valid })
    }

    /// Create matched event.
    pub fn matched(round: u32, matches: Vec<Vec<Position>>, points: u32) -> Self {
        Self::new(
            round,
            GameEventData::Matched {
                matches,
                combo: round,
                points,
            },
        )
    }

    /// Create special activated event.
    pub fn special_activated(
        round: u32,
        position: Position,
        kind: SpecialKind,
        cause: ActivationCause,
    ) -> Self {
        Self::new(round, GameEventData::SpecialActivated { position, kind, cause })
    }

    /// Create popped event.
    pub fn popped(
        round: u32,
        piece_id: PieceId,
        piece_type: PieceType,
        position: Position,
        is_special: bool,
        caused_by_special: bool,
    ) -> Self {
        Self::new(
            round,
            GameEventData::Popped {
                piece_id,
                piece_type,
                position,
                combo: round,
                is_special,
                caused_by_special,
            },
        )
    }

    /// Create promoted event.
    pub fn promoted(
        round: u32,
        piece_id: PieceId,
        piece_type: PieceType,
        position: Position,
        kind: SpecialKind,
    ) -> Self {
        Self::new(round, GameEventData::Promoted { piece_id, piece_type, position, kind })
    }

    /// Create fell event.
    pub fn fell(round: u32, piece_id: PieceId, from: Position, to: Position) -> Self {
        Self::new(round, GameEventData::Fell { piece_id, from, to })
    }

    /// Create spawned event.
    pub fn spawned(round: u32, piece_id: PieceId, piece_type: PieceType, position: Position) -> Self {
        Self::new(round, GameEventData::Spawned { piece_id, piece_type, position })
    }

    /// Create process complete event.
    pub fn process_complete(rounds: u32) -> Self {
        Self::new(rounds, GameEventData::ProcessComplete { rounds })
    }

    /// True for pop events.
    pub fn is_pop(&self) -> bool {
        matches!(self.data, GameEventData::Popped { .. })
    }
}
