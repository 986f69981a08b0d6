//! Piece Definitions
//!
//! Common piece types, the special tier layered on top of them,
//! and the piece identity owned by the grid.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::position::Position;

// =============================================================================
// PIECE TYPE
// =============================================================================

/// A common piece type: an index into the configured piece pool.
///
/// Equality of base types is the only thing matching looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceType(pub u8);

impl PieceType {
    /// Pool index of this type.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SPECIAL KIND
// =============================================================================

/// Special tier a piece may carry on top of its base type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpecialKind {
    /// Clears its row
    Row = 0,
    /// Clears its column
    Column = 1,
    /// Clears a square area around itself
    Blast = 2,
    /// Clears every piece of its base type
    Colour = 3,
}

impl SpecialKind {
    /// All kinds, in promotion priority order.
    pub const ALL: [SpecialKind; 4] = [
        SpecialKind::Colour,
        SpecialKind::Blast,
        SpecialKind::Row,
        SpecialKind::Column,
    ];

    /// Single-character marker used by the textual grid form.
    pub fn marker(self) -> char {
        match self {
            SpecialKind::Row => 'r',
            SpecialKind::Column => 'c',
            SpecialKind::Blast => 'b',
            SpecialKind::Colour => '*',
        }
    }

    /// Inverse of [`SpecialKind::marker`].
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'r' => Some(SpecialKind::Row),
            'c' => Some(SpecialKind::Column),
            'b' => Some(SpecialKind::Blast),
            '*' => Some(SpecialKind::Colour),
            _ => None,
        }
    }
}

// =============================================================================
// PIECE
// =============================================================================

/// Monotonic piece identifier, stable while the piece lives on the grid.
///
/// Presentation layers key their sprites by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

/// A piece on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Identity
    pub id: PieceId,
    /// Base type (what matching compares)
    pub piece_type: PieceType,
    /// Grid coordinates; always equal to the owning cell's coordinates
    pub position: Position,
    /// Special tier, if promoted
    pub special: Option<SpecialKind>,
}

impl Piece {
    /// Create a plain piece.
    pub fn new(id: PieceId, piece_type: PieceType, position: Position) -> Self {
        Self {
            id,
            piece_type,
            position,
            special: None,
        }
    }

    /// True if the piece carries a special tier.
    #[inline]
    pub fn is_special(&self) -> bool {
        self.special.is_some()
    }
}
