//! Grid coordinates.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A cell coordinate, 0-indexed, row 0 at the top.
///
/// Ordering is row-major (row first, then column), which is the order
/// every deterministic scan in the engine uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row index (0 = top)
    pub row: usize,
    /// Column index (0 = left)
    pub column: usize,
}

impl Position {
    /// Create a position.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// True if the two positions share an edge.
    pub fn is_adjacent(self, other: Position) -> bool {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column) == 1
    }

    /// Position shifted by a signed offset, if it stays non-negative.
    pub fn offset(self, d_row: isize, d_column: isize) -> Option<Position> {
        let row = self.row.checked_add_signed(d_row)?;
        let column = self.column.checked_add_signed(d_column)?;
        Some(Position::new(row, column))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}
