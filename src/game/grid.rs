//! Grid Model
//!
//! Row-major `rows x columns` array of cells, each empty or holding a piece.
//! Every mutation goes through this type so a piece's stored position always
//! equals the coordinates of the cell that owns it.
//!
//! Out-of-bounds access is a caller bug and panics.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::position::Position;
use crate::game::piece::{Piece, PieceId, PieceType, SpecialKind};

/// The board's cell storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Option<Piece>>,
    /// Next piece ID (monotonic counter)
    next_piece_id: u32,
}

impl Grid {
    /// Create an all-empty grid.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![None; rows * columns],
            next_piece_id: 0,
        }
    }

    /// `(rows, columns)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// True if `pos` lies inside the grid.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.column < self.columns
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position {} outside {}x{} grid",
            pos,
            self.rows,
            self.columns
        );
        pos.row * self.columns + pos.column
    }

    /// Piece at `pos`, if any.
    #[inline]
    pub fn get(&self, pos: Position) -> Option<&Piece> {
        self.cells[self.index(pos)].as_ref()
    }

    /// Mutable piece at `pos`, if any. The position field must not be edited.
    #[inline]
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Piece> {
        let idx = self.index(pos);
        self.cells[idx].as_mut()
    }

    /// Base type at `pos`, ignoring any special marker.
    #[inline]
    pub fn base_type(&self, pos: Position) -> Option<PieceType> {
        self.get(pos).map(|p| p.piece_type)
    }

    /// Replace the content of a cell, re-stamping the piece position.
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        let idx = self.index(pos);
        self.cells[idx] = piece.map(|mut p| {
            p.position = pos;
            p
        });
    }

    /// Remove and return the piece at `pos`.
    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        let idx = self.index(pos);
        self.cells[idx].take()
    }

    /// True if the cell holds no piece.
    #[inline]
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// Create a fresh piece at `pos` (overwriting whatever was there).
    pub fn spawn(&mut self, pos: Position, piece_type: PieceType) -> PieceId {
        let id = PieceId(self.next_piece_id);
        self.next_piece_id += 1;
        self.set(pos, Some(Piece::new(id, piece_type, pos)));
        id
    }

    /// Exchange the contents of two cells.
    pub fn swap(&mut self, a: Position, b: Position) {
        let piece_a = self.take(a);
        let piece_b = self.take(b);
        self.set(a, piece_b);
        self.set(b, piece_a);
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.columns).map(move |column| Position::new(row, column)))
    }

    /// All pieces in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.cells.iter().flatten()
    }

    /// True if no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

// =============================================================================
// TEXT FORM
// =============================================================================

/// One token per cell: the type index, an optional special marker, `.` when empty.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for column in 0..self.columns {
                if column > 0 {
                    f.write_str(" ")?;
                }
                match self.get(Position::new(row, column)) {
                    None => f.write_str(".")?,
                    Some(piece) => {
                        write!(f, "{}", piece.piece_type)?;
                        if let Some(kind) = piece.special {
                            write!(f, "{}", kind.marker())?;
                        }
                    }
                }
            }
            if row + 1 < self.rows {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

/// Errors from parsing the textual grid form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridParseError {
    /// No rows at all.
    #[error("grid text is empty")]
    Empty,

    /// A row with a different width than the first.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Offending row
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of this row
        found: usize,
    },

    /// A token that is neither `.` nor a type index with optional marker.
    #[error("bad cell token {token:?} at {row}:{column}")]
    BadToken {
        /// Row of the token
        row: usize,
        /// Column of the token
        column: usize,
        /// The token text
        token: String,
    },
}

impl FromStr for Grid {
    type Err = GridParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let columns = match lines.first() {
            Some(first) => first.split_whitespace().count(),
            None => return Err(GridParseError::Empty),
        };
        if columns == 0 {
            return Err(GridParseError::Empty);
        }

        let mut grid = Grid::new(lines.len(), columns);
        for (row, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != columns {
                return Err(GridParseError::Ragged {
                    row,
                    expected: columns,
                    found: tokens.len(),
                });
            }
            for (column, token) in tokens.into_iter().enumerate() {
                if token == "." {
                    continue;
                }
                let bad = || GridParseError::BadToken {
                    row,
                    column,
                    token: token.to_string(),
                };
                let (digits, special) = match token.char_indices().last() {
                    Some((i, c)) if !c.is_ascii_digit() => {
                        (&token[..i], Some(SpecialKind::from_marker(c).ok_or_else(bad)?))
                    }
                    _ => (token, None),
                };
                let type_index: u8 = digits.parse().map_err(|_| bad())?;
                let pos = Position::new(row, column);
                grid.spawn(pos, PieceType(type_index));
                if let Some(piece) = grid.get_mut(pos) {
                    piece.special = special;
                }
            }
        }
        Ok(grid)
    }
}
