//! Gravity & Refill
//!
//! Column compaction after pops, refilling the gaps from the weighted pool,
//! and the initial match-free board population.

use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::core::rng::DeterministicRng;
use crate::game::config::{PiecePool, RefillPolicy};
use crate::game::grid::Grid;
use crate::game::matching::piece_type_for_refill;
use crate::game::piece::PieceType;

/// A piece moved by gravity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fall {
    /// Cell before falling
    pub from: Position,
    /// Cell after falling
    pub to: Position,
}

/// Drop every piece as far down its column as it goes.
///
/// Relative order inside a column is preserved and empties end up at the
/// top. Only pieces that actually moved are reported, bottom-most first
/// within each column, columns left to right. Calling it again without
/// any mutation in between returns nothing.
pub fn apply_gravity(grid: &mut Grid) -> Vec<Fall> {
    let (rows, columns) = grid.dimensions();
    let mut falls = Vec::new();

    for column in 0..columns {
        // Next free slot, scanning upward from the bottom
        let mut write = rows;
        for row in (0..rows).rev() {
            let from = Position::new(row, column);
            if grid.is_empty(from) {
                continue;
            }
            write -= 1;
            if write != row {
                let to = Position::new(write, column);
                let piece = grid.take(from);
                grid.set(to, piece);
                falls.push(Fall { from, to });
            }
        }
    }

    falls
}

/// Fill every empty cell with a new piece.
///
/// Columns left to right, each column top to bottom. Returns the filled
/// positions in that order. The grid is full afterwards.
pub fn fill_up(
    grid: &mut Grid,
    pool: &PiecePool,
    policy: RefillPolicy,
    rng: &mut DeterministicRng,
) -> Vec<Position> {
    let (rows, columns) = grid.dimensions();
    let mut filled = Vec::new();

    for column in 0..columns {
        for row in 0..rows {
            let pos = Position::new(row, column);
            if !grid.is_empty(pos) {
                continue;
            }
            let piece_type = piece_type_for_refill(grid, pos, pool, policy, rng);
            grid.spawn(pos, piece_type);
            filled.push(pos);
        }
    }

    filled
}

/// Populate an empty grid so that it holds no match.
///
/// Cells are created row-major, so only the left and upper neighbours
/// exist when a type is drawn; excluding the type of a matching left pair
/// and upper pair removes at most two types, which a pool of three or
/// more always survives.
pub fn populate(grid: &mut Grid, pool: &PiecePool, rng: &mut DeterministicRng) {
    let positions: Vec<Position> = grid.positions().collect();
    for pos in positions {
        let mut excluded: Vec<PieceType> = Vec::with_capacity(2);
        for (d_row, d_column) in [(0isize, -1isize), (-1, 0)] {
            let near = pos.offset(d_row, d_column).and_then(|p| grid.base_type(p));
            let far = pos.offset(d_row * 2, d_column * 2).and_then(|p| grid.base_type(p));
            if let (Some(a), Some(b)) = (near, far) {
                if a == b {
                    excluded.push(a);
                }
            }
        }
        let piece_type = pool.pick(rng, &excluded);
        grid.spawn(pos, piece_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::matching::{empty_positions, find_matches};

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    #[test]
    fn test_gravity_compacts_column() {
        let mut g = grid("0 1\n. 2\n3 .\n. 4");
        let falls = apply_gravity(&mut g);

        assert_eq!(g.to_string(), ". .\n. 1\n0 2\n3 4");
        assert_eq!(
            falls,
            vec![
                Fall { from: Position::new(2, 0), to: Position::new(3, 0) },
                Fall { from: Position::new(0, 0), to: Position::new(2, 0) },
                Fall { from: Position::new(1, 1), to: Position::new(2, 1) },
                Fall { from: Position::new(0, 1), to: Position::new(1, 1) },
            ]
        );
    }

    #[test]
    fn test_gravity_keeps_identity_and_position() {
        let mut g = grid("5r\n.\n.");
        let id = g.get(Position::new(0, 0)).unwrap().id;
        apply_gravity(&mut g);

        let piece = g.get(Position::new(2, 0)).unwrap();
        assert_eq!(piece.id, id);
        assert_eq!(piece.position, Position::new(2, 0));
        assert!(piece.is_special());
    }

    #[test]
    fn test_gravity_idempotent() {
        let mut g = grid("0 . 1\n. 2 .\n3 . .");
        assert!(!apply_gravity(&mut g).is_empty());
        assert!(apply_gravity(&mut g).is_empty());
    }

    #[test]
    fn test_fill_up_order_and_result() {
        let mut g = grid(". 1\n. 2\n0 3");
        let pool = PiecePool::new(vec![1, 1, 1, 1, 1]);
        let mut rng = DeterministicRng::new(11);

        let filled = fill_up(&mut g, &pool, RefillPolicy::AvoidMatches, &mut rng);

        assert_eq!(filled, vec![Position::new(0, 0), Position::new(1, 0)]);
        assert!(empty_positions(&g).is_empty());
        assert!(g.is_full());
    }

    #[test]
    fn test_populate_has_no_matches() {
        for (rows, columns) in [(3, 3), (4, 7), (9, 7), (8, 8), (5, 6)] {
            for seed in 0..20 {
                let mut g = Grid::new(rows, columns);
                let pool = PiecePool::new(vec![1, 1, 1]);
                let mut rng = DeterministicRng::new(seed);
                populate(&mut g, &pool, &mut rng);

                assert!(find_matches(&g).is_empty(), "seed {seed} produced a match:\n{g}");
                assert!(empty_positions(&g).is_empty());
            }
        }
    }
}
