//! Stats & Scoring
//!
//! Score grows with match size and super-linearly with the combo level so
//! cascades pay more than the same matches made one move at a time.

use serde::{Serialize, Deserialize};

use crate::game::matching::{MatchGroup, MIN_MATCH};

/// Points per matched piece.
pub const POINTS_PER_PIECE: u32 = 10;

/// Extra points per piece beyond the minimum match length.
pub const POINTS_PER_EXTRA_PIECE: u32 = 5;

/// Score awarded by one `register_match` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    /// Points added
    pub points: u32,
    /// Groups scored
    pub matches: u32,
    /// Combo level the groups were scored at
    pub combo: u32,
}

/// Combo multiplier: the triangular number of the level (1, 3, 6, 10, ...).
#[inline]
pub fn combo_multiplier(combo: u32) -> u32 {
    let combo = combo.max(1);
    combo.saturating_mul(combo + 1) / 2
}

/// Points for one group of `size` pieces at `combo`.
///
/// Non-decreasing in both arguments.
pub fn match_points(size: usize, combo: u32) -> u32 {
    let size = size as u32;
    let extra = size.saturating_sub(MIN_MATCH as u32);
    let base = size * POINTS_PER_PIECE + extra * POINTS_PER_EXTRA_PIECE;
    base.saturating_mul(combo_multiplier(combo))
}

/// Session totals shown on the HUD.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    score: u32,
    matches: u32,
    pops: u32,
    special_pops: u32,
    best_combo: u32,
    moves: u32,
}

impl Stats {
    /// Fresh counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero everything (game setup).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Score a batch of groups found at `combo`.
    pub fn register_match(&mut self, matches: &[MatchGroup], combo: u32) -> ScoreDelta {
        let points = matches
            .iter()
            .fold(0u32, |acc, group| acc.saturating_add(match_points(group.len(), combo)));

        self.score = self.score.saturating_add(points);
        self.matches += matches.len() as u32;
        self.best_combo = self.best_combo.max(combo);

        ScoreDelta {
            points,
            matches: matches.len() as u32,
            combo,
        }
    }

    /// Count a popped piece.
    pub fn register_pop(&mut self, is_special: bool) {
        if is_special {
            self.special_pops += 1;
        } else {
            self.pops += 1;
        }
    }

    /// Count an accepted player move.
    pub fn register_move(&mut self) {
        self.moves += 1;
    }

    /// Total score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Groups scored.
    pub fn matches(&self) -> u32 {
        self.matches
    }

    /// Plain pieces popped.
    pub fn pops(&self) -> u32 {
        self.pops
    }

    /// Special pieces popped.
    pub fn special_pops(&self) -> u32 {
        self.special_pops
    }

    /// Highest combo level reached.
    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    /// Accepted moves.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Star grade 0..=3 against a target score.
    ///
    /// Thirds of the target earn one star each.
    pub fn grade(&self, target_score: u32) -> u8 {
        if target_score == 0 {
            return 3;
        }
        let scaled = (self.score as u64 * 3) / target_score as u64;
        scaled.min(3) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::Position;
    use crate::game::piece::PieceType;

    fn group(size: usize) -> MatchGroup {
        MatchGroup {
            piece_type: PieceType(0),
            positions: (0..size).map(|c| Position::new(0, c)).collect(),
            longest_horizontal: size,
            longest_vertical: 0,
        }
    }

    #[test]
    fn test_match_points_values() {
        assert_eq!(match_points(3, 1), 30);
        assert_eq!(match_points(4, 1), 45);
        assert_eq!(match_points(3, 2), 90);
        assert_eq!(match_points(3, 3), 180);
        // Level 0 scores like level 1
        assert_eq!(match_points(3, 0), 30);
    }

    #[test]
    fn test_match_points_monotone() {
        for size in 3..12 {
            for combo in 1..12 {
                assert!(match_points(size + 1, combo) >= match_points(size, combo));
                assert!(match_points(size, combo + 1) >= match_points(size, combo));
            }
        }
    }

    #[test]
    fn test_register_match_accumulates() {
        let mut stats = Stats::new();
        let delta = stats.register_match(&[group(3), group(4)], 1);
        assert_eq!(delta.points, 75);
        assert_eq!(delta.matches, 2);

        stats.register_match(&[group(3)], 2);
        assert_eq!(stats.score(), 165);
        assert_eq!(stats.matches(), 3);
        assert_eq!(stats.best_combo(), 2);
    }

    #[test]
    fn test_pops_and_reset() {
        let mut stats = Stats::new();
        stats.register_pop(false);
        stats.register_pop(true);
        stats.register_move();
        assert_eq!((stats.pops(), stats.special_pops(), stats.moves()), (1, 1, 1));

        stats.reset();
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn test_grade() {
        let mut stats = Stats::new();
        assert_eq!(stats.grade(900), 0);
        stats.register_match(&vec![group(3); 10], 1);
        assert_eq!(stats.score(), 300);
        assert_eq!(stats.grade(900), 1);
        assert_eq!(stats.grade(300), 3);
        assert_eq!(stats.grade(0), 3);
    }
}
