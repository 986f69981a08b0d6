//! Player Actions
//!
//! Swap validation and special taps. Both only act while the game is
//! playing and no cascade is running; accepted actions start the
//! sequencer, rejected ones leave the grid untouched.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::position::Position;
use crate::game::events::GameEvent;
use crate::game::grid::Grid;
use crate::game::matching::find_matches;
use crate::game::process::{self, apply_special_resolution};
use crate::game::special::resolve_activation;
use crate::game::state::Match3;

/// Outcome of a player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// True if the action was accepted and a cascade started
    pub valid: bool,
}

impl MoveResult {
    const INVALID: MoveResult = MoveResult { valid: false };
}

impl Match3 {
    /// True if input is accepted right now.
    pub fn can_act(&self) -> bool {
        self.is_playing() && !self.is_processing()
    }

    /// Attempt to swap two cells.
    ///
    /// Out-of-bounds, non-adjacent or empty cells are rejected silently.
    /// Otherwise a `Moved` event is emitted; the swap is kept if it makes a
    /// match (or free moves are on) and reverted if not.
    ///
    /// A rejected `Moved` event stays pending until [`Match3::take_events`]
    /// collects it. The next attempt drops any rejection still pending, so
    /// callers that only drive accepted moves never see stale rejections.
    pub fn try_move(&mut self, from: Position, to: Position) -> MoveResult {
        if !self.can_act() {
            return MoveResult::INVALID;
        }
        self.discard_rejected_moves();
        if !self.grid.contains(from) || !self.grid.contains(to) || !from.is_adjacent(to) {
            debug!("Rejected move {} -> {}: not adjacent on board", from, to);
            return MoveResult::INVALID;
        }
        if self.grid.is_empty(from) || self.grid.is_empty(to) {
            return MoveResult::INVALID;
        }

        self.grid.swap(from, to);
        let valid = self.config().free_moves || !find_matches(&self.grid).is_empty();
        self.push_event(GameEvent::moved(from, to, valid));

        if !valid {
            self.grid.swap(from, to);
            debug!("Move {} -> {} makes no match, reverted", from, to);
            return MoveResult::INVALID;
        }

        debug!("Move {} -> {} accepted", from, to);
        self.stats.register_move();
        self.last_swap = Some((from, to));
        process::start(self);
        MoveResult { valid: true }
    }

    /// Tap a special piece to fire it.
    ///
    /// The chain resolves and pops at combo level 1, then the sequencer
    /// takes over to settle the board.
    pub fn activate(&mut self, pos: Position) -> MoveResult {
        if !self.can_act() || !self.grid.contains(pos) {
            return MoveResult::INVALID;
        }

        let resolution = resolve_activation(&self.grid, self.specials(), pos);
        if resolution.is_empty() {
            return MoveResult::INVALID;
        }

        debug!("Tapped special at {}", pos);
        self.stats.register_move();
        apply_special_resolution(self, &resolution, 1);
        process::start(self);
        MoveResult { valid: true }
    }

    /// First swap that would make a match, scanning row-major and trying
    /// the right then lower neighbour of each cell.
    pub fn find_hint(&self) -> Option<(Position, Position)> {
        find_hint(&self.grid)
    }
}

/// First matching swap on `grid`, if any.
pub fn find_hint(grid: &Grid) -> Option<(Position, Position)> {
    let mut scratch = grid.clone();
    let positions: Vec<Position> = grid.positions().collect();

    for from in positions {
        for to in [from.offset(0, 1), from.offset(1, 0)].into_iter().flatten() {
            if !scratch.contains(to) || scratch.is_empty(from) || scratch.is_empty(to) {
                continue;
            }
            scratch.swap(from, to);
            let matched = !find_matches(&scratch).is_empty();
            scratch.swap(from, to);
            if matched {
                return Some((from, to));
            }
        }
    }

    None
}
