//! Game State
//!
//! [`Match3`] owns the grid, the RNG, the stats and the sequencer queue.
//! It is the single writer of the board: every rules step takes it by
//! `&mut`, so no two steps ever touch the grid at once.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::position::Position;
use crate::core::rng::DeterministicRng;
use crate::game::config::{ConfigError, Match3Config, PiecePool};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::grid::Grid;
use crate::game::gravity::populate;
use crate::game::process::{self, ProcessState};
use crate::game::special::SpecialTable;
use crate::game::stats::Stats;

/// Lifecycle of a game session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Board set up, input disabled
    #[default]
    Ready,
    /// Accepting moves
    Playing,
    /// Input suspended
    Paused,
    /// Session over
    Ended,
}

/// A match-3 game session.
#[derive(Clone, Debug)]
pub struct Match3 {
    config: Match3Config,
    pub(crate) pool: PiecePool,
    specials: SpecialTable,

    /// RNG seed (for verification)
    rng_seed: u64,

    /// Deterministic RNG state
    pub(crate) rng: DeterministicRng,

    /// The board
    pub(crate) grid: Grid,

    /// Session totals
    pub(crate) stats: Stats,

    /// Current session phase
    pub(crate) phase: GamePhase,

    /// Cascade sequencer state
    pub(crate) process: ProcessState,

    /// Cells of the last accepted swap (promotion pivot preference)
    pub(crate) last_swap: Option<(Position, Position)>,

    /// Events not yet handed out
    pending_events: Vec<GameEvent>,
}

impl Match3 {
    /// Validate the config and build a match-free, full board.
    pub fn new(config: Match3Config, rng_seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Grid::new(config.rows, config.columns);
        let mut game = Self::assemble(config, rng_seed, grid);
        game.setup();
        Ok(game)
    }

    /// Start from a given grid (tests, puzzles). Board dimensions come
    /// from the grid; empties and pre-formed matches are allowed and get
    /// resolved by the first cascade.
    pub fn with_grid(mut config: Match3Config, rng_seed: u64, grid: Grid) -> Result<Self, ConfigError> {
        let (rows, columns) = grid.dimensions();
        config.rows = rows;
        config.columns = columns;
        config.validate()?;
        Ok(Self::assemble(config, rng_seed, grid))
    }

    fn assemble(config: Match3Config, rng_seed: u64, grid: Grid) -> Self {
        Self {
            pool: config.pool(),
            specials: SpecialTable::new(&config.specials),
            config,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            grid,
            stats: Stats::new(),
            phase: GamePhase::Ready,
            process: ProcessState::default(),
            last_swap: None,
            pending_events: Vec::new(),
        }
    }

    /// Fresh board and zeroed stats. Cancels any running cascade.
    pub fn setup(&mut self) {
        process::end(self);
        self.pending_events.clear();

        self.grid = Grid::new(self.config.rows, self.config.columns);
        populate(&mut self.grid, &self.pool, &mut self.rng);
        self.stats.reset();
        self.phase = GamePhase::Ready;

        info!(
            "Board set up: {}x{}, {} piece types, seed {}",
            self.config.rows,
            self.config.columns,
            self.pool.len(),
            self.rng_seed
        );
        debug!("Initial grid:\n{}", self.grid);
    }

    // =========================================================================
    // Phase
    // =========================================================================

    /// Enable input.
    pub fn start_playing(&mut self) {
        self.phase = GamePhase::Playing;
    }

    /// Disable input for good. A running cascade still completes.
    pub fn stop_playing(&mut self) {
        self.phase = GamePhase::Ended;
    }

    /// Suspend input.
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
        }
    }

    /// Resume input after a pause.
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
        }
    }

    /// True while moves are accepted.
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    /// The board.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The validated config.
    pub fn config(&self) -> &Match3Config {
        &self.config
    }

    /// Session totals.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Enabled specials.
    pub fn specials(&self) -> &SpecialTable {
        &self.specials
    }

    /// The weighted pool.
    pub fn pool(&self) -> &PiecePool {
        &self.pool
    }

    /// Seed the session was created with.
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Star grade against the configured target.
    pub fn grade(&self) -> u8 {
        self.stats.grade(self.config.target_score)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Drop uncollected rejected-move events.
    pub(crate) fn discard_rejected_moves(&mut self) {
        self.pending_events
            .retain(|e| !matches!(e.data, GameEventData::Moved { valid: false, .. }));
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Hash of board, stats and round for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.rng_seed, self.process.round, |hasher| {
            // Hash cells in row-major order
            for pos in self.grid.positions() {
                match self.grid.get(pos) {
                    None => hasher.update_bool(false),
                    Some(piece) => {
                        hasher.update_bool(true);
                        hasher.update_u32(piece.id.0);
                        hasher.update_position(piece.position);
                        hasher.update_u8(piece.piece_type.0);
                        hasher.update_u8(piece.special.map_or(u8::MAX, |k| k as u8));
                    }
                }
            }

            hasher.update_u32(self.stats.score());
            hasher.update_u32(self.stats.matches());
            hasher.update_u32(self.stats.pops());
            hasher.update_u32(self.stats.special_pops());
            hasher.update_u32(self.stats.moves());
            hasher.update_bool(self.process.processing);

            // Refills depend on where the generator stands
            for word in self.rng.state() {
                hasher.update_u64(word);
            }
        })
    }
}
