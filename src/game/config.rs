//! Game Configuration
//!
//! Board dimensions, the weighted common-type pool, enabled specials with
//! their zone shapes, and the refill policy. Loaded from JSON or built from
//! one of the mode presets; validated once at setup.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::DeterministicRng;
use crate::game::piece::{PieceType, SpecialKind};

/// Smallest board edge that can hold a run of three.
pub const MIN_DIMENSION: usize = 3;

/// Largest supported board edge.
pub const MAX_DIMENSION: usize = 64;

/// Minimum number of common types for a solvable board.
pub const MIN_PIECE_TYPES: usize = 3;

/// Piece names shared by the presets, in pool order.
const PIECE_NAMES: [&str; 6] = [
    "piece-dragon",
    "piece-frog",
    "piece-newt",
    "piece-snake",
    "piece-spider",
    "piece-yeti",
];

// =============================================================================
// ERRORS
// =============================================================================

/// Setup-time configuration errors. No board is created when one is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Board edges outside the supported range.
    #[error("invalid grid dimensions {rows}x{columns} (each edge must be {min}..={max})", min = MIN_DIMENSION, max = MAX_DIMENSION)]
    InvalidDimensions {
        /// Requested rows
        rows: usize,
        /// Requested columns
        columns: usize,
    },

    /// Fewer than three common types.
    #[error("need at least {min} common piece types, got {0}", min = MIN_PIECE_TYPES)]
    TooFewPieceTypes(usize),

    /// More types than a `PieceType` can index.
    #[error("at most 256 common piece types are supported, got {0}")]
    TooManyPieceTypes(usize),

    /// A pool entry that can never be drawn.
    #[error("piece type {0:?} has zero weight")]
    ZeroWeight(String),

    /// The same special kind configured twice.
    #[error("special kind {0:?} configured more than once")]
    DuplicateSpecial(SpecialKind),

    /// A zone that clears nothing beyond its origin, or reaches past any board.
    #[error("special kind {0:?} has an empty or oversized zone")]
    InvalidZone(SpecialKind),

    /// Malformed JSON.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// SPECIAL ZONES
// =============================================================================

/// Board axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Along a row
    Horizontal,
    /// Along a column
    Vertical,
}

/// Shape of the area a special clears, with its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Zone {
    /// A line through the origin; `reach` limits cells on each side, `None` = whole line.
    Line {
        /// Line direction
        axis: Axis,
        /// Cells on each side of the origin
        reach: Option<usize>,
    },
    /// A square of `2 * radius + 1` cells per side centred on the origin.
    Area {
        /// Cells on each side of the origin
        radius: usize,
    },
    /// Every piece sharing the origin's base type.
    Colour,
}

/// An enabled special kind and its zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRule {
    /// Which kind
    pub kind: SpecialKind,
    /// What it clears
    pub zone: Zone,
}

impl SpecialRule {
    /// The stock zone for each kind.
    pub fn standard(kind: SpecialKind) -> Self {
        let zone = match kind {
            SpecialKind::Row => Zone::Line { axis: Axis::Horizontal, reach: None },
            SpecialKind::Column => Zone::Line { axis: Axis::Vertical, reach: None },
            SpecialKind::Blast => Zone::Area { radius: 1 },
            SpecialKind::Colour => Zone::Colour,
        };
        Self { kind, zone }
    }
}

// =============================================================================
// POOL
// =============================================================================

/// One entry of the weighted common-type pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceWeight {
    /// Asset name the presentation layer maps to a sprite
    pub name: String,
    /// Relative draw weight
    pub weight: u32,
}

impl PieceWeight {
    /// Entry with weight 1.
    pub fn uniform(name: &str) -> Self {
        Self { name: name.to_string(), weight: 1 }
    }
}

/// How refill chooses new types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillPolicy {
    /// Plain weighted draw.
    Unrestricted,
    /// Skip types that would complete a run of three with current neighbours.
    #[default]
    AvoidMatches,
}

/// Weighted draw over the common types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PiecePool {
    weights: Vec<u32>,
}

impl PiecePool {
    /// Pool from raw weights, index = type.
    pub fn new(weights: Vec<u32>) -> Self {
        Self { weights }
    }

    /// Number of common types.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True if the pool has no types.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// All types in pool order.
    pub fn types(&self) -> impl Iterator<Item = PieceType> + '_ {
        (0..self.weights.len()).map(|i| PieceType(i as u8))
    }

    /// Weighted draw skipping `excluded`; falls back to the whole pool
    /// when every type is excluded.
    pub fn pick(&self, rng: &mut DeterministicRng, excluded: &[PieceType]) -> PieceType {
        let filtered: Vec<u32> = self
            .weights
            .iter()
            .enumerate()
            .map(|(i, w)| if excluded.contains(&PieceType(i as u8)) { 0 } else { *w })
            .collect();

        rng.choose_weighted(&filtered)
            .or_else(|| rng.choose_weighted(&self.weights))
            .map(|i| PieceType(i as u8))
            .unwrap_or(PieceType(0))
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Difficulty presets: more common types make matches rarer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// 3 types
    Test,
    /// 4 types
    Easy,
    /// 5 types
    #[default]
    Normal,
    /// 6 types
    Hard,
}

impl Mode {
    /// Number of common types for this mode.
    pub fn piece_count(self) -> usize {
        match self {
            Mode::Test => 3,
            Mode::Easy => 4,
            Mode::Normal => 5,
            Mode::Hard => 6,
        }
    }
}

/// Everything the engine consumes from the outside at setup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Match3Config {
    /// Board rows
    pub rows: usize,
    /// Board columns
    pub columns: usize,
    /// Cell edge in pixels (presentation only)
    pub tile_size: u32,
    /// Round length in seconds (the timer lives outside the engine)
    pub duration_secs: u32,
    /// Keep swaps that create no match
    pub free_moves: bool,
    /// Weighted common-type pool
    pub pieces: Vec<PieceWeight>,
    /// Enabled specials
    pub specials: Vec<SpecialRule>,
    /// Refill type selection
    pub refill_policy: RefillPolicy,
    /// Score that earns the top grade
    pub target_score: u32,
}

impl Default for Match3Config {
    fn default() -> Self {
        Self::for_mode(Mode::Normal)
    }
}

impl Match3Config {
    /// Preset for a difficulty mode.
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            rows: 9,
            columns: 7,
            tile_size: 50,
            duration_secs: 60,
            free_moves: false,
            pieces: PIECE_NAMES[..mode.piece_count()]
                .iter()
                .map(|name| PieceWeight::uniform(name))
                .collect(),
            specials: SpecialKind::ALL.iter().map(|k| SpecialRule::standard(*k)).collect(),
            refill_policy: RefillPolicy::AvoidMatches,
            target_score: 1500,
        }
    }

    /// Parse and validate a JSON config. Missing fields take the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check dimensions, pool and specials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let edge_ok = |n: usize| (MIN_DIMENSION..=MAX_DIMENSION).contains(&n);
        if !edge_ok(self.rows) || !edge_ok(self.columns) {
            return Err(ConfigError::InvalidDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }

        if self.pieces.len() < MIN_PIECE_TYPES {
            return Err(ConfigError::TooFewPieceTypes(self.pieces.len()));
        }
        if self.pieces.len() > u8::MAX as usize + 1 {
            return Err(ConfigError::TooManyPieceTypes(self.pieces.len()));
        }
        if let Some(piece) = self.pieces.iter().find(|p| p.weight == 0) {
            return Err(ConfigError::ZeroWeight(piece.name.clone()));
        }

        for (i, rule) in self.specials.iter().enumerate() {
            if self.specials[..i].iter().any(|r| r.kind == rule.kind) {
                return Err(ConfigError::DuplicateSpecial(rule.kind));
            }
            let reach_ok = |r: usize| (1..=MAX_DIMENSION).contains(&r);
            let valid = match rule.zone {
                Zone::Line { reach, .. } => reach.map_or(true, reach_ok),
                Zone::Area { radius } => reach_ok(radius),
                Zone::Colour => true,
            };
            if !valid {
                return Err(ConfigError::InvalidZone(rule.kind));
            }
        }

        Ok(())
    }

    /// The weighted pool as the engine draws from it.
    pub fn pool(&self) -> PiecePool {
        PiecePool::new(self.pieces.iter().map(|p| p.weight).collect())
    }

    /// Asset name for a type, if it is in the pool.
    pub fn piece_name(&self, piece_type: PieceType) -> Option<&str> {
        self.pieces.get(piece_type.index()).map(|p| p.name.as_str())
    }
}
