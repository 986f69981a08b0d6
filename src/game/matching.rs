//! Match Detection
//!
//! Finds runs of three or more equal base types along rows and columns and
//! merges runs that share a cell into one group, so L, T and cross shapes
//! come out as a single match.
//!
//! Output order is fixed: groups sorted by their smallest member (row-major),
//! members sorted row-major. Scoring and pop events depend on it.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::core::rng::DeterministicRng;
use crate::game::config::{PiecePool, RefillPolicy};
use crate::game::grid::Grid;
use crate::game::piece::PieceType;

/// Shortest run that counts as a match.
pub const MIN_MATCH: usize = 3;

/// One connected match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGroup {
    /// Shared base type
    pub piece_type: PieceType,
    /// Members, row-major
    pub positions: Vec<Position>,
    /// Longest horizontal run inside the group
    pub longest_horizontal: usize,
    /// Longest vertical run inside the group
    pub longest_vertical: usize,
}

impl MatchGroup {
    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for groups produced by [`find_matches`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Smallest member.
    #[inline]
    pub fn first(&self) -> Position {
        self.positions[0]
    }

    /// True if `pos` belongs to the group.
    pub fn contains(&self, pos: Position) -> bool {
        self.positions.binary_search(&pos).is_ok()
    }

    /// True if the group has runs along both axes (L, T or cross).
    pub fn is_cross(&self) -> bool {
        self.longest_horizontal >= MIN_MATCH && self.longest_vertical >= MIN_MATCH
    }
}

struct Run {
    piece_type: PieceType,
    cells: Vec<Position>,
    horizontal: bool,
}

/// Find every match on the grid.
pub fn find_matches(grid: &Grid) -> Vec<MatchGroup> {
    let (rows, columns) = grid.dimensions();
    let mut runs: Vec<Run> = Vec::new();

    for row in 0..rows {
        scan_line(grid, (0..columns).map(|c| Position::new(row, c)), true, &mut runs);
    }
    for column in 0..columns {
        scan_line(grid, (0..rows).map(|r| Position::new(r, column)), false, &mut runs);
    }

    if runs.is_empty() {
        return Vec::new();
    }

    // Union-find over runs; two runs join when they share a cell
    let mut parent: Vec<usize> = (0..runs.len()).collect();
    let mut owner: Vec<Option<usize>> = vec![None; rows * columns];
    for (i, run) in runs.iter().enumerate() {
        for pos in &run.cells {
            let idx = pos.row * columns + pos.column;
            match owner[idx] {
                Some(j) => union(&mut parent, i, j),
                None => owner[idx] = Some(i),
            }
        }
    }

    let mut merged: BTreeMap<usize, (BTreeSet<Position>, usize, usize)> = BTreeMap::new();
    for i in 0..runs.len() {
        let root = find(&mut parent, i);
        let run = &runs[i];
        let entry = merged.entry(root).or_insert_with(|| (BTreeSet::new(), 0, 0));
        entry.0.extend(run.cells.iter().copied());
        if run.horizontal {
            entry.1 = entry.1.max(run.cells.len());
        } else {
            entry.2 = entry.2.max(run.cells.len());
        }
    }

    let mut groups: Vec<MatchGroup> = merged
        .into_iter()
        .map(|(root, (cells, longest_horizontal, longest_vertical))| MatchGroup {
            piece_type: runs[root].piece_type,
            positions: cells.into_iter().collect(),
            longest_horizontal,
            longest_vertical,
        })
        .collect();
    groups.sort_by_key(MatchGroup::first);
    groups
}

fn scan_line(
    grid: &Grid,
    line: impl Iterator<Item = Position>,
    horizontal: bool,
    runs: &mut Vec<Run>,
) {
    let mut current: Vec<Position> = Vec::new();
    let mut current_type: Option<PieceType> = None;

    for pos in line {
        let piece_type = grid.base_type(pos);
        if piece_type.is_some() && piece_type == current_type {
            current.push(pos);
            continue;
        }
        flush_run(&mut current, current_type, horizontal, runs);
        current_type = piece_type;
        if piece_type.is_some() {
            current.push(pos);
        }
    }
    flush_run(&mut current, current_type, horizontal, runs);
}

fn flush_run(
    current: &mut Vec<Position>,
    current_type: Option<PieceType>,
    horizontal: bool,
    runs: &mut Vec<Run>,
) {
    let cells = std::mem::take(current);
    if let Some(piece_type) = current_type {
        if cells.len() >= MIN_MATCH {
            runs.push(Run { piece_type, cells, horizontal });
        }
    }
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    // Keep the lower index as root so the group type comes from the first run
    if ra < rb {
        parent[rb] = ra;
    } else if rb < ra {
        parent[ra] = rb;
    }
}

/// Every empty cell, row-major.
pub fn empty_positions(grid: &Grid) -> Vec<Position> {
    grid.positions().filter(|pos| grid.is_empty(*pos)).collect()
}

/// Base types that would complete a run of three at `pos` given the
/// pieces currently around it, along either axis.
pub fn completing_types(grid: &Grid, pos: Position) -> Vec<PieceType> {
    let mut types = Vec::new();
    for (d_row, d_column) in [(0isize, 1isize), (1, 0)] {
        let at = |k: isize| {
            pos.offset(d_row * k, d_column * k)
                .filter(|p| grid.contains(*p))
                .and_then(|p| grid.base_type(p))
        };
        for (a, b) in [(at(-2), at(-1)), (at(-1), at(1)), (at(1), at(2))] {
            if let (Some(a), Some(b)) = (a, b) {
                if a == b && !types.contains(&a) {
                    types.push(a);
                }
            }
        }
    }
    types
}

/// Type for a new piece at `pos`.
pub fn piece_type_for_refill(
    grid: &Grid,
    pos: Position,
    pool: &PiecePool,
    policy: RefillPolicy,
    rng: &mut DeterministicRng,
) -> PieceType {
    match policy {
        RefillPolicy::Unrestricted => pool.pick(rng, &[]),
        RefillPolicy::AvoidMatches => pool.pick(rng, &completing_types(grid, pos)),
    }
}
