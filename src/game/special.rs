//! Special-Piece Resolution
//!
//! Each enabled [`SpecialKind`] maps to a [`Zone`] in a [`SpecialTable`]; the
//! zone is the activation rule. Activations chain: a special caught in
//! another special's zone fires too. A visited set keeps every special to
//! a single activation, so mutually overlapping zones terminate.
//!
//! Also decides which match shapes promote a piece to a special.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::game::config::{Axis, SpecialRule, Zone};
use crate::game::grid::Grid;
use crate::game::matching::{find_matches, MatchGroup};
use crate::game::piece::SpecialKind;

/// Straight run length that promotes to a colour special.
pub const COLOUR_RUN: usize = 5;

/// Straight run length that promotes to a line special.
pub const LINE_RUN: usize = 4;

/// Group size that promotes a cross-shaped match to a blast special.
pub const BLAST_SIZE: usize = 5;

/// Why a special fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationCause {
    /// Part of a regular match
    Match,
    /// Tapped by the player
    Tap,
    /// Inside another special's zone
    Chain,
}

/// A special that fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// Where the special sat
    pub position: Position,
    /// Its kind
    pub kind: SpecialKind,
    /// What set it off
    pub cause: ActivationCause,
}

/// A cell to pop during the special phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialPop {
    /// The cell
    pub position: Position,
    /// True if only a special's zone reached it (not the match itself)
    pub caused_by_special: bool,
}

/// Result of one special phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialResolution {
    /// Cells to pop, row-major
    pub pops: Vec<SpecialPop>,
    /// Specials fired, in activation order
    pub activations: Vec<Activation>,
}

impl SpecialResolution {
    /// True if nothing fired.
    pub fn is_empty(&self) -> bool {
        self.pops.is_empty() && self.activations.is_empty()
    }
}

// =============================================================================
// DISPATCH TABLE
// =============================================================================

/// Enabled specials keyed by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialTable {
    zones: BTreeMap<SpecialKind, Zone>,
}

impl SpecialTable {
    /// Build from the configured rules.
    pub fn new(rules: &[SpecialRule]) -> Self {
        Self {
            zones: rules.iter().map(|r| (r.kind, r.zone)).collect(),
        }
    }

    /// Zone for a kind, if enabled.
    pub fn zone(&self, kind: SpecialKind) -> Option<Zone> {
        self.zones.get(&kind).copied()
    }

    /// True if the kind is enabled.
    pub fn is_enabled(&self, kind: SpecialKind) -> bool {
        self.zones.contains_key(&kind)
    }

    /// Kind of the enabled special sitting at `pos`, if any.
    pub fn special_at(&self, grid: &Grid, pos: Position) -> Option<SpecialKind> {
        grid.get(pos)
            .and_then(|piece| piece.special)
            .filter(|kind| self.is_enabled(*kind))
    }
}

/// Occupied cells a zone covers when fired from `origin`, row-major.
pub fn zone_positions(grid: &Grid, origin: Position, zone: Zone) -> Vec<Position> {
    let (rows, columns) = grid.dimensions();
    let span = |centre: usize, reach: Option<usize>, len: usize| match reach {
        Some(r) => centre.saturating_sub(r)..centre.saturating_add(r).saturating_add(1).min(len),
        None => 0..len,
    };

    let cells: Vec<Position> = match zone {
        Zone::Line { axis: Axis::Horizontal, reach } => span(origin.column, reach, columns)
            .map(|c| Position::new(origin.row, c))
            .collect(),
        Zone::Line { axis: Axis::Vertical, reach } => span(origin.row, reach, rows)
            .map(|r| Position::new(r, origin.column))
            .collect(),
        Zone::Area { radius } => span(origin.row, Some(radius), rows)
            .flat_map(|r| span(origin.column, Some(radius), columns).map(move |c| Position::new(r, c)))
            .collect(),
        Zone::Colour => match grid.base_type(origin) {
            Some(target) => grid
                .positions()
                .filter(|p| grid.base_type(*p) == Some(target))
                .collect(),
            None => Vec::new(),
        },
    };

    cells.into_iter().filter(|p| !grid.is_empty(*p)).collect()
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Fire every enabled special that is part of a current match.
///
/// Matched groups holding such a special are cleared whole; the zones and
/// their chains are added on top.
pub fn resolve_specials(grid: &Grid, table: &SpecialTable) -> SpecialResolution {
    let mut plan: BTreeMap<Position, bool> = BTreeMap::new();
    let mut seeds: Vec<(Position, ActivationCause)> = Vec::new();

    for group in find_matches(grid) {
        let specials: Vec<Position> = group
            .positions
            .iter()
            .copied()
            .filter(|p| table.special_at(grid, *p).is_some())
            .collect();
        if specials.is_empty() {
            continue;
        }
        for pos in &group.positions {
            plan.entry(*pos).or_insert(false);
        }
        seeds.extend(specials.into_iter().map(|p| (p, ActivationCause::Match)));
    }

    chain(grid, table, seeds, plan)
}

/// Fire a single special directly (player tap).
///
/// Returns an empty resolution if `origin` holds no enabled special.
pub fn resolve_activation(grid: &Grid, table: &SpecialTable, origin: Position) -> SpecialResolution {
    if table.special_at(grid, origin).is_none() {
        return SpecialResolution::default();
    }
    let mut plan = BTreeMap::new();
    plan.insert(origin, false);
    chain(grid, table, vec![(origin, ActivationCause::Tap)], plan)
}

fn chain(
    grid: &Grid,
    table: &SpecialTable,
    seeds: Vec<(Position, ActivationCause)>,
    mut plan: BTreeMap<Position, bool>,
) -> SpecialResolution {
    let mut queue: VecDeque<(Position, ActivationCause)> = seeds.into();
    let mut visited: BTreeSet<Position> = BTreeSet::new();
    let mut activations = Vec::new();

    while let Some((origin, cause)) = queue.pop_front() {
        if !visited.insert(origin) {
            continue;
        }
        let Some(kind) = table.special_at(grid, origin) else {
            continue;
        };
        let Some(zone) = table.zone(kind) else {
            continue;
        };
        activations.push(Activation { position: origin, kind, cause });

        for pos in zone_positions(grid, origin, zone) {
            plan.entry(pos).or_insert(true);
            if !visited.contains(&pos) && table.special_at(grid, pos).is_some() {
                queue.push_back((pos, ActivationCause::Chain));
            }
        }
    }

    SpecialResolution {
        pops: plan
            .into_iter()
            .map(|(position, caused_by_special)| SpecialPop { position, caused_by_special })
            .collect(),
        activations,
    }
}

// =============================================================================
// PROMOTION
// =============================================================================

/// Special a match of this shape creates, if its kind is enabled.
///
/// Priority: colour (straight 5+), blast (cross of 5+), row (horizontal 4),
/// column (vertical 4).
pub fn promotion_for(group: &MatchGroup, table: &SpecialTable) -> Option<SpecialKind> {
    SpecialKind::ALL
        .into_iter()
        .filter(|kind| table.is_enabled(*kind))
        .find(|kind| match kind {
            SpecialKind::Colour => {
                group.longest_horizontal >= COLOUR_RUN || group.longest_vertical >= COLOUR_RUN
            }
            SpecialKind::Blast => group.is_cross() && group.len() >= BLAST_SIZE,
            SpecialKind::Row => !group.is_cross() && group.longest_horizontal == LINE_RUN,
            SpecialKind::Column => !group.is_cross() && group.longest_vertical == LINE_RUN,
        })
}

/// Cell that keeps the promoted piece: the first of `preferred` inside the
/// group (the player's swap cells), else the group's first member. Cells
/// already carrying a special marker are skipped; `None` if every member
/// has one.
pub fn promotion_pivot(grid: &Grid, group: &MatchGroup, preferred: &[Position]) -> Option<Position> {
    let plain = |pos: &Position| grid.get(*pos).is_some_and(|piece| !piece.is_special());

    preferred
        .iter()
        .filter(|p| group.contains(**p))
        .chain(group.positions.iter())
        .copied()
        .find(|p| plain(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::SpecialRule;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    fn standard_table() -> SpecialTable {
        let rules: Vec<SpecialRule> = SpecialKind::ALL.iter().map(|k| SpecialRule::standard(*k)).collect();
        SpecialTable::new(&rules)
    }

    #[test]
    fn test_row_special_in_match_clears_row() {
        let g = grid("1 2 1 2\n0r 0 0 2\n2 1 2 1");
        let res = resolve_specials(&g, &standard_table());

        assert_eq!(res.activations.len(), 1);
        assert_eq!(res.activations[0].cause, ActivationCause::Match);
        let popped: Vec<Position> = res.pops.iter().map(|p| p.position).collect();
        assert_eq!(popped, (0..4).map(|c| Position::new(1, c)).collect::<Vec<_>>());
        // Only the cell outside the match is tagged as special-caused
        assert!(res.pops[3].caused_by_special);
        assert!(!res.pops[0].caused_by_special);
    }

    #[test]
    fn test_no_special_no_resolution() {
        let g = grid("0 0 0\n1 2 1\n2 1 2");
        assert!(resolve_specials(&g, &standard_table()).is_empty());
    }

    #[test]
    fn test_mutual_chain_activates_each_once() {
        // Two row specials in the same row: each zone holds the other
        let g = grid("0r 1 0r\n1 2 1\n2 1 2");
        let res = resolve_activation(&g, &standard_table(), Position::new(0, 0));

        assert_eq!(res.activations.len(), 2);
        assert_eq!(res.activations[0].cause, ActivationCause::Tap);
        assert_eq!(res.activations[1].position, Position::new(0, 2));
        assert_eq!(res.activations[1].cause, ActivationCause::Chain);
        assert_eq!(res.pops.len(), 3);
    }

    #[test]
    fn test_chain_crosses_axes() {
        // Row special fires a column special which reaches the bottom row
        let g = grid("1 2 1\n0r 1 2c\n2 1 0");
        let res = resolve_activation(&g, &standard_table(), Position::new(1, 0));

        let kinds: Vec<SpecialKind> = res.activations.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![SpecialKind::Row, SpecialKind::Column]);
        let popped: BTreeSet<Position> = res.pops.iter().map(|p| p.position).collect();
        assert!(popped.contains(&Position::new(0, 2)));
        assert!(popped.contains(&Position::new(2, 2)));
        assert_eq!(popped.len(), 5);
    }

    #[test]
    fn test_blast_and_colour_zones() {
        let g = grid("0 1 2 3\n1 2 3 0\n2 3 0 1\n3 0 1 2");
        let area = zone_positions(&g, Position::new(0, 0), Zone::Area { radius: 1 });
        assert_eq!(area.len(), 4);
        let area = zone_positions(&g, Position::new(2, 2), Zone::Area { radius: 1 });
        assert_eq!(area.len(), 9);

        let colour = zone_positions(&g, Position::new(0, 0), Zone::Colour);
        assert_eq!(
            colour,
            vec![Position::new(0, 0), Position::new(1, 3), Position::new(2, 2), Position::new(3, 1)]
        );

        let limited = zone_positions(
            &g,
            Position::new(1, 1),
            Zone::Line { axis: Axis::Horizontal, reach: Some(1) },
        );
        assert_eq!(limited, vec![Position::new(1, 0), Position::new(1, 1), Position::new(1, 2)]);
    }

    #[test]
    fn test_disabled_kind_does_not_fire() {
        let table = SpecialTable::new(&[SpecialRule::standard(SpecialKind::Column)]);
        let g = grid("0r 0 0\n1 2 1\n2 1 2");
        assert!(resolve_specials(&g, &table).is_empty());
        assert!(resolve_activation(&g, &table, Position::new(0, 0)).is_empty());
    }

    #[test]
    fn test_promotion_shapes() {
        let table = standard_table();
        let horizontal_four = find_matches(&grid("0 0 0 0\n1 2 1 2\n2 1 2 1"));
        assert_eq!(promotion_for(&horizontal_four[0], &table), Some(SpecialKind::Row));

        let vertical_four = find_matches(&grid("0 1\n0 2\n0 1\n0 2"));
        assert_eq!(promotion_for(&vertical_four[0], &table), Some(SpecialKind::Column));

        let five = find_matches(&grid("0 0 0 0 0\n1 2 1 2 1"));
        assert_eq!(promotion_for(&five[0], &table), Some(SpecialKind::Colour));

        let cross = find_matches(&grid("0 1 2\n0 2 1\n0 0 0"));
        assert_eq!(promotion_for(&cross[0], &table), Some(SpecialKind::Blast));

        let three = find_matches(&grid("0 0 0\n1 2 1"));
        assert_eq!(promotion_for(&three[0], &table), None);

        let empty = SpecialTable::default();
        assert_eq!(promotion_for(&five[0], &empty), None);
    }

    #[test]
    fn test_promotion_pivot_prefers_swap_cell() {
        let g = grid("0 0 0 0\n1 2 1 2");
        let group = &find_matches(&g)[0];
        assert_eq!(promotion_pivot(&g, group, &[Position::new(0, 2)]), Some(Position::new(0, 2)));
        assert_eq!(promotion_pivot(&g, group, &[Position::new(1, 2)]), Some(Position::new(0, 0)));
        assert_eq!(promotion_pivot(&g, group, &[]), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_promotion_pivot_skips_marked_pieces() {
        // Marked pieces still match by base type
        let g = grid("0r 0 0c 0\n1 2 1 2");
        let group = &find_matches(&g)[0];
        assert_eq!(promotion_pivot(&g, group, &[Position::new(0, 2)]), Some(Position::new(0, 1)));
        assert_eq!(promotion_pivot(&g, group, &[]), Some(Position::new(0, 1)));

        let all_marked = grid("0r 0r 0r\n1 2 1");
        let group = &find_matches(&all_marked)[0];
        assert_eq!(promotion_pivot(&all_marked, group, &[]), None);
    }

    #[test]
    fn test_huge_reach_clamps_to_board() {
        let g = grid("0 1 2\n1 2 0\n2 0 1");
        let line = zone_positions(
            &g,
            Position::new(1, 1),
            Zone::Line { axis: Axis::Horizontal, reach: Some(usize::MAX) },
        );
        assert_eq!(line, vec![Position::new(1, 0), Position::new(1, 1), Position::new(1, 2)]);

        let area = zone_positions(&g, Position::new(2, 2), Zone::Area { radius: usize::MAX });
        assert_eq!(area.len(), 9);
    }
}
