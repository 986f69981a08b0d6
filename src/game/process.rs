//! Process Sequencer
//!
//! Resolves a cascade as a queue of ordered steps. Each round runs
//! update stats, specials, regular matches, gravity, refill and a
//! checkpoint that either queues another round or goes idle.
//!
//! Every step is a synchronous grid mutation. The caller drives the queue
//! with [`step`] and can present each [`StepReport`] before asking for the
//! next one; [`crate::present::run_cascade`] does exactly that.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::position::Position;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::gravity::{apply_gravity, fill_up};
use crate::game::matching::{empty_positions, find_matches};
use crate::game::special::{promotion_for, promotion_pivot, resolve_specials, SpecialResolution};
use crate::game::state::Match3;

/// One step of a cascade round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessStep {
    /// Advance the round and score current matches
    UpdateStats,
    /// Fire specials caught in matches
    ProcessSpecials,
    /// Pop plain groups, promoting qualifying shapes
    ProcessRegular,
    /// Compact columns
    ApplyGravity,
    /// Fill empties
    Refill,
    /// Queue another round or finish
    Checkpoint,
}

impl ProcessStep {
    /// Steps of one round, in order.
    pub const ROUND: [ProcessStep; 6] = [
        ProcessStep::UpdateStats,
        ProcessStep::ProcessSpecials,
        ProcessStep::ProcessRegular,
        ProcessStep::ApplyGravity,
        ProcessStep::Refill,
        ProcessStep::Checkpoint,
    ];
}

/// Events produced by one step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Step that ran
    pub step: ProcessStep,
    /// Round it ran in
    pub round: u32,
    /// Events in grid-mutation order. Events pending from before the step
    /// (the move that started the cascade) come first.
    pub events: Vec<GameEvent>,
}

/// Sequencer state owned by [`Match3`].
#[derive(Clone, Debug, Default)]
pub struct ProcessState {
    pub(crate) processing: bool,
    pub(crate) round: u32,
    pub(crate) queue: VecDeque<ProcessStep>,
}

impl Match3 {
    /// True while a cascade is running.
    pub fn is_processing(&self) -> bool {
        self.process.processing
    }

    /// Current round (combo level); 0 before the first round.
    pub fn round(&self) -> u32 {
        self.process.round
    }

    /// Steps still queued.
    pub fn queued_steps(&self) -> usize {
        self.process.queue.len()
    }
}

// =============================================================================
// CONTROL
// =============================================================================

/// Begin a cascade.
///
/// Ignored while a cascade is already running or the game is not playing.
/// Returns true if a cascade started.
pub fn start(state: &mut Match3) -> bool {
    if state.process.processing || !state.is_playing() {
        return false;
    }

    state.process.processing = true;
    state.process.round = 0;
    state.process.queue.clear();
    enqueue_round(state);

    info!("Cascade started");
    state.push_event(GameEvent::new(0, GameEventData::ProcessStarted));
    true
}

/// Stop the cascade: clear the queue and go idle.
///
/// Emits `ProcessComplete`. No-op when idle.
pub fn end(state: &mut Match3) {
    if !state.process.processing {
        return;
    }

    state.process.processing = false;
    state.process.queue.clear();
    state.last_swap = None;

    let rounds = state.process.round;
    info!("Cascade complete after {} round(s), score {}", rounds, state.stats.score());
    state.push_event(GameEvent::process_complete(rounds));
}

/// Run the next queued step. `None` when idle.
pub fn step(state: &mut Match3) -> Option<StepReport> {
    if !state.process.processing {
        return None;
    }

    let Some(next) = state.process.queue.pop_front() else {
        end(state);
        return Some(StepReport {
            step: ProcessStep::Checkpoint,
            round: state.process.round,
            events: state.take_events(),
        });
    };

    match next {
        ProcessStep::UpdateStats => update_stats(state),
        ProcessStep::ProcessSpecials => process_specials(state),
        ProcessStep::ProcessRegular => process_regular(state),
        ProcessStep::ApplyGravity => process_gravity(state),
        ProcessStep::Refill => refill(state),
        ProcessStep::Checkpoint => checkpoint(state),
    }

    #[cfg(feature = "debug-tracing")]
    tracing::trace!("After {:?} (round {}):\n{}", next, state.process.round, state.grid);

    Some(StepReport {
        step: next,
        round: state.process.round,
        events: state.take_events(),
    })
}

/// Drive the cascade to a stable grid without presentation.
///
/// Returns every event in order. Does nothing when no cascade is running.
pub fn run_to_completion(state: &mut Match3) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Some(report) = step(state) {
        events.extend(report.events);
    }
    events
}

fn enqueue_round(state: &mut Match3) {
    state.process.queue.extend(ProcessStep::ROUND);
}

// =============================================================================
// STEPS
// =============================================================================

/// 1. Advance the combo level and score whatever is matched now.
fn update_stats(state: &mut Match3) {
    state.process.round += 1;
    let round = state.process.round;

    let matches = find_matches(&state.grid);
    if matches.is_empty() {
        return;
    }

    let delta = state.stats.register_match(&matches, round);
    debug!(
        "Round {}: {} group(s) for {} points",
        round, delta.matches, delta.points
    );

    let groups = matches.into_iter().map(|g| g.positions).collect();
    state.push_event(GameEvent::matched(round, groups, delta.points));
}

/// 2. Fire specials that are part of a match.
fn process_specials(state: &mut Match3) {
    let resolution = resolve_specials(&state.grid, state.specials());
    if resolution.is_empty() {
        return;
    }
    let round = state.process.round;
    apply_special_resolution(state, &resolution, round);
}

/// 3. Pop the plain groups that remain, promoting one piece per
/// qualifying group.
fn process_regular(state: &mut Match3) {
    let round = state.process.round;
    let preferred: Vec<Position> = state
        .last_swap
        .take()
        .map(|(from, to)| vec![to, from])
        .unwrap_or_default();

    let matches = find_matches(&state.grid);
    for group in &matches {
        // Pieces that already carry a marker keep it
        let promoted = promotion_for(group, state.specials()).and_then(|kind| {
            promotion_pivot(&state.grid, group, &preferred).map(|pivot| (pivot, kind))
        });

        if let Some((pivot, kind)) = promoted {
            if let Some(piece) = state.grid.get_mut(pivot) {
                piece.special = Some(kind);
                let event = GameEvent::promoted(round, piece.id, piece.piece_type, pivot, kind);
                debug!("Promoted {} to {:?}", pivot, kind);
                state.push_event(event);
            }
        }

        for pos in &group.positions {
            if promoted.is_some_and(|(pivot, _)| pivot == *pos) {
                continue;
            }
            pop_piece(state, *pos, round, false);
        }
    }
}

/// 4. Compact columns.
fn process_gravity(state: &mut Match3) {
    let round = state.process.round;
    let falls = apply_gravity(&mut state.grid);
    if falls.is_empty() {
        return;
    }

    debug!("Round {}: {} piece(s) fell", round, falls.len());
    for fall in falls {
        if let Some(piece) = state.grid.get(fall.to) {
            let event = GameEvent::fell(round, piece.id, fall.from, fall.to);
            state.push_event(event);
        }
    }
}

/// 5. Fill every empty cell.
fn refill(state: &mut Match3) {
    let round = state.process.round;
    let policy = state.config().refill_policy;
    let filled = fill_up(&mut state.grid, &state.pool, policy, &mut state.rng);
    if filled.is_empty() {
        return;
    }

    debug!("Round {}: refilled {} cell(s)", round, filled.len());
    for pos in filled {
        if let Some(piece) = state.grid.get(pos) {
            let event = GameEvent::spawned(round, piece.id, piece.piece_type, pos);
            state.push_event(event);
        }
    }
}

/// 6. Another round if the board is still unstable, else finish.
fn checkpoint(state: &mut Match3) {
    let matches = find_matches(&state.grid).len();
    let empties = empty_positions(&state.grid).len();

    if matches > 0 || empties > 0 {
        debug!(
            "Checkpoint round {}: {} match(es), {} empty cell(s), continuing",
            state.process.round, matches, empties
        );
        enqueue_round(state);
    } else {
        debug!("Checkpoint round {}: stable", state.process.round);
        end(state);
    }
}

// =============================================================================
// SHARED
// =============================================================================

/// Emit activations and pop every planned cell at `round`.
pub(crate) fn apply_special_resolution(
    state: &mut Match3,
    resolution: &SpecialResolution,
    round: u32,
) {
    for activation in &resolution.activations {
        debug!(
            "Special {:?} at {} fired ({:?})",
            activation.kind, activation.position, activation.cause
        );
        state.push_event(GameEvent::special_activated(
            round,
            activation.position,
            activation.kind,
            activation.cause,
        ));
    }
    for pop in &resolution.pops {
        pop_piece(state, pop.position, round, pop.caused_by_special);
    }
}

/// Remove one piece, count it and emit its pop event.
fn pop_piece(state: &mut Match3, pos: Position, round: u32, caused_by_special: bool) {
    let Some(piece) = state.grid.take(pos) else {
        return;
    };
    state.stats.register_pop(piece.is_special());
    state.push_event(GameEvent::popped(
        round,
        piece.id,
        piece.piece_type,
        pos,
        piece.is_special(),
        caused_by_special,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::Match3Config;
    use crate::game::grid::Grid;
    use crate::game::piece::SpecialKind;

    fn game(text: &str) -> Match3 {
        let grid: Grid = text.parse().unwrap();
        let mut game = Match3::with_grid(Match3Config::default(), 42, grid).unwrap();
        game.start_playing();
        game
    }

    #[test]
    fn test_start_requires_playing() {
        let grid: Grid = "0 0 0\n1 2 3\n2 3 1".parse().unwrap();
        let mut g = Match3::with_grid(Match3Config::default(), 1, grid).unwrap();
        assert!(!start(&mut g));
        assert!(step(&mut g).is_none());
    }

    #[test]
    fn test_start_is_not_reentrant() {
        let mut g = game("0 0 0\n1 2 3\n2 3 1");
        assert!(start(&mut g));
        let queued = g.queued_steps();
        assert!(!start(&mut g));
        assert_eq!(g.queued_steps(), queued);
    }

    #[test]
    fn test_step_order_of_first_round() {
        let mut g = game("0 0 0\n1 2 3\n2 3 1");
        start(&mut g);
        let steps: Vec<ProcessStep> = (0..6).filter_map(|_| step(&mut g)).map(|r| r.step).collect();
        assert_eq!(steps, ProcessStep::ROUND.to_vec());
    }

    #[test]
    fn test_round_one_scores_and_pops() {
        let mut g = game("0 0 0\n1 2 3\n2 3 1");
        start(&mut g);

        let stats = step(&mut g).unwrap();
        assert_eq!(stats.round, 1);
        assert!(stats.events.iter().any(|e| matches!(
            e.data,
            GameEventData::Matched { combo: 1, points: 30, .. }
        )));
        assert_eq!(g.stats().score(), 30);

        step(&mut g); // specials
        let regular = step(&mut g).unwrap();
        let pops = regular.events.iter().filter(|e| e.is_pop()).count();
        assert_eq!(pops, 3);
        assert_eq!(empty_positions(g.grid()).len(), 3);
    }

    #[test]
    fn test_cascade_reaches_stable_grid() {
        let mut g = game("0 0 0 4\n1 2 3 1\n2 3 1 2\n3 1 2 3");
        start(&mut g);
        let events = run_to_completion(&mut g);

        assert!(!g.is_processing());
        assert!(find_matches(g.grid()).is_empty());
        assert!(empty_positions(g.grid()).is_empty());
        assert!(matches!(
            events.last().map(|e| &e.data),
            Some(GameEventData::ProcessComplete { .. })
        ));
    }

    #[test]
    fn test_end_clears_queue_and_is_idempotent() {
        let mut g = game("0 0 0\n1 2 3\n2 3 1");
        start(&mut g);
        step(&mut g);
        end(&mut g);
        assert!(!g.is_processing());
        assert_eq!(g.queued_steps(), 0);

        let completions = g
            .take_events()
            .iter()
            .filter(|e| matches!(e.data, GameEventData::ProcessComplete { .. }))
            .count();
        assert_eq!(completions, 1);

        end(&mut g);
        assert!(g.take_events().is_empty());
    }

    #[test]
    fn test_four_in_a_row_promotes() {
        let mut g = game("0 0 0 0\n1 2 3 1\n2 3 1 2");
        start(&mut g);
        step(&mut g);
        step(&mut g);
        let report = step(&mut g).unwrap();

        let promoted = report
            .events
            .iter()
            .find(|e| matches!(e.data, GameEventData::Promoted { .. }))
            .expect("row special promoted");
        match promoted.data {
            GameEventData::Promoted { position, kind, .. } => {
                assert_eq!(position, Position::new(0, 0));
                assert_eq!(kind, SpecialKind::Row);
            }
            _ => unreachable!(),
        }
        assert_eq!(report.events.iter().filter(|e| e.is_pop()).count(), 3);
        assert_eq!(
            g.grid().get(Position::new(0, 0)).and_then(|p| p.special),
            Some(SpecialKind::Row)
        );
    }

    #[test]
    fn test_matched_special_clears_its_line() {
        let mut g = game("0 0r 0 4\n1 2 3 1\n2 3 1 2");
        start(&mut g);
        step(&mut g);
        let report = step(&mut g).unwrap();

        assert!(report.events.iter().any(|e| matches!(
            e.data,
            GameEventData::SpecialActivated { kind: SpecialKind::Row, .. }
        )));
        // Three matched plus the extra cell the row reaches
        assert_eq!(report.events.iter().filter(|e| e.is_pop()).count(), 4);
        assert_eq!(g.stats().special_pops(), 1);
    }

    #[test]
    fn test_specials_step_pops_before_leftover_plain_groups() {
        // Column 0 holds a row special; row 3 is a separate plain group
        let mut g = game("0r 1 2 3\n0 2 3 1\n0 3 1 2\n4 1 1 1");
        start(&mut g);
        step(&mut g);

        let popped = |report: StepReport| -> Vec<Position> {
            report
                .events
                .iter()
                .filter_map(|e| match e.data {
                    GameEventData::Popped { position, .. } => Some(position),
                    _ => None,
                })
                .collect()
        };

        let specials = step(&mut g).unwrap();
        assert_eq!(specials.step, ProcessStep::ProcessSpecials);
        let special_pops = popped(specials);
        assert_eq!(
            special_pops,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(0, 3),
                Position::new(1, 0),
                Position::new(2, 0),
            ]
        );

        let regular = step(&mut g).unwrap();
        assert_eq!(regular.step, ProcessStep::ProcessRegular);
        let regular_pops = popped(regular);
        assert_eq!(
            regular_pops,
            vec![Position::new(3, 1), Position::new(3, 2), Position::new(3, 3)]
        );
        assert!(regular_pops.iter().all(|p| !special_pops.contains(p)));
        assert_eq!(g.stats().pops() + g.stats().special_pops(), 9);
    }

    #[test]
    fn test_promotion_keeps_existing_marker() {
        // (0,0) carries a row marker, which is disabled here
        let grid: Grid = "0r 1 2\n0 2 3\n0 3 1\n0 1 2".parse().unwrap();
        let mut config = Match3Config::default();
        config.specials.retain(|rule| rule.kind != SpecialKind::Row);
        let mut g = Match3::with_grid(config, 42, grid).unwrap();
        g.start_playing();
        start(&mut g);
        step(&mut g);
        assert!(step(&mut g).unwrap().events.iter().all(|e| !e.is_pop()));

        let report = step(&mut g).unwrap();
        let promoted = report.events.iter().find_map(|e| match e.data {
            GameEventData::Promoted { position, kind, .. } => Some((position, kind)),
            _ => None,
        });
        assert_eq!(promoted, Some((Position::new(1, 0), SpecialKind::Column)));
        assert!(g.grid().is_empty(Position::new(0, 0)));
        assert_eq!(
            g.grid().get(Position::new(1, 0)).and_then(|p| p.special),
            Some(SpecialKind::Column)
        );
    }
}
