//! Presentation Bridge
//!
//! Drives a cascade step by step and hands each event to a [`Presenter`].
//! Every step's acknowledgements are awaited before the next step runs,
//! except gravity: its acks are joined together with the refill acks so
//! falling and spawning animate at the same time. The grid itself is
//! always committed before any ack is awaited.

use futures_util::future::{self, BoxFuture, FutureExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::core::position::Position;
use crate::game::actions::MoveResult;
use crate::game::events::GameEvent;
use crate::game::process::{self, ProcessStep};
use crate::game::state::Match3;

/// Completion signal for one presented event.
pub type Ack = BoxFuture<'static, ()>;

/// An ack that is already complete.
pub fn ready_ack() -> Ack {
    future::ready(()).boxed()
}

/// Receives events as the rules engine produces them.
pub trait Presenter {
    /// Show an event; the returned future completes when the
    /// presentation is done (animation finished, sound played).
    fn present(&mut self, event: &GameEvent) -> Ack;
}

/// Presenter that shows nothing and acks immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _event: &GameEvent) -> Ack {
        ready_ack()
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Run the active cascade to completion through `presenter`.
///
/// Returns the number of rounds played. Returns immediately when no
/// cascade is running.
pub async fn run_cascade<P>(state: &mut Match3, presenter: &mut P) -> u32
where
    P: Presenter + ?Sized,
{
    let mut pending: Vec<Ack> = Vec::new();

    while let Some(report) = process::step(state) {
        pending.extend(report.events.iter().map(|event| presenter.present(event)));

        if report.step == ProcessStep::ApplyGravity {
            // Joined with the refill acks
            continue;
        }
        if !pending.is_empty() {
            debug!("Awaiting {} ack(s) for {:?}", pending.len(), report.step);
            future::join_all(pending.drain(..)).await;
        }
    }

    future::join_all(pending).await;
    state.round()
}

/// Present whatever events are pending outside a cascade.
pub async fn flush_events<P>(state: &mut Match3, presenter: &mut P)
where
    P: Presenter + ?Sized,
{
    let acks: Vec<Ack> = state
        .take_events()
        .iter()
        .map(|event| presenter.present(event))
        .collect();
    future::join_all(acks).await;
}

/// Attempt a swap and, if accepted, present the full cascade.
pub async fn play_move<P>(state: &mut Match3, presenter: &mut P, from: Position, to: Position) -> MoveResult
where
    P: Presenter + ?Sized,
{
    let result = state.try_move(from, to);
    if result.valid {
        run_cascade(state, presenter).await;
    } else {
        flush_events(state, presenter).await;
    }
    result
}

/// Tap a special and, if it fired, present the full cascade.
pub async fn play_tap<P>(state: &mut Match3, presenter: &mut P, pos: Position) -> MoveResult
where
    P: Presenter + ?Sized,
{
    let result = state.activate(pos);
    if result.valid {
        run_cascade(state, presenter).await;
    }
    result
}

// =============================================================================
// CHANNEL PRESENTER
// =============================================================================

/// An event delivered to a presentation task, with its ack handle.
#[derive(Debug)]
pub struct PresentedEvent {
    /// The event to show
    pub event: GameEvent,
    ack: oneshot::Sender<()>,
}

impl PresentedEvent {
    /// Signal that the event has been shown.
    ///
    /// Dropping without acking also releases the cascade.
    pub fn ack(self) {
        let _ = self.ack.send(());
    }
}

/// Forwards events to another task over a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<PresentedEvent>,
}

impl ChannelPresenter {
    /// Create a presenter and the receiving end for the presentation task.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresentedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Presenter for ChannelPresenter {
    fn present(&mut self, event: &GameEvent) -> Ack {
        let (ack_tx, ack_rx) = oneshot::channel();
        let delivered = PresentedEvent {
            event: event.clone(),
            ack: ack_tx,
        };

        if self.tx.send(delivered).is_err() {
            warn!("Presentation channel closed, dropping event");
            return ready_ack();
        }

        async move {
            // A dropped sender counts as done
            let _ = ack_rx.await;
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::game::config::Match3Config;
    use crate::game::events::GameEventData;
    use crate::game::grid::Grid;
    use crate::game::matching::{empty_positions, find_matches};

    /// Logs presents and ack completions in order.
    #[derive(Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, event: &GameEvent) -> Ack {
            let name = match &event.data {
                GameEventData::Fell { .. } => "fell",
                GameEventData::Spawned { .. } => "spawned",
                GameEventData::Popped { .. } => "popped",
                _ => "other",
            };
            self.log.lock().unwrap().push(format!("present {name}"));

            let log = Arc::clone(&self.log);
            async move {
                tokio::task::yield_now().await;
                log.lock().unwrap().push(format!("done {name}"));
            }
            .boxed()
        }
    }

    fn game() -> Match3 {
        let grid: Grid = "4 2 3 1\n0 1 0 4\n1 0 2 3\n2 3 4 1".parse().unwrap();
        let mut game = Match3::with_grid(Match3Config::default(), 21, grid).unwrap();
        game.start_playing();
        game
    }

    fn index_of(log: &[String], entry: &str) -> usize {
        log.iter().position(|e| e == entry).unwrap()
    }

    #[tokio::test]
    async fn test_play_move_settles_board() {
        let mut g = game();
        let mut presenter = NullPresenter;
        let result = play_move(&mut g, &mut presenter, Position::new(1, 1), Position::new(2, 1)).await;

        assert!(result.valid);
        assert!(!g.is_processing());
        assert!(find_matches(g.grid()).is_empty());
        assert!(empty_positions(g.grid()).is_empty());
        assert!(g.round() >= 1);
    }

    #[tokio::test]
    async fn test_pops_acked_before_gravity_runs() {
        let mut g = game();
        let mut recorder = Recorder::default();
        play_move(&mut g, &mut recorder, Position::new(1, 1), Position::new(2, 1)).await;

        let log = recorder.log.lock().unwrap().clone();
        assert!(index_of(&log, "done popped") < index_of(&log, "present fell"));
    }

    #[tokio::test]
    async fn test_gravity_acks_joined_with_refill() {
        let mut g = game();
        let mut recorder = Recorder::default();
        play_move(&mut g, &mut recorder, Position::new(1, 1), Position::new(2, 1)).await;

        let log = recorder.log.lock().unwrap().clone();
        // Refill is presented before any fall has finished
        assert!(index_of(&log, "present spawned") < index_of(&log, "done fell"));
    }

    #[tokio::test]
    async fn test_invalid_move_presents_only_the_attempt() {
        let mut g = game();
        let mut recorder = Recorder::default();
        let result = play_move(&mut g, &mut recorder, Position::new(3, 0), Position::new(3, 1)).await;

        assert!(!result.valid);
        let log = recorder.log.lock().unwrap().clone();
        assert_eq!(log, vec!["present other".to_string(), "done other".to_string()]);
    }

    #[tokio::test]
    async fn test_channel_presenter_round_trip() {
        let mut g = game();
        let (mut presenter, mut rx) = ChannelPresenter::new();

        let consumer = tokio::spawn(async move {
            let mut seen = 0usize;
            while let Some(delivered) = rx.recv().await {
                seen += 1;
                delivered.ack();
            }
            seen
        });

        let result = play_move(&mut g, &mut presenter, Position::new(1, 1), Position::new(2, 1)).await;
        assert!(result.valid);
        drop(presenter);

        let seen = consumer.await.unwrap();
        assert!(seen > 0);
        assert!(!g.is_processing());
    }

    #[tokio::test]
    async fn test_closed_channel_does_not_block() {
        let mut g = game();
        let (mut presenter, rx) = ChannelPresenter::new();
        drop(rx);

        let result = play_move(&mut g, &mut presenter, Position::new(1, 1), Position::new(2, 1)).await;
        assert!(result.valid);
        assert!(!g.is_processing());
    }
}
