//! Match-3 Engine Demo
//!
//! Headless session on a fixed seed: plays the first matching swap each
//! turn, logs the cascade, then replays the same moves to verify the
//! engine is deterministic.

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use match3::{
    VERSION, GameEvent, GameEventData, Match3, Match3Config, Position,
    present::{play_move, ready_ack, Ack, Presenter},
};

/// Moves played by the demo session.
const DEMO_MOVES: usize = 25;

/// Session seed.
const DEMO_SEED: u64 = 12345;

/// Presenter that logs events instead of animating them.
#[derive(Default)]
struct LogPresenter {
    events: usize,
    specials: usize,
}

impl Presenter for LogPresenter {
    fn present(&mut self, event: &GameEvent) -> Ack {
        self.events += 1;
        match &event.data {
            GameEventData::Matched { matches, combo, points } => {
                info!("  combo x{}: {} group(s), +{} points", combo, matches.len(), points);
            }
            GameEventData::SpecialActivated { position, kind, cause } => {
                self.specials += 1;
                info!("  {:?} special fired at {} ({:?})", kind, position, cause);
            }
            GameEventData::Promoted { position, kind, .. } => {
                info!("  new {:?} special at {}", kind, position);
            }
            other => debug!("  {:?}", other),
        }
        ready_ack()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Match-3 Engine v{}", VERSION);

    demo_session().await
}

/// Play a session, then replay it and compare state hashes.
async fn demo_session() -> Result<()> {
    info!("=== Starting Demo Session ===");

    let config = Match3Config::default();
    let mut game = Match3::new(config.clone(), DEMO_SEED).context("invalid demo config")?;
    game.start_playing();

    info!("RNG Seed: {}", DEMO_SEED);
    info!("Board:\n{}", game.grid());

    let mut presenter = LogPresenter::default();
    let mut played: Vec<(Position, Position)> = Vec::new();

    for turn in 1..=DEMO_MOVES {
        let Some((from, to)) = game.find_hint() else {
            info!("No moves left after {} turn(s)", turn - 1);
            break;
        };

        info!("Turn {}: swap {} <-> {}", turn, from, to);
        let result = play_move(&mut game, &mut presenter, from, to).await;
        if !result.valid {
            bail!("hinted move {} -> {} was rejected", from, to);
        }
        played.push((from, to));
    }
    game.stop_playing();

    // Print final results
    info!("=== Session Results ===");
    let stats = game.stats();
    info!("Score: {} (grade {}/3)", stats.score(), game.grade());
    info!(
        "Moves: {}, matches: {}, pops: {} (+{} special), best combo: x{}",
        stats.moves(),
        stats.matches(),
        stats.pops(),
        stats.special_pops(),
        stats.best_combo()
    );
    info!("Events presented: {}, specials fired: {}", presenter.events, presenter.specials);
    info!("Board:\n{}", game.grid());

    let hash = game.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay = Match3::new(config, DEMO_SEED)?;
    replay.start_playing();
    let mut silent = match3::present::NullPresenter;
    for (from, to) in played {
        play_move(&mut replay, &mut silent, from, to).await;
    }
    replay.stop_playing();

    let replay_hash = replay.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        bail!("DETERMINISM FAILURE: Hashes differ!")
    }
}
