//! Headless Battle Runner
//!
//! Plays a bot-vs-bot match over an in-memory backend and prints the
//! battle log, or a JSON summary for batch comparisons of bot profiles.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hexfront::battle::{BattleSetup, BotCommander, BotProfile, Difficulty, GameState};
use hexfront::core::{BattleConfig, MatchId, PlayerSlot};
use hexfront::sync::{BattleSession, BotDriver, InMemoryGateway};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Headless Battle Runner - bot vs bot matches
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run bot vs bot battles and print the log or a JSON summary")]
struct Args {
    /// Player 1 difficulty (easy, normal, hard)
    #[arg(long, default_value = "normal")]
    player1: Difficulty,

    /// Player 2 difficulty (easy, normal, hard)
    #[arg(long, default_value = "normal")]
    player2: Difficulty,

    /// Battle config TOML; defaults are used when omitted
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Turns played before the match is called a draw
    #[arg(long, default_value_t = 30)]
    max_turns: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Override every bot's thinking delay (milliseconds)
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleResult {
    outcome: String,
    turns: u32,
    actions: u64,
    player1_survivors: usize,
    player2_survivors: usize,
    player1_difficulty: String,
    player2_difficulty: String,
    seed: u64,
}

fn survivors(state: &GameState, slot: PlayerSlot) -> usize {
    state.units_of(slot).filter(|u| u.is_alive()).count()
}

fn bot(difficulty: Difficulty, seed: u64, delay_ms: u64) -> Box<BotCommander> {
    let mut profile = BotProfile::load(difficulty).unwrap_or_else(|e| {
        tracing::warn!(%difficulty, error = %e, "using built-in bot profile");
        BotProfile::for_difficulty(difficulty)
    });
    profile.thinking_delay_ms = delay_ms;
    Box::new(BotCommander::new(profile.with_seed(seed)))
}

#[tokio::main]
async fn main() -> hexfront::core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("hexfront=info")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let opening = BattleSetup::generated(&config, &mut rng)
        .skirmish(&mut rng)
        .standard_deck()
        .build()?;

    let gateway = Arc::new(InMemoryGateway::new());
    let match_id = MatchId::new(format!("runner-{seed}"));
    gateway.register_opening(match_id.clone(), opening).await;

    let session = Arc::new(BattleSession::new(gateway, match_id, config, seed));
    let mut rx = session.subscribe();
    session.start().await?;

    tracing::info!(seed, "battle started");
    let player1 = BotDriver::spawn(
        session.clone(),
        PlayerSlot::Player1,
        bot(args.player1, seed, args.delay_ms),
    );
    let player2 = BotDriver::spawn(
        session.clone(),
        PlayerSlot::Player2,
        bot(args.player2, seed.wrapping_add(1), args.delay_ms),
    );

    loop {
        let done = rx
            .borrow_and_update()
            .as_ref()
            .map_or(false, |s| s.is_finished || s.turn > args.max_turns);
        if done || player1.is_finished() && player2.is_finished() {
            break;
        }
        // Poll as well, so a halted bot cannot leave us waiting forever
        tokio::select! {
            changed = rx.changed() => if changed.is_err() { break },
            () = tokio::time::sleep(Duration::from_millis(200)) => {}
        }
    }
    player1.shutdown();
    player2.shutdown();
    for driver in [player1, player2] {
        let slot = driver.player();
        if let Err(e) = driver.join().await {
            tracing::error!(%slot, error = %e, "bot halted");
        }
    }

    let state = session.state().await?;
    let outcome = match (state.is_finished, state.winner) {
        (true, Some(winner)) => format!("{winner}_wins"),
        (true, None) => "draw".to_string(),
        (false, _) => "turn_limit".to_string(),
    };

    if args.format == "json" {
        let result = BattleResult {
            outcome,
            turns: state.turn,
            actions: state.version,
            player1_survivors: survivors(&state, PlayerSlot::Player1),
            player2_survivors: survivors(&state, PlayerSlot::Player2),
            player1_difficulty: args.player1.to_string(),
            player2_difficulty: args.player2.to_string(),
            seed,
        };
        let json = serde_json::to_string_pretty(&result).map_err(hexfront::sync::SyncError::from)?;
        println!("{json}");
    } else {
        for entry in &state.battle_log {
            println!("[turn {} {}] {}", entry.turn, entry.phase, entry.message);
        }
        println!();
        println!("Outcome: {outcome} after {} turns (seed {seed})", state.turn);
    }

    Ok(())
}
