//! Battle system - turn-based hex tactics between two sides
//!
//! Every rule lives here as a pure transition over `GameState`:
//! - Phases run in a fixed order, empty ones are skipped
//! - Units build up pressure, rout, flee and can be rallied
//! - Tactical cards fold exact, reversible modifiers into unit stats
//! - The bot plays one side through the same action API as a human

pub mod actions;
pub mod ai;
pub mod battle_map;
pub mod combat;
pub mod constants;
pub mod hex;
pub mod morale;
pub mod movement;
pub mod phase;
pub mod resolution;
pub mod setup;
pub mod state;
pub mod tactics;
pub mod terrain;
pub mod units;
pub mod victory;

// Re-exports for convenient access
pub use actions::{apply_action, Action};
pub use ai::{
    decide_bot_action, get_bot_thinking_delay, BotAction, BotCommander, BotDecision, BotError,
    BotProfile, Difficulty, TacticalAi,
};
pub use battle_map::{BattleMap, Hex};
pub use hex::{HexCoord, HexDirection};
pub use morale::{RallySupport, RetreatOutcome};
pub use resolution::{FireLine, MeleeOutcome, RangedOutcome};
pub use setup::{BattleSetup, SetupError};
pub use state::{BattleLogEntry, GameState, LogType, Phase};
pub use tactics::{CardId, TacticalCard};
pub use terrain::Terrain;
pub use units::{
    ActiveCard, BattleCommander, BattleUnit, CommanderId, Posture, StatDelta, UnitId, UnitStats,
};
pub use victory::VictoryStatus;
