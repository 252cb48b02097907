//! Heuristic bot for the non-human side
//!
//! Architecture: Trait + Data hybrid
//! - TacticalAi trait defines the interface for swappable bots
//! - BotProfile holds TOML-loaded difficulty and temperament
//! - DecisionContext is the bot's read-only view of one side's situation

pub mod commander;
pub mod decision_context;
pub mod profile;

pub use commander::BotCommander;
pub use decision_context::DecisionContext;
pub use profile::BotProfile;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::actions::Action;
use crate::battle::hex::HexCoord;
use crate::battle::state::{GameState, Phase};
use crate::battle::units::{Posture, UnitId};
use crate::core::types::PlayerSlot;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("Failed to read bot profile {path:?}: {source}")]
    ProfileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse bot profile TOML: {0}")]
    ProfileParse(#[from] toml::de::Error),

    #[error("Invalid bot profile: {0}")]
    InvalidProfile(String),

    #[error("Match is finished; nothing to decide")]
    MatchFinished,

    #[error("It is not {0}'s turn")]
    NotOurTurn(PlayerSlot),
}

/// Bot skill tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" | "medium" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(BotError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// What the bot wants to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotAction {
    Move { unit: UnitId, to: HexCoord },
    /// Shoot, charge or strike, depending on the phase
    Attack { attacker: UnitId, target: UnitId },
    Rally { unit: UnitId },
    SetPosture { unit: UnitId, posture: Posture },
    Pass,
    EndPhase,
}

/// A chosen action and the bot's one-line explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotDecision {
    pub action: BotAction,
    pub reason: String,
}

impl BotDecision {
    pub fn new(action: BotAction, reason: impl Into<String>) -> Self {
        Self {
            action,
            reason: reason.into(),
        }
    }

    /// Translate into an engine action for the given phase
    ///
    /// Passing ends the phase so the match can never stall on the bot.
    pub fn to_action(&self, phase: Phase) -> Action {
        match &self.action {
            BotAction::Move { unit, to } => Action::MoveUnit {
                unit: *unit,
                to: *to,
            },
            BotAction::Attack { attacker, target } => {
                let (attacker, target) = (*attacker, *target);
                match phase {
                    Phase::Shooting => Action::RangedAttack { attacker, target },
                    Phase::Charge => Action::Charge { attacker, target },
                    _ => Action::MeleeAttack { attacker, target },
                }
            }
            BotAction::Rally { unit } => Action::RallyUnit { unit: *unit },
            BotAction::SetPosture { unit, posture } => Action::SetPosture {
                unit: *unit,
                posture: *posture,
            },
            BotAction::Pass | BotAction::EndPhase => Action::EndPhase,
        }
    }
}

/// Trait for bot implementations
pub trait TacticalAi: Send {
    /// Pick one action for `player` against the given state
    fn decide(&mut self, state: &GameState, player: PlayerSlot) -> Result<BotDecision, BotError>;

    /// Pause before acting, to pace the match for human opponents
    fn thinking_delay(&self) -> Duration;
}

/// One-shot decision with the built-in profile for a difficulty
pub fn decide_bot_action(
    state: &GameState,
    player: PlayerSlot,
    difficulty: Difficulty,
) -> Result<BotDecision, BotError> {
    BotCommander::new(BotProfile::for_difficulty(difficulty)).decide(state, player)
}

/// Thinking delay of the built-in profile for a difficulty
pub fn get_bot_thinking_delay(difficulty: Difficulty) -> Duration {
    BotProfile::for_difficulty(difficulty).thinking_delay()
}
