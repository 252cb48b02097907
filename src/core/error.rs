use thiserror::Error;

use crate::battle::ai::BotError;
use crate::battle::hex::HexCoord;
use crate::battle::setup::SetupError;
use crate::battle::state::Phase;
use crate::battle::tactics::CardId;
use crate::battle::units::{CommanderId, Posture, UnitId};
use crate::core::config::ConfigError;
use crate::core::types::PlayerSlot;
use crate::sync::{SessionError, SyncError};

/// A precondition the proposed action failed.
///
/// Rejections never carry a partially updated state: the caller keeps the
/// state it had, and nothing is logged or persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Match is already finished")]
    MatchFinished,

    #[error("Action is not allowed during the {0} phase")]
    WrongPhase(Phase),

    #[error("It is not {0}'s turn to act")]
    NotYourTurn(PlayerSlot),

    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Commander not found: {0}")]
    CommanderNotFound(CommanderId),

    #[error("Tactical card not found: {0}")]
    CardNotFound(CardId),

    #[error("{0} does not control that piece")]
    NotOwner(PlayerSlot),

    #[error("Unit {0} has already acted this turn")]
    AlreadyActed(UnitId),

    #[error("Unit {0} is routing")]
    UnitRouting(UnitId),

    #[error("Unit {0} has been eliminated")]
    UnitEliminated(UnitId),

    #[error("Hex {0} is outside the map")]
    InvalidHex(HexCoord),

    #[error("Hex {0} is occupied")]
    HexOccupied(HexCoord),

    #[error("Hex {0} is out of reach")]
    OutOfReach(HexCoord),

    #[error("Unit {target} is not a valid target for {attacker}")]
    InvalidTarget { attacker: UnitId, target: UnitId },

    #[error("Unit {0} has no ranged attack")]
    NoRangedAttack(UnitId),

    #[error("Unit {unit} cannot adopt the {posture:?} posture")]
    PostureUnavailable { unit: UnitId, posture: Posture },

    #[error("Unit {0} is not in Charge posture")]
    NotCharging(UnitId),

    #[error("Unit {0} is already in that posture")]
    AlreadyInPosture(UnitId),

    #[error("Insufficient command: card costs {needed}, {available} remaining")]
    InsufficientCommand { needed: i32, available: i32 },

    #[error("Unit {0} already has an active tactical card")]
    CardAlreadyActive(UnitId),

    #[error("Tactical card {0} is not in hand")]
    CardNotInHand(CardId),

    #[error("No commander or ally is close enough to rally {0}")]
    NoRallySupport(UnitId),

    #[error("Unit {0} is too exhausted to rally")]
    TooExhaustedToRally(UnitId),

    #[error("Unit {0} is not routing")]
    NotRouting(UnitId),

    #[error("Initiative has already been rolled this turn")]
    InitiativeAlreadyRolled,
}

#[derive(Error, Debug)]
pub enum HexfrontError {
    #[error("Action rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Battle setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Bot error: {0}")]
    Bot(#[from] BotError),
}

pub type Result<T> = std::result::Result<T, HexfrontError>;
