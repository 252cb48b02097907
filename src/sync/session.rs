//! A hosted match: load, apply, save, with retry on conflicting writes

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::battle::actions::{apply_action, Action};
use crate::battle::ai::BotError;
use crate::battle::hex::HexCoord;
use crate::battle::state::GameState;
use crate::battle::tactics::CardId;
use crate::battle::units::{CommanderId, Posture, UnitId};
use crate::core::config::BattleConfig;
use crate::core::error::Rejection;
use crate::core::types::{now_millis, MatchId, PlayerSlot};
use crate::sync::gateway::{StateReceiver, SyncError, SyncGateway};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Action rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Match {0} has not been started")]
    NotStarted(MatchId),

    #[error("Save kept conflicting after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("State moved on: expected version {expected}, found {found}")]
    Stale { expected: u64, found: u64 },

    #[error("Bot failed: {0}")]
    Bot(#[from] BotError),
}

/// One match hosted over a [`SyncGateway`]
///
/// Every action goes through [`apply_action`] against the latest stored
/// state and is only adopted once the gateway accepts the save.
pub struct BattleSession {
    gateway: Arc<dyn SyncGateway>,
    match_id: MatchId,
    config: BattleConfig,
    rng: Mutex<ChaCha8Rng>,
}

impl BattleSession {
    pub fn new(
        gateway: Arc<dyn SyncGateway>,
        match_id: MatchId,
        config: BattleConfig,
        seed: u64,
    ) -> Self {
        Self {
            gateway,
            match_id,
            config,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    pub fn gateway(&self) -> &Arc<dyn SyncGateway> {
        &self.gateway
    }

    /// Resume the stored state, or initialize the match from its opening
    pub async fn start(&self) -> Result<GameState, SessionError> {
        if let Some(state) = self.gateway.load_state(&self.match_id).await? {
            debug!(match_id = %self.match_id, version = state.version, "resumed match");
            return Ok(state);
        }
        let state = self.gateway.initialize_battle(&self.match_id).await?;
        info!(match_id = %self.match_id, "match initialized");
        Ok(state)
    }

    /// Latest authoritative state
    pub async fn state(&self) -> Result<GameState, SessionError> {
        self.gateway
            .load_state(&self.match_id)
            .await?
            .ok_or_else(|| SessionError::NotStarted(self.match_id.clone()))
    }

    pub fn subscribe(&self) -> StateReceiver {
        self.gateway.subscribe_state(&self.match_id)
    }

    async fn apply(
        &self,
        current: &GameState,
        player: PlayerSlot,
        action: &Action,
    ) -> Result<GameState, Rejection> {
        let mut rng = self.rng.lock().await;
        apply_action(current, player, action, &mut *rng, now_millis())
    }

    async fn commit(&self, player: PlayerSlot, action: &Action, next: &GameState) -> Result<bool, SessionError> {
        if !self.gateway.save_state(&self.match_id, next).await? {
            return Ok(false);
        }
        if let Err(e) = self.gateway.log_action(&self.match_id, player, action).await {
            warn!(match_id = %self.match_id, error = %e, "failed to append audit record");
        }
        debug!(
            match_id = %self.match_id,
            %player,
            action = action.kind(),
            version = next.version,
            "action committed"
        );
        Ok(true)
    }

    /// Apply an action for `player` and persist it.
    ///
    /// On a conflicting save the latest state is reloaded and the action
    /// re-validated against it, up to `save_retry_limit` attempts.
    pub async fn submit(&self, player: PlayerSlot, action: Action) -> Result<GameState, SessionError> {
        let attempts = self.config.save_retry_limit.max(1);
        for attempt in 1..=attempts {
            let current = self.state().await?;
            let next = self.apply(&current, player, &action).await?;
            if self.commit(player, &action, &next).await? {
                return Ok(next);
            }
            warn!(
                match_id = %self.match_id,
                action = action.kind(),
                attempt,
                "save conflicted, reloading"
            );
        }
        Err(SessionError::Conflict { attempts })
    }

    /// Apply an action only if the stored state is still at `expected_version`.
    ///
    /// Used by callers that decided on an action while looking at a specific
    /// state and must not have it applied to a different one.
    pub async fn submit_if_current(
        &self,
        player: PlayerSlot,
        action: Action,
        expected_version: u64,
    ) -> Result<GameState, SessionError> {
        let current = self.state().await?;
        if current.version != expected_version {
            return Err(SessionError::Stale {
                expected: expected_version,
                found: current.version,
            });
        }
        let next = self.apply(&current, player, &action).await?;
        if self.commit(player, &action, &next).await? {
            Ok(next)
        } else {
            Err(SessionError::Stale {
                expected: expected_version,
                found: expected_version + 1,
            })
        }
    }

    pub async fn roll_initiative(&self, player: PlayerSlot) -> Result<GameState, SessionError> {
        self.submit(player, Action::RollInitiative).await
    }

    pub async fn move_unit(
        &self,
        player: PlayerSlot,
        unit: UnitId,
        to: HexCoord,
    ) -> Result<GameState, SessionError> {
        self.submit(player, Action::MoveUnit { unit, to }).await
    }

    pub async fn set_posture(
        &self,
        player: PlayerSlot,
        unit: UnitId,
        posture: Posture,
    ) -> Result<GameState, SessionError> {
        self.submit(player, Action::SetPosture { unit, posture }).await
    }

    pub async fn ranged_attack(
        &self,
        player: PlayerSlot,
        attacker: UnitId,
        target: UnitId,
    ) -> Result<GameState, SessionError> {
        self.submit(player, Action::RangedAttack { attacker, target }).await
    }

    pub async fn charge(
        &self,
        player: PlayerSlot,
        attacker: UnitId,
        target: UnitId,
    ) -> Result<GameState, SessionError> {
        self.submit(player, Action::Charge { attacker, target }).await
    }

    pub async fn melee_attack(
        &self,
        player: PlayerSlot,
        attacker: UnitId,
        target: UnitId,
    ) -> Result<GameState, SessionError> {
        self.submit(player, Action::MeleeAttack { attacker, target }).await
    }

    pub async fn rally_unit(&self, player: PlayerSlot, unit: UnitId) -> Result<GameState, SessionError> {
        self.submit(player, Action::RallyUnit { unit }).await
    }

    pub async fn use_tactical_card(
        &self,
        player: PlayerSlot,
        commander: CommanderId,
        unit: UnitId,
        card: CardId,
    ) -> Result<GameState, SessionError> {
        self.submit(player, Action::UseTacticalCard { commander, unit, card })
            .await
    }

    pub async fn end_phase(&self, player: PlayerSlot) -> Result<GameState, SessionError> {
        self.submit(player, Action::EndPhase).await
    }
}
