//! Runs a bot for one side of a hosted match
//!
//! The driver watches the session's state. Whenever the bot's side is
//! awaited it asks the bot for a decision, waits out the thinking delay
//! and submits the decision against the exact state it was made for. A
//! state change during the delay discards the pending decision.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::battle::actions::Action;
use crate::battle::ai::TacticalAi;
use crate::battle::state::GameState;
use crate::core::types::PlayerSlot;
use crate::sync::gateway::StateReceiver;
use crate::sync::session::{BattleSession, SessionError};

/// Handle to a running bot task; dropping it stops the bot
pub struct BotDriver {
    player: PlayerSlot,
    cancel: CancellationToken,
    handle: Option<JoinHandle<Result<(), SessionError>>>,
}

enum Wake {
    Cancelled,
    Changed,
    Closed,
    Elapsed,
}

async fn wait_for_change(rx: &mut StateReceiver, cancel: &CancellationToken) -> Wake {
    tokio::select! {
        () = cancel.cancelled() => Wake::Cancelled,
        changed = rx.changed() => match changed {
            Ok(()) => Wake::Changed,
            Err(_) => Wake::Closed,
        },
    }
}

impl BotDriver {
    /// Start driving `player` in `session` with `ai`
    pub fn spawn(session: Arc<BattleSession>, player: PlayerSlot, ai: Box<dyn TacticalAi>) -> Self {
        let cancel = CancellationToken::new();
        let rx = session.subscribe();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move { run(session, player, ai, rx, task_cancel).await });
        Self {
            player,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn player(&self) -> PlayerSlot {
        self.player
    }

    /// Stop the bot; a pending decision is dropped without being submitted
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the bot task to end and report how it ended
    pub async fn join(mut self) -> Result<(), SessionError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => {
                error!(player = %self.player, "bot task panicked");
                std::panic::resume_unwind(e.into_panic())
            }
        }
    }
}

impl Drop for BotDriver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    session: Arc<BattleSession>,
    player: PlayerSlot,
    mut ai: Box<dyn TacticalAi>,
    mut rx: StateReceiver,
    cancel: CancellationToken,
) -> Result<(), SessionError> {
    info!(%player, match_id = %session.match_id(), "bot started");
    loop {
        let snapshot: Option<GameState> = rx.borrow_and_update().clone();
        let Some(state) = snapshot else {
            match wait_for_change(&mut rx, &cancel).await {
                Wake::Changed => continue,
                _ => return Ok(()),
            }
        };

        if state.is_finished {
            info!(%player, winner = ?state.winner, "match finished, bot stopping");
            return Ok(());
        }
        if !state.awaits(player) {
            match wait_for_change(&mut rx, &cancel).await {
                Wake::Changed => continue,
                _ => return Ok(()),
            }
        }

        let decision = match ai.decide(&state, player) {
            Ok(decision) => decision,
            Err(e) => {
                error!(%player, error = %e, "bot failed to decide, halting");
                return Err(e.into());
            }
        };
        debug!(%player, reason = %decision.reason, "bot decided");

        let wake = tokio::select! {
            () = cancel.cancelled() => Wake::Cancelled,
            changed = rx.changed() => match changed {
                Ok(()) => Wake::Changed,
                Err(_) => Wake::Closed,
            },
            () = tokio::time::sleep(ai.thinking_delay()) => Wake::Elapsed,
        };
        match wake {
            Wake::Elapsed => {}
            Wake::Changed => {
                debug!(%player, "state changed while thinking, decision dropped");
                continue;
            }
            Wake::Cancelled | Wake::Closed => return Ok(()),
        }

        let action = decision.to_action(state.phase);
        match session
            .submit_if_current(player, action.clone(), state.version)
            .await
        {
            Ok(_) => {}
            Err(SessionError::Stale { expected, found }) => {
                warn!(%player, expected, found, "bot action was stale, deciding again");
            }
            Err(SessionError::Rejected(rejection)) => {
                warn!(%player, action = action.kind(), %rejection, "bot action rejected, ending phase");
                if action == Action::EndPhase {
                    return Err(rejection.into());
                }
                match session
                    .submit_if_current(player, Action::EndPhase, state.version)
                    .await
                {
                    Ok(_) | Err(SessionError::Stale { .. }) => {}
                    Err(e) => {
                        error!(%player, error = %e, "bot could not end the phase, halting");
                        return Err(e);
                    }
                }
            }
            Err(e) => {
                error!(%player, error = %e, "bot submit failed, halting");
                return Err(e);
            }
        }
    }
}
