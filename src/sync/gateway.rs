//! Persistence and broadcast contract for authoritative match state

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::battle::actions::Action;
use crate::battle::state::GameState;
use crate::core::types::{MatchId, PlayerSlot};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Match not found: {0}")]
    UnknownMatch(MatchId),

    #[error("Invalid match id {0:?}")]
    InvalidMatchId(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Receives every new authoritative state of one match.
///
/// Holds `None` until the match has been loaded or initialized.
/// Dropping the receiver unsubscribes.
pub type StateReceiver = watch::Receiver<Option<GameState>>;

/// One line of the append-only audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub match_id: MatchId,
    pub player: PlayerSlot,
    pub action: Action,
    pub timestamp: u64,
}

/// Backend holding the single authoritative state per match
///
/// Saves are compare-and-swap on `GameState::version`: a save is accepted
/// only if it is exactly one version ahead of what is stored.
#[async_trait::async_trait]
pub trait SyncGateway: Send + Sync {
    /// Latest authoritative state, or `None` for a match not yet started
    async fn load_state(&self, match_id: &MatchId) -> Result<Option<GameState>, SyncError>;

    /// Try to make `state` authoritative.
    ///
    /// Returns `Ok(false)` when another writer got there first; the caller
    /// must not adopt `state` in that case.
    async fn save_state(&self, match_id: &MatchId, state: &GameState) -> Result<bool, SyncError>;

    /// Live view of the authoritative state
    fn subscribe_state(&self, match_id: &MatchId) -> StateReceiver;

    /// Append to the audit trail
    async fn log_action(
        &self,
        match_id: &MatchId,
        player: PlayerSlot,
        action: &Action,
    ) -> Result<(), SyncError>;

    /// Opening state built by whoever set up the match
    async fn initialize_battle(&self, match_id: &MatchId) -> Result<GameState, SyncError>;
}

/// Is `next` the direct successor of what is stored?
pub fn accepts(stored: Option<&GameState>, next: &GameState) -> bool {
    match stored {
        Some(current) => next.version == current.version + 1,
        None => next.version == 0,
    }
}

/// Per-match watch channels shared by gateway implementations
#[derive(Debug, Default)]
pub struct StateBroadcaster {
    channels: Mutex<HashMap<MatchId, watch::Sender<Option<GameState>>>>,
}

impl StateBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_sender<T>(
        &self,
        match_id: &MatchId,
        f: impl FnOnce(&watch::Sender<Option<GameState>>) -> T,
    ) -> T {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = channels
            .entry(match_id.clone())
            .or_insert_with(|| watch::channel(None).0);
        f(sender)
    }

    pub fn subscribe(&self, match_id: &MatchId) -> StateReceiver {
        self.with_sender(match_id, |sender| sender.subscribe())
    }

    /// Push a state unless subscribers already hold the same or a newer one
    pub fn publish(&self, match_id: &MatchId, state: &GameState) {
        self.with_sender(match_id, |sender| {
            sender.send_if_modified(|current| {
                let newer = current
                    .as_ref()
                    .map_or(true, |held| state.version > held.version);
                if newer {
                    *current = Some(state.clone());
                }
                newer
            })
        });
    }
}
