//! JSON-on-disk gateway
//!
//! Each match gets its own directory under the gateway root:
//!
//! ```text
//! <root>/<match-id>/opening.json   opening state written at setup
//! <root>/<match-id>/state.json     current authoritative state
//! <root>/<match-id>/actions.jsonl  append-only audit trail
//! ```
//!
//! `state.json` is replaced by writing a sibling temp file and renaming it,
//! so readers never observe a half-written state.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::battle::actions::Action;
use crate::battle::state::GameState;
use crate::core::types::{now_millis, MatchId, PlayerSlot};
use crate::sync::gateway::{
    accepts, ActionRecord, StateBroadcaster, StateReceiver, SyncError, SyncGateway,
};

const OPENING_FILE: &str = "opening.json";
const STATE_FILE: &str = "state.json";
const AUDIT_FILE: &str = "actions.jsonl";

#[derive(Debug)]
pub struct JsonFileGateway {
    root: PathBuf,
    /// Serializes compare-and-swap within this process
    write_lock: Mutex<()>,
    broadcaster: StateBroadcaster,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SyncError + '_ {
    move |source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Match ids become directory names, so only a safe alphabet is allowed
fn validate_match_id(match_id: &MatchId) -> Result<(), SyncError> {
    let id = match_id.as_str();
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidMatchId(id.to_string()))
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SyncError> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SyncError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn write_json_atomic(path: &Path, state: &GameState) -> Result<(), SyncError> {
    let contents = serde_json::to_vec_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).await.map_err(io_error(&tmp))?;
    fs::rename(&tmp, path).await.map_err(io_error(path))?;
    Ok(())
}

impl JsonFileGateway {
    /// Gateway rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
            broadcaster: StateBroadcaster::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn match_dir(&self, match_id: &MatchId) -> Result<PathBuf, SyncError> {
        validate_match_id(match_id)?;
        Ok(self.root.join(match_id.as_str()))
    }

    async fn ensure_match_dir(&self, match_id: &MatchId) -> Result<PathBuf, SyncError> {
        let dir = self.match_dir(match_id)?;
        fs::create_dir_all(&dir).await.map_err(io_error(&dir))?;
        Ok(dir)
    }

    /// Store the opening state that `initialize_battle` will hand out
    pub async fn register_opening(
        &self,
        match_id: &MatchId,
        opening: &GameState,
    ) -> Result<(), SyncError> {
        let dir = self.ensure_match_dir(match_id).await?;
        write_json_atomic(&dir.join(OPENING_FILE), opening).await
    }

    /// Every audit record written for a match, oldest first
    pub async fn audit_log(&self, match_id: &MatchId) -> Result<Vec<ActionRecord>, SyncError> {
        let path = self.match_dir(match_id)?.join(AUDIT_FILE);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(SyncError::Io { path, source }),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(SyncError::from))
            .collect()
    }
}

#[async_trait::async_trait]
impl SyncGateway for JsonFileGateway {
    async fn load_state(&self, match_id: &MatchId) -> Result<Option<GameState>, SyncError> {
        let path = self.match_dir(match_id)?.join(STATE_FILE);
        let state: Option<GameState> = read_json(&path).await?;
        if let Some(state) = &state {
            self.broadcaster.publish(match_id, state);
        }
        Ok(state)
    }

    async fn save_state(&self, match_id: &MatchId, state: &GameState) -> Result<bool, SyncError> {
        let dir = self.match_dir(match_id)?;
        let path = dir.join(STATE_FILE);

        let _guard = self.write_lock.lock().await;
        let stored: Option<GameState> = read_json(&path).await?;
        if stored.is_none() && !fs::try_exists(&dir).await.map_err(io_error(&dir))? {
            return Err(SyncError::UnknownMatch(match_id.clone()));
        }
        if !accepts(stored.as_ref(), state) {
            debug!(%match_id, version = state.version, "save rejected as stale");
            return Ok(false);
        }
        write_json_atomic(&path, state).await?;

        self.broadcaster.publish(match_id, state);
        Ok(true)
    }

    fn subscribe_state(&self, match_id: &MatchId) -> StateReceiver {
        self.broadcaster.subscribe(match_id)
    }

    async fn log_action(
        &self,
        match_id: &MatchId,
        player: PlayerSlot,
        action: &Action,
    ) -> Result<(), SyncError> {
        let dir = self.ensure_match_dir(match_id).await?;
        let path = dir.join(AUDIT_FILE);
        let record = ActionRecord {
            match_id: match_id.clone(),
            player,
            action: action.clone(),
            timestamp: now_millis(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_error(&path))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(io_error(&path))?;
        file.flush().await.map_err(io_error(&path))?;
        Ok(())
    }

    async fn initialize_battle(&self, match_id: &MatchId) -> Result<GameState, SyncError> {
        let dir = self.match_dir(match_id)?;
        let state_path = dir.join(STATE_FILE);

        let _guard = self.write_lock.lock().await;
        if let Some(current) = read_json::<GameState>(&state_path).await? {
            self.broadcaster.publish(match_id, &current);
            return Ok(current);
        }
        let opening: GameState = read_json(&dir.join(OPENING_FILE))
            .await?
            .ok_or_else(|| SyncError::UnknownMatch(match_id.clone()))?;
        write_json_atomic(&state_path, &opening).await?;

        self.broadcaster.publish(match_id, &opening);
        Ok(opening)
    }
}
