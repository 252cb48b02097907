//! In-process gateway: states and audit trail live in memory

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::debug;

use crate::battle::actions::Action;
use crate::battle::state::GameState;
use crate::core::types::{now_millis, MatchId, PlayerSlot};
use crate::sync::gateway::{
    accepts, ActionRecord, StateBroadcaster, StateReceiver, SyncError, SyncGateway,
};

#[derive(Debug, Default)]
struct MatchRecord {
    opening: Option<GameState>,
    current: Option<GameState>,
    audit: Vec<ActionRecord>,
}

/// Gateway for tests, local hot-seat games and bot-vs-bot runs
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    matches: Mutex<HashMap<MatchId, MatchRecord>>,
    broadcaster: StateBroadcaster,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the opening state that `initialize_battle` will hand out
    pub async fn register_opening(&self, match_id: MatchId, opening: GameState) {
        let mut matches = self.matches.lock().await;
        matches.entry(match_id).or_default().opening = Some(opening);
    }

    /// Copy of the audit trail for a match
    pub async fn audit_log(&self, match_id: &MatchId) -> Vec<ActionRecord> {
        let matches = self.matches.lock().await;
        matches
            .get(match_id)
            .map(|record| record.audit.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SyncGateway for InMemoryGateway {
    async fn load_state(&self, match_id: &MatchId) -> Result<Option<GameState>, SyncError> {
        let matches = self.matches.lock().await;
        Ok(matches.get(match_id).and_then(|r| r.current.clone()))
    }

    async fn save_state(&self, match_id: &MatchId, state: &GameState) -> Result<bool, SyncError> {
        let mut matches = self.matches.lock().await;
        let record = matches
            .get_mut(match_id)
            .ok_or_else(|| SyncError::UnknownMatch(match_id.clone()))?;

        if !accepts(record.current.as_ref(), state) {
            debug!(%match_id, version = state.version, "save rejected as stale");
            return Ok(false);
        }
        record.current = Some(state.clone());
        drop(matches);

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
        let mut matches = self.matches.lock().await;
        let record = matches
            .get_mut(match_id)
            .ok_or_else(|| SyncError::UnknownMatch(match_id.clone()))?;
        record.audit.push(ActionRecord {
            match_id: match_id.clone(),
            player,
            action: action.clone(),
            timestamp: now_millis(),
        });
        Ok(())
    }

    async fn initialize_battle(&self, match_id: &MatchId) -> Result<GameState, SyncError> {
        let mut matches = self.matches.lock().await;
        let record = matches
            .get_mut(match_id)
            .ok_or_else(|| SyncError::UnknownMatch(match_id.clone()))?;

        if let Some(current) = &record.current {
            return Ok(current.clone());
        }
        let opening = record
            .opening
            .clone()
            .ok_or_else(|| SyncError::UnknownMatch(match_id.clone()))?;
        record.current = Some(opening.clone());
        drop(matches);

        self.broadcaster.publish(match_id, &opening);
        Ok(opening)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;

    fn opening() -> GameState {
        GameState::new(BattleMap::new(4, 4))
    }

    #[tokio::test]
    async fn test_unknown_match() {
        let gateway = InMemoryGateway::new();
        let id = MatchId::new("nope");
        assert!(gateway.load_state(&id).await.unwrap().is_none());
        assert!(matches!(
            gateway.initialize_battle(&id).await,
            Err(SyncError::UnknownMatch(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_then_compare_and_swap() {
        let gateway = InMemoryGateway::new();
        let id = MatchId::new("m1");
        gateway.register_opening(id.clone(), opening()).await;

        let start = gateway.initialize_battle(&id).await.unwrap();
        assert_eq!(start.version, 0);

        let mut next = start.clone();
        next.version = 1;
        assert!(gateway.save_state(&id, &next).await.unwrap());
        // Same version again is a conflict
        assert!(!gateway.save_state(&id, &next).await.unwrap());

        let loaded = gateway.load_state(&id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_save_broadcasts() {
        let gateway = InMemoryGateway::new();
        let id = MatchId::new("m2");
        gateway.register_opening(id.clone(), opening()).await;
        let mut rx = gateway.subscribe_state(&id);

        gateway.initialize_battle(&id).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|s| s.version), Some(0));
    }

    #[tokio::test]
    async fn test_audit_trail_appends() {
        let gateway = InMemoryGateway::new();
        let id = MatchId::new("m3");
        gateway.register_opening(id.clone(), opening()).await;

        gateway
            .log_action(&id, PlayerSlot::Player2, &Action::EndPhase)
            .await
            .unwrap();

        let audit = gateway.audit_log(&id).await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].player, PlayerSlot::Player2);
    }
}
