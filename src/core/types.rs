//! Core type definitions used throughout the codebase

use std::time::{SystemTime, UNIX_EPOCH};

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// One of the two player slots in a match
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    #[display(fmt = "player1")]
    Player1,
    #[display(fmt = "player2")]
    Player2,
}

impl PlayerSlot {
    /// The other side of the table
    pub fn opponent(self) -> Self {
        match self {
            PlayerSlot::Player1 => PlayerSlot::Player2,
            PlayerSlot::Player2 => PlayerSlot::Player1,
        }
    }

    /// Both slots, first player first
    pub fn all() -> [PlayerSlot; 2] {
        [PlayerSlot::Player1, PlayerSlot::Player2]
    }
}

/// A value held once per player, addressed by slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPair<T> {
    pub player1: T,
    pub player2: T,
}

impl<T> PlayerPair<T> {
    pub fn new(player1: T, player2: T) -> Self {
        Self { player1, player2 }
    }

    pub fn get(&self, slot: PlayerSlot) -> &T {
        match slot {
            PlayerSlot::Player1 => &self.player1,
            PlayerSlot::Player2 => &self.player2,
        }
    }

    pub fn get_mut(&mut self, slot: PlayerSlot) -> &mut T {
        match slot {
            PlayerSlot::Player1 => &mut self.player1,
            PlayerSlot::Player2 => &mut self.player2,
        }
    }
}

/// Identifier of a match as known to the sync backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Wall-clock milliseconds since the Unix epoch, used for battle log timestamps
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
