pub mod config;
pub mod error;
pub mod types;

pub use config::{BattleConfig, ConfigError};
pub use error::{HexfrontError, Rejection, Result};
pub use types::{now_millis, MatchId, PlayerPair, PlayerSlot};
