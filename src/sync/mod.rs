//! Hosting a match over a persistence backend
//!
//! - `SyncGateway` is the backend contract: load, compare-and-swap save,
//!   live subscription, audit trail, opening state
//! - `InMemoryGateway` and `JsonFileGateway` are the bundled backends
//! - `BattleSession` applies actions against the latest stored state
//! - `BotDriver` plays one side from a `TacticalAi`

pub mod bot_driver;
pub mod file;
pub mod gateway;
pub mod memory;
pub mod session;

pub use bot_driver::BotDriver;
pub use file::JsonFileGateway;
pub use gateway::{ActionRecord, StateBroadcaster, StateReceiver, SyncError, SyncGateway};
pub use memory::InMemoryGateway;
pub use session::{BattleSession, SessionError};
