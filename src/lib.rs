//! Hexfront - turn-based hex tactical combat engine
//!
//! `battle` holds the rules as pure state transitions, `sync` hosts a match
//! over a persistence backend and drives bots, `core` carries shared types,
//! errors and configuration.

pub mod battle;
pub mod core;
pub mod sync;
