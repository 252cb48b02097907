//! Battle rule constants - all tunable values in one place
//!
//! Pressure, damage and stat modifiers are ADDITIVE integers so that every
//! modifier can be reverted exactly.

// Map
pub const DEFAULT_MAP_WIDTH: i32 = 12;
pub const DEFAULT_MAP_HEIGHT: i32 = 10;

// Initiative
pub const INITIATIVE_DIE_SIDES: i32 = 20;
pub const MAX_INITIATIVE_ADVANTAGE: u8 = 4;

// Melee
pub const BASE_MELEE_PRESSURE: i32 = 2;
pub const MAX_MELEE_PRESSURE: i32 = 4;
pub const MAX_COUNTER_PRESSURE: i32 = 3;

// Ranged
pub const MAX_RANGED_RANGE: u32 = 4;
pub const HILL_RANGE_BONUS: u32 = 1;
pub const FRIENDLY_FIRE_PRESSURE: i32 = 1;

// Morale
pub const REORGANIZE_RECOVERY: i32 = 2;
pub const RALLY_COMMANDER_RANGE: u32 = 1;
pub const RALLY_ALLY_RANGE: u32 = 1;
pub const RALLY_FATIGUE: i32 = 1;
pub const MIN_ROUT_DISTANCE: i32 = 1;

// Abilities gating postures
pub const CHARGE_ABILITY: &str = "charge";
