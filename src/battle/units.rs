//! Battle units and commanders
//!
//! Units carry both base stats (as imported from army data) and current stats.
//! Current stats are base stats with every active modifier folded in:
//! terrain, posture and at most one tactical card. Each modifier is a
//! `StatDelta` that is applied and reverted additively, so removing a
//! modifier always restores the exact previous values.

use std::ops::{Add, Neg};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::battle::constants::CHARGE_ABILITY;
use crate::battle::hex::{HexCoord, HexDirection};
use crate::battle::tactics::CardId;
use crate::core::types::PlayerSlot;

/// Unique identifier for units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display(fmt = "{}", _0)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for commanders
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display(fmt = "{}", _0)]
pub struct CommanderId(pub Uuid);

impl CommanderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommanderId {
    fn default() -> Self {
        Self::new()
    }
}

/// The five combat stats every unit carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitStats {
    pub attack: i32,
    pub defense: i32,
    pub ranged: i32,
    pub movement: i32,
    pub morale: i32,
}

impl UnitStats {
    pub fn new(attack: i32, defense: i32, ranged: i32, movement: i32, morale: i32) -> Self {
        Self {
            attack,
            defense,
            ranged,
            movement,
            morale,
        }
    }

    /// Fold a modifier into these stats
    pub fn apply(&mut self, delta: StatDelta) {
        self.attack += delta.attack;
        self.defense += delta.defense;
        self.ranged += delta.ranged;
        self.movement += delta.movement;
        self.morale += delta.morale;
    }

    /// Remove a previously applied modifier
    pub fn revert(&mut self, delta: StatDelta) {
        self.apply(-delta);
    }
}

/// Additive change to unit stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatDelta {
    pub attack: i32,
    pub defense: i32,
    pub ranged: i32,
    pub movement: i32,
    pub morale: i32,
}

impl StatDelta {
    pub fn is_zero(&self) -> bool {
        *self == StatDelta::default()
    }
}

impl Add for StatDelta {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            attack: self.attack + rhs.attack,
            defense: self.defense + rhs.defense,
            ranged: self.ranged + rhs.ranged,
            movement: self.movement + rhs.movement,
            morale: self.morale + rhs.morale,
        }
    }
}

impl Neg for StatDelta {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            attack: -self.attack,
            defense: -self.defense,
            ranged: -self.ranged,
            movement: -self.movement,
            morale: -self.morale,
        }
    }
}

/// Tactical stance of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    #[default]
    Offensive,
    Defensive,
    Charge,
    Reorganizing,
}

impl Posture {
    pub fn all() -> [Posture; 4] {
        [
            Posture::Offensive,
            Posture::Defensive,
            Posture::Charge,
            Posture::Reorganizing,
        ]
    }

    /// Ability tag a unit needs before it may adopt this posture
    pub fn required_ability(&self) -> Option<&'static str> {
        match self {
            Posture::Charge => Some(CHARGE_ABILITY),
            _ => None,
        }
    }

    /// Stat modifier while in this posture
    pub fn stat_delta(&self) -> StatDelta {
        match self {
            Posture::Offensive => StatDelta::default(),
            Posture::Defensive => StatDelta {
                attack: -1,
                defense: 2,
                ..StatDelta::default()
            },
            Posture::Charge => StatDelta {
                attack: 2,
                defense: -1,
                ..StatDelta::default()
            },
            Posture::Reorganizing => StatDelta {
                attack: -2,
                defense: -1,
                ..StatDelta::default()
            },
        }
    }
}

/// A tactical card currently folded into a unit's stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCard {
    pub card_id: CardId,
    pub commander_id: CommanderId,
    /// Exactly what was added to current stats, kept for exact reversal
    pub delta: StatDelta,
}

/// A unit on the battle map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleUnit {
    pub id: UnitId,
    pub name: String,
    pub owner: PlayerSlot,

    // Position
    pub position: HexCoord,
    pub facing: HexDirection,
    pub posture: Posture,

    // Stats
    pub base_stats: UnitStats,
    pub current_stats: UnitStats,

    // Condition
    pub max_health: i32,
    pub current_health: i32,
    pub current_pressure: i32,
    pub permanent_pressure: i32, // Floor raised by every rally
    pub max_pressure: i32,
    pub is_routing: bool,
    pub has_acted_this_turn: bool,

    pub active_card: Option<ActiveCard>,
    pub abilities: Vec<String>,
}

impl BattleUnit {
    pub fn new(
        id: UnitId,
        name: impl Into<String>,
        owner: PlayerSlot,
        stats: UnitStats,
        max_health: i32,
        max_pressure: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            position: HexCoord::default(),
            facing: HexDirection::default(),
            posture: Posture::default(),
            base_stats: stats,
            current_stats: stats,
            max_health,
            current_health: max_health,
            current_pressure: 0,
            permanent_pressure: 0,
            max_pressure,
            is_routing: false,
            has_acted_this_turn: false,
            active_card: None,
            abilities: Vec::new(),
        }
    }

    pub fn at(mut self, position: HexCoord) -> Self {
        self.position = position;
        self
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.abilities.push(ability.into());
        self
    }

    pub fn with_posture(mut self, posture: Posture) -> Self {
        self.posture = posture;
        self
    }

    /// Still on the board with health left
    pub fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    /// Alive and not routing: counts toward holding the field
    pub fn is_steady(&self) -> bool {
        self.is_alive() && !self.is_routing
    }

    /// May take a unit action this turn
    pub fn is_ready(&self) -> bool {
        self.is_steady() && !self.has_acted_this_turn
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        self.abilities.iter().any(|a| a.eq_ignore_ascii_case(ability))
    }

    /// Is the posture open to this unit at all?
    pub fn can_adopt(&self, posture: Posture) -> bool {
        posture
            .required_ability()
            .map_or(true, |ability| self.has_ability(ability))
    }

    /// Swap posture, exchanging the old posture modifier for the new one
    pub fn change_posture(&mut self, posture: Posture) {
        self.current_stats.revert(self.posture.stat_delta());
        self.current_stats.apply(posture.stat_delta());
        self.posture = posture;
    }

    pub fn movement_allowance(&self) -> u32 {
        self.current_stats.movement.max(0) as u32
    }

    pub fn has_ranged_attack(&self) -> bool {
        self.current_stats.ranged > 0
    }

    pub fn effective_attack(&self) -> i32 {
        self.current_stats.attack.max(0)
    }

    pub fn effective_defense(&self) -> i32 {
        self.current_stats.defense.max(0)
    }

    pub fn effective_ranged(&self) -> i32 {
        self.current_stats.ranged.max(0)
    }

    /// Pressure left before the unit breaks
    pub fn pressure_headroom(&self) -> i32 {
        (self.max_pressure - self.current_pressure).max(0)
    }
}

/// A commander present on the battlefield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleCommander {
    pub id: CommanderId,
    pub name: String,
    pub owner: PlayerSlot,
    pub position: HexCoord,
    /// Added to the initiative roll
    pub strategy: i32,
    /// Command budget per turn, spent on tactical cards
    pub command: i32,
    pub guard: i32,
    pub used_command_this_turn: i32,
    pub has_acted_this_turn: bool,
}

impl BattleCommander {
    pub fn new(
        id: CommanderId,
        name: impl Into<String>,
        owner: PlayerSlot,
        position: HexCoord,
        strategy: i32,
        command: i32,
        guard: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            position,
            strategy,
            command,
            guard,
            used_command_this_turn: 0,
            has_acted_this_turn: false,
        }
    }

    pub fn remaining_command(&self) -> i32 {
        self.command - self.used_command_this_turn
    }
}
