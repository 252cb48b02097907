//! The authoritative battle aggregate
//!
//! A `GameState` is a value: engines clone it, mutate the clone and hand the
//! clone back, so no caller ever observes a half-applied action.

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::battle::battle_map::BattleMap;
use crate::battle::hex::HexCoord;
use crate::battle::tactics::{CardId, TacticalCard};
use crate::battle::units::{BattleCommander, BattleUnit, CommanderId, UnitId};
use crate::core::error::Rejection;
use crate::core::types::{PlayerPair, PlayerSlot};

/// Phases of a turn, in play order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[display(fmt = "initiative")]
    Initiative,
    #[display(fmt = "movement")]
    Movement,
    #[display(fmt = "shooting")]
    Shooting,
    #[display(fmt = "charge")]
    Charge,
    #[display(fmt = "melee")]
    Melee,
    #[display(fmt = "rout")]
    Rout,
    #[display(fmt = "reorganization")]
    Reorganization,
    #[display(fmt = "end_turn")]
    EndTurn,
}

impl Phase {
    /// The phase that follows this one; end of turn wraps to initiative
    pub fn next(&self) -> Phase {
        match self {
            Phase::Initiative => Phase::Movement,
            Phase::Movement => Phase::Shooting,
            Phase::Shooting => Phase::Charge,
            Phase::Charge => Phase::Melee,
            Phase::Melee => Phase::Rout,
            Phase::Rout => Phase::Reorganization,
            Phase::Reorganization => Phase::EndTurn,
            Phase::EndTurn => Phase::Initiative,
        }
    }

    /// Phases in which units take turns acting one at a time
    pub fn is_unit_action_phase(&self) -> bool {
        matches!(
            self,
            Phase::Movement | Phase::Shooting | Phase::Charge | Phase::Melee
        )
    }
}

/// Category of a battle log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Phase,
    Initiative,
    Movement,
    Combat,
    Morale,
    Tactic,
    Victory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLogEntry {
    pub turn: u32,
    pub phase: Phase,
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub entry_type: LogType,
    pub message: String,
}

/// Full state of one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Bumped by every accepted action; the sync layer compares it to
    /// detect concurrent writers
    pub version: u64,
    pub turn: u32,
    pub phase: Phase,
    pub active_player: PlayerSlot,
    pub initiative_winner: Option<PlayerSlot>,
    pub initiative_advantage: u8,
    pub initiative_rolls: Option<PlayerPair<i32>>,
    pub units_moved_this_phase: u32,

    pub map: BattleMap,
    pub units: BTreeMap<UnitId, BattleUnit>,
    pub commanders: BTreeMap<CommanderId, BattleCommander>,
    pub card_library: BTreeMap<CardId, TacticalCard>,
    pub hands: PlayerPair<Vec<CardId>>,

    pub battle_log: Vec<BattleLogEntry>,
    pub is_finished: bool,
    pub winner: Option<PlayerSlot>,
}

impl GameState {
    /// Empty opening state on the given map, turn 1, initiative phase
    pub fn new(map: BattleMap) -> Self {
        Self {
            version: 0,
            turn: 1,
            phase: Phase::Initiative,
            active_player: PlayerSlot::Player1,
            initiative_winner: None,
            initiative_advantage: 0,
            initiative_rolls: None,
            units_moved_this_phase: 0,
            map,
            units: BTreeMap::new(),
            commanders: BTreeMap::new(),
            card_library: BTreeMap::new(),
            hands: PlayerPair::default(),
            battle_log: Vec::new(),
            is_finished: false,
            winner: None,
        }
    }

    /// Is this player the one expected to act?
    pub fn awaits(&self, player: PlayerSlot) -> bool {
        !self.is_finished && self.active_player == player
    }

    pub fn unit(&self, id: UnitId) -> Result<&BattleUnit, Rejection> {
        self.units.get(&id).ok_or(Rejection::UnitNotFound(id))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut BattleUnit, Rejection> {
        self.units.get_mut(&id).ok_or(Rejection::UnitNotFound(id))
    }

    /// A unit `player` owns that may still take its action this turn
    pub fn ready_unit(&self, player: PlayerSlot, id: UnitId) -> Result<&BattleUnit, Rejection> {
        let unit = self.unit(id)?;
        if unit.owner != player {
            return Err(Rejection::NotOwner(player));
        }
        if !unit.is_alive() {
            return Err(Rejection::UnitEliminated(id));
        }
        if unit.is_routing {
            return Err(Rejection::UnitRouting(id));
        }
        if unit.has_acted_this_turn {
            return Err(Rejection::AlreadyActed(id));
        }
        Ok(unit)
    }

    pub fn commander(&self, id: CommanderId) -> Result<&BattleCommander, Rejection> {
        self.commanders
            .get(&id)
            .ok_or(Rejection::CommanderNotFound(id))
    }

    pub fn commander_mut(&mut self, id: CommanderId) -> Result<&mut BattleCommander, Rejection> {
        self.commanders
            .get_mut(&id)
            .ok_or(Rejection::CommanderNotFound(id))
    }

    /// Units of one side, in id order
    pub fn units_of(&self, slot: PlayerSlot) -> impl Iterator<Item = &BattleUnit> {
        self.units.values().filter(move |u| u.owner == slot)
    }

    pub fn commanders_of(&self, slot: PlayerSlot) -> impl Iterator<Item = &BattleCommander> {
        self.commanders.values().filter(move |c| c.owner == slot)
    }

    /// The unit standing on a hex, if any
    pub fn unit_at(&self, coord: HexCoord) -> Option<&BattleUnit> {
        self.map
            .occupant(coord)
            .and_then(|id| self.units.get(&id))
    }

    /// Append a battle log entry stamped with the current turn and phase
    pub fn log(&mut self, entry_type: LogType, message: impl Into<String>, now: u64) {
        self.battle_log.push(BattleLogEntry {
            turn: self.turn,
            phase: self.phase,
            timestamp: now,
            entry_type,
            message: message.into(),
        });
    }

    /// Put a unit on a hex, folding in the hex's terrain
    ///
    /// The unit must currently be off the board (fresh or just lifted).
    pub(crate) fn place_unit(&mut self, id: UnitId, to: HexCoord) {
        let terrain = self.map.terrain(to);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.position = to;
            unit.current_stats.apply(terrain.stat_delta());
            self.map.set_occupant(to, id);
        }
    }

    /// Lift a unit off its hex, removing the hex's terrain modifier
    fn lift_unit(&mut self, id: UnitId) {
        if let Some(unit) = self.units.get_mut(&id) {
            let from = unit.position;
            unit.current_stats
                .revert(self.map.terrain(from).stat_delta());
            if self.map.occupant(from) == Some(id) {
                self.map.clear_occupant(from);
            }
        }
    }

    /// Move a unit between hexes, swapping terrain modifiers and occupancy
    pub(crate) fn relocate_unit(&mut self, id: UnitId, to: HexCoord) {
        self.lift_unit(id);
        self.place_unit(id, to);
    }

    /// Take a unit out of play: health drops to zero and its hex is freed.
    /// The unit itself stays in the roster for the log and replays.
    pub(crate) fn eliminate_unit(&mut self, id: UnitId) {
        self.lift_unit(id);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.current_health = 0;
        }
    }
}
