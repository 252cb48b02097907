//! Pressure, routing, retreat, recovery and rally
//!
//! Pressure accumulates from combat. A unit whose pressure reaches its
//! maximum breaks and routs on that same update. Rallying a unit raises its
//! permanent pressure floor, so every rally leaves it a little more brittle.

use tracing::debug;

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::{
    MIN_ROUT_DISTANCE, RALLY_ALLY_RANGE, RALLY_COMMANDER_RANGE, RALLY_FATIGUE,
    REORGANIZE_RECOVERY,
};
use crate::battle::hex::{HexCoord, HexDirection};
use crate::battle::state::{GameState, LogType};
use crate::battle::units::{BattleUnit, CommanderId, Posture, UnitId};
use crate::core::error::Rejection;
use crate::core::types::PlayerSlot;

/// Add pressure to a unit, clamped to `[permanent_pressure, max_pressure]`.
///
/// Returns true if the unit broke on this update.
pub fn apply_pressure(unit: &mut BattleUnit, amount: i32) -> bool {
    unit.current_pressure =
        (unit.current_pressure + amount).clamp(unit.permanent_pressure, unit.max_pressure);

    if !unit.is_routing && unit.current_pressure >= unit.max_pressure {
        unit.is_routing = true;
        return true;
    }
    false
}

/// Remove health. Returns true if the unit has none left.
pub fn apply_damage(unit: &mut BattleUnit, amount: i32) -> bool {
    unit.current_health = (unit.current_health - amount.max(0)).max(0);
    unit.current_health == 0
}

/// Pressure a reorganizing unit sheds in one reorganization phase
pub fn recovery_amount(unit: &BattleUnit) -> i32 {
    (unit.current_pressure - unit.permanent_pressure).clamp(0, REORGANIZE_RECOVERY)
}

/// Where a routing unit ends up this rout phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetreatOutcome {
    /// Reached or passed its home edge: leaves the field
    Flee,
    /// Falls back to a free hex
    Move(HexCoord),
    /// Path is blocked; stays put
    Hold,
}

/// Straight-line retreat toward the owner's home row
pub fn retreat_destination(map: &BattleMap, unit: &BattleUnit) -> RetreatOutcome {
    let distance = unit.current_stats.movement.max(MIN_ROUT_DISTANCE);
    let step = BattleMap::homeward_step(unit.owner);
    let target_row = unit.position.r + step * distance;
    let home = map.home_row(unit.owner);

    let reaches_edge = match unit.owner {
        PlayerSlot::Player1 => target_row <= home,
        PlayerSlot::Player2 => target_row >= home,
    };
    if reaches_edge {
        return RetreatOutcome::Flee;
    }

    let destination = HexCoord::new(unit.position.q, target_row);
    if map.is_free(destination) {
        RetreatOutcome::Move(destination)
    } else {
        RetreatOutcome::Hold
    }
}

/// Run forced retreat for every routing unit still on the field
pub fn forced_retreat(state: &mut GameState, now: u64) {
    let routing: Vec<UnitId> = state
        .units
        .values()
        .filter(|u| u.is_alive() && u.is_routing)
        .map(|u| u.id)
        .collect();

    for id in routing {
        let Some(unit) = state.units.get(&id) else {
            continue;
        };
        let name = unit.name.clone();
        let from = unit.position;

        match retreat_destination(&state.map, unit) {
            RetreatOutcome::Flee => {
                state.eliminate_unit(id);
                debug!(unit = %id, "routing unit fled the field");
                state.log(
                    LogType::Morale,
                    format!("{name} flees the battlefield"),
                    now,
                );
            }
            RetreatOutcome::Move(to) => {
                state.relocate_unit(id, to);
                if let (Some(unit), Some(facing)) =
                    (state.units.get_mut(&id), HexDirection::toward(from, to))
                {
                    unit.facing = facing;
                }
                state.log(
                    LogType::Morale,
                    format!("{name} retreats from {from} to {to}"),
                    now,
                );
            }
            RetreatOutcome::Hold => {
                state.log(
                    LogType::Morale,
                    format!("{name} is routing but its retreat is blocked"),
                    now,
                );
            }
        }
    }
}

/// Recover pressure for every steady unit in Reorganizing posture
pub fn reorganize(state: &mut GameState, now: u64) {
    let mut recovered = Vec::new();
    for unit in state.units.values_mut() {
        if !unit.is_steady() || unit.posture != Posture::Reorganizing {
            continue;
        }
        let amount = recovery_amount(unit);
        if amount > 0 {
            unit.current_pressure -= amount;
            recovered.push((unit.name.clone(), amount));
        }
    }

    for (name, amount) in recovered {
        state.log(
            LogType::Morale,
            format!("{name} reorganizes and recovers {amount} pressure"),
            now,
        );
    }
}

/// What lets a routing unit rally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RallySupport {
    Commander(CommanderId),
    Ally(UnitId),
}

/// A fresh commander in range, else a steady adjacent ally
pub fn find_rally_support(state: &GameState, unit: &BattleUnit) -> Option<RallySupport> {
    let commander = state.commanders_of(unit.owner).find(|c| {
        !c.has_acted_this_turn && c.position.distance(&unit.position) <= RALLY_COMMANDER_RANGE
    });
    if let Some(commander) = commander {
        return Some(RallySupport::Commander(commander.id));
    }

    state
        .units_of(unit.owner)
        .find(|ally| {
            ally.id != unit.id
                && ally.is_steady()
                && ally.position.distance(&unit.position) <= RALLY_ALLY_RANGE
        })
        .map(|ally| RallySupport::Ally(ally.id))
}

/// Bring a routing unit back under control
pub fn rally_unit(
    state: &mut GameState,
    player: PlayerSlot,
    unit_id: UnitId,
    now: u64,
) -> Result<RallySupport, Rejection> {
    let unit = state.unit(unit_id)?;
    if unit.owner != player {
        return Err(Rejection::NotOwner(player));
    }
    if !unit.is_alive() {
        return Err(Rejection::UnitEliminated(unit_id));
    }
    if !unit.is_routing {
        return Err(Rejection::NotRouting(unit_id));
    }
    if unit.permanent_pressure + RALLY_FATIGUE >= unit.max_pressure {
        return Err(Rejection::TooExhaustedToRally(unit_id));
    }
    let support = find_rally_support(state, unit).ok_or(Rejection::NoRallySupport(unit_id))?;

    let unit = state.unit_mut(unit_id)?;
    unit.is_routing = false;
    unit.change_posture(Posture::Offensive);
    unit.permanent_pressure += RALLY_FATIGUE;
    unit.current_pressure = unit.permanent_pressure;
    let name = unit.name.clone();

    let helper = match support {
        RallySupport::Commander(commander_id) => {
            let commander = state.commander_mut(commander_id)?;
            commander.has_acted_this_turn = true;
            commander.name.clone()
        }
        RallySupport::Ally(ally_id) => state.unit(ally_id)?.name.clone(),
    };

    debug!(unit = %unit_id, ?support, "unit rallied");
    state.log(
        LogType::Morale,
        format!("{name} rallies with support from {helper}"),
        now,
    );
    Ok(support)
}
