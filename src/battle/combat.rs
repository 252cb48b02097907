//! Melee, ranged and charge actions
//!
//! Validates the engagement, resolves it with `battle::resolution` and
//! applies pressure and damage through `battle::morale`.

use tracing::debug;

use crate::battle::constants::FRIENDLY_FIRE_PRESSURE;
use crate::battle::hex::HexDirection;
use crate::battle::morale::{apply_damage, apply_pressure};
use crate::battle::movement::reachable_hexes;
use crate::battle::resolution::{
    resolve_melee, resolve_ranged, validate_melee_target, validate_ranged_target, FireLine,
    MeleeOutcome, RangedOutcome,
};
use crate::battle::state::{GameState, LogType};
use crate::battle::units::{Posture, UnitId};
use crate::core::error::Rejection;
use crate::core::types::PlayerSlot;

/// Apply pressure and damage to one unit, logging breaks and deaths
fn apply_hit(
    state: &mut GameState,
    id: UnitId,
    pressure: i32,
    damage: i32,
    now: u64,
) -> Result<(), Rejection> {
    let unit = state.unit_mut(id)?;
    if !unit.is_alive() {
        return Ok(());
    }
    let broke = apply_pressure(unit, pressure);
    let killed = apply_damage(unit, damage);
    let name = unit.name.clone();

    if killed {
        state.eliminate_unit(id);
        debug!(unit = %id, "unit destroyed");
        state.log(LogType::Combat, format!("{name} is destroyed"), now);
    } else if broke {
        debug!(unit = %id, "unit routed");
        state.log(LogType::Morale, format!("{name} breaks and routs"), now);
    }
    Ok(())
}

/// Mark the attacker as spent and turn it to face its target
fn finish_attack(state: &mut GameState, attacker_id: UnitId, target_id: UnitId) -> Result<(), Rejection> {
    let target_pos = state.unit(target_id)?.position;
    let attacker = state.unit_mut(attacker_id)?;
    if let Some(facing) = HexDirection::toward(attacker.position, target_pos) {
        attacker.facing = facing;
    }
    attacker.has_acted_this_turn = true;
    Ok(())
}

/// Resolve and apply a melee exchange between two already-validated units
fn strike(
    state: &mut GameState,
    attacker_id: UnitId,
    defender_id: UnitId,
    now: u64,
) -> Result<MeleeOutcome, Rejection> {
    let attacker = state.unit(attacker_id)?;
    let defender = state.unit(defender_id)?;
    let outcome = resolve_melee(attacker, defender);
    let message = format!(
        "{} attacks {} (margin {}): {} pressure and {} damage dealt, {} pressure and {} damage taken",
        attacker.name,
        defender.name,
        outcome.margin,
        outcome.defender_pressure,
        outcome.defender_damage,
        outcome.attacker_pressure,
        outcome.attacker_damage,
    );

    finish_attack(state, attacker_id, defender_id)?;
    state.log(LogType::Combat, message, now);
    apply_hit(
        state,
        defender_id,
        outcome.defender_pressure,
        outcome.defender_damage,
        now,
    )?;
    apply_hit(
        state,
        attacker_id,
        outcome.attacker_pressure,
        outcome.attacker_damage,
        now,
    )?;

    Ok(outcome)
}

/// Attack an adjacent enemy
pub fn melee_attack(
    state: &mut GameState,
    player: PlayerSlot,
    attacker_id: UnitId,
    defender_id: UnitId,
    now: u64,
) -> Result<MeleeOutcome, Rejection> {
    let attacker = state.ready_unit(player, attacker_id)?;
    let defender = state.unit(defender_id)?;
    validate_melee_target(attacker, defender)?;
    if defender.has_acted_this_turn {
        return Err(Rejection::AlreadyActed(defender_id));
    }
    strike(state, attacker_id, defender_id, now)
}

/// Shoot at an enemy in range and line of sight
pub fn ranged_attack(
    state: &mut GameState,
    player: PlayerSlot,
    shooter_id: UnitId,
    target_id: UnitId,
    now: u64,
) -> Result<RangedOutcome, Rejection> {
    let shooter = state.ready_unit(player, shooter_id)?;
    if !shooter.has_ranged_attack() {
        return Err(Rejection::NoRangedAttack(shooter_id));
    }
    let target = state.unit(target_id)?;
    let line = validate_ranged_target(state, shooter, target)?;
    let outcome = resolve_ranged(shooter, target);
    let message = format!(
        "{} shoots at {}: {} pressure, {} damage",
        shooter.name, target.name, outcome.pressure, outcome.damage
    );

    finish_attack(state, shooter_id, target_id)?;
    state.log(LogType::Combat, message, now);
    apply_hit(state, target_id, outcome.pressure, outcome.damage, now)?;

    if let FireLine::Screened(friend_id) = line {
        let friend = state.unit(friend_id)?.name.clone();
        state.log(
            LogType::Combat,
            format!("{friend} is caught in friendly fire"),
            now,
        );
        apply_hit(state, friend_id, FRIENDLY_FIRE_PRESSURE, 0, now)?;
    }

    Ok(outcome)
}

/// Charge into contact with an enemy, then fight
///
/// The charger moves to the cheapest reachable free hex next to the target.
/// A charger already in contact fights from where it stands.
pub fn charge(
    state: &mut GameState,
    player: PlayerSlot,
    attacker_id: UnitId,
    target_id: UnitId,
    now: u64,
) -> Result<MeleeOutcome, Rejection> {
    let attacker = state.ready_unit(player, attacker_id)?;
    if attacker.posture != Posture::Charge {
        return Err(Rejection::NotCharging(attacker_id));
    }
    let target = state.unit(target_id)?;
    if target.owner == attacker.owner || !target.is_alive() {
        return Err(Rejection::InvalidTarget {
            attacker: attacker_id,
            target: target_id,
        });
    }
    if target.has_acted_this_turn {
        return Err(Rejection::AlreadyActed(target_id));
    }

    if !attacker.position.is_adjacent(&target.position) {
        let reach = reachable_hexes(&state.map, attacker.position, attacker.movement_allowance());
        let destination = target
            .position
            .neighbors()
            .into_iter()
            .filter_map(|hex| reach.get(&hex).map(|&cost| (cost, hex)))
            .min_by_key(|&(cost, _)| cost)
            .map(|(_, hex)| hex)
            .ok_or(Rejection::OutOfReach(target.position))?;

        let name = attacker.name.clone();
        let target_name = target.name.clone();
        state.relocate_unit(attacker_id, destination);
        state.log(
            LogType::Movement,
            format!("{name} charges {target_name}, closing to {destination}"),
            now,
        );
    }

    strike(state, attacker_id, target_id, now)
}
