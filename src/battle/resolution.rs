//! Pure combat resolution
//!
//! These functions only compute outcomes from current stats. Applying the
//! outcome to a state is the job of `battle::combat`.

use crate::battle::constants::{
    BASE_MELEE_PRESSURE, MAX_COUNTER_PRESSURE, MAX_MELEE_PRESSURE, MAX_RANGED_RANGE,
};
use crate::battle::state::GameState;
use crate::battle::units::{BattleUnit, UnitId};
use crate::core::error::Rejection;

/// Result of one melee exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeleeOutcome {
    /// Attack minus defense, before any clamping
    pub margin: i32,
    pub defender_pressure: i32,
    pub defender_damage: i32,
    pub attacker_pressure: i32,
    pub attacker_damage: i32,
}

/// Resolve a melee attack, including the defender's counter-blow
///
/// Routing defenders do not strike back.
pub fn resolve_melee(attacker: &BattleUnit, defender: &BattleUnit) -> MeleeOutcome {
    let margin = attacker.effective_attack() - defender.effective_defense();

    let (attacker_pressure, attacker_damage) = if defender.is_routing {
        (0, 0)
    } else {
        let counter = defender.effective_attack() - attacker.effective_defense();
        (
            (counter + 1).clamp(0, MAX_COUNTER_PRESSURE),
            counter.max(0),
        )
    };

    MeleeOutcome {
        margin,
        defender_pressure: (margin + BASE_MELEE_PRESSURE).clamp(1, MAX_MELEE_PRESSURE),
        defender_damage: margin.max(1),
        attacker_pressure,
        attacker_damage,
    }
}

/// Result of one volley
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangedOutcome {
    pub pressure: i32,
    pub damage: i32,
}

pub fn resolve_ranged(shooter: &BattleUnit, target: &BattleUnit) -> RangedOutcome {
    let ranged = shooter.effective_ranged();
    let defense = target.effective_defense();
    RangedOutcome {
        pressure: (ranged - defense / 2).max(1),
        damage: i32::from(ranged > defense),
    }
}

/// What lies between a shooter and its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireLine {
    Clear,
    /// A friendly unit is in the way and will catch some of the volley
    Screened(UnitId),
    /// Terrain or an enemy unit stops the shot
    Blocked,
}

/// Walk the hex line from shooter to target
pub fn check_fire_line(state: &GameState, shooter: &BattleUnit, target: &BattleUnit) -> FireLine {
    let mut screen = None;
    for coord in state.map.hexes_between(shooter.position, target.position) {
        if state.map.terrain(coord).blocks_line_of_sight() {
            return FireLine::Blocked;
        }
        if let Some(blocker) = state.unit_at(coord) {
            if blocker.owner != shooter.owner {
                return FireLine::Blocked;
            }
            screen.get_or_insert(blocker.id);
        }
    }
    screen.map_or(FireLine::Clear, FireLine::Screened)
}

/// Maximum shooting distance from the unit's current hex
pub fn shooting_range(state: &GameState, shooter: &BattleUnit) -> u32 {
    MAX_RANGED_RANGE + state.map.terrain(shooter.position).range_bonus()
}

/// Check that `target` can be shot by `shooter` and report the fire line
pub fn validate_ranged_target(
    state: &GameState,
    shooter: &BattleUnit,
    target: &BattleUnit,
) -> Result<FireLine, Rejection> {
    let invalid = Rejection::InvalidTarget {
        attacker: shooter.id,
        target: target.id,
    };
    if target.owner == shooter.owner || !target.is_alive() {
        return Err(invalid);
    }

    let distance = shooter.position.distance(&target.position);
    if distance == 0 || distance > shooting_range(state, shooter) {
        return Err(invalid);
    }

    match check_fire_line(state, shooter, target) {
        FireLine::Blocked => Err(invalid),
        line => Ok(line),
    }
}

/// Check that `defender` can be struck in melee by `attacker`
pub fn validate_melee_target(attacker: &BattleUnit, defender: &BattleUnit) -> Result<(), Rejection> {
    if defender.owner == attacker.owner
        || !defender.is_alive()
        || !attacker.position.is_adjacent(&defender.position)
    {
        return Err(Rejection::InvalidTarget {
            attacker: attacker.id,
            target: defender.id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::hex::HexCoord;
    use crate::battle::terrain::Terrain;
    use crate::battle::units::UnitStats;
    use crate::core::types::PlayerSlot;

    fn unit(owner: PlayerSlot, attack: i32, defense: i32, ranged: i32) -> BattleUnit {
        BattleUnit::new(
            UnitId::new(),
            "Test",
            owner,
            UnitStats::new(attack, defense, ranged, 3, 4),
            10,
            6,
        )
    }

    #[test]
    fn test_melee_even_fight() {
        let a = unit(PlayerSlot::Player1, 3, 3, 0);
        let d = unit(PlayerSlot::Player2, 3, 3, 0);
        let outcome = resolve_melee(&a, &d);

        assert_eq!(outcome.margin, 0);
        assert_eq!(outcome.defender_pressure, 2);
        assert_eq!(outcome.defender_damage, 1);
        assert_eq!(outcome.attacker_pressure, 1);
        assert_eq!(outcome.attacker_damage, 0);
    }

    #[test]
    fn test_melee_pressure_is_capped() {
        let a = unit(PlayerSlot::Player1, 9, 5, 0);
        let d = unit(PlayerSlot::Player2, 1, 1, 0);
        let outcome = resolve_melee(&a, &d);

        assert_eq!(outcome.defender_pressure, 4);
        assert_eq!(outcome.defender_damage, 8);
        assert_eq!(outcome.attacker_pressure, 0);
    }

    #[test]
    fn test_melee_always_applies_some_pressure() {
        let a = unit(PlayerSlot::Player1, 1, 1, 0);
        let d = unit(PlayerSlot::Player2, 6, 8, 0);
        let outcome = resolve_melee(&a, &d);

        assert_eq!(outcome.defender_pressure, 1);
        assert_eq!(outcome.defender_damage, 1);
        assert_eq!(outcome.attacker_pressure, 3);
        assert_eq!(outcome.attacker_damage, 5);
    }

    #[test]
    fn test_routing_defender_does_not_counter() {
        let a = unit(PlayerSlot::Player1, 1, 1, 0);
        let mut d = unit(PlayerSlot::Player2, 6, 1, 0);
        d.is_routing = true;
        let outcome = resolve_melee(&a, &d);

        assert_eq!(outcome.attacker_pressure, 0);
        assert_eq!(outcome.attacker_damage, 0);
    }

    #[test]
    fn test_ranged_outcome() {
        let archers = unit(PlayerSlot::Player1, 1, 1, 4);
        let target = unit(PlayerSlot::Player2, 3, 2, 0);
        assert_eq!(
            resolve_ranged(&archers, &target),
            RangedOutcome {
                pressure: 3,
                damage: 1
            }
        );

        let armored = unit(PlayerSlot::Player2, 3, 6, 0);
        assert_eq!(
            resolve_ranged(&archers, &armored),
            RangedOutcome {
                pressure: 1,
                damage: 0
            }
        );
    }

    fn shooting_state() -> (GameState, BattleUnit, BattleUnit) {
        let mut state = GameState::new(BattleMap::new(10, 10));
        let shooter = unit(PlayerSlot::Player1, 1, 1, 3).at(HexCoord::new(0, 0));
        let target = unit(PlayerSlot::Player2, 1, 1, 0).at(HexCoord::new(4, 0));
        for u in [&shooter, &target] {
            state.units.insert(u.id, u.clone());
            state.map.set_occupant(u.position, u.id);
        }
        (state, shooter, target)
    }

    #[test]
    fn test_fire_line_clear_and_forest() {
        let (mut state, shooter, target) = shooting_state();
        assert_eq!(check_fire_line(&state, &shooter, &target), FireLine::Clear);

        state.map.set_terrain(HexCoord::new(2, 0), Terrain::Forest);
        assert_eq!(check_fire_line(&state, &shooter, &target), FireLine::Blocked);
    }

    #[test]
    fn test_fire_line_screened_by_first_friend() {
        let (mut state, shooter, target) = shooting_state();
        let near = unit(PlayerSlot::Player1, 1, 1, 0).at(HexCoord::new(1, 0));
        let far = unit(PlayerSlot::Player1, 1, 1, 0).at(HexCoord::new(3, 0));
        for u in [&near, &far] {
            state.units.insert(u.id, u.clone());
            state.map.set_occupant(u.position, u.id);
        }

        assert_eq!(
            check_fire_line(&state, &shooter, &target),
            FireLine::Screened(near.id)
        );
    }

    #[test]
    fn test_fire_line_blocked_by_enemy() {
        let (mut state, shooter, target) = shooting_state();
        let enemy = unit(PlayerSlot::Player2, 1, 1, 0).at(HexCoord::new(2, 0));
        state.units.insert(enemy.id, enemy.clone());
        state.map.set_occupant(enemy.position, enemy.id);

        assert_eq!(check_fire_line(&state, &shooter, &target), FireLine::Blocked);
    }

    #[test]
    fn test_hill_extends_range() {
        let (mut state, shooter, mut target) = shooting_state();
        state.map.clear_occupant(target.position);
        target.position = HexCoord::new(5, 0);
        state.map.set_occupant(target.position, target.id);
        assert!(validate_ranged_target(&state, &shooter, &target).is_err());

        state.map.set_terrain(shooter.position, Terrain::Hill);
        assert_eq!(
            validate_ranged_target(&state, &shooter, &target),
            Ok(FireLine::Clear)
        );
    }

    #[test]
    fn test_melee_target_must_be_adjacent_enemy() {
        let a = unit(PlayerSlot::Player1, 3, 3, 0).at(HexCoord::new(2, 2));
        let friend = unit(PlayerSlot::Player1, 3, 3, 0).at(HexCoord::new(3, 2));
        let far = unit(PlayerSlot::Player2, 3, 3, 0).at(HexCoord::new(5, 2));
        let near = unit(PlayerSlot::Player2, 3, 3, 0).at(HexCoord::new(2, 3));

        assert!(validate_melee_target(&a, &friend).is_err());
        assert!(validate_melee_target(&a, &far).is_err());
        assert!(validate_melee_target(&a, &near).is_ok());
    }
}
