//! Unit movement and posture changes
//!
//! Reachability is a uniform-cost search over the map that respects
//! terrain costs and never passes through an occupied hex.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use tracing::debug;

use crate::battle::battle_map::BattleMap;
use crate::battle::hex::{HexCoord, HexDirection};
use crate::battle::state::{GameState, LogType};
use crate::battle::units::{Posture, UnitId};
use crate::core::error::Rejection;
use crate::core::types::PlayerSlot;

/// Node in the search frontier
#[derive(Debug, Clone)]
struct PathNode {
    coord: HexCoord,
    cost: u32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.cost.cmp(&self.cost)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Every hex reachable from `start` within `budget` movement points,
/// with the cheapest cost to get there. The start hex is included at cost 0.
pub fn reachable_hexes(map: &BattleMap, start: HexCoord, budget: u32) -> AHashMap<HexCoord, u32> {
    let mut best: AHashMap<HexCoord, u32> = AHashMap::new();
    let mut open_set = BinaryHeap::new();

    best.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        cost: 0,
    });

    while let Some(current) = open_set.pop() {
        if best.get(&current.coord).is_some_and(|&c| current.cost > c) {
            continue; // Stale entry
        }

        for neighbor in current.coord.neighbors() {
            let Some(hex) = map.hex(neighbor) else {
                continue;
            };
            if !hex.is_free() {
                continue;
            }

            let cost = current.cost + hex.terrain.movement_cost();
            if cost > budget {
                continue;
            }
            if best.get(&neighbor).map_or(true, |&known| cost < known) {
                best.insert(neighbor, cost);
                open_set.push(PathNode {
                    coord: neighbor,
                    cost,
                });
            }
        }
    }

    best
}

/// Can the unit reach `destination` this turn?
pub fn can_reach(state: &GameState, unit_id: UnitId, destination: HexCoord) -> bool {
    let Some(unit) = state.units.get(&unit_id) else {
        return false;
    };
    destination != unit.position
        && reachable_hexes(&state.map, unit.position, unit.movement_allowance())
            .contains_key(&destination)
}

/// Move one of `player`'s units. Consumes the unit's action.
pub fn move_unit(
    state: &mut GameState,
    player: PlayerSlot,
    unit_id: UnitId,
    destination: HexCoord,
    now: u64,
) -> Result<(), Rejection> {
    let unit = state.ready_unit(player, unit_id)?;
    let from = unit.position;
    let allowance = unit.movement_allowance();

    if !state.map.is_valid_hex(destination) {
        return Err(Rejection::InvalidHex(destination));
    }
    if destination == from || !state.map.is_free(destination) {
        return Err(Rejection::HexOccupied(destination));
    }
    if !reachable_hexes(&state.map, from, allowance).contains_key(&destination) {
        return Err(Rejection::OutOfReach(destination));
    }

    state.relocate_unit(unit_id, destination);
    let unit = state.unit_mut(unit_id)?;
    if let Some(facing) = HexDirection::toward(from, destination) {
        unit.facing = facing;
    }
    unit.has_acted_this_turn = true;
    let name = unit.name.clone();

    debug!(unit = %unit_id, %from, to = %destination, "unit moved");
    state.log(
        LogType::Movement,
        format!("{name} moves from {from} to {destination}"),
        now,
    );
    Ok(())
}

/// Change a unit's posture. Does not consume the unit's action.
pub fn set_posture(
    state: &mut GameState,
    player: PlayerSlot,
    unit_id: UnitId,
    posture: Posture,
    now: u64,
) -> Result<(), Rejection> {
    let unit = state.ready_unit(player, unit_id)?;
    if unit.posture == posture {
        return Err(Rejection::AlreadyInPosture(unit_id));
    }
    if !unit.can_adopt(posture) {
        return Err(Rejection::PostureUnavailable {
            unit: unit_id,
            posture,
        });
    }

    let unit = state.unit_mut(unit_id)?;
    unit.change_posture(posture);
    let name = unit.name.clone();
    state.log(
        LogType::Movement,
        format!("{name} adopts {posture:?} posture"),
        now,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::Terrain;
    use crate::battle::units::{BattleUnit, UnitStats};

    fn state_with(units: &[(HexCoord, PlayerSlot)]) -> (GameState, Vec<UnitId>) {
        let mut state = GameState::new(BattleMap::new(12, 10));
        let mut ids = Vec::new();
        for &(coord, owner) in units {
            let id = UnitId::new();
            state.units.insert(
                id,
                BattleUnit::new(id, "Foot", owner, UnitStats::new(3, 3, 0, 3, 5), 10, 6),
            );
            state.place_unit(id, coord);
            ids.push(id);
        }
        (state, ids)
    }

    #[test]
    fn test_reachable_on_open_ground_matches_distance() {
        let map = BattleMap::new(12, 10);
        let start = HexCoord::new(2, 3);
        let reach = reachable_hexes(&map, start, 3);

        for hex in map.hexes() {
            let expected = start.distance(&hex.coord) <= 3;
            assert_eq!(reach.contains_key(&hex.coord), expected, "{}", hex.coord);
        }
    }

    #[test]
    fn test_forest_costs_double() {
        let mut map = BattleMap::new(12, 10);
        map.set_terrain(HexCoord::new(3, 3), Terrain::Forest);
        let reach = reachable_hexes(&map, HexCoord::new(2, 3), 3);
        assert_eq!(reach.get(&HexCoord::new(3, 3)), Some(&2));
    }

    #[test]
    fn test_occupied_hexes_block_paths() {
        let mut map = BattleMap::new(3, 1);
        map.set_occupant(HexCoord::new(1, 0), UnitId::new());
        let reach = reachable_hexes(&map, HexCoord::new(0, 0), 5);
        assert!(!reach.contains_key(&HexCoord::new(2, 0)));
    }

    #[test]
    fn test_move_updates_position_and_facing() {
        let (mut state, ids) = state_with(&[(HexCoord::new(2, 3), PlayerSlot::Player1)]);
        move_unit(&mut state, PlayerSlot::Player1, ids[0], HexCoord::new(5, 3), 0).unwrap();

        let unit = &state.units[&ids[0]];
        assert_eq!(unit.position, HexCoord::new(5, 3));
        assert_eq!(unit.facing, HexDirection::East);
        assert!(unit.has_acted_this_turn);
        assert_eq!(state.map.occupant(HexCoord::new(5, 3)), Some(ids[0]));
        assert!(state.map.is_free(HexCoord::new(2, 3)));
    }

    #[test]
    fn test_move_rejections() {
        let (mut state, ids) = state_with(&[
            (HexCoord::new(2, 3), PlayerSlot::Player1),
            (HexCoord::new(3, 3), PlayerSlot::Player2),
        ]);
        let mover = ids[0];

        assert_eq!(
            move_unit(&mut state, PlayerSlot::Player1, mover, HexCoord::new(3, 3), 0),
            Err(Rejection::HexOccupied(HexCoord::new(3, 3)))
        );
        assert_eq!(
            move_unit(&mut state, PlayerSlot::Player1, mover, HexCoord::new(-1, 3), 0),
            Err(Rejection::InvalidHex(HexCoord::new(-1, 3)))
        );
        assert_eq!(
            move_unit(&mut state, PlayerSlot::Player1, mover, HexCoord::new(2, 7), 0),
            Err(Rejection::OutOfReach(HexCoord::new(2, 7)))
        );
        assert_eq!(
            move_unit(&mut state, PlayerSlot::Player2, mover, HexCoord::new(2, 4), 0),
            Err(Rejection::NotOwner(PlayerSlot::Player2))
        );

        move_unit(&mut state, PlayerSlot::Player1, mover, HexCoord::new(2, 4), 0).unwrap();
        assert_eq!(
            move_unit(&mut state, PlayerSlot::Player1, mover, HexCoord::new(2, 5), 0),
            Err(Rejection::AlreadyActed(mover))
        );
    }

    #[test]
    fn test_posture_change_keeps_action() {
        let (mut state, ids) = state_with(&[(HexCoord::new(2, 3), PlayerSlot::Player1)]);
        set_posture(&mut state, PlayerSlot::Player1, ids[0], Posture::Defensive, 0).unwrap();

        let unit = &state.units[&ids[0]];
        assert_eq!(unit.posture, Posture::Defensive);
        assert!(!unit.has_acted_this_turn);

        assert_eq!(
            set_posture(&mut state, PlayerSlot::Player1, ids[0], Posture::Charge, 0),
            Err(Rejection::PostureUnavailable {
                unit: ids[0],
                posture: Posture::Charge
            })
        );
    }
}
