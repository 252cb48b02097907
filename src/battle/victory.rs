//! Victory detection
//!
//! A side is beaten once it has no unit that is both alive and steady.

use tracing::info;

use crate::battle::state::{GameState, LogType};
use crate::core::types::PlayerSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictoryStatus {
    Ongoing,
    Winner(PlayerSlot),
    /// Both sides collapsed in the same action
    Draw,
}

/// Does this side have nothing left holding the field?
pub fn side_defeated(state: &GameState, slot: PlayerSlot) -> bool {
    !state.units_of(slot).any(|u| u.is_steady())
}

pub fn evaluate(state: &GameState) -> VictoryStatus {
    match (
        side_defeated(state, PlayerSlot::Player1),
        side_defeated(state, PlayerSlot::Player2),
    ) {
        (false, false) => VictoryStatus::Ongoing,
        (true, false) => VictoryStatus::Winner(PlayerSlot::Player2),
        (false, true) => VictoryStatus::Winner(PlayerSlot::Player1),
        (true, true) => VictoryStatus::Draw,
    }
}

/// Evaluate and, on a decision, finish the match. Returns true if the
/// match is (now) finished.
pub fn apply_victory(state: &mut GameState, now: u64) -> bool {
    if state.is_finished {
        return true;
    }

    let message = match evaluate(state) {
        VictoryStatus::Ongoing => return false,
        VictoryStatus::Winner(slot) => {
            state.winner = Some(slot);
            format!("{slot} wins the battle")
        }
        VictoryStatus::Draw => {
            state.winner = None;
            "Both armies have left the field; the battle is a draw".to_string()
        }
    };

    state.is_finished = true;
    info!(turn = state.turn, winner = ?state.winner, "battle finished");
    state.log(LogType::Victory, message, now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::units::{BattleUnit, UnitId, UnitStats};

    fn state_with(units: &[(PlayerSlot, bool, i32)]) -> GameState {
        let mut state = GameState::new(BattleMap::new(4, 4));
        for &(owner, routing, health) in units {
            let id = UnitId::new();
            let mut unit =
                BattleUnit::new(id, "Band", owner, UnitStats::new(2, 2, 0, 2, 2), 5, 5);
            unit.is_routing = routing;
            unit.current_health = health;
            state.units.insert(id, unit);
        }
        state
    }

    #[test]
    fn test_both_sides_standing() {
        let state = state_with(&[(PlayerSlot::Player1, false, 5), (PlayerSlot::Player2, false, 5)]);
        assert_eq!(evaluate(&state), VictoryStatus::Ongoing);
    }

    #[test]
    fn test_routing_units_do_not_hold_the_field() {
        let state = state_with(&[
            (PlayerSlot::Player1, false, 5),
            (PlayerSlot::Player2, true, 5),
            (PlayerSlot::Player2, false, 0),
        ]);
        assert_eq!(evaluate(&state), VictoryStatus::Winner(PlayerSlot::Player1));
    }

    #[test]
    fn test_mutual_collapse_is_draw() {
        let mut state = state_with(&[(PlayerSlot::Player1, true, 5), (PlayerSlot::Player2, true, 5)]);
        assert!(apply_victory(&mut state, 0));
        assert!(state.is_finished);
        assert_eq!(state.winner, None);
    }

    #[test]
    fn test_apply_victory_sets_winner_once() {
        let mut state = state_with(&[(PlayerSlot::Player1, false, 5), (PlayerSlot::Player2, false, 0)]);
        assert!(apply_victory(&mut state, 0));
        assert_eq!(state.winner, Some(PlayerSlot::Player1));
        assert_eq!(state.battle_log.len(), 1);

        assert!(apply_victory(&mut state, 0));
        assert_eq!(state.battle_log.len(), 1);
    }
}
