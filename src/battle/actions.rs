//! Player actions and the single entry point that applies them
//!
//! `apply_action` never mutates its input. It validates against the given
//! state and either returns a brand new state with the action folded in
//! (version bumped, log appended, victory evaluated) or a `Rejection`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battle::combat;
use crate::battle::hex::HexCoord;
use crate::battle::morale;
use crate::battle::movement;
use crate::battle::phase;
use crate::battle::state::{GameState, Phase};
use crate::battle::tactics::{self, CardId};
use crate::battle::units::{CommanderId, Posture, UnitId};
use crate::battle::victory::apply_victory;
use crate::core::error::Rejection;
use crate::core::types::PlayerSlot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    RollInitiative,
    MoveUnit {
        unit: UnitId,
        to: HexCoord,
    },
    SetPosture {
        unit: UnitId,
        posture: Posture,
    },
    RangedAttack {
        attacker: UnitId,
        target: UnitId,
    },
    Charge {
        attacker: UnitId,
        target: UnitId,
    },
    MeleeAttack {
        attacker: UnitId,
        target: UnitId,
    },
    RallyUnit {
        unit: UnitId,
    },
    UseTacticalCard {
        commander: CommanderId,
        unit: UnitId,
        card: CardId,
    },
    EndPhase,
}

impl Action {
    /// Short name used in logs and the audit trail
    pub fn kind(&self) -> &'static str {
        match self {
            Action::RollInitiative => "roll_initiative",
            Action::MoveUnit { .. } => "move_unit",
            Action::SetPosture { .. } => "set_posture",
            Action::RangedAttack { .. } => "ranged_attack",
            Action::Charge { .. } => "charge",
            Action::MeleeAttack { .. } => "melee_attack",
            Action::RallyUnit { .. } => "rally_unit",
            Action::UseTacticalCard { .. } => "use_tactical_card",
            Action::EndPhase => "end_phase",
        }
    }
}

fn require_phase(state: &GameState, phase: Phase) -> Result<(), Rejection> {
    if state.phase != phase {
        return Err(Rejection::WrongPhase(state.phase));
    }
    Ok(())
}

fn require_turn(state: &GameState, player: PlayerSlot) -> Result<(), Rejection> {
    if !state.awaits(player) {
        return Err(Rejection::NotYourTurn(player));
    }
    Ok(())
}

/// Validate and apply one action, producing the next state
pub fn apply_action<R: Rng>(
    state: &GameState,
    player: PlayerSlot,
    action: &Action,
    rng: &mut R,
    now: u64,
) -> Result<GameState, Rejection> {
    if state.is_finished {
        return Err(Rejection::MatchFinished);
    }

    let mut next = state.clone();
    match action {
        Action::RollInitiative => {
            phase::roll_initiative(&mut next, rng, now)?;
        }
        Action::MoveUnit { unit, to } => {
            require_phase(&next, Phase::Movement)?;
            require_turn(&next, player)?;
            movement::move_unit(&mut next, player, *unit, *to, now)?;
            phase::after_unit_action(&mut next);
        }
        Action::SetPosture { unit, posture } => {
            require_phase(&next, Phase::Movement)?;
            require_turn(&next, player)?;
            movement::set_posture(&mut next, player, *unit, *posture, now)?;
        }
        Action::RangedAttack { attacker, target } => {
            require_phase(&next, Phase::Shooting)?;
            require_turn(&next, player)?;
            combat::ranged_attack(&mut next, player, *attacker, *target, now)?;
            phase::after_unit_action(&mut next);
        }
        Action::Charge { attacker, target } => {
            require_phase(&next, Phase::Charge)?;
            require_turn(&next, player)?;
            combat::charge(&mut next, player, *attacker, *target, now)?;
            phase::after_unit_action(&mut next);
        }
        Action::MeleeAttack { attacker, target } => {
            require_phase(&next, Phase::Melee)?;
            require_turn(&next, player)?;
            combat::melee_attack(&mut next, player, *attacker, *target, now)?;
            phase::after_unit_action(&mut next);
        }
        Action::RallyUnit { unit } => {
            require_phase(&next, Phase::Rout)?;
            morale::rally_unit(&mut next, player, *unit, now)?;
        }
        Action::UseTacticalCard {
            commander,
            unit,
            card,
        } => {
            if !next.phase.is_unit_action_phase() {
                return Err(Rejection::WrongPhase(next.phase));
            }
            require_turn(&next, player)?;
            tactics::use_tactical_card(&mut next, player, *commander, *unit, card, now)?;
        }
        Action::EndPhase => {
            phase::end_phase(&mut next, player, rng, now)?;
        }
    }

    apply_victory(&mut next, now);
    next.version += 1;
    debug!(
        %player,
        action = action.kind(),
        version = next.version,
        phase = %next.phase,
        "action applied"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::battle_map::BattleMap;
    use crate::battle::units::{BattleUnit, UnitStats};
    use crate::core::types::PlayerPair;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn opening() -> (GameState, UnitId, UnitId) {
        let mut state = GameState::new(BattleMap::new(8, 8));
        let a = UnitId::new();
        let b = UnitId::new();
        state.units.insert(
            a,
            BattleUnit::new(a, "Blue", PlayerSlot::Player1, UnitStats::new(3, 3, 0, 3, 4), 10, 6),
        );
        state.units.insert(
            b,
            BattleUnit::new(b, "Red", PlayerSlot::Player2, UnitStats::new(3, 3, 0, 3, 4), 10, 6),
        );
        state.place_unit(a, HexCoord::new(2, 1));
        state.place_unit(b, HexCoord::new(2, 6));
        (state, a, b)
    }

    #[test]
    fn test_action_json_is_tagged() {
        let json = serde_json::to_value(Action::EndPhase).unwrap();
        assert_eq!(json["type"], "end_phase");
    }

    #[test]
    fn test_apply_does_not_touch_input() {
        let (state, a, _) = opening();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ready = state.clone();
        phase::apply_initiative(&mut ready, PlayerPair::new(15, 10), 0).unwrap();
        let moving = apply_action(&ready, PlayerSlot::Player1, &Action::EndPhase, &mut rng, 0).unwrap();
        let snapshot = moving.clone();

        let moved = apply_action(
            &moving,
            PlayerSlot::Player1,
            &Action::MoveUnit {
                unit: a,
                to: HexCoord::new(2, 3),
            },
            &mut rng,
            0,
        )
        .unwrap();

        assert_eq!(moving, snapshot);
        assert_eq!(moved.version, moving.version + 1);
        assert_eq!(moved.units[&a].position, HexCoord::new(2, 3));
    }

    #[test]
    fn test_wrong_phase_rejected() {
        let (state, a, _) = opening();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let result = apply_action(
            &state,
            PlayerSlot::Player1,
            &Action::MoveUnit {
                unit: a,
                to: HexCoord::new(2, 2),
            },
            &mut rng,
            0,
        );
        assert_eq!(result, Err(Rejection::WrongPhase(Phase::Initiative)));
    }

    #[test]
    fn test_finished_match_rejects_everything_first() {
        let (mut state, _, _) = opening();
        state.is_finished = true;
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for action in [Action::RollInitiative, Action::EndPhase] {
            assert_eq!(
                apply_action(&state, PlayerSlot::Player1, &action, &mut rng, 0),
                Err(Rejection::MatchFinished)
            );
        }
    }

    #[test]
    fn test_out_of_turn_move_rejected() {
        let (mut state, _, b) = opening();
        phase::apply_initiative(&mut state, PlayerPair::new(15, 10), 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let state = apply_action(&state, PlayerSlot::Player2, &Action::EndPhase, &mut rng, 0).unwrap();

        let result = apply_action(
            &state,
            PlayerSlot::Player2,
            &Action::MoveUnit {
                unit: b,
                to: HexCoord::new(2, 5),
            },
            &mut rng,
            0,
        );
        assert_eq!(result, Err(Rejection::NotYourTurn(PlayerSlot::Player2)));
    }
}
