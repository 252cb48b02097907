//! Phase scheduling: initiative, phase order, skips, alternation and
//! turn rollover

use rand::Rng;
use tracing::debug;

use crate::battle::constants::{INITIATIVE_DIE_SIDES, MAX_INITIATIVE_ADVANTAGE};
use crate::battle::morale;
use crate::battle::state::{GameState, LogType, Phase};
use crate::battle::tactics::revert_card;
use crate::battle::units::Posture;
use crate::battle::victory::apply_victory;
use crate::core::error::Rejection;
use crate::core::types::{PlayerPair, PlayerSlot};

/// Map an initiative roll difference to consecutive opening actions
pub fn advantage_for(diff: i32) -> u8 {
    match diff.abs() {
        0 => 0,
        1..=3 => 1,
        4..=6 => 2,
        7..=9 => 3,
        _ => MAX_INITIATIVE_ADVANTAGE,
    }
}

/// Winner and advantage for a pair of rolls. Ties go to player 1.
pub fn resolve_initiative(rolls: &PlayerPair<i32>) -> (PlayerSlot, u8) {
    let winner = if rolls.player1 >= rolls.player2 {
        PlayerSlot::Player1
    } else {
        PlayerSlot::Player2
    };
    (winner, advantage_for(rolls.player1 - rolls.player2))
}

/// Best strategy among a side's commanders
pub fn initiative_strength(state: &GameState, slot: PlayerSlot) -> i32 {
    state
        .commanders_of(slot)
        .map(|c| c.strategy)
        .max()
        .unwrap_or(0)
}

/// Record finished initiative rolls and hand control to the winner
pub fn apply_initiative(
    state: &mut GameState,
    rolls: PlayerPair<i32>,
    now: u64,
) -> Result<(), Rejection> {
    if state.phase != Phase::Initiative {
        return Err(Rejection::WrongPhase(state.phase));
    }
    if state.initiative_rolls.is_some() {
        return Err(Rejection::InitiativeAlreadyRolled);
    }

    let (winner, advantage) = resolve_initiative(&rolls);
    state.initiative_winner = Some(winner);
    state.initiative_advantage = advantage;
    state.active_player = winner;
    state.log(
        LogType::Initiative,
        format!(
            "Initiative: player1 rolls {}, player2 rolls {}; {winner} wins with advantage {advantage}",
            rolls.player1, rolls.player2
        ),
        now,
    );
    debug!(%winner, advantage, "initiative resolved");
    state.initiative_rolls = Some(rolls);
    Ok(())
}

/// Roll 1d20 + strategy for both sides
pub fn roll_initiative<R: Rng>(
    state: &mut GameState,
    rng: &mut R,
    now: u64,
) -> Result<PlayerPair<i32>, Rejection> {
    if state.phase != Phase::Initiative {
        return Err(Rejection::WrongPhase(state.phase));
    }
    if state.initiative_rolls.is_some() {
        return Err(Rejection::InitiativeAlreadyRolled);
    }

    let mut roll = |slot| rng.gen_range(1..=INITIATIVE_DIE_SIDES) + initiative_strength(state, slot);
    let rolls = PlayerPair::new(roll(PlayerSlot::Player1), roll(PlayerSlot::Player2));
    apply_initiative(state, rolls.clone(), now)?;
    Ok(rolls)
}

/// True when nobody could act in the phase, so it is passed over
pub fn should_skip(state: &GameState, phase: Phase) -> bool {
    let mut units = state.units.values();
    match phase {
        Phase::Shooting => !units.any(|u| u.is_ready() && u.has_ranged_attack()),
        Phase::Charge => !units.any(|u| u.is_ready() && u.posture == Posture::Charge),
        Phase::Rout => !units.any(|u| u.is_alive() && u.is_routing),
        Phase::Reorganization => {
            !units.any(|u| u.is_steady() && u.posture == Posture::Reorganizing)
        }
        _ => false,
    }
}

/// Does `slot` have a unit that could take an action in this phase?
pub fn has_eligible_actor(state: &GameState, slot: PlayerSlot, phase: Phase) -> bool {
    let mut ready = state.units_of(slot).filter(|u| u.is_ready());
    match phase {
        Phase::Movement => ready.next().is_some(),
        Phase::Shooting => ready.any(|u| u.has_ranged_attack()),
        Phase::Charge => ready.any(|u| u.posture == Posture::Charge),
        Phase::Melee => ready.any(|u| {
            u.position.neighbors().iter().any(|&hex| {
                state
                    .unit_at(hex)
                    .is_some_and(|other| {
                        other.owner != slot && other.is_alive() && !other.has_acted_this_turn
                    })
            })
        }),
        _ => false,
    }
}

/// Hand control to the other side if the side to act has nothing to do
pub fn normalize_active_player(state: &mut GameState) {
    if !state.phase.is_unit_action_phase() {
        return;
    }
    let active = state.active_player;
    if !has_eligible_actor(state, active, state.phase)
        && has_eligible_actor(state, active.opponent(), state.phase)
    {
        state.active_player = active.opponent();
    }
}

/// Bookkeeping after a unit spends its action
///
/// The initiative winner acts `advantage` times (at least once) before
/// control passes; from then on play alternates one for one.
pub fn after_unit_action(state: &mut GameState) {
    state.units_moved_this_phase += 1;
    let threshold = u32::from(state.initiative_advantage.max(1));
    if state.units_moved_this_phase >= threshold {
        state.active_player = state.active_player.opponent();
    }
    normalize_active_player(state);
}

/// Per-turn reset on the way back to initiative
fn end_turn_reset(state: &mut GameState) {
    for unit in state.units.values_mut() {
        unit.has_acted_this_turn = false;
        revert_card(unit);
    }
    for commander in state.commanders.values_mut() {
        commander.used_command_this_turn = 0;
        commander.has_acted_this_turn = false;
    }
    state.initiative_rolls = None;
    state.initiative_winner = None;
    state.initiative_advantage = 0;
    state.active_player = PlayerSlot::Player1;
}

/// Leave the current phase, skipping phases nobody can act in
pub fn advance_phase(state: &mut GameState, now: u64) {
    loop {
        let next = state.phase.next();

        if next == Phase::EndTurn {
            state.phase = Phase::EndTurn;
            state.log(LogType::Phase, format!("Turn {} ends", state.turn), now);
            end_turn_reset(state);
            state.turn += 1;
            state.phase = Phase::Initiative;
            debug!(turn = state.turn, "new turn");
            state.log(LogType::Phase, format!("Turn {} begins", state.turn), now);
            break;
        }

        state.phase = next;
        if should_skip(state, next) {
            debug!(phase = %next, "phase skipped");
            state.log(
                LogType::Phase,
                format!("Skipping {next} phase: no eligible units"),
                now,
            );
            continue;
        }

        debug!(phase = %next, turn = state.turn, "phase entered");
        state.log(LogType::Phase, format!("{next} phase begins"), now);
        state.units_moved_this_phase = 0;
        state.active_player = state.initiative_winner.unwrap_or(PlayerSlot::Player1);

        match next {
            Phase::Rout => morale::forced_retreat(state, now),
            Phase::Reorganization => morale::reorganize(state, now),
            _ => {}
        }
        normalize_active_player(state);
        break;
    }

    apply_victory(state, now);
}

/// End the current phase on behalf of `player`
///
/// Either side may close initiative; ending it before anyone rolled rolls
/// first. Every other phase can only be closed by the side to act.
pub fn end_phase<R: Rng>(
    state: &mut GameState,
    player: PlayerSlot,
    rng: &mut R,
    now: u64,
) -> Result<(), Rejection> {
    if state.phase == Phase::Initiative {
        if state.initiative_rolls.is_none() {
            roll_initiative(state, rng, now)?;
        }
    } else if !state.awaits(player) {
        return Err(Rejection::NotYourTurn(player));
    }

    advance_phase(state, now);
    Ok(())
}
