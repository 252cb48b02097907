//! Battle engine integration tests, driven through `apply_action`

use hexfront::battle::*;
use hexfront::core::{PlayerPair, PlayerSlot, Rejection};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn line(owner: PlayerSlot, at: HexCoord) -> BattleUnit {
    BattleUnit::new(UnitId::new(), "Line", owner, UnitStats::new(3, 3, 0, 3, 4), 10, 6).at(at)
}

fn archers(owner: PlayerSlot, at: HexCoord) -> BattleUnit {
    BattleUnit::new(UnitId::new(), "Archers", owner, UnitStats::new(1, 1, 4, 3, 4), 10, 6).at(at)
}

/// Player 1 general whose strategy guarantees the initiative with
/// maximum advantage
fn strategist(at: HexCoord) -> BattleCommander {
    BattleCommander::new(CommanderId::new(), "Strategist", PlayerSlot::Player1, at, 30, 4, 2)
}

fn act(state: &GameState, player: PlayerSlot, action: Action, rng: &mut ChaCha8Rng) -> GameState {
    apply_action(state, player, &action, rng, 0)
        .unwrap_or_else(|e| panic!("{} by {player} rejected: {e}", action.kind()))
}

fn end_phase(state: &GameState, rng: &mut ChaCha8Rng) -> GameState {
    act(state, state.active_player, Action::EndPhase, rng)
}

#[test]
fn test_reach_on_open_ground() {
    let map = BattleMap::new(10, 10);
    let start = HexCoord::new(2, 3);

    let reach = movement::reachable_hexes(&map, start, 3);

    let expected: Vec<HexCoord> = start
        .hexes_in_range(3)
        .into_iter()
        .filter(|&h| map.is_valid_hex(h))
        .collect();
    assert_eq!(reach.len(), expected.len());
    for hex in expected {
        assert_eq!(reach.get(&hex).copied(), Some(start.distance(&hex)));
    }
    assert!(!reach.contains_key(&HexCoord::new(2, 7)));
}

#[test]
fn test_initiative_fifteen_against_ten() {
    let (winner, advantage) = phase::resolve_initiative(&PlayerPair::new(15, 10));
    assert_eq!(winner, PlayerSlot::Player1);
    assert_eq!(advantage, 2);

    let mut state = BattleSetup::new(BattleMap::new(6, 6))
        .unit(line(PlayerSlot::Player1, HexCoord::new(1, 1)))
        .unit(line(PlayerSlot::Player2, HexCoord::new(1, 4)))
        .build()
        .unwrap();
    phase::apply_initiative(&mut state, PlayerPair::new(10, 15), 0).unwrap();
    assert_eq!(state.initiative_winner, Some(PlayerSlot::Player2));
    assert_eq!(state.active_player, PlayerSlot::Player2);
    assert_eq!(state.initiative_advantage, 2);
    assert_eq!(
        phase::apply_initiative(&mut state, PlayerPair::new(1, 1), 0),
        Err(Rejection::InitiativeAlreadyRolled)
    );
}

#[test]
fn test_two_volleys_rout_then_unit_flees_off_the_edge() {
    let volley1 = archers(PlayerSlot::Player1, HexCoord::new(3, 2));
    let volley2 = archers(PlayerSlot::Player1, HexCoord::new(2, 2));
    let target = line(PlayerSlot::Player2, HexCoord::new(3, 5));
    let reserve = line(PlayerSlot::Player2, HexCoord::new(7, 7));
    let (v1, v2, t) = (volley1.id, volley2.id, target.id);

    let opening = BattleSetup::new(BattleMap::new(8, 8))
        .unit(volley1)
        .unit(volley2)
        .unit(target)
        .unit(reserve)
        .commander(strategist(HexCoord::new(3, 0)))
        .build()
        .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    // Either side may close initiative; it rolls on the way out
    let state = act(&opening, PlayerSlot::Player2, Action::EndPhase, &mut rng);
    assert_eq!(state.phase, Phase::Movement);
    assert_eq!(state.initiative_winner, Some(PlayerSlot::Player1));
    assert_eq!(state.initiative_advantage, 4);

    let state = end_phase(&state, &mut rng);
    assert_eq!(state.phase, Phase::Shooting);
    assert_eq!(state.active_player, PlayerSlot::Player1);

    let state = act(
        &state,
        PlayerSlot::Player1,
        Action::RangedAttack { attacker: v1, target: t },
        &mut rng,
    );
    assert!(!state.units[&t].is_routing);
    let state = act(
        &state,
        PlayerSlot::Player1,
        Action::RangedAttack { attacker: v2, target: t },
        &mut rng,
    );
    let routed = &state.units[&t];
    assert!(routed.is_routing);
    assert_eq!(routed.current_pressure, routed.max_pressure);
    assert!(!state.is_finished, "the reserve still holds the field");

    // Charge is skipped, melee has nobody in contact, then rout
    let state = end_phase(&state, &mut rng);
    assert_eq!(state.phase, Phase::Melee);
    let state = end_phase(&state, &mut rng);

    assert!(!state.units[&t].is_alive());
    assert!(state.map.is_free(HexCoord::new(3, 5)));
    assert!(state
        .battle_log
        .iter()
        .any(|e| e.entry_type == LogType::Morale && e.message.contains("flees")));
}

#[test]
fn test_card_lasts_until_end_of_turn() {
    let unit = line(PlayerSlot::Player1, HexCoord::new(2, 1));
    let unit_id = unit.id;
    let general = strategist(HexCoord::new(2, 0));
    let general_id = general.id;
    let opening = BattleSetup::new(BattleMap::new(6, 6))
        .unit(unit)
        .unit(line(PlayerSlot::Player2, HexCoord::new(2, 4)))
        .commander(general)
        .standard_deck()
        .build()
        .unwrap();
    let before = opening.units[&unit_id].current_stats;
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    let state = act(&opening, PlayerSlot::Player1, Action::EndPhase, &mut rng);
    let mut state = act(
        &state,
        PlayerSlot::Player1,
        Action::UseTacticalCard {
            commander: general_id,
            unit: unit_id,
            card: "shield_wall".into(),
        },
        &mut rng,
    );
    let boosted = state.units[&unit_id].current_stats;
    assert_eq!(boosted.defense, before.defense + 2);
    assert_eq!(boosted.movement, before.movement - 1);
    assert!(!state.hands.player1.contains(&"shield_wall".into()));

    // Same card twice on one unit is refused
    let again = apply_action(
        &state,
        PlayerSlot::Player1,
        &Action::UseTacticalCard {
            commander: general_id,
            unit: unit_id,
            card: "forced_march".into(),
        },
        &mut rng,
        0,
    );
    assert_eq!(again, Err(Rejection::CardAlreadyActive(unit_id)));

    while state.turn == 1 {
        state = end_phase(&state, &mut rng);
    }
    assert_eq!(state.units[&unit_id].current_stats, before);
    assert!(state.units[&unit_id].active_card.is_none());
    assert_eq!(state.commanders[&general_id].used_command_this_turn, 0);
}

#[test]
fn test_victory_then_everything_is_refused() {
    let mut broken = line(PlayerSlot::Player2, HexCoord::new(2, 4));
    broken.is_routing = true;
    broken.current_pressure = broken.max_pressure;
    let opening = BattleSetup::new(BattleMap::new(6, 6))
        .unit(line(PlayerSlot::Player1, HexCoord::new(2, 1)))
        .unit(broken)
        .build()
        .unwrap();
    assert_eq!(
        victory::evaluate(&opening),
        VictoryStatus::Winner(PlayerSlot::Player1)
    );

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let state = act(&opening, PlayerSlot::Player1, Action::RollInitiative, &mut rng);
    assert!(state.is_finished);
    assert_eq!(state.winner, Some(PlayerSlot::Player1));
    let victories = state
        .battle_log
        .iter()
        .filter(|e| e.entry_type == LogType::Victory)
        .count();
    assert_eq!(victories, 1);

    for player in PlayerSlot::all() {
        assert_eq!(
            apply_action(&state, player, &Action::EndPhase, &mut rng, 0),
            Err(Rejection::MatchFinished)
        );
    }
}

#[test]
fn test_rejected_action_changes_nothing() {
    let unit = line(PlayerSlot::Player1, HexCoord::new(2, 1));
    let unit_id = unit.id;
    let opening = BattleSetup::new(BattleMap::new(6, 6))
        .unit(unit)
        .unit(line(PlayerSlot::Player2, HexCoord::new(2, 4)))
        .commander(strategist(HexCoord::new(2, 0)))
        .build()
        .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let state = act(&opening, PlayerSlot::Player1, Action::EndPhase, &mut rng);
    let snapshot = state.clone();

    let out_of_reach = apply_action(
        &state,
        PlayerSlot::Player1,
        &Action::MoveUnit {
            unit: unit_id,
            to: HexCoord::new(2, 5),
        },
        &mut rng,
        0,
    );
    assert!(out_of_reach.is_err());
    let wrong_side = apply_action(
        &state,
        PlayerSlot::Player2,
        &Action::MoveUnit {
            unit: unit_id,
            to: HexCoord::new(2, 2),
        },
        &mut rng,
        0,
    );
    assert_eq!(wrong_side, Err(Rejection::NotYourTurn(PlayerSlot::Player2)));
    assert_eq!(state, snapshot);

    let moved = act(
        &state,
        PlayerSlot::Player1,
        Action::MoveUnit {
            unit: unit_id,
            to: HexCoord::new(2, 2),
        },
        &mut rng,
    );
    assert_eq!(moved.version, state.version + 1);
    assert_eq!(moved.units[&unit_id].position, HexCoord::new(2, 2));
    assert_eq!(state.units[&unit_id].position, HexCoord::new(2, 1));
}

#[test]
fn test_bot_match_makes_progress() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let config = hexfront::core::BattleConfig::default();
    let mut state = BattleSetup::generated(&config, &mut rng)
        .skirmish(&mut rng)
        .standard_deck()
        .build()
        .unwrap();
    let mut bots = PlayerPair::new(
        BotCommander::new(BotProfile::for_difficulty(Difficulty::Hard).with_seed(1)),
        BotCommander::new(BotProfile::for_difficulty(Difficulty::Easy).with_seed(2)),
    );

    for _ in 0..3000 {
        if state.is_finished || state.turn > 12 {
            break;
        }
        let player = state.active_player;
        let decision = bots.get_mut(player).decide(&state, player).unwrap();
        let action = decision.to_action(state.phase);
        let next = match apply_action(&state, player, &action, &mut rng, 0) {
            Ok(next) => next,
            Err(_) => apply_action(&state, player, &Action::EndPhase, &mut rng, 0).unwrap(),
        };
        assert_eq!(next.version, state.version + 1);
        state = next;
    }

    assert!(state.is_finished || state.turn > 12);
    assert!(state
        .battle_log
        .iter()
        .any(|e| e.entry_type == LogType::Combat));
}
