//! Bot commander - the built-in heuristic bot
//!
//! Scores every candidate action for the current phase and takes the best
//! one. The random source is reseeded from the profile seed and the state
//! being decided on, so the same state always yields the same decision.

use std::time::Duration;

use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::profile::BotProfile;
use crate::battle::ai::{BotAction, BotDecision, BotError, TacticalAi};
use crate::battle::constants::{CHARGE_ABILITY, MAX_RANGED_RANGE, RALLY_FATIGUE};
use crate::battle::hex::HexCoord;
use crate::battle::morale::find_rally_support;
use crate::battle::movement::reachable_hexes;
use crate::battle::resolution::{
    resolve_melee, resolve_ranged, shooting_range, validate_ranged_target, FireLine,
};
use crate::battle::state::{GameState, Phase};
use crate::battle::units::{BattleUnit, Posture};
use crate::core::types::PlayerSlot;

/// Bonus for an attack that should break the target outright
const BREAK_BONUS: f64 = 5.0;

/// Minimum gain for a move to be worth the unit's action
const MOVE_THRESHOLD: f64 = 0.01;

type Candidate = (OrderedFloat<f64>, BotDecision);

/// Heuristic bot implementing `TacticalAi`
pub struct BotCommander {
    profile: BotProfile,
    rng: ChaCha8Rng,
}

impl BotCommander {
    pub fn new(profile: BotProfile) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(profile.seed);
        Self { profile, rng }
    }

    /// Seed for one decision: same profile and state, same choice
    fn decision_seed(&self, state: &GameState, player: PlayerSlot) -> u64 {
        let side = match player {
            PlayerSlot::Player1 => 1u64,
            PlayerSlot::Player2 => 2u64,
        };
        self.profile.seed
            ^ (u64::from(state.turn) << 32)
            ^ ((state.phase as u64) << 24)
            ^ (side << 56)
            ^ state.version
    }

    /// Roll for making a mistake based on difficulty settings
    fn makes_mistake(&mut self) -> bool {
        self.rng.gen::<f64>() < self.profile.mistake_chance
    }

    /// Best candidate, or occasionally a random one
    fn choose(&mut self, candidates: Vec<Candidate>, fallback: &str) -> BotDecision {
        if candidates.is_empty() {
            return BotDecision::new(BotAction::EndPhase, fallback);
        }
        if candidates.len() > 1 && self.makes_mistake() {
            let pick = self.rng.gen_range(0..candidates.len());
            let (_, mut decision) = candidates.into_iter().nth(pick).unwrap_or_else(|| {
                (OrderedFloat(0.0), BotDecision::new(BotAction::EndPhase, fallback))
            });
            decision.reason.push_str(" (hasty)");
            return decision;
        }

        candidates
            .into_iter()
            .max_by_key(|(score, _)| *score)
            .map(|(_, decision)| decision)
            .unwrap_or_else(|| BotDecision::new(BotAction::EndPhase, fallback))
    }

    /// Aggression scaled by how the sides compare; a weaker side hangs back
    fn boldness(&self, context: &DecisionContext) -> f64 {
        self.profile.aggression * context.strength_ratio().clamp(0.5, 2.0)
    }

    /// How much the unit likes standing on a hex
    fn position_score(&self, context: &DecisionContext, unit: &BattleUnit, at: HexCoord) -> f64 {
        let terrain = context.state.map.terrain(at);
        let cover = f64::from(terrain.stat_delta().defense) * self.profile.caution * 0.5;

        let Some(distance) = context.distance_to_enemy(at) else {
            return cover;
        };
        let distance = f64::from(distance);

        if unit.has_ranged_attack() {
            // Stand just inside bow range
            let ideal = f64::from(MAX_RANGED_RANGE + terrain.range_bonus() - 1);
            -(distance - ideal).abs() + cover + f64::from(terrain.range_bonus()) * 0.5
        } else {
            -distance * self.boldness(context) + cover
        }
    }

    fn movement_candidates(&self, context: &DecisionContext) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for unit in context.ready_units() {
            let engaged = !context.adjacent_enemies(unit.position).is_empty();
            let spent = unit.current_pressure - unit.permanent_pressure;

            // Worn out and out of contact: pull back and recover
            if !engaged
                && unit.pressure_headroom() <= 2
                && spent > 0
                && unit.posture != Posture::Reorganizing
            {
                candidates.push((
                    OrderedFloat(10.0 * self.profile.caution),
                    BotDecision::new(
                        BotAction::SetPosture {
                            unit: unit.id,
                            posture: Posture::Reorganizing,
                        },
                        format!("{} is badly shaken and reorganizes", unit.name),
                    ),
                ));
                continue;
            }
            if unit.posture == Posture::Reorganizing && spent == 0 {
                candidates.push((
                    OrderedFloat(3.0),
                    BotDecision::new(
                        BotAction::SetPosture {
                            unit: unit.id,
                            posture: Posture::Offensive,
                        },
                        format!("{} has recovered and returns to the line", unit.name),
                    ),
                ));
                continue;
            }
            if unit.has_ability(CHARGE_ABILITY)
                && unit.posture == Posture::Offensive
                && self.profile.aggression > 0.5
                && context
                    .distance_to_enemy(unit.position)
                    .is_some_and(|d| d <= unit.movement_allowance() + 1)
            {
                candidates.push((
                    OrderedFloat(4.0 * self.profile.aggression),
                    BotDecision::new(
                        BotAction::SetPosture {
                            unit: unit.id,
                            posture: Posture::Charge,
                        },
                        format!("{} readies a charge", unit.name),
                    ),
                ));
                continue;
            }
            let charge_ready = unit.posture == Posture::Charge
                && context
                    .distance_to_enemy(unit.position)
                    .is_some_and(|d| d <= unit.movement_allowance() + 1);
            if engaged || charge_ready {
                continue;
            }

            let here = self.position_score(context, unit, unit.position);
            let reach =
                reachable_hexes(&context.state.map, unit.position, unit.movement_allowance());
            let mut destinations: Vec<HexCoord> = reach
                .keys()
                .copied()
                .filter(|&hex| hex != unit.position)
                .collect();
            destinations.sort_by_key(|hex| (hex.r, hex.q));

            let best = destinations
                .into_iter()
                .map(|hex| (OrderedFloat(self.position_score(context, unit, hex) - here), hex))
                .max_by_key(|(gain, _)| *gain);

            if let Some((gain, to)) = best {
                if gain.0 > MOVE_THRESHOLD {
                    candidates.push((
                        gain,
                        BotDecision::new(
                            BotAction::Move { unit: unit.id, to },
                            format!("{} advances to {to}", unit.name),
                        ),
                    ));
                }
            }
        }

        candidates
    }

    fn shooting_candidates(&self, context: &DecisionContext) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for unit in context.ready_units() {
            if !unit.has_ranged_attack() {
                continue;
            }
            let range = shooting_range(context.state, unit);
            for enemy in context.enemy_units() {
                if unit.position.distance(&enemy.position) > range {
                    continue;
                }
                let Ok(line) = validate_ranged_target(context.state, unit, enemy) else {
                    continue;
                };
                let outcome = resolve_ranged(unit, enemy);
                let mut score = f64::from(outcome.pressure) + 2.0 * f64::from(outcome.damage);
                if !enemy.is_routing && outcome.pressure >= enemy.pressure_headroom() {
                    score += BREAK_BONUS;
                }
                if enemy.is_routing {
                    score -= 3.0;
                }
                if matches!(line, FireLine::Screened(_)) {
                    score -= 1.5 * self.profile.caution;
                }
                candidates.push((
                    OrderedFloat(score),
                    BotDecision::new(
                        BotAction::Attack {
                            attacker: unit.id,
                            target: enemy.id,
                        },
                        format!("{} looses arrows at {}", unit.name, enemy.name),
                    ),
                ));
            }
        }
        candidates
    }

    /// Value of a melee blow from the attacker's side
    fn melee_score(&self, attacker: &BattleUnit, defender: &BattleUnit) -> f64 {
        let outcome = resolve_melee(attacker, defender);
        let mut score =
            1.5 * f64::from(outcome.defender_pressure) + f64::from(outcome.defender_damage);
        if !defender.is_routing && outcome.defender_pressure >= defender.pressure_headroom() {
            score += BREAK_BONUS;
        }
        if defender.is_routing {
            score -= 2.0;
        }
        score
            - self.profile.caution
                * (1.5 * f64::from(outcome.attacker_pressure) + f64::from(outcome.attacker_damage))
    }

    fn charge_candidates(&self, context: &DecisionContext) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for unit in context.ready_units() {
            if unit.posture != Posture::Charge {
                continue;
            }
            let reach =
                reachable_hexes(&context.state.map, unit.position, unit.movement_allowance());
            for enemy in context.enemy_units() {
                if enemy.has_acted_this_turn {
                    continue;
                }
                let in_contact = unit.position.is_adjacent(&enemy.position);
                let reachable = enemy.position.neighbors().iter().any(|h| reach.contains_key(h));
                if !in_contact && !reachable {
                    continue;
                }
                let score = self.melee_score(unit, enemy) + self.profile.aggression;
                candidates.push((
                    OrderedFloat(score),
                    BotDecision::new(
                        BotAction::Attack {
                            attacker: unit.id,
                            target: enemy.id,
                        },
                        format!("{} charges {}", unit.name, enemy.name),
                    ),
                ));
            }
        }
        candidates
    }

    fn melee_candidates(&self, context: &DecisionContext) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for unit in context.ready_units() {
            for enemy in context.adjacent_enemies(unit.position) {
                if enemy.has_acted_this_turn {
                    continue;
                }
                let score = self.melee_score(unit, enemy);
                if score <= 0.0 && self.profile.aggression < 0.5 {
                    continue;
                }
                candidates.push((
                    OrderedFloat(score),
                    BotDecision::new(
                        BotAction::Attack {
                            attacker: unit.id,
                            target: enemy.id,
                        },
                        format!("{} engages {}", unit.name, enemy.name),
                    ),
                ));
            }
        }
        candidates
    }

    fn rally_candidates(&self, context: &DecisionContext) -> Vec<Candidate> {
        context
            .own_units()
            .into_iter()
            .filter(|u| u.is_routing && u.permanent_pressure + RALLY_FATIGUE < u.max_pressure)
            .filter(|u| find_rally_support(context.state, u).is_some())
            .map(|u| {
                (
                    OrderedFloat(f64::from(u.current_health)),
                    BotDecision::new(
                        BotAction::Rally { unit: u.id },
                        format!("{} is rallied", u.name),
                    ),
                )
            })
            .collect()
    }
}

impl TacticalAi for BotCommander {
    fn decide(&mut self, state: &GameState, player: PlayerSlot) -> Result<BotDecision, BotError> {
        if state.is_finished {
            return Err(BotError::MatchFinished);
        }
        if !state.awaits(player) {
            return Err(BotError::NotOurTurn(player));
        }

        self.rng = ChaCha8Rng::seed_from_u64(self.decision_seed(state, player));
        let context = DecisionContext::new(state, player);

        let decision = match state.phase {
            Phase::Initiative => BotDecision::new(BotAction::EndPhase, "Rolling for initiative"),
            Phase::Movement => {
                let candidates = self.movement_candidates(&context);
                self.choose(candidates, "No useful moves left")
            }
            Phase::Shooting => {
                let candidates = self.shooting_candidates(&context);
                self.choose(candidates, "No targets in range")
            }
            Phase::Charge => {
                let candidates = self.charge_candidates(&context);
                self.choose(candidates, "No charge can connect")
            }
            Phase::Melee => {
                let candidates = self.melee_candidates(&context);
                self.choose(candidates, "No favorable engagements")
            }
            Phase::Rout => {
                let candidates = self.rally_candidates(&context);
                self.choose(candidates, "No unit can be rallied")
            }
            Phase::Reorganization | Phase::EndTurn => {
                BotDecision::new(BotAction::Pass, "Holding position")
            }
        };

        debug!(
            %player,
            phase = %state.phase,
            reason = %decision.reason,
            "bot decided"
        );
        Ok(decision)
    }

    fn thinking_delay(&self) -> Duration {
        self.profile.thinking_delay()
    }
}
