//! Tactical cards: temporary stat modifiers paid for with command
//!
//! A card's delta is folded into one unit's current stats and recorded on
//! the unit. At end of turn the recorded delta is subtracted again, which
//! restores the exact pre-activation stats.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::battle::state::{GameState, LogType};
use crate::battle::units::{ActiveCard, BattleUnit, CommanderId, StatDelta, UnitId};
use crate::core::error::Rejection;
use crate::core::types::PlayerSlot;

/// Identifier of a card in the match's card library
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticalCard {
    pub id: CardId,
    pub name: String,
    pub command_cost: i32,
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default)]
    pub defense_bonus: i32,
    #[serde(default)]
    pub mobility_bonus: i32,
    #[serde(default)]
    pub attack_penalty: i32,
    #[serde(default)]
    pub defense_penalty: i32,
    #[serde(default)]
    pub mobility_penalty: i32,
}

impl TacticalCard {
    /// Net modifier the card applies
    pub fn stat_delta(&self) -> StatDelta {
        StatDelta {
            attack: self.attack_bonus - self.attack_penalty,
            defense: self.defense_bonus - self.defense_penalty,
            movement: self.mobility_bonus - self.mobility_penalty,
            ..StatDelta::default()
        }
    }
}

/// A small stock deck used when no external card library is supplied
pub fn standard_cards() -> Vec<TacticalCard> {
    vec![
        TacticalCard {
            id: CardId::new("shield_wall"),
            name: "Shield Wall".into(),
            command_cost: 1,
            defense_bonus: 2,
            mobility_penalty: 1,
            attack_bonus: 0,
            mobility_bonus: 0,
            attack_penalty: 0,
            defense_penalty: 0,
        },
        TacticalCard {
            id: CardId::new("forced_march"),
            name: "Forced March".into(),
            command_cost: 1,
            mobility_bonus: 2,
            defense_penalty: 1,
            attack_bonus: 0,
            defense_bonus: 0,
            attack_penalty: 0,
            mobility_penalty: 0,
        },
        TacticalCard {
            id: CardId::new("furious_assault"),
            name: "Furious Assault".into(),
            command_cost: 2,
            attack_bonus: 3,
            defense_penalty: 2,
            defense_bonus: 0,
            mobility_bonus: 0,
            attack_penalty: 0,
            mobility_penalty: 0,
        },
    ]
}

/// Fold a card into a unit, recording exactly what was added
pub fn apply_card(unit: &mut BattleUnit, card: &TacticalCard, commander_id: CommanderId) {
    let delta = card.stat_delta();
    unit.current_stats.apply(delta);
    unit.active_card = Some(ActiveCard {
        card_id: card.id.clone(),
        commander_id,
        delta,
    });
}

/// Undo whatever card is active on the unit
pub fn revert_card(unit: &mut BattleUnit) -> Option<ActiveCard> {
    let active = unit.active_card.take()?;
    unit.current_stats.revert(active.delta);
    Some(active)
}

/// Play a card from `player`'s hand onto one of their units
pub fn use_tactical_card(
    state: &mut GameState,
    player: PlayerSlot,
    commander_id: CommanderId,
    unit_id: UnitId,
    card_id: &CardId,
    now: u64,
) -> Result<(), Rejection> {
    let commander = state.commander(commander_id)?;
    if commander.owner != player {
        return Err(Rejection::NotOwner(player));
    }
    let available = commander.remaining_command();
    let commander_name = commander.name.clone();

    let unit = state.unit(unit_id)?;
    if unit.owner != player {
        return Err(Rejection::NotOwner(player));
    }
    if !unit.is_alive() {
        return Err(Rejection::UnitEliminated(unit_id));
    }
    if unit.is_routing {
        return Err(Rejection::UnitRouting(unit_id));
    }
    if unit.has_acted_this_turn {
        return Err(Rejection::AlreadyActed(unit_id));
    }
    if unit.active_card.is_some() {
        return Err(Rejection::CardAlreadyActive(unit_id));
    }

    let hand = state.hands.get(player);
    let Some(slot) = hand.iter().position(|id| id == card_id) else {
        return Err(Rejection::CardNotInHand(card_id.clone()));
    };
    let card = state
        .card_library
        .get(card_id)
        .cloned()
        .ok_or_else(|| Rejection::CardNotFound(card_id.clone()))?;

    if card.command_cost > available {
        return Err(Rejection::InsufficientCommand {
            needed: card.command_cost,
            available,
        });
    }

    // All checks passed
    state.hands.get_mut(player).remove(slot);
    state.commander_mut(commander_id)?.used_command_this_turn += card.command_cost;
    let unit = state.unit_mut(unit_id)?;
    apply_card(unit, &card, commander_id);
    let unit_name = unit.name.clone();

    debug!(card = %card.id, unit = %unit_id, "tactical card played");
    state.log(
        LogType::Tactic,
        format!("{commander_name} plays {} on {unit_name}", card.name),
        now,
    );
    Ok(())
}
