//! Opening-state construction from externally supplied armies

use std::collections::BTreeSet;

use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::battle::battle_map::BattleMap;
use crate::battle::constants::CHARGE_ABILITY;
use crate::battle::hex::HexCoord;
use crate::battle::state::GameState;
use crate::battle::tactics::{standard_cards, CardId, TacticalCard};
use crate::battle::units::{BattleCommander, BattleUnit, CommanderId, UnitId, UnitStats};
use crate::core::config::BattleConfig;
use crate::core::types::{PlayerPair, PlayerSlot};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Unit {unit} is placed outside the map at {coord}")]
    UnitOutOfBounds { unit: UnitId, coord: HexCoord },

    #[error("Commander {commander} is placed outside the map at {coord}")]
    CommanderOutOfBounds {
        commander: CommanderId,
        coord: HexCoord,
    },

    #[error("More than one unit is placed on {0}")]
    Overlap(HexCoord),

    #[error("Unit id {0} is used more than once")]
    DuplicateUnit(UnitId),

    #[error("Commander id {0} is used more than once")]
    DuplicateCommander(CommanderId),

    #[error("{0} has no units")]
    EmptySide(PlayerSlot),

    #[error("Card {0} is dealt but missing from the library")]
    UnknownCard(CardId),

    #[error("Unit {0} has no health or no pressure capacity")]
    InvalidUnit(UnitId),
}

/// Builder for the opening `GameState`
#[derive(Debug, Clone)]
pub struct BattleSetup {
    map: BattleMap,
    units: Vec<BattleUnit>,
    commanders: Vec<BattleCommander>,
    cards: Vec<TacticalCard>,
    hands: PlayerPair<Vec<CardId>>,
}

impl BattleSetup {
    pub fn new(map: BattleMap) -> Self {
        Self {
            map,
            units: Vec::new(),
            commanders: Vec::new(),
            cards: Vec::new(),
            hands: PlayerPair::default(),
        }
    }

    /// Start from a freshly generated map
    pub fn generated<R: Rng>(config: &BattleConfig, rng: &mut R) -> Self {
        Self::new(BattleMap::generate(config, rng))
    }

    pub fn map(&self) -> &BattleMap {
        &self.map
    }

    pub fn unit(mut self, unit: BattleUnit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn commander(mut self, commander: BattleCommander) -> Self {
        self.commanders.push(commander);
        self
    }

    pub fn card(mut self, card: TacticalCard) -> Self {
        self.cards.push(card);
        self
    }

    pub fn hand(mut self, slot: PlayerSlot, cards: Vec<CardId>) -> Self {
        *self.hands.get_mut(slot) = cards;
        self
    }

    /// Add the stock cards and deal one of each to both players
    pub fn standard_deck(mut self) -> Self {
        for card in standard_cards() {
            for slot in PlayerSlot::all() {
                self.hands.get_mut(slot).push(card.id.clone());
            }
            self.cards.push(card);
        }
        self
    }

    /// Stock armies for quick matches: a line of infantry, archers and
    /// cavalry one row in from each home edge, with a commander behind.
    ///
    /// Ids are drawn from `rng`, so a seeded rng gives the same armies
    /// and the same unit ordering every time.
    pub fn skirmish<R: Rng>(mut self, rng: &mut R) -> Self {
        let width = self.map.width;
        let count = width.min(5);
        let first = (width - count) / 2;
        for slot in PlayerSlot::all() {
            let home = self.map.home_row(slot);
            let front = home - BattleMap::homeward_step(slot);
            for i in 0..count {
                let (name, stats, health, pressure) = match i % 3 {
                    0 => ("Infantry", UnitStats::new(3, 3, 0, 3, 4), 10, 6),
                    1 => ("Archers", UnitStats::new(2, 2, 3, 3, 3), 8, 5),
                    _ => ("Cavalry", UnitStats::new(4, 2, 0, 5, 3), 8, 5),
                };
                let mut unit = BattleUnit::new(
                    UnitId(Uuid::from_u128(rng.gen())),
                    format!("{slot} {name} {}", i + 1),
                    slot,
                    stats,
                    health,
                    pressure,
                )
                .at(HexCoord::new(first + i, front));
                if name == "Cavalry" {
                    unit = unit.with_ability(CHARGE_ABILITY);
                }
                self.units.push(unit);
            }
            self.commanders.push(BattleCommander::new(
                CommanderId(Uuid::from_u128(rng.gen())),
                format!("{slot} General"),
                slot,
                HexCoord::new(width / 2, home),
                3,
                4,
                2,
            ));
        }
        self
    }

    /// Validate the armies and produce turn 1
    ///
    /// Current stats are rebuilt from base stats, posture and terrain so
    /// every modifier on the board can later be reverted exactly.
    pub fn build(self) -> Result<GameState, SetupError> {
        let mut seen_units = BTreeSet::new();
        let mut seen_hexes = BTreeSet::new();
        for unit in &self.units {
            if !seen_units.insert(unit.id) {
                return Err(SetupError::DuplicateUnit(unit.id));
            }
            if !self.map.is_valid_hex(unit.position) {
                return Err(SetupError::UnitOutOfBounds {
                    unit: unit.id,
                    coord: unit.position,
                });
            }
            if !seen_hexes.insert((unit.position.q, unit.position.r)) {
                return Err(SetupError::Overlap(unit.position));
            }
            if unit.max_health <= 0 || unit.max_pressure <= 0 {
                return Err(SetupError::InvalidUnit(unit.id));
            }
        }
        for slot in PlayerSlot::all() {
            if !self.units.iter().any(|u| u.owner == slot) {
                return Err(SetupError::EmptySide(slot));
            }
        }

        let mut seen_commanders = BTreeSet::new();
        for commander in &self.commanders {
            if !seen_commanders.insert(commander.id) {
                return Err(SetupError::DuplicateCommander(commander.id));
            }
            if !self.map.is_valid_hex(commander.position) {
                return Err(SetupError::CommanderOutOfBounds {
                    commander: commander.id,
                    coord: commander.position,
                });
            }
        }

        for id in self.hands.player1.iter().chain(&self.hands.player2) {
            if !self.cards.iter().any(|c| &c.id == id) {
                return Err(SetupError::UnknownCard(id.clone()));
            }
        }

        let mut state = GameState::new(self.map);
        for mut unit in self.units {
            let id = unit.id;
            let position = unit.position;
            unit.current_stats = unit.base_stats;
            unit.current_stats.apply(unit.posture.stat_delta());
            unit.active_card = None;
            state.units.insert(id, unit);
            state.place_unit(id, position);
        }
        for commander in self.commanders {
            state.commanders.insert(commander.id, commander);
        }
        for card in self.cards {
            state.card_library.insert(card.id.clone(), card);
        }
        state.hands = self.hands;

        Ok(state)
    }
}
