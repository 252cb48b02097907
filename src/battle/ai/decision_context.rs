//! The bot's view of the battle from one side

use crate::battle::hex::HexCoord;
use crate::battle::state::GameState;
use crate::battle::units::BattleUnit;
use crate::core::types::PlayerSlot;

/// Read-only view of the state from `player`'s side of the table
pub struct DecisionContext<'a> {
    pub state: &'a GameState,
    pub player: PlayerSlot,
}

impl<'a> DecisionContext<'a> {
    pub fn new(state: &'a GameState, player: PlayerSlot) -> Self {
        Self { state, player }
    }

    /// Own units still on the field
    pub fn own_units(&self) -> Vec<&'a BattleUnit> {
        self.state
            .units_of(self.player)
            .filter(|u| u.is_alive())
            .collect()
    }

    /// Own units that may still act this turn
    pub fn ready_units(&self) -> Vec<&'a BattleUnit> {
        self.state
            .units_of(self.player)
            .filter(|u| u.is_ready())
            .collect()
    }

    /// Enemy units still on the field, routing or not
    pub fn enemy_units(&self) -> Vec<&'a BattleUnit> {
        self.state
            .units_of(self.player.opponent())
            .filter(|u| u.is_alive())
            .collect()
    }

    /// Closest living enemy to a hex
    pub fn nearest_enemy(&self, from: HexCoord) -> Option<&'a BattleUnit> {
        self.enemy_units()
            .into_iter()
            .min_by_key(|e| from.distance(&e.position))
    }

    /// Distance from a hex to the closest living enemy
    pub fn distance_to_enemy(&self, from: HexCoord) -> Option<u32> {
        self.nearest_enemy(from).map(|e| from.distance(&e.position))
    }

    /// Living enemies adjacent to a hex
    pub fn adjacent_enemies(&self, at: HexCoord) -> Vec<&'a BattleUnit> {
        self.enemy_units()
            .into_iter()
            .filter(|e| e.position.is_adjacent(&at))
            .collect()
    }

    fn steady_strength(units: &[&BattleUnit]) -> i32 {
        units
            .iter()
            .filter(|u| !u.is_routing)
            .map(|u| u.current_health)
            .sum()
    }

    /// Own steady health over enemy steady health
    pub fn strength_ratio(&self) -> f64 {
        let own = Self::steady_strength(&self.own_units());
        let enemy = Self::steady_strength(&self.enemy_units());
        if enemy == 0 {
            return f64::from(own.max(1));
        }
        f64::from(own) / f64::from(enemy)
    }
}
