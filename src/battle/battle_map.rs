//! Battle map with hex grid, terrain, occupancy and line of sight
//!
//! The map is an axial rectangle: `0 <= q < width`, `0 <= r < height`.
//! Hexes are stored row-major so the map serializes as plain JSON.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::battle::terrain::Terrain;
use crate::battle::units::UnitId;
use crate::core::config::BattleConfig;
use crate::core::types::PlayerSlot;

/// A single hex on the battle map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    pub coord: HexCoord,
    pub terrain: Terrain,
    /// At most one unit; always agrees with that unit's position
    pub occupant: Option<UnitId>,
}

impl Hex {
    pub fn new(coord: HexCoord, terrain: Terrain) -> Self {
        Self {
            coord,
            terrain,
            occupant: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

/// The full battle map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleMap {
    pub width: i32,
    pub height: i32,
    hexes: Vec<Hex>,
}

impl BattleMap {
    /// Create a map of open plains
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let mut hexes = Vec::with_capacity((width * height) as usize);
        for r in 0..height {
            for q in 0..width {
                hexes.push(Hex::new(HexCoord::new(q, r), Terrain::Plains));
            }
        }
        Self {
            width,
            height,
            hexes,
        }
    }

    /// Build a map with randomized terrain
    ///
    /// Home rows stay open plains so both sides can always deploy and
    /// routing units have a clear edge to flee over. The same rng state
    /// always produces the same map.
    pub fn generate<R: Rng>(config: &BattleConfig, rng: &mut R) -> Self {
        let mut map = Self::new(config.map_width, config.map_height);
        let home_rows = [
            map.home_row(PlayerSlot::Player1),
            map.home_row(PlayerSlot::Player2),
        ];

        for hex in map.hexes.iter_mut() {
            if home_rows.contains(&hex.coord.r) {
                continue;
            }
            let roll: f64 = rng.gen();
            hex.terrain = if roll < config.forest_chance {
                Terrain::Forest
            } else if roll < config.forest_chance + config.hill_chance {
                Terrain::Hill
            } else {
                Terrain::Plains
            };
        }

        map
    }

    /// Check if coordinate is within map bounds
    pub fn is_valid_hex(&self, coord: HexCoord) -> bool {
        coord.q >= 0 && coord.r >= 0 && coord.q < self.width && coord.r < self.height
    }

    fn index(&self, coord: HexCoord) -> Option<usize> {
        self.is_valid_hex(coord)
            .then(|| (coord.r * self.width + coord.q) as usize)
    }

    /// Get a hex at the given coordinate
    pub fn hex(&self, coord: HexCoord) -> Option<&Hex> {
        self.index(coord).and_then(|i| self.hexes.get(i))
    }

    /// Get a mutable hex at the given coordinate
    pub fn hex_mut(&mut self, coord: HexCoord) -> Option<&mut Hex> {
        self.index(coord).and_then(move |i| self.hexes.get_mut(i))
    }

    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.iter()
    }

    /// Terrain at a coordinate; off-map reads as plains
    pub fn terrain(&self, coord: HexCoord) -> Terrain {
        self.hex(coord).map(|h| h.terrain).unwrap_or_default()
    }

    /// Set terrain at a coordinate
    pub fn set_terrain(&mut self, coord: HexCoord, terrain: Terrain) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.terrain = terrain;
        }
    }

    pub fn occupant(&self, coord: HexCoord) -> Option<UnitId> {
        self.hex(coord).and_then(|h| h.occupant)
    }

    /// On the map and empty
    pub fn is_free(&self, coord: HexCoord) -> bool {
        self.hex(coord).is_some_and(Hex::is_free)
    }

    pub fn set_occupant(&mut self, coord: HexCoord, unit: UnitId) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.occupant = Some(unit);
        }
    }

    pub fn clear_occupant(&mut self, coord: HexCoord) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.occupant = None;
        }
    }

    /// Row a side deploys on and flees toward
    pub fn home_row(&self, slot: PlayerSlot) -> i32 {
        match slot {
            PlayerSlot::Player1 => 0,
            PlayerSlot::Player2 => self.height - 1,
        }
    }

    /// Step along r that leads toward a side's home row
    pub fn homeward_step(slot: PlayerSlot) -> i32 {
        match slot {
            PlayerSlot::Player1 => -1,
            PlayerSlot::Player2 => 1,
        }
    }

    /// Hexes strictly between two endpoints on the hex line
    pub fn hexes_between(&self, from: HexCoord, to: HexCoord) -> Vec<HexCoord> {
        let line = from.line_to(&to);
        line.iter()
            .skip(1)
            .take(line.len().saturating_sub(2))
            .copied()
            .collect()
    }

    /// Check terrain line of sight between two hexes
    pub fn has_line_of_sight(&self, from: HexCoord, to: HexCoord) -> bool {
        self.hexes_between(from, to)
            .into_iter()
            .all(|coord| !self.terrain(coord).blocks_line_of_sight())
    }
}
