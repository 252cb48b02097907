//! Battle terrain types and their effects
//!
//! Terrain modifiers are folded into a unit's current stats while it stands
//! on the hex, and removed again when it leaves.

use serde::{Deserialize, Serialize};

use crate::battle::units::StatDelta;

/// Primary terrain type for a battle hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Plains, // No penalty, no cover
    Forest, // Slow, cover, blocks line of sight
    Hill,   // Slow, cover, extends missile range
}

impl Terrain {
    /// Movement points spent entering this hex
    pub fn movement_cost(&self) -> u32 {
        match self {
            Terrain::Plains => 1,
            Terrain::Forest => 2,
            Terrain::Hill => 2,
        }
    }

    /// Does this terrain block line of sight?
    pub fn blocks_line_of_sight(&self) -> bool {
        matches!(self, Terrain::Forest)
    }

    /// Stat modifier for a unit standing here
    pub fn stat_delta(&self) -> StatDelta {
        match self {
            Terrain::Plains => StatDelta::default(),
            Terrain::Forest | Terrain::Hill => StatDelta {
                defense: 1,
                ..StatDelta::default()
            },
        }
    }

    /// Extra range for shooters standing here
    pub fn range_bonus(&self) -> u32 {
        match self {
            Terrain::Hill => crate::battle::constants::HILL_RANGE_BONUS,
            _ => 0,
        }
    }
}
