//! Hex coordinate system for battle maps (axial coordinates)
//!
//! Uses axial coordinates (q, r) for easy neighbor calculation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Axial hex coordinate; two coordinates with equal q and r are the same cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance: the largest cube-axis difference
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Get all 6 neighboring hex coordinates
    pub fn neighbors(&self) -> [HexCoord; 6] {
        HexDirection::all().map(|direction| self.step(direction, 1))
    }

    /// Is `other` one of the six neighbors?
    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.distance(other) == 1
    }

    /// Move `steps` cells in a direction
    pub fn step(&self, direction: HexDirection, steps: i32) -> HexCoord {
        let offset = direction.offset();
        HexCoord::new(self.q + offset.q * steps, self.r + offset.r * steps)
    }

    /// Get hex coordinates in a line from self to other (inclusive)
    pub fn line_to(&self, other: &Self) -> Vec<HexCoord> {
        let n = self.distance(other) as i32;
        if n == 0 {
            return vec![*self];
        }

        let mut results = Vec::with_capacity((n + 1) as usize);
        for i in 0..=n {
            let t = f64::from(i) / f64::from(n);
            // Nudge off exact cell edges so ties resolve consistently
            let q = f64::from(self.q) + 1e-6 + f64::from(other.q - self.q) * t;
            let r = f64::from(self.r) + 1e-6 + f64::from(other.r - self.r) * t;
            results.push(Self::round(q, r));
        }
        results
    }

    /// Round floating point hex to nearest integer hex
    fn round(q: f64, r: f64) -> Self {
        let s = -q - r;
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }

    /// Get all hexes within range (inclusive)
    pub fn hexes_in_range(&self, range: u32) -> Vec<HexCoord> {
        let range = range as i32;
        let mut results = Vec::new();
        for q in -range..=range {
            for r in (-range).max(-q - range)..=range.min(-q + range) {
                results.push(HexCoord::new(self.q + q, self.r + r));
            }
        }
        results
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Direction enum for hex facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HexDirection {
    #[default]
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// Get the hex offset for this direction
    pub fn offset(&self) -> HexCoord {
        match self {
            HexDirection::East => HexCoord::new(1, 0),
            HexDirection::NorthEast => HexCoord::new(1, -1),
            HexDirection::NorthWest => HexCoord::new(0, -1),
            HexDirection::West => HexCoord::new(-1, 0),
            HexDirection::SouthWest => HexCoord::new(-1, 1),
            HexDirection::SouthEast => HexCoord::new(0, 1),
        }
    }

    /// All directions
    pub fn all() -> [HexDirection; 6] {
        [
            HexDirection::East,
            HexDirection::NorthEast,
            HexDirection::NorthWest,
            HexDirection::West,
            HexDirection::SouthWest,
            HexDirection::SouthEast,
        ]
    }

    /// Direction best aligned with the vector `from -> to`.
    ///
    /// Alignment is the cube-coordinate dot product; the earliest direction
    /// in `all()` wins ties. Returns `None` for a zero vector.
    pub fn toward(from: HexCoord, to: HexCoord) -> Option<Self> {
        let (dq, dr) = (to.q - from.q, to.r - from.r);
        if dq == 0 && dr == 0 {
            return None;
        }
        let ds = -dq - dr;

        let mut best: Option<(HexDirection, i32)> = None;
        for direction in Self::all() {
            let o = direction.offset();
            let alignment = dq * o.q + dr * o.r + ds * o.s();
            if best.map_or(true, |(_, score)| alignment > score) {
                best = Some((direction, alignment));
            }
        }
        best.map(|(direction, _)| direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_coord_creation() {
        let coord = HexCoord::new(5, 10);
        assert_eq!(coord.q, 5);
        assert_eq!(coord.r, 10);
    }

    #[test]
    fn test_hex_distance_same() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_hex_distance_adjacent() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, 0);
        assert_eq!(a.distance(&b), 1);
    }

    #[test]
    fn test_hex_distance_diagonal() {
        // (2,3) -> (5,0): dq=3, dr=-3, ds=0
        assert_eq!(HexCoord::new(2, 3).distance(&HexCoord::new(5, 0)), 3);
        // (2,3) -> (2,7): straight down the r axis
        assert_eq!(HexCoord::new(2, 3).distance(&HexCoord::new(2, 7)), 4);
    }

    #[test]
    fn test_hex_neighbors_are_adjacent() {
        let coord = HexCoord::new(5, 5);
        let neighbors = coord.neighbors();
        assert_eq!(neighbors.len(), 6);
        assert!(neighbors.iter().all(|n| coord.is_adjacent(n)));
    }

    #[test]
    fn test_hex_line() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(3, 0);
        let line = a.line_to(&b);
        assert_eq!(line.len(), 4); // Includes start and end
        assert_eq!(line[0], a);
        assert_eq!(line[3], b);
    }

    #[test]
    fn test_hex_line_is_contiguous() {
        let a = HexCoord::new(1, 1);
        let b = HexCoord::new(4, 6);
        let line = a.line_to(&b);
        for pair in line.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]));
        }
    }

    #[test]
    fn test_hexes_in_range() {
        let center = HexCoord::new(0, 0);
        let range_1 = center.hexes_in_range(1);
        assert_eq!(range_1.len(), 7); // Center + 6 neighbors
        assert_eq!(center.hexes_in_range(2).len(), 19);
    }

    #[test]
    fn test_toward_matches_unit_offsets() {
        let origin = HexCoord::new(3, 3);
        for direction in HexDirection::all() {
            let target = origin.step(direction, 2);
            assert_eq!(HexDirection::toward(origin, target), Some(direction));
        }
    }

    #[test]
    fn test_toward_zero_vector() {
        let origin = HexCoord::new(3, 3);
        assert_eq!(HexDirection::toward(origin, origin), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(HexCoord::new(2, -1).to_string(), "(2, -1)");
    }
}
