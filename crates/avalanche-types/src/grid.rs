//! Square neuron grid: node id to coordinate mapping and grid distances.
//!
//! Nodes are numbered row by row starting at `1` in the top-left corner, so
//! on a grid of side `S` node `n` sits at
//!
//! ```text
//! row = floor((n - 1) / S) + 1
//! col = n - S * row + S
//! ```
//!
//! Both coordinates are one-based. The mapping is a bijection between
//! `1..=S*S` and the grid cells; anything outside that range is an upstream
//! contract violation and is reported as [`GridError::OutOfRange`].

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Side length used when no configuration overrides it.
pub const DEFAULT_GRID_SIDE: u32 = 100;

/// Errors raised by grid lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The node id does not name a cell of the grid.
    #[error("node id {node} outside grid range 1..={max}")]
    OutOfRange {
        /// The offending node id.
        node: NodeId,
        /// Largest valid node id for this grid.
        max: u32,
    },

    /// The coordinate lies outside the grid.
    #[error("coordinate ({row}, {col}) outside a grid of side {side}")]
    CoordinateOutOfRange {
        /// One-based row.
        row: u32,
        /// One-based column.
        col: u32,
        /// Grid side length.
        side: u32,
    },

    /// The side length is zero or its square does not fit a node id.
    #[error("invalid grid side {side}")]
    InvalidSide {
        /// The rejected side length.
        side: u32,
    },
}

/// One-based `(row, col)` position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    /// Row, counted from `1` at the top.
    pub row: u32,
    /// Column, counted from `1` at the left.
    pub col: u32,
}

impl GridCoord {
    /// Create a coordinate.
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Euclidean distance to another coordinate, in grid cells.
    pub fn distance_to(self, other: Self) -> f64 {
        let dr = f64::from(self.row.abs_diff(other.row));
        let dc = f64::from(self.col.abs_diff(other.col));
        dr.mul_add(dr, dc * dc).sqrt()
    }
}

/// A square grid of `side * side` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Grid {
    side: u32,
    capacity: u32,
}

impl Grid {
    /// Create a grid with the given side length.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidSide`] if `side` is zero or `side * side`
    /// overflows a `u32` node id.
    pub const fn new(side: u32) -> Result<Self, GridError> {
        if side == 0 {
            return Err(GridError::InvalidSide { side });
        }
        match side.checked_mul(side) {
            Some(capacity) => Ok(Self { side, capacity }),
            None => Err(GridError::InvalidSide { side }),
        }
    }

    /// Side length of the grid.
    pub const fn side(&self) -> u32 {
        self.side
    }

    /// Number of nodes on the grid, which is also the largest valid id.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether `node` names a cell of this grid.
    pub const fn contains(&self, node: NodeId) -> bool {
        node.0 >= 1 && node.0 <= self.capacity
    }

    /// Map a node id to its grid coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfRange`] unless `1 <= node <= side * side`.
    pub fn coordinate(&self, node: NodeId) -> Result<GridCoord, GridError> {
        let out_of_range = GridError::OutOfRange {
            node,
            max: self.capacity,
        };
        if !self.contains(node) {
            return Err(out_of_range);
        }
        let zero_based = node.0.checked_sub(1).ok_or_else(|| out_of_range.clone())?;
        let row = zero_based
            .checked_div(self.side)
            .and_then(|r| r.checked_add(1))
            .ok_or_else(|| out_of_range.clone())?;
        let col = zero_based
            .checked_rem(self.side)
            .and_then(|c| c.checked_add(1))
            .ok_or(out_of_range)?;
        Ok(GridCoord { row, col })
    }

    /// Map a grid coordinate back to its node id.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CoordinateOutOfRange`] if either coordinate is
    /// zero or larger than the side.
    pub fn node_at(&self, coord: GridCoord) -> Result<NodeId, GridError> {
        let out_of_range = GridError::CoordinateOutOfRange {
            row: coord.row,
            col: coord.col,
            side: self.side,
        };
        if coord.row == 0 || coord.col == 0 || coord.row > self.side || coord.col > self.side {
            return Err(out_of_range);
        }
        coord
            .row
            .checked_sub(1)
            .and_then(|r| r.checked_mul(self.side))
            .and_then(|base| base.checked_add(coord.col))
            .map(NodeId)
            .ok_or(out_of_range)
    }

    /// Euclidean distance between the cells of two nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfRange`] if either id is outside the grid.
    pub fn distance(&self, a: NodeId, b: NodeId) -> Result<f64, GridError> {
        Ok(self.coordinate(a)?.distance_to(self.coordinate(b)?))
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            side: DEFAULT_GRID_SIDE,
            capacity: DEFAULT_GRID_SIDE.saturating_mul(DEFAULT_GRID_SIDE),
        }
    }
}

impl TryFrom<u32> for Grid {
    type Error = GridError;

    fn try_from(side: u32) -> Result<Self, Self::Error> {
        Self::new(side)
    }
}

impl From<Grid> for u32 {
    fn from(grid: Grid) -> Self {
        grid.side
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::default()
    }

    #[test]
    fn corners_map_to_expected_coordinates() {
        let g = grid();
        assert_eq!(g.coordinate(NodeId(1)), Ok(GridCoord::new(1, 1)));
        assert_eq!(g.coordinate(NodeId(100)), Ok(GridCoord::new(1, 100)));
        assert_eq!(g.coordinate(NodeId(101)), Ok(GridCoord::new(2, 1)));
        assert_eq!(g.coordinate(NodeId(10_000)), Ok(GridCoord::new(100, 100)));
    }

    #[test]
    fn coordinate_matches_closed_form() {
        let g = grid();
        // row = floor((n - 1) / 100) + 1, col = n - 100 * row + 100
        assert_eq!(g.coordinate(NodeId(4217)), Ok(GridCoord::new(43, 17)));
        assert_eq!(g.coordinate(NodeId(250)), Ok(GridCoord::new(3, 50)));
    }

    #[test]
    fn ids_outside_grid_are_rejected() {
        let g = grid();
        assert_eq!(
            g.coordinate(NodeId(0)),
            Err(GridError::OutOfRange {
                node: NodeId(0),
                max: 10_000
            })
        );
        assert!(g.coordinate(NodeId(10_001)).is_err());
        assert!(g.distance(NodeId(5), NodeId(20_000)).is_err());
    }

    #[test]
    fn mapping_is_a_bijection_on_small_grid() {
        let g = Grid::new(7).unwrap();
        let mut seen = std::collections::BTreeSet::new();
        for raw in 1..=g.capacity() {
            let coord = g.coordinate(NodeId(raw)).unwrap();
            assert!(seen.insert(coord), "duplicate coordinate {coord:?}");
            assert_eq!(g.node_at(coord), Ok(NodeId(raw)));
        }
        assert_eq!(seen.len(), 49);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let g = grid();
        let d_ab = g.distance(NodeId(1), NodeId(305)).unwrap();
        let d_ba = g.distance(NodeId(305), NodeId(1)).unwrap();
        assert!((d_ab - d_ba).abs() < f64::EPSILON);
        assert!(g.distance(NodeId(77), NodeId(77)).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn axis_aligned_distance_is_exact() {
        let g = grid();
        // Eight rows straight down.
        let d = g.distance(NodeId(1), NodeId(801)).unwrap();
        assert!((d - 8.0).abs() < f64::EPSILON);
        // Three columns across.
        let d = g.distance(NodeId(10), NodeId(13)).unwrap();
        assert!((d - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_sides_are_rejected() {
        assert_eq!(Grid::new(0), Err(GridError::InvalidSide { side: 0 }));
        assert_eq!(
            Grid::new(u32::MAX),
            Err(GridError::InvalidSide { side: u32::MAX })
        );
        assert!(Grid::new(65_535).is_ok());
    }

    #[test]
    fn node_at_rejects_coordinates_off_grid() {
        let g = grid();
        assert!(g.node_at(GridCoord::new(0, 5)).is_err());
        assert!(g.node_at(GridCoord::new(101, 1)).is_err());
        assert_eq!(g.node_at(GridCoord::new(43, 17)), Ok(NodeId(4217)));
    }
}
