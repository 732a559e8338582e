//! Shared type definitions for spatiotemporal avalanche detection.
//!
//! This crate holds the vocabulary every other crate in the workspace speaks:
//! the spike event, the row it is read in, the identifiers for nodes and
//! clusters, and the square grid that gives every node a position.
//!
//! # Modules
//!
//! - [`grid`] -- Node id to `(row, col)` mapping and Euclidean grid distance
//! - [`ids`] -- Integer newtypes for node and cluster identifiers
//! - [`spike`] -- The [`Spike`] event and the timestamp-grouped [`SpikeRow`]

pub mod grid;
pub mod ids;
pub mod spike;

// Re-export all public types at crate root for convenience.
pub use grid::{DEFAULT_GRID_SIDE, Grid, GridCoord, GridError};
pub use ids::{ClusterId, NodeId};
pub use spike::{Spike, SpikeRow, Timestamp};
