//! Spatial and temporal matching thresholds.
//!
//! A spike joins a cluster when some member of that cluster fired less than
//! `tau` steps earlier and sits less than `radius` cells away. Both bounds
//! are strict: a gap of exactly `tau` or a distance of exactly `radius`
//! never matches.
//!
//! `scan_depth` bounds how many of the most recently created clusters are
//! examined for each spike. Historically the same value as `tau` was used
//! for both purposes; leaving `scan_depth` unset keeps that behaviour.

use serde::{Deserialize, Serialize};

/// Default temporal window in time steps (a 5 ms mean inter-spike interval
/// at 0.1 ms per step).
pub const DEFAULT_TAU: u64 = 50;

/// Default spatial radius in grid cells.
pub const DEFAULT_RADIUS: f64 = 8.0;

/// Thresholds deciding whether a spike belongs to a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWindow {
    /// Temporal window: members fired strictly less than `tau` steps ago.
    pub tau: u64,
    /// Spatial radius: members lie strictly closer than `radius` cells.
    pub radius: f64,
    /// Number of most recent clusters examined per spike. `None` couples
    /// the bound to `tau`.
    pub scan_depth: Option<usize>,
}

impl MatchWindow {
    /// Create a window with the legacy scan depth (equal to `tau`).
    pub const fn new(tau: u64, radius: f64) -> Self {
        Self {
            tau,
            radius,
            scan_depth: None,
        }
    }

    /// Use an explicit scan depth instead of the legacy coupling to `tau`.
    #[must_use]
    pub const fn with_scan_depth(mut self, depth: usize) -> Self {
        self.scan_depth = Some(depth);
        self
    }

    /// Resolved number of clusters to examine per spike.
    pub fn scan_depth(&self) -> usize {
        self.scan_depth
            .unwrap_or_else(|| usize::try_from(self.tau).unwrap_or(usize::MAX))
    }

    /// Whether a member that fired `elapsed` steps ago is recent enough.
    pub const fn within_tau(&self, elapsed: u64) -> bool {
        elapsed < self.tau
    }

    /// Whether a member `distance` cells away is close enough.
    pub fn within_radius(&self, distance: f64) -> bool {
        distance < self.radius
    }
}

impl Default for MatchWindow {
    fn default() -> Self {
        Self::new(DEFAULT_TAU, DEFAULT_RADIUS)
    }
}
