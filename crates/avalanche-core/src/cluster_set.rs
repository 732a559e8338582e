//! The live working set of clusters and the placement state machine.
//!
//! [`ClusterSet`] owns every cluster of a run. For each incoming spike it
//! looks back over the most recently created clusters, collects the ones
//! with a member inside the matching window, and then either reports no
//! match, appends the spike to the single match, or appends it to the oldest
//! match and folds all the other matches into it.
//!
//! # Placement
//!
//! ```text
//! newest ──► oldest            scan at most `scan_depth` clusters
//!   C9  C8  C7  C6 ...
//!   ✓       ✓   ✓              candidates = [C9, C7, C6]
//!
//! append spike to C6, then C9 → C7, C7 → C6   (newest pair first)
//! ```
//!
//! Candidates are collected without touching the set; removals and merges
//! are applied afterwards in one pass, so no index is invalidated while
//! iterating.

use std::collections::BTreeMap;

use avalanche_types::{ClusterId, Grid, GridError, Spike};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cluster::Cluster;
use crate::error::DetectError;
use crate::window::MatchWindow;

/// Running counters describing what a clusterer has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    /// Clusters created, including ones later absorbed or discarded.
    pub created: u64,
    /// Spikes attached to an existing cluster.
    pub attached: u64,
    /// Placements that joined two or more clusters.
    pub merges: u64,
    /// Clusters destroyed by being absorbed into another.
    pub absorbed: u64,
    /// Singleton clusters dropped at stream end.
    pub discarded: u64,
}

/// Ordered collection of live clusters, oldest first.
#[derive(Debug, Clone)]
pub struct ClusterSet {
    clusters: BTreeMap<ClusterId, Cluster>,
    next_id: Option<ClusterId>,
    window: MatchWindow,
    grid: Grid,
    stats: ClusterStats,
}

impl ClusterSet {
    /// Create an empty set matching spikes on `grid` within `window`.
    pub const fn new(grid: Grid, window: MatchWindow) -> Self {
        Self {
            clusters: BTreeMap::new(),
            next_id: Some(ClusterId(0)),
            window,
            grid,
            stats: ClusterStats {
                created: 0,
                attached: 0,
                merges: 0,
                absorbed: 0,
                discarded: 0,
            },
        }
    }

    /// The matching thresholds in use.
    pub const fn window(&self) -> &MatchWindow {
        &self.window
    }

    /// The grid spikes are positioned on.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Counters accumulated so far.
    pub const fn stats(&self) -> ClusterStats {
        self.stats
    }

    /// Number of live clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether there are no live clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Look up a live cluster.
    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    /// Live clusters in creation order.
    pub fn clusters(&self) -> impl ExactSizeIterator<Item = &Cluster> + DoubleEndedIterator {
        self.clusters.values()
    }

    /// Try to attach `spike` to existing clusters.
    ///
    /// Returns `true` if the spike joined a cluster (merging several if it
    /// bridged them) and `false` if nothing matched, in which case the
    /// caller should start a new cluster with [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if a node id is outside the grid, including the
    /// spike's own node when there is nothing to compare it against.
    pub fn place(&mut self, spike: Spike) -> Result<bool, GridError> {
        self.grid.coordinate(spike.node)?;
        let candidates = self.candidates(spike)?;
        let Some(&oldest) = candidates.last() else {
            trace!(timestamp = spike.timestamp, node = %spike.node, "no matching cluster");
            return Ok(false);
        };
        let Some(target) = self.clusters.get_mut(&oldest) else {
            return Ok(false);
        };
        target.append(spike);
        self.stats.attached = self.stats.attached.saturating_add(1);

        if candidates.len() > 1 {
            self.merge_candidates(&candidates);
        }
        trace!(
            timestamp = spike.timestamp,
            node = %spike.node,
            cluster = %oldest,
            matched = candidates.len(),
            "attached spike"
        );
        Ok(true)
    }

    /// Register a new singleton cluster seeded with `spike`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::ClusterIdExhausted`] if no ids are left.
    pub fn insert(&mut self, spike: Spike) -> Result<ClusterId, DetectError> {
        let id = self.next_id.ok_or(DetectError::ClusterIdExhausted)?;
        self.next_id = id.next();
        self.clusters.insert(id, Cluster::new(id, spike));
        self.stats.created = self.stats.created.saturating_add(1);
        Ok(id)
    }

    /// Place `spike`, starting a new cluster if it matched nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError`] if a node id is outside the grid or the
    /// cluster id space is exhausted.
    pub fn ingest(&mut self, spike: Spike) -> Result<(), DetectError> {
        if !self.place(spike)? {
            self.insert(spike)?;
        }
        Ok(())
    }

    /// Drop every cluster that still holds a single spike.
    ///
    /// Returns how many clusters were removed.
    pub fn discard_singletons(&mut self) -> usize {
        let before = self.clusters.len();
        self.clusters.retain(|_, cluster| !cluster.is_singleton());
        let removed = before.saturating_sub(self.clusters.len());
        self.stats.discarded = self
            .stats
            .discarded
            .saturating_add(u64::try_from(removed).unwrap_or(u64::MAX));
        removed
    }

    /// Size of each live cluster, in creation order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.clusters.values().map(Cluster::len)
    }

    /// Ordered membership of each live cluster, in creation order.
    pub fn members(&self) -> impl Iterator<Item = Vec<Spike>> + '_ {
        self.clusters.values().map(|cluster| cluster.iter().collect())
    }

    /// Ids of clusters with a member inside the window, newest first.
    fn candidates(&self, spike: Spike) -> Result<Vec<ClusterId>, GridError> {
        let mut found = Vec::new();
        for cluster in self
            .clusters
            .values()
            .rev()
            .take(self.window.scan_depth())
        {
            if cluster.has_neighbor(spike, &self.window, &self.grid)? {
                found.push(cluster.id());
            }
        }
        Ok(found)
    }

    /// Fold matched clusters into the oldest one, newest pair first.
    ///
    /// `candidates` is ordered newest to oldest; each cluster is absorbed
    /// into the next older candidate and removed from the set.
    fn merge_candidates(&mut self, candidates: &[ClusterId]) {
        for pair in candidates.windows(2) {
            let &[newer, older] = pair else {
                continue;
            };
            let Some(absorbed) = self.clusters.remove(&newer) else {
                continue;
            };
            if let Some(target) = self.clusters.get_mut(&older) {
                target.absorb(absorbed);
                self.stats.absorbed = self.stats.absorbed.saturating_add(1);
            }
        }
        self.stats.merges = self.stats.merges.saturating_add(1);
        debug!(
            into = ?candidates.last(),
            absorbed = candidates.len().saturating_sub(1),
            "merged clusters"
        );
    }
}
