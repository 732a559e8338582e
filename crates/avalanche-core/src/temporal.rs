//! Temporal-only avalanche grouping.
//!
//! Ignores position entirely: consecutive spikes belong to the same
//! avalanche as long as each time step follows the previous one by at most
//! `tau` steps. A longer quiet gap closes the current avalanche and the next
//! spike opens a new one. Single-spike avalanches are dropped at the end,
//! exactly as in the spatiotemporal mode.

use avalanche_types::{ClusterId, Spike, Timestamp};

use crate::cluster::Cluster;
use crate::cluster_set::ClusterStats;
use crate::error::DetectError;

/// Groups a spike stream into avalanches separated by quiet gaps.
#[derive(Debug, Clone)]
pub struct TemporalClusterer {
    tau: u64,
    clusters: Vec<Cluster>,
    previous: Option<Timestamp>,
    next_id: Option<ClusterId>,
    stats: ClusterStats,
}

impl TemporalClusterer {
    /// Create a clusterer that splits on gaps longer than `tau` steps.
    pub const fn new(tau: u64) -> Self {
        Self {
            tau,
            clusters: Vec::new(),
            previous: None,
            next_id: Some(ClusterId(0)),
            stats: ClusterStats {
                created: 0,
                attached: 0,
                merges: 0,
                absorbed: 0,
                discarded: 0,
            },
        }
    }

    /// The gap length tolerated inside one avalanche.
    pub const fn tau(&self) -> u64 {
        self.tau
    }

    /// Counters accumulated so far.
    pub const fn stats(&self) -> ClusterStats {
        self.stats
    }

    /// Add the next spike of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::ClusterIdExhausted`] if a new avalanche is
    /// needed and no ids are left.
    pub fn ingest(&mut self, spike: Spike) -> Result<(), DetectError> {
        let quiet_gap = self
            .previous
            .is_none_or(|previous| previous.saturating_add(self.tau) < spike.timestamp);
        self.previous = Some(spike.timestamp);

        if !quiet_gap {
            if let Some(current) = self.clusters.last_mut() {
                current.append(spike);
                self.stats.attached = self.stats.attached.saturating_add(1);
                return Ok(());
            }
        }

        let id = self.next_id.ok_or(DetectError::ClusterIdExhausted)?;
        self.next_id = id.next();
        self.clusters.push(Cluster::new(id, spike));
        self.stats.created = self.stats.created.saturating_add(1);
        Ok(())
    }

    /// Drop every single-spike avalanche, returning how many were removed.
    pub fn discard_singletons(&mut self) -> usize {
        let before = self.clusters.len();
        self.clusters.retain(|cluster| !cluster.is_singleton());
        let removed = before.saturating_sub(self.clusters.len());
        self.stats.discarded = self
            .stats
            .discarded
            .saturating_add(u64::try_from(removed).unwrap_or(u64::MAX));
        removed
    }

    /// Avalanches in the order they started.
    pub fn clusters(&self) -> impl ExactSizeIterator<Item = &Cluster> + DoubleEndedIterator {
        self.clusters.iter()
    }

    /// Size of each avalanche, in start order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.clusters.iter().map(Cluster::len)
    }
}
