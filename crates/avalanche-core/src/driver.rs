//! Stream driver: feeds spike rows to a clusterer and finalizes the run.
//!
//! The driver owns the per-run bookkeeping (row and spike counts, wall
//! clock timing, node id validation) and delegates placement to any
//! [`Clusterer`]. Both grouping modes plug in through that trait:
//!
//! - [`ClusterSet`] for spatiotemporal clustering.
//! - [`TemporalClusterer`] for time-only grouping.

use std::time::Instant;

use avalanche_types::{Grid, GridError, Spike, SpikeRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::cluster_set::{ClusterSet, ClusterStats};
use crate::error::DetectError;
use crate::temporal::TemporalClusterer;

/// A strategy that groups an ordered spike stream into avalanches.
pub trait Clusterer {
    /// Add the next spike of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError`] if the spike cannot be placed.
    fn ingest(&mut self, spike: Spike) -> Result<(), DetectError>;

    /// Close the stream: drop singleton groups and return how many were
    /// removed.
    fn finish(&mut self) -> usize;

    /// Surviving avalanches in creation order.
    fn avalanches(&self) -> Box<dyn Iterator<Item = &Cluster> + '_>;

    /// Counters accumulated so far.
    fn stats(&self) -> ClusterStats;
}

impl Clusterer for ClusterSet {
    fn ingest(&mut self, spike: Spike) -> Result<(), DetectError> {
        Self::ingest(self, spike)
    }

    fn finish(&mut self) -> usize {
        self.discard_singletons()
    }

    fn avalanches(&self) -> Box<dyn Iterator<Item = &Cluster> + '_> {
        Box::new(self.clusters())
    }

    fn stats(&self) -> ClusterStats {
        Self::stats(self)
    }
}

impl Clusterer for TemporalClusterer {
    fn ingest(&mut self, spike: Spike) -> Result<(), DetectError> {
        Self::ingest(self, spike)
    }

    fn finish(&mut self) -> usize {
        self.discard_singletons()
    }

    fn avalanches(&self) -> Box<dyn Iterator<Item = &Cluster> + '_> {
        Box::new(self.clusters())
    }

    fn stats(&self) -> ClusterStats {
        Self::stats(self)
    }
}

/// Summary of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Spike rows (time steps) read.
    pub rows: u64,
    /// Spikes read.
    pub spikes: u64,
    /// Clusters created, including ones later merged or discarded.
    pub created: u64,
    /// Placements that bridged two or more clusters.
    pub merges: u64,
    /// Clusters absorbed into an older cluster.
    pub absorbed: u64,
    /// Single-spike clusters dropped at stream end.
    pub singletons_discarded: u64,
    /// Avalanches reported.
    pub avalanches: u64,
    /// Size of the largest avalanche, zero if none.
    pub largest_avalanche: u64,
    /// Wall clock time the run started.
    pub started_at: DateTime<Utc>,
    /// Wall clock time the run finished.
    pub finished_at: DateTime<Utc>,
    /// Elapsed processing time in milliseconds.
    pub elapsed_ms: u64,
}

/// Feeds a spike stream through a [`Clusterer`].
#[derive(Debug)]
pub struct StreamDriver<C> {
    grid: Grid,
    clusterer: C,
}

impl<C: Clusterer> StreamDriver<C> {
    /// Create a driver validating node ids against `grid`.
    pub const fn new(grid: Grid, clusterer: C) -> Self {
        Self { grid, clusterer }
    }

    /// The wrapped clusterer.
    pub const fn clusterer(&self) -> &C {
        &self.clusterer
    }

    /// Consume the driver, returning the clusterer with its avalanches.
    pub fn into_inner(self) -> C {
        self.clusterer
    }

    /// Process every row, then discard singletons.
    ///
    /// Each row's spikes are ingested in the order listed. Processing
    /// stops at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first read error, [`GridError::OutOfRange`] for a node
    /// id outside the grid, or any placement error from the clusterer.
    pub fn run<I>(&mut self, rows: I) -> Result<RunReport, DetectError>
    where
        I: IntoIterator<Item = Result<SpikeRow, DetectError>>,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut row_count: u64 = 0;
        let mut spike_count: u64 = 0;

        for row in rows {
            let row = row?;
            for spike in row.spikes() {
                if !self.grid.contains(spike.node) {
                    return Err(GridError::OutOfRange {
                        node: spike.node,
                        max: self.grid.capacity(),
                    }
                    .into());
                }
                self.clusterer.ingest(spike)?;
                spike_count = spike_count.saturating_add(1);
            }
            row_count = row_count.saturating_add(1);
            if row_count.is_multiple_of(100_000) {
                debug!(rows = row_count, spikes = spike_count, "progress");
            }
        }

        let discarded = self.clusterer.finish();
        let stats = self.clusterer.stats();
        let (avalanches, largest) = self
            .clusterer
            .avalanches()
            .fold((0_u64, 0_usize), |(count, largest), cluster| {
                (count.saturating_add(1), largest.max(cluster.len()))
            });
        let elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

        let report = RunReport {
            rows: row_count,
            spikes: spike_count,
            created: stats.created,
            merges: stats.merges,
            absorbed: stats.absorbed,
            singletons_discarded: u64::try_from(discarded).unwrap_or(u64::MAX),
            avalanches,
            largest_avalanche: u64::try_from(largest).unwrap_or(u64::MAX),
            started_at,
            finished_at: Utc::now(),
            elapsed_ms,
        };
        info!(
            rows = report.rows,
            spikes = report.spikes,
            avalanches = report.avalanches,
            largest = report.largest_avalanche,
            merges = report.merges,
            discarded = report.singletons_discarded,
            elapsed_ms = report.elapsed_ms,
            "detection complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use avalanche_types::NodeId;

    use super::*;
    use crate::window::MatchWindow;

    fn rows(data: &[(u64, &[u32])]) -> Vec<Result<SpikeRow, DetectError>> {
        data.iter()
            .map(|&(t, nodes)| Ok(SpikeRow::new(t, nodes.iter().copied().map(NodeId).collect())))
            .collect()
    }

    #[test]
    fn run_reports_counts_and_drops_singletons() {
        let grid = Grid::default();
        let mut driver = StreamDriver::new(grid, ClusterSet::new(grid, MatchWindow::new(10, 3.0)));
        let report = driver.run(rows(&[(1, &[1, 2]), (2, &[3]), (50, &[5000])])).unwrap();

        assert_eq!(report.rows, 3);
        assert_eq!(report.spikes, 4);
        assert_eq!(report.created, 2);
        assert_eq!(report.singletons_discarded, 1);
        assert_eq!(report.avalanches, 1);
        assert_eq!(report.largest_avalanche, 3);
        assert!(report.finished_at >= report.started_at);
        assert_eq!(driver.clusterer().sizes().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn out_of_range_node_stops_the_run() {
        let grid = Grid::default();
        let mut driver = StreamDriver::new(grid, TemporalClusterer::new(5));
        let result = driver.run(rows(&[(1, &[1]), (2, &[10_001])]));
        assert!(matches!(
            result,
            Err(DetectError::Grid {
                source: GridError::OutOfRange { max: 10_000, .. }
            })
        ));

        let result = StreamDriver::new(grid, TemporalClusterer::new(5)).run(rows(&[(1, &[0])]));
        assert!(matches!(result, Err(DetectError::Grid { .. })));
    }

    #[test]
    fn read_error_is_propagated() {
        let grid = Grid::default();
        let mut driver = StreamDriver::new(grid, TemporalClusterer::new(5));
        let input = vec![
            Ok(SpikeRow::new(1, vec![NodeId(1)])),
            Err(DetectError::MalformedRow {
                line: 2,
                reason: "bad".to_owned(),
            }),
        ];
        assert!(matches!(
            driver.run(input),
            Err(DetectError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn empty_stream_reports_nothing() {
        let grid = Grid::default();
        let mut driver = StreamDriver::new(grid, ClusterSet::new(grid, MatchWindow::default()));
        let report = driver.run(Vec::new()).unwrap();
        assert_eq!(report.avalanches, 0);
        assert_eq!(report.largest_avalanche, 0);
        assert_eq!(driver.into_inner().len(), 0);
    }

    #[test]
    fn temporal_mode_through_the_trait() {
        let grid = Grid::default();
        let mut driver = StreamDriver::new(grid, TemporalClusterer::new(2));
        let report = driver
            .run(rows(&[(1, &[1, 9999]), (3, &[50]), (10, &[4]), (30, &[7, 8])]))
            .unwrap();
        assert_eq!(report.avalanches, 2);
        let sizes: Vec<usize> = driver.clusterer().avalanches().map(Cluster::len).collect();
        assert_eq!(sizes, vec![3, 2]);
    }
}
