//! Seeded synthetic spike traces with known avalanche ground truth.
//!
//! Each generator builds a trace whose avalanches are known by
//! construction, so detector output can be checked exactly:
//!
//! - [`basic`] -- chained avalanches of random sizes separated by quiet gaps,
//!   with isolated single spikes in between.
//! - [`merging`] -- two chains converging on a shared root spike.
//! - [`spatial_noise`] -- spikes close in space but never close in time.
//! - [`temporal_noise`] -- spikes close in time but never close in space.
//!
//! Every generator takes the thresholds it is built against as
//! [`SynthParams`] and any [`rand::Rng`], so a seeded generator reproduces
//! the same trace.

mod error;
mod generators;
mod placement;

use std::io::Write;
use std::path::Path;

use avalanche_types::{Grid, SpikeRow};
use tracing::debug;

pub use error::SynthError;
pub use generators::{basic, merging, spatial_noise, temporal_noise};

/// Grid and thresholds a trace is generated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    /// Grid the node ids refer to.
    pub grid: Grid,
    /// Temporal window of the detector, in time steps.
    pub tau: u64,
    /// Spatial radius of the detector, in grid cells.
    pub radius: f64,
}

impl SynthParams {
    /// Check that the thresholds can be generated against.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::InvalidParams`] for a zero `tau` or a radius
    /// that is not a positive finite number.
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.tau == 0 {
            return Err(SynthError::invalid("tau must be at least 1"));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SynthError::invalid(format!(
                "radius must be a positive finite number, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            tau: 50,
            radius: 8.0,
        }
    }
}

/// A generated spike stream and the avalanche sizes a correct detector
/// reports for it, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticTrace {
    /// Rows in non-decreasing timestamp order.
    pub rows: Vec<SpikeRow>,
    /// Expected avalanche sizes.
    pub expected_sizes: Vec<usize>,
}

impl SyntheticTrace {
    /// Total number of spikes in the trace.
    pub fn spike_count(&self) -> usize {
        self.rows.iter().map(SpikeRow::len).sum()
    }

    /// Write the trace in detector input format: `timestamp,node,...`.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError`] if writing fails.
    pub fn write_to<W: Write>(&self, sink: W) -> Result<(), SynthError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(sink);
        for row in &self.rows {
            let mut record = Vec::with_capacity(row.len().saturating_add(1));
            record.push(row.timestamp.to_string());
            record.extend(row.nodes.iter().map(ToString::to_string));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the trace to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError`] if the file cannot be created or written.
    pub fn write_file(&self, path: &Path) -> Result<(), SynthError> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))?;
        debug!(
            path = %path.display(),
            rows = self.rows.len(),
            spikes = self.spike_count(),
            avalanches = self.expected_sizes.len(),
            "wrote synthetic trace"
        );
        Ok(())
    }
}
