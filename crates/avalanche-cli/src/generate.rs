//! The `generate` subcommand.

use std::path::PathBuf;

use anyhow::Context;
use avalanche_core::window::{DEFAULT_RADIUS, DEFAULT_TAU};
use avalanche_synth::SynthParams;
use avalanche_types::{DEFAULT_GRID_SIDE, Grid};
use clap::{Args, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

/// Shape of the generated trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceKind {
    /// Chained avalanches of random size with isolated spikes in between
    Basic,
    /// Avalanches formed by two chains that merge at a root spike
    Merging,
    /// Spikes close in space but never close in time (no avalanches)
    SpatialNoise,
    /// Spikes close in time but never close in space (no avalanches)
    TemporalNoise,
}

/// Arguments for `avalanche generate`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Trace shape
    #[arg(value_enum)]
    pub kind: TraceKind,

    /// File to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// RNG seed; a random seed is drawn and logged when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Spikes to generate (basic: budget shared by the avalanches)
    #[arg(long, default_value_t = 100)]
    pub spikes: usize,

    /// Number of avalanches (basic, merging)
    #[arg(long, default_value_t = 5)]
    pub avalanches: usize,

    /// Upper bound on isolated single spikes (basic)
    #[arg(long, default_value_t = 20)]
    pub singles: usize,

    /// Steps per chain; each avalanche has `2 * length + 1` spikes (merging)
    #[arg(long, default_value_t = 10)]
    pub length: usize,

    /// Allow several spikes per time step (temporal-noise)
    #[arg(long)]
    pub multiple: bool,

    /// Grid side length
    #[arg(long, default_value_t = DEFAULT_GRID_SIDE)]
    pub grid: u32,

    /// Temporal window the trace is built against
    #[arg(long, default_value_t = DEFAULT_TAU)]
    pub tau: u64,

    /// Spatial radius the trace is built against
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    pub radius: f64,
}

/// Generate the requested trace and write it to `args.output`.
pub fn run(args: &GenerateArgs) -> anyhow::Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let params = SynthParams {
        grid: Grid::new(args.grid)?,
        tau: args.tau,
        radius: args.radius,
    };

    let trace = match args.kind {
        TraceKind::Basic => {
            avalanche_synth::basic(&params, args.spikes, args.avalanches, args.singles, &mut rng)
        }
        TraceKind::Merging => {
            avalanche_synth::merging(&params, args.length, args.avalanches, &mut rng)
        }
        TraceKind::SpatialNoise => avalanche_synth::spatial_noise(&params, args.spikes, &mut rng),
        TraceKind::TemporalNoise => {
            avalanche_synth::temporal_noise(&params, args.spikes, args.multiple, &mut rng)
        }
    }
    .with_context(|| format!("generating {:?} trace", args.kind))?;

    trace
        .write_file(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    info!(
        kind = ?args.kind,
        seed,
        output = %args.output.display(),
        rows = trace.rows.len(),
        spikes = trace.spike_count(),
        expected = ?trace.expected_sizes,
        "trace generated"
    );
    Ok(())
}
