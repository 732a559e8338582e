//! The `detect` subcommand.

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use avalanche_core::output::{write_members, write_report, write_sizes, write_summary};
use avalanche_core::{
    ClusterSet, Clusterer, ClusteringMode, DetectorConfig, OutputPaths, SpikeReader, StreamDriver,
    TemporalClusterer,
};
use clap::Args;
use tracing::info;

/// Arguments for `avalanche detect`.
#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Spike file: one `timestamp,node[,node...]` row per time step
    pub input: PathBuf,

    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Grid side length (nodes are numbered 1..=side*side)
    #[arg(long)]
    pub grid: Option<u32>,

    /// Temporal window in time steps
    #[arg(long)]
    pub tau: Option<u64>,

    /// Spatial radius in grid cells
    #[arg(long)]
    pub radius: Option<f64>,

    /// Most recent clusters examined per spike (defaults to tau)
    #[arg(long)]
    pub scan_depth: Option<usize>,

    /// Group by time only, ignoring position
    #[arg(long)]
    pub temporal: bool,

    /// Also write `<stem>_list.csv` with each avalanche's members
    #[arg(long)]
    pub members: bool,

    /// Also write `<stem>_summary.csv` with start, end, width and size
    #[arg(long)]
    pub summary: bool,

    /// Also write `<stem>_report.json` with run counters
    #[arg(long)]
    pub report: bool,

    /// Directory for output files (defaults to the input's directory)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

impl DetectArgs {
    /// Resolve the run configuration: file, then environment, then flags.
    pub fn load_config(&self) -> anyhow::Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => {
                let mut config = DetectorConfig::default();
                config.apply_env_overrides()?;
                config
            }
        };

        if let Some(side) = self.grid {
            config.grid.side = side;
        }
        if let Some(tau) = self.tau {
            config.clustering.tau = tau;
        }
        if let Some(radius) = self.radius {
            config.clustering.radius = radius;
        }
        if let Some(depth) = self.scan_depth {
            config.clustering.scan_depth = Some(depth);
        }
        if self.temporal {
            config.clustering.mode = ClusteringMode::Temporal;
        }
        config.output.members |= self.members;
        config.output.summary |= self.summary;
        config.output.report |= self.report;

        config.validate()?;
        Ok(config)
    }
}

/// Run detection over `args.input` and write the configured outputs.
pub fn run(args: &DetectArgs, config: &DetectorConfig) -> anyhow::Result<()> {
    let grid = config.build_grid()?;
    let window = config.window();
    let reader = SpikeReader::from_path(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;

    info!(
        input = %args.input.display(),
        grid = grid.side(),
        tau = window.tau,
        radius = window.radius,
        scan_depth = window.scan_depth(),
        mode = ?config.clustering.mode,
        "starting detection"
    );

    match config.clustering.mode {
        ClusteringMode::Spatiotemporal => {
            let driver = StreamDriver::new(grid, ClusterSet::new(grid, window));
            detect_and_write(args, config, driver, reader)
        }
        ClusteringMode::Temporal => {
            let driver = StreamDriver::new(grid, TemporalClusterer::new(window.tau));
            detect_and_write(args, config, driver, reader)
        }
    }
}

fn detect_and_write<C: Clusterer>(
    args: &DetectArgs,
    config: &DetectorConfig,
    mut driver: StreamDriver<C>,
    reader: SpikeReader<File>,
) -> anyhow::Result<()> {
    let report = driver
        .run(reader)
        .with_context(|| format!("detecting avalanches in {}", args.input.display()))?;

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    let paths = OutputPaths::for_input(&args.input, args.out_dir.as_deref());
    let clusterer = driver.clusterer();

    write_sizes(&paths.sizes, clusterer.avalanches())
        .with_context(|| format!("writing {}", paths.sizes.display()))?;
    if config.output.members {
        write_members(&paths.members, clusterer.avalanches())
            .with_context(|| format!("writing {}", paths.members.display()))?;
    }
    if config.output.summary {
        write_summary(&paths.summary, clusterer.avalanches())
            .with_context(|| format!("writing {}", paths.summary.display()))?;
    }
    if config.output.report {
        write_report(&paths.report, &report)
            .with_context(|| format!("writing {}", paths.report.display()))?;
    }

    info!(
        sizes = %paths.sizes.display(),
        avalanches = report.avalanches,
        "results written"
    );
    Ok(())
}
