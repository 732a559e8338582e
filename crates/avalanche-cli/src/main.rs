//! `avalanche` command-line front end.
//!
//! # Commands
//!
//! - `detect`: cluster a spike file into avalanches and write the size,
//!   membership, summary and report files.
//! - `generate`: write a seeded synthetic spike file with known avalanches.
//!
//! Logging goes to stderr. `-v` raises the level to `info`, `-vv` to
//! `debug`, `-vvv` to `trace`; without a flag `RUST_LOG` or the configured
//! level applies.

mod detect;
mod generate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Neuronal avalanche detection for spike recordings.
#[derive(Debug, Parser)]
#[command(name = "avalanche")]
#[command(version)]
#[command(about = "Detect spatiotemporal avalanches in spike streams")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect avalanches in a spike file
    ///
    /// Reads `timestamp,node,...` rows and writes `<stem>_size.csv` next to
    /// the input (or into `--out-dir`), plus any optional outputs enabled by
    /// flags or the config file.
    Detect(detect::DetectArgs),
    /// Generate a synthetic spike file with known avalanches
    Generate(generate::GenerateArgs),
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, input, or output handling fails.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => {
            let config = args.load_config()?;
            init_logging(cli.verbose, &config.logging.level);
            detect::run(&args, &config)
        }
        Commands::Generate(args) => {
            init_logging(cli.verbose, "info");
            generate::run(&args)
        }
    }
}

/// Install the stderr subscriber.
fn init_logging(verbose: u8, default_level: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_detect_flags() {
        let cli = Cli::try_parse_from([
            "avalanche",
            "-vv",
            "detect",
            "spikes.csv",
            "--tau",
            "20",
            "--radius",
            "4.5",
            "--scan-depth",
            "7",
            "--members",
            "--temporal",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Detect(args) = cli.command else {
            panic!("expected the detect command");
        };
        assert_eq!(args.tau, Some(20));
        assert_eq!(args.scan_depth, Some(7));
        assert!(args.members);
        assert!(args.temporal);
        assert!(!args.summary);
    }

    #[test]
    fn parses_generate_kind() {
        let cli = Cli::try_parse_from([
            "avalanche",
            "generate",
            "temporal-noise",
            "--output",
            "noise.csv",
            "--seed",
            "4",
            "--multiple",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected the generate command");
        };
        assert_eq!(args.kind, generate::TraceKind::TemporalNoise);
        assert_eq!(args.seed, Some(4));
        assert!(args.multiple);
    }
}
