//! Configuration loading and typed config structures for avalanche detection.
//!
//! A run is configured from an optional YAML file (`avalanche.yaml` by
//! convention). Every field has a default, so an empty file, or no file at
//! all, yields the thresholds the analysis has always used: a 100 x 100
//! grid, `tau = 50` steps, and a radius of 8 cells.
//!
//! Environment variables override file values; command-line flags override
//! both (applied by the binary).

use std::path::Path;

use avalanche_types::{DEFAULT_GRID_SIDE, Grid, GridError};
use serde::{Deserialize, Serialize};

use crate::window::{DEFAULT_RADIUS, DEFAULT_TAU, MatchWindow};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    Env {
        /// The environment variable name.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The configuration parsed but describes an unusable run.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl From<GridError> for ConfigError {
    fn from(source: GridError) -> Self {
        Self::Invalid {
            reason: source.to_string(),
        }
    }
}

/// Top-level detector configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Neuron grid geometry.
    #[serde(default)]
    pub grid: GridConfig,

    /// Matching thresholds and clustering mode.
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Which optional output files to write.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DetectorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment overrides are applied after parsing:
    /// - `AVALANCHE_GRID_SIDE` overrides `grid.side`
    /// - `AVALANCHE_TAU` overrides `clustering.tau`
    /// - `AVALANCHE_RADIUS` overrides `clustering.radius`
    /// - `AVALANCHE_SCAN_DEPTH` overrides `clustering.scan_depth`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::Env`] if an override is not a valid number.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override thresholds from `AVALANCHE_*` environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a variable is set but not a number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(side) = env_number("AVALANCHE_GRID_SIDE")? {
            self.grid.side = side;
        }
        if let Some(tau) = env_number("AVALANCHE_TAU")? {
            self.clustering.tau = tau;
        }
        if let Some(radius) = env_number("AVALANCHE_RADIUS")? {
            self.clustering.radius = radius;
        }
        if let Some(depth) = env_number("AVALANCHE_SCAN_DEPTH")? {
            self.clustering.scan_depth = Some(depth);
        }
        Ok(())
    }

    /// Check that the configuration describes a usable run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero or oversized grid side,
    /// a zero tau, a radius that is not a positive finite number, or a zero
    /// scan depth.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_grid()?;
        if self.clustering.tau == 0 {
            return Err(ConfigError::Invalid {
                reason: "tau must be at least 1".to_owned(),
            });
        }
        let radius = self.clustering.radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!("radius must be a positive finite number, got {radius}"),
            });
        }
        if self.clustering.scan_depth == Some(0) {
            return Err(ConfigError::Invalid {
                reason: "scan_depth must be at least 1 when set".to_owned(),
            });
        }
        Ok(())
    }

    /// Build the grid described by `grid.side`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the side is zero or too large.
    pub fn build_grid(&self) -> Result<Grid, ConfigError> {
        Ok(Grid::new(self.grid.side)?)
    }

    /// The resolved matching window.
    pub const fn window(&self) -> MatchWindow {
        MatchWindow {
            tau: self.clustering.tau,
            radius: self.clustering.radius,
            scan_depth: self.clustering.scan_depth,
        }
    }
}

/// Grid geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Side length of the square grid (`side * side` neurons).
    #[serde(default = "default_grid_side")]
    pub side: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            side: default_grid_side(),
        }
    }
}

/// How spikes are grouped into avalanches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringMode {
    /// Spikes must be close in both space and time.
    #[default]
    Spatiotemporal,
    /// Spikes only need to be close in time.
    Temporal,
}

/// Matching thresholds and clustering mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Temporal window in time steps (strict).
    #[serde(default = "default_tau")]
    pub tau: u64,

    /// Spatial radius in grid cells (strict).
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// Most recent clusters examined per spike. Unset means "same as tau".
    #[serde(default)]
    pub scan_depth: Option<usize>,

    /// Grouping mode.
    #[serde(default)]
    pub mode: ClusteringMode,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            tau: default_tau(),
            radius: default_radius(),
            scan_depth: None,
            mode: ClusteringMode::default(),
        }
    }
}

/// Optional output files. The sizes file is always written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write `<stem>_list.csv` with each avalanche's members.
    #[serde(default)]
    pub members: bool,

    /// Write `<stem>_summary.csv` with start, end, width and size.
    #[serde(default)]
    pub summary: bool,

    /// Write `<stem>_report.json` with run counters and timing.
    #[serde(default)]
    pub report: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Read and parse an optional numeric environment variable.
fn env_number<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Env {
                var,
                reason: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_grid_side() -> u32 {
    DEFAULT_GRID_SIDE
}

const fn default_tau() -> u64 {
    DEFAULT_TAU
}

const fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DetectorConfig::default();
        assert_eq!(config.grid.side, 100);
        assert_eq!(config.clustering.tau, 50);
        assert!((config.clustering.radius - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.clustering.scan_depth, None);
        assert_eq!(config.clustering.mode, ClusteringMode::Spatiotemporal);
        assert!(!config.output.members);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
grid:
  side: 64

clustering:
  tau: 15
  radius: 1.5
  scan_depth: 4
  mode: temporal

output:
  members: true
  summary: true
  report: false

logging:
  level: debug
";
        let config = DetectorConfig::parse(yaml).unwrap();

        assert_eq!(config.grid.side, 64);
        assert_eq!(config.clustering.tau, 15);
        assert!((config.clustering.radius - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.clustering.scan_depth, Some(4));
        assert_eq!(config.clustering.mode, ClusteringMode::Temporal);
        assert!(config.output.members);
        assert!(config.output.summary);
        assert!(!config.output.report);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.window().scan_depth(), 4);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = DetectorConfig::parse("clustering:\n  tau: 7\n").unwrap();

        // Tau is overridden
        assert_eq!(config.clustering.tau, 7);
        // Everything else uses defaults
        assert!((config.clustering.radius - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.grid.side, 100);
        assert_eq!(config.window().scan_depth(), 7);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = DetectorConfig::parse("").unwrap();
        assert_eq!(config, DetectorConfig::default());
    }

    #[test]
    fn parse_rejects_garbage() {
        let config = DetectorConfig::parse("clustering: [tau");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = DetectorConfig::default();
        config.grid.side = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = DetectorConfig::default();
        config.clustering.tau = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        // An explicit scan depth does not rescue a zero tau.
        config.clustering.scan_depth = Some(5);
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.clustering.radius = -1.0;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.clustering.radius = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.clustering.scan_depth = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avalanche.yaml");
        std::fs::write(&path, "grid:\n  side: 32\n").unwrap();

        let config = DetectorConfig::from_file(&path).unwrap();
        assert_eq!(config.grid.side, 32);
        assert_eq!(config.clustering.tau, 50);
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let config = DetectorConfig::from_file(Path::new("/nonexistent/avalanche.yaml"));
        assert!(matches!(config, Err(ConfigError::Io { .. })));
    }
}
