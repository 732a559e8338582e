//! Online detection of neuronal avalanches in spike streams.
//!
//! Spikes arrive one time step at a time. Each spike is compared against the
//! recently created clusters; it joins every cluster with a member that fired
//! less than `tau` steps earlier and lies less than `radius` cells away,
//! merging those clusters when it bridges several. At stream end, clusters
//! of a single spike are dropped and the rest are reported as avalanches.
//!
//! # Modules
//!
//! - [`cluster`] -- Time-ordered spike sequence with O(1) append and
//!   splice-merge.
//! - [`cluster_set`] -- The live cluster collection and the per-spike
//!   placement state machine.
//! - [`config`] -- Configuration loading from `avalanche.yaml`.
//! - [`driver`] -- [`Clusterer`] trait and the [`StreamDriver`] run loop.
//! - [`error`] -- [`DetectError`] for every fallible detection step.
//! - [`input`] -- CSV spike stream reader.
//! - [`output`] -- Size, membership, summary and report writers.
//! - [`temporal`] -- Time-only grouping mode.
//! - [`window`] -- Strict temporal and spatial matching thresholds.
//!
//! [`Clusterer`]: driver::Clusterer
//! [`StreamDriver`]: driver::StreamDriver
//! [`DetectError`]: error::DetectError

pub mod cluster;
pub mod cluster_set;
pub mod config;
pub mod driver;
pub mod error;
pub mod input;
pub mod output;
pub mod temporal;
pub mod window;

pub use cluster::{AvalancheSummary, Cluster};
pub use cluster_set::{ClusterSet, ClusterStats};
pub use config::{ClusteringMode, ConfigError, DetectorConfig};
pub use driver::{Clusterer, RunReport, StreamDriver};
pub use error::DetectError;
pub use input::SpikeReader;
pub use output::OutputPaths;
pub use temporal::TemporalClusterer;
pub use window::MatchWindow;
