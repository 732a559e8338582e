//! Error types for the `avalanche-core` crate.
//!
//! Every fallible detection step (reading the stream, validating node ids,
//! writing results) surfaces through [`DetectError`]. Configuration loading
//! has its own [`ConfigError`](crate::config::ConfigError).

use avalanche_types::GridError;

/// Errors that can occur while detecting avalanches in a spike stream.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// A row has a missing or non-integer timestamp or node id field.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow {
        /// One-based line number in the input.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },

    /// A node id does not name a cell of the configured grid.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },

    /// The cluster id sequence ran out.
    #[error("cluster id space exhausted")]
    ClusterIdExhausted,

    /// Failed to read the input or write an output file.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The CSV reader or writer failed.
    #[error("CSV error: {source}")]
    Csv {
        /// The underlying CSV error.
        #[from]
        source: csv::Error,
    },

    /// The run report could not be serialized.
    #[error("report serialization error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
