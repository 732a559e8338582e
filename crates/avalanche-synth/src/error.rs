//! Error types for the `avalanche-synth` crate.

use avalanche_types::GridError;

/// Errors that can occur while generating or writing a synthetic trace.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The requested trace cannot be built with these parameters.
    #[error("invalid generator parameters: {reason}")]
    InvalidParams {
        /// What is wrong with the parameters.
        reason: String,
    },

    /// A generated coordinate fell outside the grid.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },

    /// The trace file could not be written.
    #[error("CSV error: {source}")]
    Csv {
        /// The underlying CSV error.
        #[from]
        source: csv::Error,
    },

    /// Flushing the trace file failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl SynthError {
    /// Shorthand for [`SynthError::InvalidParams`].
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}
