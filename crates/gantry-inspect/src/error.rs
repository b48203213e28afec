//! Inspect error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading the instance list.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The input file could not be read.
    #[error("failed to read instance list from {path}")]
    ReadInput {
        /// Path that was read (`-` for stdin).
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The input is not a JSON array of containers.
    #[error("failed to parse instance list: {0}")]
    ParseInput(#[from] serde_json::Error),
}

impl InspectError {
    /// Create a new read error.
    pub fn read_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadInput {
            path: path.into(),
            source,
        }
    }
}
