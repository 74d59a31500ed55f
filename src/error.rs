use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the load → layout pipeline. All of them end the run.
#[derive(Debug, Error)]
pub enum Error {
    /// A row is missing the configured name/count field, or the count is not
    /// a non-negative integer.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: u64, reason: String },

    /// Nothing left to rank once zero-count entrants are dropped.
    #[error("no entrant has a non-zero count")]
    EmptyDataset,

    #[error("invalid bounding box {width}x{height}: both sides must be positive")]
    InvalidGeometry { width: f64, height: f64 },

    #[error("rank cutoff must be at least 1")]
    InvalidCutoff,

    #[error("no records ranked at or above {maxrank}")]
    EmptyView { maxrank: u32 },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Stable, kebab-case name of the error kind, printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedInput { .. } => "malformed-input",
            Error::EmptyDataset => "empty-dataset",
            Error::InvalidGeometry { .. } => "invalid-geometry",
            Error::InvalidCutoff => "invalid-cutoff",
            Error::EmptyView { .. } => "empty-view",
            Error::Io { .. } => "io",
            Error::Csv(_) => "csv",
        }
    }

    pub(crate) fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            line,
            reason: reason.into(),
        }
    }
}
