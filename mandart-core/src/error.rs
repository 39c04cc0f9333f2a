//! Error types shared by the MandArt crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MandArtError {
    #[error("Invalid shape parameter `{field}`: {reason}")]
    InvalidParameters { field: &'static str, reason: String },

    #[error("Invalid palette: {reason}")]
    InvalidPalette { reason: String },

    #[error("Malformed picture definition: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Grid computation cancelled")]
    Cancelled,

    #[error("Grid computation aborted before producing a result")]
    ComputationAborted,

    #[error("Unknown grid backend: {0}")]
    UnknownBackend(String),

    #[error("Worker pool unavailable: {0}")]
    ThreadPool(String),
}

impl MandArtError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn palette(reason: impl Into<String>) -> Self {
        Self::InvalidPalette {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MandArtError>;
