//! Error types for the homenet-consolidate crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to move output into place at {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConsolidateError>;
