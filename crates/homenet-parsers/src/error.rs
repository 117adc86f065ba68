//! Error types for the homenet-parsers crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid XML: {0}")]
    XmlParse(String),

    #[error("Unexpected input shape: {0}")]
    UnexpectedShape(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
