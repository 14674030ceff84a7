//! Error types for Listen Flux

use crate::schema::ValidationError;
use thiserror::Error;

/// Errors that can occur while ingesting history or configuring the engine
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to parse listening history: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid track record: {0}")]
    InvalidRecord(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
