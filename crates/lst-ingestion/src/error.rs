//! Error types for the ingestion crate.
//!
//! Only structural problems surface as [`IngestionError`]. Data problems in a
//! single granule or region are recorded inline and counted instead.

use thiserror::Error;

/// Errors that abort an ingestion stage.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid partition source: {0}")]
    InvalidPartitions(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
