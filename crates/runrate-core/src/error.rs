// crates/runrate-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("group '{key}' not found in {key_name} table")]
    GroupNotFound { key: String, key_name: String },

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
