//! Error types for tradeflow

use thiserror::Error;

/// Main error type for the tradeflow engine
#[derive(Error, Debug)]
pub enum TradeflowError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias for tradeflow operations
pub type Result<T> = std::result::Result<T, TradeflowError>;
