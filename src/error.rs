//! Error types for the retail_forecast crate

use thiserror::Error;

/// Custom error types for the retail_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Source tables are unreadable, malformed, or missing the join key
    #[error("Data source error: {0}")]
    DataSourceError(String),

    /// A requested store has no historical records
    #[error("Store {store} has no historical records")]
    EmptyHistoryError {
        /// Store identifier with the empty history
        store: u32,
    },

    /// Feature frame does not match the model artifact's expected columns
    #[error("Schema mismatch: {0}")]
    SchemaMismatchError(String),

    /// Error related to data validation or processing
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV export or parsing
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON serialization of the model artifact
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::JsonError(err.to_string())
    }
}
