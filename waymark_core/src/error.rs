//! Error types for Waymark

use thiserror::Error;

/// Waymark error type
///
/// Domain errors from the algorithm crates (matrix, planner) convert into
/// this type so binaries can propagate everything with `?`.
#[derive(Error, Debug)]
pub enum WaymarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Matrix error: {0}")]
    Matrix(String),

    #[error("Planner error: {0}")]
    Planner(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<toml::de::Error> for WaymarkError {
    fn from(e: toml::de::Error) -> Self {
        WaymarkError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for WaymarkError {
    fn from(e: toml::ser::Error) -> Self {
        WaymarkError::Config(e.to_string())
    }
}

/// Result type for Waymark operations
pub type WaymarkResult<T> = std::result::Result<T, WaymarkError>;
