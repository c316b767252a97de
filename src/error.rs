//! Error types for dark/flat operations

use thiserror::Error;

/// Main error type for dark/flat operations
#[derive(Error, Debug)]
pub enum DarkFlatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Invalid axis: {0}")]
    InvalidAxis(usize),

    #[error("Axis label not found: {0}")]
    AxisNotFound(String),

    #[error("Invalid frame label: {0}")]
    InvalidLabel(i64),

    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("No {0} frames available")]
    NoFrames(String),

    #[error("Missing reference array: {0}")]
    MissingReference(String),

    #[error("Preview error: {0}")]
    Preview(String),

    #[error("Dark and flat have not been set up")]
    NotSetUp,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized Result type for dark/flat operations
pub type Result<T> = std::result::Result<T, DarkFlatError>;

impl From<bincode::Error> for DarkFlatError {
    fn from(err: bincode::Error) -> Self {
        DarkFlatError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DarkFlatError {
    fn from(err: serde_json::Error) -> Self {
        DarkFlatError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DarkFlatError {
    fn from(err: ndarray::ShapeError) -> Self {
        DarkFlatError::InvalidDimensions(err.to_string())
    }
}
