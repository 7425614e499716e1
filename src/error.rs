use std::fmt;

/// Result type for deepq operations
pub type Result<T> = std::result::Result<T, DeepqError>;

/// Main error type for the deepq library
#[derive(Debug, Clone)]
pub enum DeepqError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Numerical computation errors (NaN/Inf in predictions or loss)
    NumericalError(String),

    /// Empty buffer or container
    EmptyBuffer(String),

    /// Invalid action index
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Unusable historical data feed
    DataError(String),

    /// Training error
    TrainingError(String),
}

impl fmt::Display for DeepqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeepqError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            DeepqError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            DeepqError::IoError(msg) => write!(f, "IO error: {}", msg),
            DeepqError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            DeepqError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            DeepqError::EmptyBuffer(msg) => write!(f, "Empty buffer: {}", msg),
            DeepqError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            DeepqError::DataError(msg) => write!(f, "Data error: {}", msg),
            DeepqError::TrainingError(msg) => write!(f, "Training error: {}", msg),
        }
    }
}

impl std::error::Error for DeepqError {}

// Conversion from std::io::Error
impl From<std::io::Error> for DeepqError {
    fn from(err: std::io::Error) -> Self {
        DeepqError::IoError(err.to_string())
    }
}

// Conversion from bincode::Error
impl From<bincode::Error> for DeepqError {
    fn from(err: bincode::Error) -> Self {
        DeepqError::SerializationError(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DeepqError {
    fn from(err: serde_json::Error) -> Self {
        DeepqError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl DeepqError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DeepqError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DeepqError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
