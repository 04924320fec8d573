//! Error types for Pulso operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for Pulso operations.
///
/// Covers numeric failures during model fitting, invalid configuration,
/// and persistence failures of the model registry.
///
/// # Examples
///
/// ```
/// use pulso::error::PulsoError;
///
/// let err = PulsoError::DimensionMismatch {
///     expected: "60x10".to_string(),
///     actual: "60x5".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug)]
pub enum PulsoError {
    /// Matrix/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Normal-equation system is singular (not positive definite).
    SingularMatrix {
        /// Offending diagonal pivot during decomposition
        pivot: f64,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A persisted registry artifact disagrees with the running feature
    /// layout.
    RegistryMismatch {
        /// Description of the disagreement
        message: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for PulsoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulsoError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Matrix dimension mismatch: expected {expected}, got {actual}"
                )
            }
            PulsoError::SingularMatrix { pivot } => {
                write!(
                    f,
                    "Singular matrix detected: pivot = {pivot}, system is not positive definite"
                )
            }
            PulsoError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            PulsoError::RegistryMismatch { message } => {
                write!(f, "Registry layout mismatch: {message}")
            }
            PulsoError::Io(e) => write!(f, "I/O error: {e}"),
            PulsoError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            PulsoError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PulsoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PulsoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PulsoError {
    fn from(err: std::io::Error) -> Self {
        PulsoError::Io(err)
    }
}

impl From<&str> for PulsoError {
    fn from(msg: &str) -> Self {
        PulsoError::Other(msg.to_string())
    }
}

impl From<String> for PulsoError {
    fn from(msg: String) -> Self {
        PulsoError::Other(msg)
    }
}

impl PulsoError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create a registry layout mismatch error
    #[must_use]
    pub fn registry_mismatch(message: impl Into<String>) -> Self {
        Self::RegistryMismatch {
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, PulsoError>;
