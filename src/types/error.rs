use thiserror::Error;

/// Errors raised by covariance and hedge calculations.
///
/// A result that is merely unreliable (too few samples, weak correlation) is
/// not an error: it is reported through `is_significant == false` on the
/// covariance result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HedgeError {
    /// Fewer observations than the calculation needs.
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Minimum number of observations required.
        required: usize,
        /// Number of observations supplied.
        actual: usize,
    },

    /// The hedge instrument has zero variance, so no hedge ratio exists.
    #[error("Degenerate variance: {0}")]
    DegenerateVariance(String),

    /// A configuration parameter is outside its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Input data is malformed (unsorted, mismatched lengths, duplicates).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A numerical routine could not produce a finite result.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// A result could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result alias used throughout the crate.
pub type HedgeResult<T> = Result<T, HedgeError>;
