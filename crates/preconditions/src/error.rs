//! Error types for the preconditions crate.

use thiserror::Error;

/// Result type alias for precondition operations.
pub type Result<T> = std::result::Result<T, PreconditionError>;

/// Errors that can occur while deriving tags or evaluating preconditions.
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// A required input was null or blank
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `*` was supplied where only concrete entity tags are supported
    #[error("Wildcard entity tag in {header} is not supported for mutating requests")]
    UnsupportedWildcard {
        /// Header that carried the wildcard
        header: &'static str,
    },

    /// The source carried no version information
    #[error("No version information to derive an entity tag from")]
    EmptySource,

    /// A member of a row version collection had no version bytes
    #[error("Row version missing for member {index}")]
    MissingRowVersion {
        /// Position of the offending member
        index: usize,
    },

    /// Row versions of different lengths cannot be combined
    #[error("Row version {index} is {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Position of the offending member
        index: usize,
        /// Length of the first member
        expected: usize,
        /// Length of the offending member
        actual: usize,
    },

    /// An internal guarantee did not hold
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PreconditionError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error reflects a caller asking for unsupported semantics
    /// rather than a bug or bad input.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedWildcard { .. })
    }
}
