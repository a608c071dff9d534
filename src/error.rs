use thiserror::Error;

/// Engine error enumerator.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A documented precondition was violated by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The product of the domain sizes overflows the addressable range.
    #[error("Table size overflows the addressable range")]
    LengthOverflow,
    /// The tree decomposition exceeds the caller's complexity bound.
    #[error("Tree decomposition complexity {complexity} exceeds maximum {max_complexity}")]
    ExcessiveComplexity {
        /// The complexity of the offending decomposition.
        complexity: f64,
        /// The caller's complexity bound.
        max_complexity: f64,
    },
    /// The requested operation is not available in this configuration.
    #[error("Operation unavailable: {0}")]
    OperationUnavailable(&'static str),
    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
