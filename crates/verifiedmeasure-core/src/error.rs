//! Error types for VerifiedMeasure domain operations.

use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating domain input.
///
/// These never involve I/O; storage and transport failures live in the
/// store crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A required field was missing or blank.
    #[error("{0} required")]
    Required(&'static str),

    /// A numeric amount was not a finite positive number.
    #[error("amount must be positive")]
    InvalidAmount,

    /// An access type other than `download` or `export`.
    #[error("invalid access_type: {0}")]
    InvalidAccessType(String),

    /// A batch of import rows contained no usable row.
    #[error("no valid rows")]
    NoValidRows,

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
