//! Error types for merkle_audit

use thiserror::Error;

/// Result type alias for merkle_audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, proving or restoring a tree
///
/// A digest that is simply absent from a tree is not an error: lookups and
/// proof requests report it as `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// An operation precondition was violated at the data-model level
    #[error("Structural error: {0}")]
    Structural(String),

    /// A parent/child linkage in the node graph does not line up
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// A restored tree does not hash to what was persisted
    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
