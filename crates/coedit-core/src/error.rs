//! Error types for Coedit Core

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid document ID: {0}")]
    InvalidDocumentId(String),
}

/// Result type alias for Coedit Core operations
pub type Result<T> = std::result::Result<T, Error>;
