//! Protocol error types

use thiserror::Error;

/// Protocol-specific errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Frame too large: {size} > {max}")]
    FrameTooLarge { size: usize, max: usize },
}

impl ProtocolError {
    /// Stable machine-readable code, surfaced in error replies
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::InvalidJson(_) => "INVALID_JSON",
            ProtocolError::UnknownEvent(_) => "UNKNOWN_EVENT",
            ProtocolError::MissingField(_) | ProtocolError::InvalidField { .. } => {
                "MALFORMED_INPUT"
            }
            ProtocolError::FrameTooLarge { .. } => "FRAME_TOO_LARGE",
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
