use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid signature {field}: {reason}")]
    InvalidSignature { field: &'static str, reason: String },

    #[error("invalid utc offset: {0} minutes")]
    InvalidOffset(i32),
}
