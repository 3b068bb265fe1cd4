//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference (or reflog) was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// A compare-and-swap precondition failed: the stored value is not the
    /// one the caller last observed.
    #[error("ref {name} changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        name: String,
        expected: String,
        actual: String,
    },

    /// A symbolic chain loops or nests deeper than allowed.
    #[error("corrupt ref chain at {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// The reference name is not well formed.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The same name appears twice in one transaction.
    #[error("ref {name} updated more than once in a transaction")]
    DuplicateUpdate { name: String },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("ref store lock poisoned: {0}")]
    LockPoisoned(String),

    /// Serialization or deserialization failure of persisted state.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RefError {
    /// `true` for failures of the backing medium rather than expected
    /// outcomes of the ref state machine.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LockPoisoned(_) | Self::Serialization(_) | Self::Io(_)
        )
    }

    pub(crate) fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
