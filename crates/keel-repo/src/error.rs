use keel_refs::RefError;
use keel_store::{PeelError, StoreError};
use thiserror::Error;

/// Errors returned by [`Repository`](crate::Repository) operations.
///
/// `NotFound`, `UnbornBranch`, `InvalidTarget`, `Conflict`, `Corrupt` and
/// `InvalidName` are ordinary outcomes of the HEAD state machine. The rest
/// report a failure of the configuration or of a backing store.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("branch {0} has no commits yet")]
    UnbornBranch(String),

    #[error("invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("concurrent update: {0}")]
    Conflict(String),

    #[error("corrupt reference: {0}")]
    Corrupt(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref store error: {0}")]
    Backend(RefError),
}

impl RepoError {
    /// `true` when a backing store or the configuration failed, as opposed
    /// to the repository being in a state that refuses the operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Store(_) | Self::Backend(_))
    }
}

impl From<RefError> for RepoError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::NotFound { name } => Self::NotFound(name),
            RefError::Conflict { .. } => Self::Conflict(err.to_string()),
            RefError::Corrupt { .. } => Self::Corrupt(err.to_string()),
            RefError::InvalidName { .. } => Self::InvalidName(err.to_string()),
            other => Self::Backend(other),
        }
    }
}

impl From<PeelError> for RepoError {
    fn from(err: PeelError) -> Self {
        match err {
            PeelError::NotFound(id) => Self::NotFound(id.to_string()),
            PeelError::InvalidTarget { id, kind } => Self::InvalidTarget {
                target: id.to_string(),
                reason: format!("{kind} is not commit-ish"),
            },
            PeelError::DanglingTag { tag, target } => Self::InvalidTarget {
                target: tag.to_string(),
                reason: format!("tag points at missing object {target}"),
            },
            PeelError::TooDeep { start, max } => Self::InvalidTarget {
                target: start.to_string(),
                reason: format!("more than {max} nested tags"),
            },
            PeelError::Store(e) => Self::Store(e),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
