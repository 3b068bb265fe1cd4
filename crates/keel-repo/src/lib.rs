//! Repository handle for Keel.
//!
//! A [`Repository`] ties an object store and a ref store together and runs
//! the HEAD state machine over them: attaching HEAD to branches (born or
//! unborn), detaching it at commits reached by peeling tags, and recording
//! each move in HEAD's reflog in the same atomic step as the move itself.
//!
//! There is no ambient "current repository": every operation goes through an
//! explicit handle.

pub mod config;
pub mod error;
pub mod head;
pub mod repository;

#[cfg(test)]
mod testing;

pub use config::{Identity, RepoConfig};
pub use error::{RepoError, RepoResult};
pub use head::HeadState;
pub use repository::Repository;

// Re-export key types
pub use keel_refs::{RefStore, RefValue, Reference, Reflog, ReflogEntry};
pub use keel_store::{ObjectKind, ObjectStore};
pub use keel_types::{ObjectId, Signature, Timestamp};
