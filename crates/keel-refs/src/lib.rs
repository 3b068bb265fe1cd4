//! Reference management for Keel.
//!
//! A reference is a name that points either directly at an object id or, as
//! a symbolic ref, at another reference. `HEAD` is the usual symbolic ref: it
//! names the checked-out branch, or holds an id directly when detached.
//!
//! # Architecture
//!
//! - **Backends** implement four primitives of the [`RefStore`] trait. Lookup,
//!   chain resolution and the create/update/delete helpers are provided
//!   methods, so all backends behave the same.
//! - **Transactions** ([`RefTransaction`]) move one or more refs and append
//!   their reflog entries atomically, each update guarded by an
//!   [`Expected`] precondition.
//! - **Reflogs** ([`Reflog`]) record every logged transition of a ref and
//!   are served most-recent-first.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`RefValue`], [`Reference`], [`Resolved`]
//! - [`names`] -- Ref name validation and namespace helpers
//! - [`traits`] -- The [`RefStore`] trait
//! - [`transaction`] -- Atomic, compare-and-swap ref updates
//! - [`reflog`] -- Reflog entries and snapshots
//! - [`memory`] -- In-memory [`InMemoryRefStore`]
//! - [`file`] -- JSON-file-backed [`FileRefStore`]

mod db;
pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod reflog;
pub mod traits;
pub mod transaction;
pub mod types;

pub use error::{RefError, Result};
pub use file::FileRefStore;
pub use memory::InMemoryRefStore;
pub use names::{
    is_branch_ref, is_pseudo_ref, is_tag_ref, shorten, validate_branch_name, validate_ref_name,
    BRANCH_PREFIX, HEAD, TAG_PREFIX,
};
pub use reflog::{normalize_message, Reflog, ReflogEntry};
pub use traits::{RefStore, MAX_SYMBOLIC_DEPTH};
pub use transaction::{Expected, RefChange, RefTransaction, RefUpdate};
pub use types::{RefValue, Reference, Resolved};
