//! Content-addressed object lookup for Keel.
//!
//! Object storage is an external collaborator of the reference subsystem. This
//! crate carries just enough of it to answer the two questions HEAD handling
//! asks: "does this object exist?" and "what commit does it peel to?".
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content
//! - [`Tree`] -- empty placeholder that commits point at
//! - [`Commit`] -- a point in history, the only valid HEAD target
//! - [`Tag`] -- an annotated pointer at another object
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Peeling
//!
//! [`peel_to_commit`] walks a tag chain to the first commit, with a bounded
//! hop count.

pub mod error;
pub mod memory;
pub mod object;
pub mod peel;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, Object, ObjectKind, StoredObject, Tag, Tree};
pub use peel::{peel_to_commit, peel_to_commit_with_depth, PeelError, DEFAULT_MAX_PEEL_DEPTH};
pub use traits::ObjectStore;
