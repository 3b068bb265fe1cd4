//! Foundation types for Keel.
//!
//! This crate provides the identifier and identity types shared by the object
//! store, the reference store and the repository layer. Every other Keel
//! crate depends on `keel-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`Signature`] -- Who moved a reference, and when
//! - [`Timestamp`] -- Seconds since the epoch plus the author's UTC offset

pub mod error;
pub mod object;
pub mod signature;

pub use error::TypeError;
pub use object::ObjectId;
pub use signature::{Signature, Timestamp};
