//! Peeling: following annotated tags down to the commit they name.
//!
//! Peeling is an explicit loop with a hop counter. Content addressing makes a
//! genuine tag cycle impossible, but a damaged or hand-edited store can still
//! present one, and the walk must terminate either way.

use keel_types::ObjectId;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::object::{ObjectKind, Tag};
use crate::traits::ObjectStore;

/// Tags followed before a chain is declared malformed.
pub const DEFAULT_MAX_PEEL_DEPTH: usize = 16;

/// Why an object could not be peeled to a commit.
#[derive(Debug, thiserror::Error)]
pub enum PeelError {
    /// The starting object does not exist.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Peeling ended on an object that is not a commit.
    #[error("object {id} is a {kind}, not a commit")]
    InvalidTarget { id: ObjectId, kind: ObjectKind },

    /// A tag in the chain names an object the store does not have.
    #[error("tag {tag} points at missing object {target}")]
    DanglingTag { tag: ObjectId, target: ObjectId },

    /// More than `max` tags were followed.
    #[error("tag chain starting at {start} exceeds {max} hops")]
    TooDeep { start: ObjectId, max: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Peel `id` to a commit with the default hop limit.
pub fn peel_to_commit<S>(store: &S, id: &ObjectId) -> Result<ObjectId, PeelError>
where
    S: ObjectStore + ?Sized,
{
    peel_to_commit_with_depth(store, id, DEFAULT_MAX_PEEL_DEPTH)
}

/// Peel `id` to a commit, following at most `max_hops` tags.
pub fn peel_to_commit_with_depth<S>(
    store: &S,
    id: &ObjectId,
    max_hops: usize,
) -> Result<ObjectId, PeelError>
where
    S: ObjectStore + ?Sized,
{
    let mut current = *id;
    let mut via_tag: Option<ObjectId> = None;

    for _ in 0..=max_hops {
        let Some(stored) = store.read(&current)? else {
            return Err(match via_tag {
                None => PeelError::NotFound(current),
                Some(tag) => {
                    warn!(tag = %tag, target = %current, "dangling tag while peeling");
                    PeelError::DanglingTag {
                        tag,
                        target: current,
                    }
                }
            });
        };

        match stored.kind {
            ObjectKind::Commit => {
                debug!(start = %id.short_hex(), commit = %current.short_hex(), "peeled to commit");
                return Ok(current);
            }
            ObjectKind::Tag => {
                let tag = Tag::from_stored_object(&stored)?;
                via_tag = Some(current);
                current = tag.target;
            }
            kind => return Err(PeelError::InvalidTarget { id: current, kind }),
        }
    }

    warn!(start = %id, max = max_hops, "tag chain too deep");
    Err(PeelError::TooDeep {
        start: *id,
        max: max_hops,
    })
}
