//! The [`RefStore`] trait defining the reference storage interface.
//!
//! A backend provides four primitives (read one ref, list refs, commit a
//! transaction, read/delete a reflog). Everything else (lookup, chain
//! resolution, the create/update/delete helpers) is built on top of them
//! here, so every backend resolves and validates the same way.

use std::collections::HashSet;

use keel_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{RefError, Result};
use crate::names::{BRANCH_PREFIX, TAG_PREFIX};
use crate::reflog::{Reflog, ReflogEntry};
use crate::transaction::{Expected, RefTransaction, RefUpdate};
use crate::types::{RefValue, Reference, Resolved};

/// Symbolic hops followed before a chain is declared corrupt.
pub const MAX_SYMBOLIC_DEPTH: usize = 5;

/// Storage backend for named references and their reflogs.
///
/// Implementations must be thread-safe (`Send + Sync`). A reader must always
/// observe a ref either entirely before or entirely after a committed
/// transaction, and [`RefStore::commit`] must apply all of a transaction's
/// updates and reflog appends or none of them.
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/main").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<RefValue>>;

    /// List all refs whose canonical name starts with `prefix`, sorted by
    /// name. Pass `""` to list everything.
    fn list_refs(&self, prefix: &str) -> Result<Vec<Reference>>;

    /// Atomically apply every update in `tx`.
    ///
    /// Fails with `Conflict` if any update's precondition does not hold, in
    /// which case nothing is written.
    fn commit(&self, tx: &RefTransaction) -> Result<()>;

    /// Read the reflog for `name`. Returns `Ok(None)` if no log exists;
    /// reading never creates one.
    fn read_reflog(&self, name: &str) -> Result<Option<Reflog>>;

    /// Remove the reflog for `name`. Returns `Ok(true)` if it existed.
    fn delete_reflog(&self, name: &str) -> Result<bool>;

    /// Read a ref, failing `NotFound` if it does not exist.
    fn lookup(&self, name: &str) -> Result<Reference> {
        self.read_ref(name)?
            .map(|value| Reference::new(name, value))
            .ok_or_else(|| RefError::not_found(name))
    }

    /// Follow `name` through symbolic links with the default depth bound.
    fn resolve(&self, name: &str) -> Result<Resolved> {
        self.resolve_with_depth(name, MAX_SYMBOLIC_DEPTH)
    }

    /// Follow `name` through symbolic links.
    ///
    /// Returns the first direct ref reached, or `Unborn` naming the first
    /// link target that has no entry. Fails `NotFound` if `name` itself is
    /// missing, and `Corrupt` if a name repeats or more than `max_depth`
    /// symbolic hops are needed.
    fn resolve_with_depth(&self, name: &str, max_depth: usize) -> Result<Resolved> {
        let mut value = self
            .read_ref(name)?
            .ok_or_else(|| RefError::not_found(name))?;
        let mut current = name.to_string();
        let mut seen = HashSet::from([current.clone()]);
        let mut hops = 0;

        loop {
            let target = match value {
                RefValue::Direct(id) => {
                    debug!(start = name, end = %current, hops, "resolved ref");
                    return Ok(Resolved::Direct { name: current, id });
                }
                RefValue::Symbolic(target) => target,
            };

            hops += 1;
            if hops > max_depth {
                warn!(start = name, max_depth, "symbolic ref chain too deep");
                return Err(RefError::Corrupt {
                    name: name.to_string(),
                    reason: format!("more than {max_depth} symbolic hops"),
                });
            }
            if !seen.insert(target.clone()) {
                warn!(start = name, repeated = %target, "symbolic ref cycle");
                return Err(RefError::Corrupt {
                    name: name.to_string(),
                    reason: format!("cycle through {target}"),
                });
            }

            match self.read_ref(&target)? {
                Some(next) => {
                    current = target;
                    value = next;
                }
                None => {
                    debug!(start = name, unborn = %target, hops, "resolved to unborn ref");
                    return Ok(Resolved::Unborn { target });
                }
            }
        }
    }

    /// Point `name` at another ref.
    ///
    /// With `force` the write is unconditional. Without it, the stored value
    /// must equal `current` (`None`: the ref must not exist yet), otherwise
    /// the call fails `Conflict`. `log`, if given, is appended to `name`'s
    /// reflog in the same atomic step.
    fn create_or_update_symbolic(
        &self,
        name: &str,
        target: &str,
        force: bool,
        current: Option<&RefValue>,
        log: Option<ReflogEntry>,
    ) -> Result<Reference> {
        let value = RefValue::Symbolic(target.to_string());
        write_value(self, name, value, Expected::from_force(force, current), log)
    }

    /// Point `name` directly at `id`. Preconditions as for
    /// [`RefStore::create_or_update_symbolic`].
    fn create_or_update_direct(
        &self,
        name: &str,
        id: ObjectId,
        force: bool,
        current: Option<&RefValue>,
        log: Option<ReflogEntry>,
    ) -> Result<Reference> {
        let value = RefValue::Direct(id);
        write_value(self, name, value, Expected::from_force(force, current), log)
    }

    /// Delete `name`. With `current` set, the ref must still hold that value.
    ///
    /// The reflog is not touched; use [`RefStore::delete_reflog`] for that.
    fn delete(&self, name: &str, current: Option<&RefValue>) -> Result<()> {
        let expected = current.map_or(Expected::Any, |value| Expected::Value(value.clone()));
        self.commit(&RefTransaction::single(
            RefUpdate::delete(name).expecting(expected),
        ))
    }

    /// Append an entry to `name`'s reflog without moving the ref.
    fn append_reflog(&self, name: &str, entry: ReflogEntry) -> Result<()> {
        self.commit(&RefTransaction::single(RefUpdate::log_only(name, entry)))
    }

    /// List all branch refs.
    fn branches(&self) -> Result<Vec<Reference>> {
        self.list_refs(BRANCH_PREFIX)
    }

    /// List all tag refs.
    fn tags(&self) -> Result<Vec<Reference>> {
        self.list_refs(TAG_PREFIX)
    }
}

fn write_value<S: RefStore + ?Sized>(
    store: &S,
    name: &str,
    value: RefValue,
    expected: Expected,
    log: Option<ReflogEntry>,
) -> Result<Reference> {
    let mut update = RefUpdate::set(name, value.clone()).expecting(expected);
    if let Some(entry) = log {
        update = update.with_log(entry);
    }
    store.commit(&RefTransaction::single(update))?;
    Ok(Reference::new(name, value))
}
