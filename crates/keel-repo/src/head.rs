//! The HEAD state machine.
//!
//! HEAD is in one of three states, derived by resolving it:
//! - **Attached**: symbolic, and the chain ends at a ref holding an id.
//! - **Detached**: HEAD itself holds an id.
//! - **Unborn**: symbolic, and the chain ends at a name with no entry.
//!
//! Every write re-checks the HEAD value read at the start of the operation
//! and commits the new value together with its reflog entry, so a racing
//! writer surfaces as `Conflict` and a failed write leaves no trace.

use keel_refs::{
    is_branch_ref, shorten, validate_ref_name, Expected, RefStore, RefTransaction, RefUpdate,
    RefValue, Reference, ReflogEntry, Resolved, BRANCH_PREFIX, HEAD,
};
use keel_types::{ObjectId, Signature};
use tracing::{debug, info, warn};

use crate::error::{RepoError, RepoResult};
use crate::repository::Repository;

/// Where HEAD currently points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD names `name`, which holds `id`.
    Attached { name: String, id: ObjectId },
    Detached(ObjectId),
    /// HEAD names a branch that has no commits yet.
    Unborn(String),
}

impl HeadState {
    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached(_))
    }

    pub fn is_unborn(&self) -> bool {
        matches!(self, Self::Unborn(_))
    }

    /// The id HEAD resolves to, if any.
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Self::Attached { id, .. } | Self::Detached(id) => Some(*id),
            Self::Unborn(_) => None,
        }
    }
}

/// HEAD as read before a write: the raw value the write is conditioned on,
/// and the id it resolved to for the reflog.
struct Observed {
    value: Option<RefValue>,
    id: Option<ObjectId>,
}

impl Observed {
    fn describe(&self) -> Option<String> {
        self.value.as_ref().map(|value| match value {
            RefValue::Symbolic(name) => shorten(name).to_string(),
            RefValue::Direct(id) => id.to_hex(),
        })
    }
}

fn checkout_message(from: Option<&str>, to: &str) -> String {
    match from {
        Some(from) => format!("checkout: moving from {from} to {to}"),
        None => format!("checkout: moving to {to}"),
    }
}

impl Repository {
    /// Resolve HEAD into its logical state.
    ///
    /// Fails `NotFound` if there is no HEAD and `Corrupt` if its chain loops
    /// or is too long.
    pub fn head_state(&self) -> RepoResult<HeadState> {
        let resolved = self
            .refs()
            .resolve_with_depth(HEAD, self.config().max_symbolic_depth)?;
        Ok(match resolved {
            Resolved::Direct { name, id } if name == HEAD => HeadState::Detached(id),
            Resolved::Direct { name, id } => HeadState::Attached { name, id },
            Resolved::Unborn { target } => HeadState::Unborn(target),
        })
    }

    pub fn head_detached(&self) -> RepoResult<bool> {
        Ok(self.head_state()?.is_detached())
    }

    pub fn head_unborn(&self) -> RepoResult<bool> {
        Ok(self.head_state()?.is_unborn())
    }

    /// The reference HEAD resolves to.
    ///
    /// When attached this is the branch with its id; when detached it is
    /// HEAD itself. An unborn HEAD fails `UnbornBranch`.
    pub fn head(&self) -> RepoResult<Reference> {
        match self.head_state()? {
            HeadState::Attached { name, id } => Ok(Reference::new(name, RefValue::Direct(id))),
            HeadState::Detached(id) => Ok(Reference::new(HEAD, RefValue::Direct(id))),
            HeadState::Unborn(branch) => Err(RepoError::UnbornBranch(branch)),
        }
    }

    /// Point HEAD at the reference `target`.
    ///
    /// - A branch holding a commit: HEAD is attached to it and the move is
    ///   logged.
    /// - A branch that does not exist yet (or whose chain ends unborn): HEAD
    ///   is attached without a reflog entry, since no id moved.
    /// - Any other existing ref: its target is peeled to a commit and HEAD is
    ///   detached there, as with [`Repository::set_head_detached`].
    ///
    /// Anything else fails `NotFound`; a target that is not commit-ish fails
    /// `InvalidTarget`. HEAD is unchanged on failure.
    pub fn set_head(
        &self,
        target: &str,
        signature: Option<&Signature>,
        message: Option<&str>,
    ) -> RepoResult<()> {
        if let Err(e) = validate_ref_name(target) {
            debug!(target, error = %e, "set_head target is not a ref name");
            return Err(RepoError::NotFound(target.to_string()));
        }
        let observed = self.observe_head()?;
        let depth = self.config().max_symbolic_depth;

        if self.refs().read_ref(target)?.is_none() {
            if !is_branch_ref(target) {
                return Err(RepoError::NotFound(target.to_string()));
            }
            self.write_head(&observed, RefValue::Symbolic(target.to_string()), None)?;
            info!(branch = target, "HEAD attached to unborn branch");
            return Ok(());
        }

        let resolved = self.refs().resolve_with_depth(target, depth)?;
        if !target.starts_with(BRANCH_PREFIX) {
            return match resolved {
                Resolved::Direct { id, .. } => self.detach_to(&observed, &id, signature, message),
                Resolved::Unborn { target } => Err(RepoError::UnbornBranch(target)),
            };
        }

        let log = match resolved {
            Resolved::Unborn { .. } => None,
            Resolved::Direct { id, .. } => {
                self.require_commit(target, &id)?;
                self.head_log(&observed, id, signature, message, shorten(target))?
            }
        };
        self.write_head(&observed, RefValue::Symbolic(target.to_string()), log)?;
        info!(branch = target, "HEAD attached");
        Ok(())
    }

    /// Detach HEAD at `id`, peeled through any tags to a commit.
    ///
    /// Fails `NotFound` if `id` is not in the object store and
    /// `InvalidTarget` if it does not peel to a commit.
    pub fn set_head_detached(
        &self,
        id: &ObjectId,
        signature: Option<&Signature>,
        message: Option<&str>,
    ) -> RepoResult<()> {
        let observed = self.observe_head()?;
        self.detach_to(&observed, id, signature, message)
    }

    /// Detach HEAD at the commit it currently resolves to.
    ///
    /// Always logs one entry, even when HEAD was already detached there.
    pub fn detach_head(&self) -> RepoResult<()> {
        let value = self
            .refs()
            .read_ref(HEAD)?
            .ok_or_else(|| RepoError::NotFound(HEAD.to_string()))?;
        let id = match self.head_state()? {
            HeadState::Unborn(branch) => return Err(RepoError::UnbornBranch(branch)),
            HeadState::Attached { id, .. } | HeadState::Detached(id) => id,
        };
        let observed = Observed {
            value: Some(value),
            id: Some(id),
        };
        self.detach_to(&observed, &id, None, None)
    }

    fn observe_head(&self) -> RepoResult<Observed> {
        let value = self.refs().read_ref(HEAD)?;
        let id = match &value {
            None => None,
            Some(RefValue::Direct(id)) => Some(*id),
            Some(RefValue::Symbolic(_)) => {
                match self
                    .refs()
                    .resolve_with_depth(HEAD, self.config().max_symbolic_depth)
                {
                    Ok(resolved) => resolved.id(),
                    Err(e) if !e.is_fatal() => {
                        warn!(error = %e, "HEAD does not resolve, logging without old id");
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };
        Ok(Observed { value, id })
    }

    fn detach_to(
        &self,
        observed: &Observed,
        id: &ObjectId,
        signature: Option<&Signature>,
        message: Option<&str>,
    ) -> RepoResult<()> {
        let commit = self.peel_to_commit(id)?;
        let log = self.head_log(observed, commit, signature, message, &commit.to_hex())?;
        self.write_head(observed, RefValue::Direct(commit), log)?;
        info!(commit = %commit.short_hex(), "HEAD detached");
        Ok(())
    }

    /// A branch must name something that peels to a commit.
    fn require_commit(&self, branch: &str, id: &ObjectId) -> RepoResult<()> {
        match self.peel_to_commit(id) {
            Ok(_) => Ok(()),
            Err(RepoError::NotFound(missing)) => Err(RepoError::InvalidTarget {
                target: branch.to_string(),
                reason: format!("points at missing object {missing}"),
            }),
            Err(e) => Err(e),
        }
    }

    fn head_log(
        &self,
        observed: &Observed,
        new: ObjectId,
        signature: Option<&Signature>,
        message: Option<&str>,
        to: &str,
    ) -> RepoResult<Option<ReflogEntry>> {
        if !self.config().log_ref_updates {
            return Ok(None);
        }
        let committer = self.committer(signature)?;
        let message = message.map_or_else(
            || checkout_message(observed.describe().as_deref(), to),
            str::to_string,
        );
        Ok(Some(ReflogEntry::new(
            observed.id,
            new,
            committer,
            Some(&message),
        )))
    }

    fn write_head(
        &self,
        observed: &Observed,
        value: RefValue,
        log: Option<ReflogEntry>,
    ) -> RepoResult<()> {
        let mut update =
            RefUpdate::set(HEAD, value).expecting(Expected::from_force(false, observed.value.as_ref()));
        if let Some(entry) = log {
            update = update.with_log(entry);
        }
        self.refs().commit(&RefTransaction::single(update))?;
        Ok(())
    }
}
