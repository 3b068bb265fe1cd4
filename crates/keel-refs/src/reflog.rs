//! Reflog: the per-reference audit log of value transitions.
//!
//! Entries are stored in append order and served most-recent-first, so index
//! 0 is always the latest entry. A log comes into existence with its first
//! entry and disappears only through an explicit delete.

use std::fmt;

use keel_types::{ObjectId, Signature};
use serde::{Deserialize, Serialize};

/// One recorded transition of a reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflogEntry {
    /// Resolved id before the move, `None` if there was none.
    pub old: Option<ObjectId>,
    /// Resolved id after the move.
    pub new: ObjectId,
    pub committer: Signature,
    pub message: Option<String>,
}

impl ReflogEntry {
    /// Build an entry, normalising the message the way git does.
    pub fn new(
        old: Option<ObjectId>,
        new: ObjectId,
        committer: Signature,
        message: Option<&str>,
    ) -> Self {
        Self {
            old,
            new,
            committer,
            message: message.and_then(normalize_message),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for ReflogEntry {
    /// One line of a git reflog file: `<old> <new> <committer>\t<message>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.old.unwrap_or_else(ObjectId::null);
        write!(f, "{old} {} {}", self.new, self.committer)?;
        if let Some(message) = &self.message {
            write!(f, "\t{message}")?;
        }
        Ok(())
    }
}

/// Collapse line breaks to spaces and trim; an empty result means no message.
pub fn normalize_message(message: &str) -> Option<String> {
    let collapsed = message
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// A snapshot of one reference's log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reflog {
    name: String,
    /// Oldest first; readers index from the back.
    entries: Vec<ReflogEntry>,
}

impl Reflog {
    pub(crate) fn new(name: impl Into<String>, entries: Vec<ReflogEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// The reference this log belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by index, where 0 is the most recent.
    pub fn entry(&self, index: usize) -> Option<&ReflogEntry> {
        let last = self.entries.len().checked_sub(1)?;
        self.entries.get(last.checked_sub(index)?)
    }

    /// Entries from most recent to oldest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ReflogEntry> + ExactSizeIterator {
        self.entries.iter().rev()
    }
}
