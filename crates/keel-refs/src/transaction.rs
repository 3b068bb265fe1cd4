//! Atomic ref updates.
//!
//! A [`RefTransaction`] bundles one or more ref changes with the reflog
//! entries that describe them. A store applies a transaction completely or
//! not at all, so a reader never sees a ref moved without its log entry or a
//! log entry without its move.

use keel_types::ObjectId;

use crate::reflog::ReflogEntry;
use crate::types::RefValue;

/// What a ref must hold for an update to proceed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    /// Overwrite unconditionally.
    Any,
    /// The ref must not exist yet.
    Absent,
    /// The ref must still hold exactly this value.
    Value(RefValue),
}

impl Expected {
    /// Map the `force` / last-observed-value pair used by the ref store API.
    ///
    /// With `force` the write is unconditional; otherwise the stored value
    /// must equal `current`, where `None` means the ref must not exist.
    pub fn from_force(force: bool, current: Option<&RefValue>) -> Self {
        match (force, current) {
            (true, _) => Self::Any,
            (false, None) => Self::Absent,
            (false, Some(value)) => Self::Value(value.clone()),
        }
    }

    pub fn matches(&self, actual: Option<&RefValue>) -> bool {
        match self {
            Self::Any => true,
            Self::Absent => actual.is_none(),
            Self::Value(expected) => actual == Some(expected),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Any => "anything".into(),
            Self::Absent => "no ref".into(),
            Self::Value(value) => value.to_string(),
        }
    }
}

/// The change an update makes to its ref.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefChange {
    /// Create or overwrite the ref.
    Set(RefValue),
    /// Remove the ref. Its reflog is left alone.
    Delete,
    /// Leave the ref as it is; only the reflog entry is written.
    Keep,
}

/// A single ref change inside a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefUpdate {
    pub name: String,
    pub change: RefChange,
    pub expected: Expected,
    pub log: Option<ReflogEntry>,
}

impl RefUpdate {
    fn new(name: impl Into<String>, change: RefChange) -> Self {
        Self {
            name: name.into(),
            change,
            expected: Expected::Any,
            log: None,
        }
    }

    pub fn set(name: impl Into<String>, value: RefValue) -> Self {
        Self::new(name, RefChange::Set(value))
    }

    pub fn set_direct(name: impl Into<String>, id: ObjectId) -> Self {
        Self::set(name, RefValue::Direct(id))
    }

    pub fn set_symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::set(name, RefValue::Symbolic(target.into()))
    }

    pub fn delete(name: impl Into<String>) -> Self {
        Self::new(name, RefChange::Delete)
    }

    /// An update that only appends to `name`'s reflog.
    pub fn log_only(name: impl Into<String>, entry: ReflogEntry) -> Self {
        Self::new(name, RefChange::Keep).with_log(entry)
    }

    pub fn expecting(mut self, expected: Expected) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_log(mut self, entry: ReflogEntry) -> Self {
        self.log = Some(entry);
        self
    }
}

/// An all-or-nothing batch of ref updates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefTransaction {
    updates: Vec<RefUpdate>,
}

impl RefTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(update: RefUpdate) -> Self {
        Self {
            updates: vec![update],
        }
    }

    pub fn push(&mut self, update: RefUpdate) -> &mut Self {
        self.updates.push(update);
        self
    }

    pub fn updates(&self) -> &[RefUpdate] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(byte: u8) -> RefValue {
        RefValue::Direct(ObjectId::from_hash([byte; 32]))
    }

    #[test]
    fn force_ignores_current() {
        assert_eq!(Expected::from_force(true, Some(&direct(1))), Expected::Any);
        assert_eq!(Expected::from_force(true, None), Expected::Any);
    }

    #[test]
    fn non_force_without_current_requires_absence() {
        let expected = Expected::from_force(false, None);
        assert!(expected.matches(None));
        assert!(!expected.matches(Some(&direct(1))));
    }

    #[test]
    fn non_force_with_current_requires_equality() {
        let expected = Expected::from_force(false, Some(&direct(1)));
        assert!(expected.matches(Some(&direct(1))));
        assert!(!expected.matches(Some(&direct(2))));
        assert!(!expected.matches(None));
    }

    #[test]
    fn builder_sets_fields() {
        let update = RefUpdate::set_symbolic("HEAD", "refs/heads/main")
            .expecting(Expected::Absent);
        assert_eq!(update.name, "HEAD");
        assert_eq!(
            update.change,
            RefChange::Set(RefValue::Symbolic("refs/heads/main".into()))
        );
        assert_eq!(update.expected, Expected::Absent);
        assert!(update.log.is_none());

        let mut tx = RefTransaction::new();
        assert!(tx.is_empty());
        tx.push(update).push(RefUpdate::delete("refs/heads/old"));
        assert_eq!(tx.updates().len(), 2);
    }
}
