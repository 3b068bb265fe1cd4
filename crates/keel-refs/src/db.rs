//! The ref table shared by every backend: refs plus their reflogs.
//!
//! Keeping both maps in one value is what lets a backend commit a ref move
//! and its log entry under a single lock (or a single file rename).

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::reflog::{Reflog, ReflogEntry};
use crate::transaction::{RefChange, RefTransaction};
use crate::types::{RefValue, Reference};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RefDb {
    refs: BTreeMap<String, RefValue>,
    /// Oldest entry first.
    logs: BTreeMap<String, Vec<ReflogEntry>>,
}

impl RefDb {
    pub(crate) fn get(&self, name: &str) -> Option<&RefValue> {
        self.refs.get(name)
    }

    pub(crate) fn list(&self, prefix: &str) -> Vec<Reference> {
        self.refs
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, value)| Reference::new(name.clone(), value.clone()))
            .collect()
    }

    pub(crate) fn reflog(&self, name: &str) -> Option<Reflog> {
        self.logs
            .get(name)
            .map(|entries| Reflog::new(name, entries.clone()))
    }

    pub(crate) fn delete_reflog(&mut self, name: &str) -> bool {
        self.logs.remove(name).is_some()
    }

    /// Validate every update against the current table without touching it.
    pub(crate) fn check(&self, tx: &RefTransaction) -> Result<()> {
        let mut seen = HashSet::new();
        for update in tx.updates() {
            validate_ref_name(&update.name)?;
            if !seen.insert(update.name.as_str()) {
                return Err(RefError::DuplicateUpdate {
                    name: update.name.clone(),
                });
            }
            if let RefChange::Set(RefValue::Symbolic(target)) = &update.change {
                validate_ref_name(target)?;
            }

            let current = self.refs.get(&update.name);
            if !update.expected.matches(current) {
                return Err(RefError::Conflict {
                    name: update.name.clone(),
                    expected: update.expected.describe(),
                    actual: current.map_or_else(|| "no ref".into(), ToString::to_string),
                });
            }
            if update.change == RefChange::Delete && current.is_none() {
                return Err(RefError::not_found(&update.name));
            }
        }
        Ok(())
    }

    /// Apply a transaction that has already passed [`RefDb::check`].
    pub(crate) fn apply_checked(&mut self, tx: &RefTransaction) {
        for update in tx.updates() {
            match &update.change {
                RefChange::Set(value) => {
                    self.refs.insert(update.name.clone(), value.clone());
                }
                RefChange::Delete => {
                    self.refs.remove(&update.name);
                }
                RefChange::Keep => {}
            }
            if let Some(entry) = &update.log {
                self.logs
                    .entry(update.name.clone())
                    .or_default()
                    .push(entry.clone());
            }
        }
    }

    pub(crate) fn apply(&mut self, tx: &RefTransaction) -> Result<()> {
        self.check(tx)?;
        self.apply_checked(tx);
        Ok(())
    }
}
