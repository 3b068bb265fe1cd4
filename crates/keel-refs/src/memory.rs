//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] keeps refs and reflogs in one table behind a single
//! `RwLock`. It implements the full [`RefStore`] trait and is suitable for
//! unit tests, embedding, and short-lived processes.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::db::RefDb;
use crate::error::{RefError, Result};
use crate::reflog::Reflog;
use crate::traits::RefStore;
use crate::transaction::RefTransaction;
use crate::types::{RefValue, Reference};

/// An in-memory implementation of [`RefStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    db: RwLock<RefDb>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RefDb>> {
        self.db
            .read()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RefDb>> {
        self.db
            .write()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<RefValue>> {
        Ok(self.read()?.get(name).cloned())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<Reference>> {
        Ok(self.read()?.list(prefix))
    }

    fn commit(&self, tx: &RefTransaction) -> Result<()> {
        self.write()?.apply(tx)?;
        debug!(updates = tx.updates().len(), "ref transaction committed");
        Ok(())
    }

    fn read_reflog(&self, name: &str) -> Result<Option<Reflog>> {
        Ok(self.read()?.reflog(name))
    }

    fn delete_reflog(&self, name: &str) -> Result<bool> {
        Ok(self.write()?.delete_reflog(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflog::ReflogEntry;
    use crate::transaction::{Expected, RefUpdate};
    use crate::types::Resolved;
    use keel_types::{ObjectId, Signature, Timestamp};

    fn id(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 32])
    }

    fn sig() -> Signature {
        Signature::new("me", "foo@example.com", Timestamp::new(1_000, 0).unwrap()).unwrap()
    }

    fn log(old: Option<u8>, new: u8, message: &str) -> ReflogEntry {
        ReflogEntry::new(old.map(id), id(new), sig(), Some(message))
    }

    /// HEAD -> refs/heads/main -> id(1), plus a tag.
    fn seeded() -> InMemoryRefStore {
        let store = InMemoryRefStore::new();
        store
            .create_or_update_direct("refs/heads/main", id(1), true, None, None)
            .unwrap();
        store
            .create_or_update_direct("refs/tags/v1", id(2), true, None, None)
            .unwrap();
        store
            .create_or_update_symbolic("HEAD", "refs/heads/main", true, None, None)
            .unwrap();
        store
    }

    // ---- lookup ----

    #[test]
    fn lookup_returns_raw_value() {
        let store = seeded();
        let head = store.lookup("HEAD").unwrap();
        assert_eq!(head.value, RefValue::Symbolic("refs/heads/main".into()));
    }

    #[test]
    fn lookup_missing_is_not_found() {
        let store = InMemoryRefStore::new();
        let err = store.lookup("refs/heads/nope").unwrap_err();
        assert!(matches!(err, RefError::NotFound { ref name } if name == "refs/heads/nope"));
    }

    // ---- resolve ----

    #[test]
    fn resolve_follows_symbolic_chain() {
        let store = seeded();
        assert_eq!(
            store.resolve("HEAD").unwrap(),
            Resolved::Direct {
                name: "refs/heads/main".into(),
                id: id(1)
            }
        );
    }

    #[test]
    fn resolve_direct_is_itself() {
        let store = seeded();
        let resolved = store.resolve("refs/tags/v1").unwrap();
        assert_eq!(resolved.name(), "refs/tags/v1");
        assert_eq!(resolved.id(), Some(id(2)));
    }

    #[test]
    fn resolve_to_missing_target_is_unborn() {
        let store = InMemoryRefStore::new();
        store
            .create_or_update_symbolic("HEAD", "refs/heads/orphan", true, None, None)
            .unwrap();
        assert_eq!(
            store.resolve("HEAD").unwrap(),
            Resolved::Unborn {
                target: "refs/heads/orphan".into()
            }
        );
    }

    #[test]
    fn resolve_missing_start_is_not_found() {
        let store = InMemoryRefStore::new();
        assert!(matches!(
            store.resolve("HEAD"),
            Err(RefError::NotFound { .. })
        ));
    }

    #[test]
    fn resolve_cycle_is_corrupt() {
        let store = InMemoryRefStore::new();
        store
            .create_or_update_symbolic("refs/heads/a", "refs/heads/b", true, None, None)
            .unwrap();
        store
            .create_or_update_symbolic("refs/heads/b", "refs/heads/a", true, None, None)
            .unwrap();
        store
            .create_or_update_symbolic("HEAD", "refs/heads/a", true, None, None)
            .unwrap();
        assert!(matches!(
            store.resolve("HEAD"),
            Err(RefError::Corrupt { .. })
        ));
    }

    #[test]
    fn resolve_self_loop_is_corrupt() {
        let store = InMemoryRefStore::new();
        store
            .create_or_update_symbolic("refs/heads/me", "refs/heads/me", true, None, None)
            .unwrap();
        assert!(matches!(
            store.resolve("refs/heads/me"),
            Err(RefError::Corrupt { .. })
        ));
    }

    #[test]
    fn resolve_depth_bound() {
        let store = InMemoryRefStore::new();
        store
            .create_or_update_direct("refs/heads/l0", id(7), true, None, None)
            .unwrap();
        for i in 1..=3 {
            store
                .create_or_update_symbolic(
                    &format!("refs/heads/l{i}"),
                    &format!("refs/heads/l{}", i - 1),
                    true,
                    None,
                    None,
                )
                .unwrap();
        }
        assert_eq!(
            store.resolve_with_depth("refs/heads/l3", 3).unwrap().id(),
            Some(id(7))
        );
        assert!(matches!(
            store.resolve_with_depth("refs/heads/l3", 2),
            Err(RefError::Corrupt { .. })
        ));
    }

    // ---- compare-and-swap ----

    #[test]
    fn non_force_create_fails_if_exists() {
        let store = seeded();
        let err = store
            .create_or_update_direct("refs/heads/main", id(9), false, None, None)
            .unwrap_err();
        assert!(matches!(err, RefError::Conflict { .. }));
        assert_eq!(store.read_ref("refs/heads/main").unwrap(), Some(RefValue::Direct(id(1))));
    }

    #[test]
    fn non_force_update_with_matching_current() {
        let store = seeded();
        let current = RefValue::Direct(id(1));
        store
            .create_or_update_direct("refs/heads/main", id(3), false, Some(&current), None)
            .unwrap();
        assert_eq!(store.resolve("HEAD").unwrap().id(), Some(id(3)));
    }

    #[test]
    fn stale_current_conflicts_without_logging() {
        let store = seeded();
        let stale = RefValue::Direct(id(8));
        let err = store
            .create_or_update_direct(
                "refs/heads/main",
                id(3),
                false,
                Some(&stale),
                Some(log(Some(8), 3, "lost race")),
            )
            .unwrap_err();
        assert!(matches!(err, RefError::Conflict { .. }));
        assert!(store.read_reflog("refs/heads/main").unwrap().is_none());
    }

    #[test]
    fn force_overwrites_kind() {
        let store = seeded();
        store
            .create_or_update_direct("HEAD", id(2), true, None, None)
            .unwrap();
        assert_eq!(store.read_ref("HEAD").unwrap(), Some(RefValue::Direct(id(2))));
    }

    #[test]
    fn invalid_name_rejected_on_write() {
        let store = InMemoryRefStore::new();
        let err = store
            .create_or_update_direct("refs/heads/bad..name", id(1), true, None, None)
            .unwrap_err();
        assert!(matches!(err, RefError::InvalidName { .. }));
    }

    // ---- delete ----

    #[test]
    fn delete_keeps_reflog() {
        let store = seeded();
        store
            .create_or_update_direct(
                "refs/heads/main",
                id(4),
                true,
                None,
                Some(log(Some(1), 4, "advance")),
            )
            .unwrap();
        store.delete("refs/heads/main", None).unwrap();
        assert!(store.read_ref("refs/heads/main").unwrap().is_none());
        assert_eq!(store.read_reflog("refs/heads/main").unwrap().unwrap().len(), 1);
    }

    #[test]
    fn delete_with_stale_value_conflicts() {
        let store = seeded();
        let err = store
            .delete("refs/heads/main", Some(&RefValue::Direct(id(9))))
            .unwrap_err();
        assert!(matches!(err, RefError::Conflict { .. }));
        assert!(store.read_ref("refs/heads/main").unwrap().is_some());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let store = InMemoryRefStore::new();
        assert!(matches!(
            store.delete("refs/heads/ghost", None),
            Err(RefError::NotFound { .. })
        ));
    }

    // ---- reflog ----

    #[test]
    fn reflog_appends_are_most_recent_first() {
        let store = seeded();
        store
            .create_or_update_direct("refs/heads/main", id(2), true, None, Some(log(Some(1), 2, "one")))
            .unwrap();
        store
            .create_or_update_direct("refs/heads/main", id(3), true, None, Some(log(Some(2), 3, "two")))
            .unwrap();
        let reflog = store.read_reflog("refs/heads/main").unwrap().unwrap();
        assert_eq!(reflog.name(), "refs/heads/main");
        let messages: Vec<_> = reflog.iter().filter_map(|e| e.message()).collect();
        assert_eq!(messages, vec!["two", "one"]);
        assert_eq!(reflog.entry(0).unwrap().old, Some(id(2)));
    }

    #[test]
    fn reading_missing_reflog_does_not_create_it() {
        let store = seeded();
        assert!(store.read_reflog("HEAD").unwrap().is_none());
        assert!(store.read_reflog("HEAD").unwrap().is_none());
        assert!(!store.delete_reflog("HEAD").unwrap());
    }

    #[test]
    fn append_then_delete_reflog() {
        let store = seeded();
        store.append_reflog("HEAD", log(None, 1, "init")).unwrap();
        assert_eq!(store.read_reflog("HEAD").unwrap().unwrap().len(), 1);
        assert!(store.delete_reflog("HEAD").unwrap());
        assert!(store.read_reflog("HEAD").unwrap().is_none());
    }

    // ---- transactions ----

    #[test]
    fn multi_ref_transaction_is_all_or_nothing() {
        let store = seeded();
        let mut tx = RefTransaction::new();
        tx.push(
            RefUpdate::set_direct("refs/heads/main", id(5))
                .expecting(Expected::Value(RefValue::Direct(id(1))))
                .with_log(log(Some(1), 5, "commit")),
        )
        .push(RefUpdate::log_only("HEAD", log(Some(1), 5, "commit")))
        .push(RefUpdate::set_direct("refs/tags/v1", id(6)).expecting(Expected::Absent));

        assert!(matches!(store.commit(&tx), Err(RefError::Conflict { .. })));
        assert_eq!(store.resolve("HEAD").unwrap().id(), Some(id(1)));
        assert!(store.read_reflog("HEAD").unwrap().is_none());
        assert!(store.read_reflog("refs/heads/main").unwrap().is_none());
    }

    #[test]
    fn listing_by_namespace() {
        let store = seeded();
        store
            .create_or_update_direct("refs/heads/develop", id(3), true, None, None)
            .unwrap();
        let branches: Vec<_> = store.branches().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(branches, vec!["refs/heads/develop", "refs/heads/main"]);
        let tags = store.tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].short_name(), "v1");
    }

    // ---- concurrency ----

    #[test]
    fn racing_writers_one_wins() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(seeded());
        let observed = store.read_ref("refs/heads/main").unwrap();

        let handles: Vec<_> = (10..18u8)
            .map(|n| {
                let store = Arc::clone(&store);
                let observed = observed.clone();
                thread::spawn(move || {
                    store
                        .create_or_update_direct(
                            "refs/heads/main",
                            id(n),
                            false,
                            observed.as_ref(),
                            Some(log(Some(1), n, "race")),
                        )
                        .is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(store.read_reflog("refs/heads/main").unwrap().unwrap().len(), 1);
    }
}
