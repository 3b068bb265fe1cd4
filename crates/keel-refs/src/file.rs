//! File-backed reference store.
//!
//! The whole ref table (refs and reflogs) lives in one JSON document. Every
//! write builds the next table in memory, writes it to a temporary file in
//! the same directory and renames it over the old one. The in-memory copy is
//! replaced only after the rename succeeds, so a failed write leaves both
//! the file and the store unchanged.
//!
//! Each write re-serializes the entire table, reflogs included, and reflogs
//! are never pruned, so the cost of a write grows with the recorded history.
//! This suits small repositories; a large history wants refs and logs in
//! separate files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::db::RefDb;
use crate::error::{RefError, Result};
use crate::reflog::Reflog;
use crate::traits::RefStore;
use crate::transaction::RefTransaction;
use crate::types::{RefValue, Reference};

/// A [`RefStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileRefStore {
    path: PathBuf,
    db: Mutex<RefDb>,
}

impl FileRefStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// The parent directory is created if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let db = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                warn!(path = %path.display(), error = %e, "unreadable ref file");
                RefError::Serialization(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RefDb::default(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), "opened file ref store");
        Ok(Self {
            path,
            db: Mutex::new(db),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, RefDb>> {
        self.db
            .lock()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    /// Write `next` to disk, then install it as the live table.
    fn persist(&self, current: &mut RefDb, next: RefDb) -> Result<()> {
        let json = serde_json::to_vec_pretty(&next)
            .map_err(|e| RefError::Serialization(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RefError::Io(e.error))?;

        *current = next;
        Ok(())
    }
}

impl RefStore for FileRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<RefValue>> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<Reference>> {
        Ok(self.lock()?.list(prefix))
    }

    fn commit(&self, tx: &RefTransaction) -> Result<()> {
        let mut db = self.lock()?;
        db.check(tx)?;
        let mut next = db.clone();
        next.apply_checked(tx);
        self.persist(&mut db, next)?;
        debug!(
            path = %self.path.display(),
            updates = tx.updates().len(),
            "ref transaction persisted"
        );
        Ok(())
    }

    fn read_reflog(&self, name: &str) -> Result<Option<Reflog>> {
        Ok(self.lock()?.reflog(name))
    }

    fn delete_reflog(&self, name: &str) -> Result<bool> {
        let mut db = self.lock()?;
        let mut next = db.clone();
        if !next.delete_reflog(name) {
            return Ok(false);
        }
        self.persist(&mut db, next)?;
        Ok(true)
    }
}
