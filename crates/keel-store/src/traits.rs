use keel_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Object, StoredObject};

/// Content-addressed object store.
///
/// Keel treats the object store as an external collaborator: reference
/// handling only ever looks objects up, to check that they exist and to peel
/// tags. Implementations must satisfy:
/// - Objects are immutable once written.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// Writing an object that already exists is a no-op.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.read(id)?.is_some())
    }

    /// Delete an object by ID. Returns `true` if the object existed.
    fn delete(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read and decode an object, failing `NotFound` when it is absent.
    fn lookup(&self, id: &ObjectId) -> StoreResult<Object> {
        let stored = self.read(id)?.ok_or(StoreError::NotFound(*id))?;
        Object::decode(&stored)
    }
}
