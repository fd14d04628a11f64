//! Key-value store trait definition.

use crate::error::StorageResult;

/// A durable key-value store.
///
/// Stores are **opaque byte stores**. Values are replaced wholesale by
/// `put`; there is no partial update or append.
///
/// # Invariants
///
/// - `get` returns exactly the bytes of the last successful `put` for the key
/// - `get` on a key that was never written returns `Ok(None)`
/// - A failed `put` leaves the previous value readable
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KvStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. A missing key is not
    /// an error.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Lists all keys starting with `prefix`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated.
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list(prefix)
    }
}
