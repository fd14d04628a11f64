//! In-memory key-value store for testing.

use crate::error::{StorageError, StorageResult};
use crate::store::KvStore;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// An in-memory key-value store.
///
/// This store keeps all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral services that re-sync on startup
///
/// It also supports fault injection, so tests can exercise the degraded
/// paths of the resolver and the sync engine.
///
/// # Example
///
/// ```rust
/// use hscode_storage::{KvStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.put("a", b"1").unwrap();
/// store.fail_writes_to("a");
/// assert!(store.put("a", b"2").is_err());
/// assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    failing_writes: RwLock<BTreeSet<String>>,
    fail_reads: AtomicBool,
    write_log: RwLock<Vec<String>>,
    reads: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given entries.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Makes every subsequent `get` and `list` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `put` to `key` fail.
    pub fn fail_writes_to(&self, key: impl Into<String>) {
        self.failing_writes.write().insert(key.into());
    }

    /// Clears all injected write failures.
    pub fn clear_write_failures(&self) {
        self.failing_writes.write().clear();
    }

    /// Returns the keys of successful `put` calls, in call order.
    #[must_use]
    pub fn write_log(&self) -> Vec<String> {
        self.write_log.read().clone()
    }

    /// Returns how many `get` calls reached this store.
    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn check_reads(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }
}

impl KvStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        if self.failing_writes.read().contains(key) {
            return Err(StorageError::Unavailable(format!(
                "injected write failure for {key}"
            )));
        }
        self.data.write().insert(key.to_string(), value.to_vec());
        self.write_log.write().push(key.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.check_reads()?;
        Ok(self
            .data
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
