//! File-based key-value store for persistent storage.

use crate::error::{StorageError, StorageResult};
use crate::store::KvStore;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file-based key-value store.
///
/// Each key maps to one file under the root directory. Data survives
/// process restarts.
///
/// # Durability
///
/// `put` writes to a temporary file, calls `File::sync_all()`, then renames
/// it over the target. A crash mid-write leaves the previous value in place.
///
/// # Thread Safety
///
/// Writers are serialized by an internal lock. Readers do not take the lock;
/// the rename makes every read see either the old or the new file.
///
/// # Example
///
/// ```no_run
/// use hscode_storage::{KvStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("hs-data")).unwrap();
/// store.put("HS_METADATA", b"{}").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Keys become file names, so anything that could escape the root or
/// collide with temporary files is rejected.
fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{key}.tmp"));

        let _guard = self.write_lock.lock();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with(prefix) && validate_key(&name).is_ok() {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn file_open_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("store");

        let store = FileStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn file_put_and_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.put("HS_METADATA", b"{\"a\":1}").unwrap();
        assert_eq!(
            store.get("HS_METADATA").unwrap(),
            Some(b"{\"a\":1}".to_vec())
        );
    }

    #[test]
    fn file_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("HS_CURRENT_DATABASE").unwrap(), None);
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();

        {
            let store = FileStore::open(dir.path()).unwrap();
            store.put("key", b"persistent data").unwrap();
        }

        {
            let store = FileStore::open(dir.path()).unwrap();
            assert_eq!(store.get("key").unwrap(), Some(b"persistent data".to_vec()));
        }
    }

    #[test]
    fn file_put_replaces_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.put("key", b"old").unwrap();
        store.put("key", b"new").unwrap();

        assert_eq!(store.get("key").unwrap(), Some(b"new".to_vec()));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn file_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.put("key", b"value").unwrap();
        store.delete("key").unwrap();
        store.delete("key").unwrap();
        assert_eq!(store.get("key").unwrap(), None);
    }

    #[test]
    fn file_list_by_prefix() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.put("HS_METADATA", b"1").unwrap();
        store.put("HS_CURRENT_DATABASE", b"2").unwrap();
        store.put("OTHER", b"3").unwrap();

        assert_eq!(
            store.list("HS_").unwrap(),
            vec!["HS_CURRENT_DATABASE", "HS_METADATA"]
        );
    }

    #[test]
    fn file_rejects_invalid_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        for key in ["", "../escape", "a/b", ".hidden", "space key"] {
            assert!(
                matches!(store.put(key, b"x"), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
            assert!(matches!(store.get(key), Err(StorageError::InvalidKey(_))));
        }
    }

    proptest! {
        #[test]
        fn file_round_trips_any_valid_key(
            key in "[A-Za-z0-9_][A-Za-z0-9_.-]{0,20}",
            value in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let dir = tempdir().unwrap();
            let store = FileStore::open(dir.path()).unwrap();
            store.put(&key, &value).unwrap();
            prop_assert_eq!(store.get(&key).unwrap(), Some(value));
        }
    }
}
