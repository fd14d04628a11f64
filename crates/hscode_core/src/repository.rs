//! Typed access to the documents kept in the key-value store.
//!
//! Every document is JSON. The table slots hold a flat
//! `{ code: "A → B → C" }` object; metadata and status lists are objects
//! with camelCase fields.

use crate::error::{CoreError, CoreResult};
use crate::metadata::{SyncMetadata, SyncType};
use crate::status::{StatusKind, StatusList};
use crate::table::{ChangeSummary, CodeTable};
use hscode_storage::{
    KvStore, BACKUP_TABLE_KEY, CONTROLLED_LIST_KEY, CURRENT_TABLE_KEY, METADATA_KEY,
    SANCTIONED_LIST_KEY,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

fn read_json<S, T>(store: &S, key: &str) -> CoreResult<Option<T>>
where
    S: KvStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| CoreError::Codec {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

fn write_json<S, T>(store: &S, key: &str, value: &T) -> CoreResult<()>
where
    S: KvStore + ?Sized,
    T: Serialize,
{
    let bytes = serde_json::to_vec(value).map_err(|source| CoreError::Codec {
        key: key.to_string(),
        source,
    })?;
    store.put(key, &bytes)?;
    Ok(())
}

/// Storage key of a status list.
pub fn status_list_key(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Sanctioned => SANCTIONED_LIST_KEY,
        StatusKind::Controlled => CONTROLLED_LIST_KEY,
    }
}

/// Loads the current code table.
pub fn load_table<S: KvStore + ?Sized>(store: &S) -> CoreResult<Option<CodeTable>> {
    read_json(store, CURRENT_TABLE_KEY)
}

/// Overwrites the current code table.
pub fn save_table<S: KvStore + ?Sized>(store: &S, table: &CodeTable) -> CoreResult<()> {
    write_json(store, CURRENT_TABLE_KEY, table)
}

/// Loads the backup of the previous table.
pub fn load_backup<S: KvStore + ?Sized>(store: &S) -> CoreResult<Option<CodeTable>> {
    read_json(store, BACKUP_TABLE_KEY)
}

/// Overwrites the backup slot.
pub fn save_backup<S: KvStore + ?Sized>(store: &S, table: &CodeTable) -> CoreResult<()> {
    write_json(store, BACKUP_TABLE_KEY, table)
}

/// Loads the metadata of the last sync attempt.
pub fn load_metadata<S: KvStore + ?Sized>(store: &S) -> CoreResult<Option<SyncMetadata>> {
    read_json(store, METADATA_KEY)
}

/// Overwrites the sync metadata.
pub fn save_metadata<S: KvStore + ?Sized>(store: &S, metadata: &SyncMetadata) -> CoreResult<()> {
    write_json(store, METADATA_KEY, metadata)
}

/// Loads a status list.
pub fn load_status_list<S: KvStore + ?Sized>(
    store: &S,
    kind: StatusKind,
) -> CoreResult<Option<StatusList>> {
    read_json(store, status_list_key(kind))
}

/// Replaces a status list.
pub fn save_status_list<S: KvStore + ?Sized>(
    store: &S,
    kind: StatusKind,
    list: &StatusList,
) -> CoreResult<()> {
    write_json(store, status_list_key(kind), list)
}

/// Restores the backup table into the current slot.
///
/// The table being replaced is not kept; the backup slot is left as is so
/// a rollback can be repeated. Returns the number of restored codes.
///
/// # Errors
///
/// Returns [`CoreError::NoBackup`] when the backup slot is empty.
pub fn restore_backup<S: KvStore + ?Sized>(
    store: &S,
    version: &str,
    now: OffsetDateTime,
) -> CoreResult<usize> {
    let backup = load_backup(store)?.ok_or(CoreError::NoBackup)?;
    save_table(store, &backup)?;

    let metadata = SyncMetadata::new(
        now,
        backup.len() as u64,
        ChangeSummary::unchanged(backup.len()),
        version,
        SyncType::Rollback,
    );
    save_metadata(store, &metadata)?;

    info!(records = backup.len(), "restored backup table");
    Ok(backup.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::Description;
    use hscode_storage::InMemoryStore;
    use time::macros::datetime;

    fn table(entries: &[(&str, &str)]) -> CodeTable {
        entries
            .iter()
            .map(|(c, d)| (c.to_string(), Description::from_joined(d)))
            .collect()
    }

    #[test]
    fn missing_documents_are_none() {
        let store = InMemoryStore::new();
        assert!(load_table(&store).unwrap().is_none());
        assert!(load_metadata(&store).unwrap().is_none());
        assert!(load_status_list(&store, StatusKind::Controlled)
            .unwrap()
            .is_none());
    }

    #[test]
    fn table_round_trip() {
        let store = InMemoryStore::new();
        let t = table(&[("0101", "A → B"), ("010121", "A → B → C")]);
        save_table(&store, &t).unwrap();
        assert_eq!(load_table(&store).unwrap(), Some(t));
    }

    #[test]
    fn reads_table_written_by_other_tools() {
        let store = InMemoryStore::with_entries([(
            CURRENT_TABLE_KEY,
            r#"{"0101":"Sekcja I → Rozdział 1 → 0101 - Konie"}"#,
        )]);
        let t = load_table(&store).unwrap().unwrap();
        assert_eq!(t.get("0101").unwrap().depth(), 3);
    }

    #[test]
    fn corrupt_document_reports_key() {
        let store = InMemoryStore::with_entries([(METADATA_KEY, "{")]);
        let err = load_metadata(&store).unwrap_err();
        assert!(matches!(err, CoreError::Codec { ref key, .. } if key == METADATA_KEY));
    }

    #[test]
    fn restore_backup_copies_into_current_slot() {
        let store = InMemoryStore::new();
        let old = table(&[("0101", "old")]);
        save_backup(&store, &old).unwrap();
        save_table(&store, &table(&[("0202", "new")])).unwrap();

        let restored = restore_backup(&store, "1.4.3", datetime!(2025-01-01 0:00 UTC)).unwrap();
        assert_eq!(restored, 1);
        assert_eq!(load_table(&store).unwrap(), Some(old.clone()));
        assert_eq!(load_backup(&store).unwrap(), Some(old));

        let meta = load_metadata(&store).unwrap().unwrap();
        assert_eq!(meta.sync_type, SyncType::Rollback);
        assert_eq!(meta.total_records, 1);
    }

    #[test]
    fn restore_without_backup_fails() {
        let store = InMemoryStore::new();
        let err = restore_backup(&store, "1.4.3", datetime!(2025-01-01 0:00 UTC)).unwrap_err();
        assert!(matches!(err, CoreError::NoBackup));
    }
}
