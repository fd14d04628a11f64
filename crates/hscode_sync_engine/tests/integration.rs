//! Integration tests for the sync engine against real stores.

use hscode_core::{repository, Description, SyncType};
use hscode_storage::{
    FileStore, InMemoryStore, KvStore, BACKUP_TABLE_KEY, CURRENT_TABLE_KEY, METADATA_KEY,
};
use hscode_sync_engine::{
    HttpUpstream, MockUpstream, PageOutcome, SyncConfig, SyncEngine, SyncError, SyncResult,
    SyncState, TreeNode, UpstreamSource,
};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn config(pages: u32) -> SyncConfig {
    SyncConfig::new("https://upstream.example.com/codes")
        .with_total_pages(pages)
        .with_page_delay(Duration::ZERO)
        .with_version("1.0.0-test")
}

fn chapter(name: &str, leaves: &[(&str, &str)]) -> TreeNode {
    leaves.iter().fold(TreeNode::group(name), |node, (code, desc)| {
        node.with_child(TreeNode::leaf(*code, *desc))
    })
}

#[test]
fn second_sync_backs_up_and_replaces_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let upstream = Arc::new(MockUpstream::new(1));
    let engine = SyncEngine::new(config(1), Arc::clone(&upstream), store);

    upstream.set_page(1, chapter("Animals", &[("0101", "Horses"), ("0102", "Bovine")]));
    engine.run().unwrap();

    upstream.set_page(1, chapter("Animals", &[("0101", "Horses"), ("0103", "Swine")]));
    let report = engine.run().unwrap();
    assert_eq!(report.changes.added, 1);
    assert_eq!(report.changes.removed, 1);
    assert_eq!(report.changes.unchanged, 1);
    assert!(report.backed_up);

    let store = engine.store();
    let current = repository::load_table(store).unwrap().unwrap();
    let backup = repository::load_backup(store).unwrap().unwrap();
    assert!(current.contains("0103"));
    assert!(!current.contains("0102"));
    assert!(backup.contains("0102"));
    assert_eq!(
        backup.get("0101"),
        Some(&Description::new(["Animals", "Horses"]))
    );
}

#[test]
fn unchanged_upstream_refreshes_metadata_only() {
    let store = Arc::new(InMemoryStore::new());
    let upstream = Arc::new(MockUpstream::new(1));
    upstream.set_page(1, chapter("Animals", &[("0101", "Horses")]));
    let engine = SyncEngine::new(config(1), Arc::clone(&upstream), Arc::clone(&store));

    engine.run().unwrap();
    let first = repository::load_metadata(&*store).unwrap().unwrap();
    let writes_before = store.write_log().len();

    let report = engine.run().unwrap();
    assert!(!report.persisted);
    assert!(report.changes.is_noop());

    let log = store.write_log();
    assert!(log[writes_before..].iter().all(|key| key != CURRENT_TABLE_KEY));
    let metadata = repository::load_metadata(&*store).unwrap().unwrap();
    assert_eq!(metadata.sync_type, SyncType::None);
    assert!(metadata.last_sync >= first.last_sync);
}

#[test]
fn label_with_separator_does_not_rewrite_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let upstream = Arc::new(MockUpstream::new(1));
    upstream.set_page(1, chapter("Animals", &[("0101", "Horses → ponies")]));
    let engine = SyncEngine::new(config(1), Arc::clone(&upstream), store);

    engine.run().unwrap();
    let report = engine.run().unwrap();

    assert!(report.changes.is_noop());
    assert_eq!(report.changes.unchanged, 1);
    assert!(!report.persisted);
}

#[test]
fn partial_fetch_is_reported_not_fatal() {
    let store = Arc::new(InMemoryStore::new());
    let upstream = Arc::new(MockUpstream::new(3));
    upstream.set_page(1, chapter("Animals", &[("0101", "Horses")]));
    upstream.fail_page(2, "HTTP 500");
    upstream.set_page(3, chapter("Meat", &[("0201", "Beef")]));
    let engine = SyncEngine::new(config(3), Arc::clone(&upstream), Arc::clone(&store));

    let report = engine.run().unwrap();
    assert_eq!(report.successful_pages, 2);
    assert_eq!(report.failed_pages, 1);
    assert_eq!(report.total_records, 2);
    assert!(matches!(report.pages[1], PageOutcome::Skipped { page: 2, .. }));
    assert_eq!(upstream.requests(), vec![1, 2, 3]);

    let metadata = repository::load_metadata(&*store).unwrap().unwrap();
    assert_eq!(metadata.successful_pages, 2);
    assert_eq!(metadata.failed_pages, 1);
}

#[test]
fn table_write_failure_fails_the_run() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_writes_to(CURRENT_TABLE_KEY);
    let upstream = Arc::new(MockUpstream::new(1));
    upstream.set_page(1, chapter("Animals", &[("0101", "Horses")]));
    let engine = SyncEngine::new(config(1), upstream, Arc::clone(&store));

    let err = engine.run().unwrap_err();
    assert!(matches!(err, SyncError::Storage(_)));
    assert_eq!(engine.state(), SyncState::Failed);
    assert!(store.get(CURRENT_TABLE_KEY).unwrap().is_none());

    let metadata = repository::load_metadata(&*store).unwrap().unwrap();
    assert_eq!(metadata.sync_type, SyncType::ErrorFallback);
}

#[test]
fn backup_is_written_before_table_and_metadata() {
    let store = Arc::new(InMemoryStore::new());
    let upstream = Arc::new(MockUpstream::new(1));
    let engine = SyncEngine::new(config(1), Arc::clone(&upstream), Arc::clone(&store));

    upstream.set_page(1, chapter("Animals", &[("0101", "Horses")]));
    engine.run().unwrap();
    let writes_before = store.write_log().len();

    upstream.set_page(1, chapter("Animals", &[("0101", "Ponies")]));
    engine.run().unwrap();

    let log = store.write_log();
    assert_eq!(
        log[writes_before..],
        [
            BACKUP_TABLE_KEY.to_string(),
            CURRENT_TABLE_KEY.to_string(),
            METADATA_KEY.to_string(),
        ]
    );
}

#[test]
fn failed_backup_does_not_block_table_write() {
    let store = Arc::new(InMemoryStore::new());
    let upstream = Arc::new(MockUpstream::new(1));
    let engine = SyncEngine::new(config(1), Arc::clone(&upstream), Arc::clone(&store));

    upstream.set_page(1, chapter("Animals", &[("0101", "Horses")]));
    engine.run().unwrap();

    store.fail_writes_to(BACKUP_TABLE_KEY);
    upstream.set_page(1, chapter("Animals", &[("0101", "Ponies")]));
    let report = engine.run().unwrap();

    assert!(report.persisted);
    assert!(!report.backed_up);
    assert!(repository::load_backup(&*store).unwrap().is_none());
    let current = repository::load_table(&*store).unwrap().unwrap();
    assert_eq!(
        current.get("0101"),
        Some(&Description::new(["Animals", "Ponies"]))
    );
    let metadata = repository::load_metadata(&*store).unwrap().unwrap();
    assert_eq!(metadata.sync_type, SyncType::Delta);
}

#[test]
fn unreadable_table_aborts_without_touching_it() {
    let store = Arc::new(InMemoryStore::new());
    let stored: hscode_core::CodeTable = ["0101", "0102", "0103"]
        .iter()
        .map(|c| (c.to_string(), Description::single(*c)))
        .collect();
    repository::save_table(&*store, &stored).unwrap();
    let writes_before = store.write_log().len();

    let upstream = Arc::new(MockUpstream::new(1));
    upstream.set_page(1, chapter("Animals", &[("0101", "Horses")]));
    let engine = SyncEngine::new(config(1), Arc::clone(&upstream), Arc::clone(&store));

    store.set_fail_reads(true);
    let err = engine.run().unwrap_err();
    store.set_fail_reads(false);

    assert!(matches!(err, SyncError::Storage(_)));
    assert_eq!(engine.state(), SyncState::Failed);
    assert!(upstream.requests().is_empty());
    let log = store.write_log();
    assert_eq!(log[writes_before..], [METADATA_KEY.to_string()]);

    let current = repository::load_table(&*store).unwrap().unwrap();
    assert_eq!(current.len(), 3);
    assert!(repository::load_backup(&*store).unwrap().is_none());
    let metadata = repository::load_metadata(&*store).unwrap().unwrap();
    assert_eq!(metadata.sync_type, SyncType::ErrorFallback);
}

#[test]
fn rollback_restores_previous_table() {
    let store = Arc::new(InMemoryStore::new());
    let upstream = Arc::new(MockUpstream::new(1));
    let engine = SyncEngine::new(config(1), Arc::clone(&upstream), Arc::clone(&store));

    upstream.set_page(1, chapter("Animals", &[("0101", "Horses")]));
    engine.run().unwrap();
    upstream.set_page(1, chapter("Animals", &[("0101", "Ponies")]));
    engine.run().unwrap();

    let restored =
        repository::restore_backup(&*store, "1.0.0-test", time::OffsetDateTime::now_utc()).unwrap();
    assert_eq!(restored, 1);
    let table = repository::load_table(&*store).unwrap().unwrap();
    assert_eq!(
        table.get("0101"),
        Some(&Description::new(["Animals", "Horses"]))
    );
    let metadata = repository::load_metadata(&*store).unwrap().unwrap();
    assert_eq!(metadata.sync_type, SyncType::Rollback);
}

/// An upstream that blocks inside the first page until released.
struct GatedUpstream {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl UpstreamSource for GatedUpstream {
    fn total_pages(&self) -> u32 {
        1
    }

    fn fetch_page(&self, _page: u32) -> SyncResult<TreeNode> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(chapter("Animals", &[("0101", "Horses")]))
    }
}

#[test]
fn concurrent_run_is_rejected() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let upstream = GatedUpstream {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let engine = SyncEngine::new(config(1), upstream, InMemoryStore::new());

    std::thread::scope(|scope| {
        let first = scope.spawn(|| engine.run());
        entered_rx.recv().unwrap();
        assert_eq!(engine.state(), SyncState::Fetching);

        let err = engine.run().unwrap_err();
        assert!(matches!(err, SyncError::InvalidStateTransition { .. }));

        release_tx.send(()).unwrap();
        assert!(first.join().unwrap().is_ok());
    });
    assert_eq!(engine.state(), SyncState::Succeeded);
}

#[test]
fn http_upstream_drives_engine() {
    let pages = vec![
        r#"{"description":"Animals","subgroup":[{"code":"0101","description":"Horses"}]}"#,
        r#"{"description":"Meat","subgroup":[{"code":"0201","description":"Beef"}]}"#,
    ];
    let client = move |url: &str| -> Result<Vec<u8>, String> {
        let page: usize = url
            .rsplit('=')
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| format!("bad url {url}"))?;
        pages
            .get(page - 1)
            .map(|body| body.as_bytes().to_vec())
            .ok_or_else(|| "HTTP 404".to_string())
    };
    let config = config(2);
    let upstream = HttpUpstream::new(&config, client);
    let engine = SyncEngine::new(config, upstream, InMemoryStore::new());

    let report = engine.run().unwrap();
    assert_eq!(report.total_records, 2);
    let table = repository::load_table(engine.store()).unwrap().unwrap();
    assert_eq!(
        table.get("0201"),
        Some(&Description::new(["Meat", "Beef"]))
    );
}
