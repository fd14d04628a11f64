//! Sync engine state machine.

use crate::config::SyncConfig;
use crate::diff::diff;
use crate::error::{SyncError, SyncResult};
use crate::flatten::flatten;
use crate::upstream::UpstreamSource;
use hscode_core::{repository, ChangeSummary, CodeTable, SyncMetadata, SyncType};
use hscode_storage::KvStore;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No run has started yet.
    Idle,
    /// Pages are being fetched.
    Fetching,
    /// The fetched table is being compared with the stored one.
    Diffing,
    /// The new table, backup and metadata are being written.
    Persisting,
    /// The last run completed.
    Succeeded,
    /// The last run failed.
    Failed,
}

impl SyncState {
    /// Returns true if a run is in progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::Fetching | SyncState::Diffing | SyncState::Persisting
        )
    }

    /// Returns true if a new run can start.
    pub fn can_start_sync(&self) -> bool {
        !self.is_active()
    }
}

/// What happened to one upstream page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was fetched and flattened.
    Fetched {
        /// Page number.
        page: u32,
        /// Records the page contributed.
        records: usize,
    },
    /// The page failed and was skipped.
    Skipped {
        /// Page number.
        page: u32,
        /// Failure message.
        error: String,
    },
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Diff against the previous table.
    pub changes: ChangeSummary,
    /// Codes in the fetched table.
    pub total_records: usize,
    /// Pages fetched.
    pub successful_pages: u32,
    /// Pages skipped.
    pub failed_pages: u32,
    /// Whether the table slot was rewritten.
    pub persisted: bool,
    /// Whether the previous table was copied to the backup slot.
    pub backed_up: bool,
    /// Per-page log.
    pub pages: Vec<PageOutcome>,
    /// Wall time of the run.
    pub duration: Duration,
}

impl SyncReport {
    /// Duration in whole milliseconds.
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }

    /// Metadata label for this run.
    pub fn sync_type(&self) -> SyncType {
        if self.persisted {
            SyncType::Delta
        } else {
            SyncType::None
        }
    }
}

/// Statistics about sync runs.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Runs that completed.
    pub runs_completed: u64,
    /// Runs that failed.
    pub runs_failed: u64,
    /// Report of the last completed run.
    pub last_report: Option<SyncReport>,
    /// Last run time.
    pub last_run_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Tables fetched from all pages.
struct FetchedTable {
    table: CodeTable,
    successful_pages: u32,
    failed_pages: u32,
    pages: Vec<PageOutcome>,
}

/// The sync engine replaces the stored table with the upstream one.
pub struct SyncEngine<U: UpstreamSource, S: KvStore> {
    config: SyncConfig,
    upstream: U,
    store: S,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl<U: UpstreamSource, S: KvStore> SyncEngine<U, S> {
    /// Creates a new sync engine.
    pub fn new(config: SyncConfig, upstream: U, store: S) -> Self {
        Self {
            config,
            upstream,
            store,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the store the engine writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the upstream source.
    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Runs one full sync: fetch, diff, persist.
    ///
    /// On failure a fallback metadata record is written and the stored
    /// table is left untouched.
    pub fn run(&self) -> SyncResult<SyncReport> {
        {
            let mut state = self.state.write();
            if !state.can_start_sync() {
                return Err(SyncError::InvalidStateTransition {
                    from: format!("{:?}", *state),
                    to: format!("{:?}", SyncState::Fetching),
                });
            }
            *state = SyncState::Fetching;
        }

        let start = Instant::now();
        info!(pages = self.upstream.total_pages(), "sync started");
        let old = match self.load_previous() {
            Ok(old) => old,
            Err(e) => {
                self.handle_error(&e, &CodeTable::new(), (0, 0));
                return Err(e);
            }
        };
        let mut page_counts = (0, 0);

        match self.run_phases(&old, start, &mut page_counts) {
            Ok(report) => {
                self.set_state(SyncState::Succeeded);
                info!(
                    added = report.changes.added,
                    updated = report.changes.updated,
                    removed = report.changes.removed,
                    unchanged = report.changes.unchanged,
                    total = report.total_records,
                    failed_pages = report.failed_pages,
                    duration_ms = report.duration_ms() as u64,
                    persisted = report.persisted,
                    "sync completed"
                );
                let mut stats = self.stats.write();
                stats.runs_completed += 1;
                stats.last_run_time = Some(Instant::now());
                stats.last_error = None;
                stats.last_report = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                self.handle_error(&e, &old, page_counts);
                Err(e)
            }
        }
    }

    fn run_phases(
        &self,
        old: &CodeTable,
        start: Instant,
        page_counts: &mut (u32, u32),
    ) -> SyncResult<SyncReport> {
        let fetched = self.fetch_all();
        *page_counts = (fetched.successful_pages, fetched.failed_pages);
        if fetched.successful_pages == 0 {
            return Err(SyncError::UpstreamUnavailable {
                pages: self.upstream.total_pages(),
            });
        }
        if fetched.table.is_empty() {
            return Err(SyncError::EmptyDataset);
        }

        self.set_state(SyncState::Diffing);
        let changes = diff(old, &fetched.table);
        debug!(?changes, "diff computed");

        self.set_state(SyncState::Persisting);
        let (persisted, backed_up) = self.persist(old, &fetched, changes)?;

        Ok(SyncReport {
            changes,
            total_records: fetched.table.len(),
            successful_pages: fetched.successful_pages,
            failed_pages: fetched.failed_pages,
            persisted,
            backed_up,
            pages: fetched.pages,
            duration: start.elapsed(),
        })
    }

    /// Reads the stored table; absence yields an empty one.
    ///
    /// A read failure aborts the run before anything is fetched or written.
    fn load_previous(&self) -> SyncResult<CodeTable> {
        match repository::load_table(&self.store)? {
            Some(table) => Ok(table),
            None => {
                info!("no stored table, treating this as the first sync");
                Ok(CodeTable::new())
            }
        }
    }

    /// Fetches every page in order. Failed pages are skipped, never retried.
    fn fetch_all(&self) -> FetchedTable {
        let total = self.upstream.total_pages();
        let mut fetched = FetchedTable {
            table: CodeTable::new(),
            successful_pages: 0,
            failed_pages: 0,
            pages: Vec::with_capacity(total as usize),
        };

        for page in 1..=total {
            match self.upstream.fetch_page(page) {
                Ok(root) => {
                    let records = flatten(&root);
                    debug!(page, records = records.len(), "page fetched");
                    fetched.pages.push(PageOutcome::Fetched {
                        page,
                        records: records.len(),
                    });
                    fetched.table.extend(records);
                    fetched.successful_pages += 1;
                }
                Err(e) => {
                    warn!(page, error = %e, "page skipped");
                    fetched.pages.push(PageOutcome::Skipped {
                        page,
                        error: e.to_string(),
                    });
                    fetched.failed_pages += 1;
                }
            }

            if page < total && !self.config.page_delay.is_zero() {
                std::thread::sleep(self.config.page_delay);
            }
        }

        fetched
    }

    /// Writes backup, table and metadata in that order.
    ///
    /// Returns `(persisted, backed_up)`.
    fn persist(
        &self,
        old: &CodeTable,
        fetched: &FetchedTable,
        changes: ChangeSummary,
    ) -> SyncResult<(bool, bool)> {
        let now = OffsetDateTime::now_utc();
        let total = fetched.table.len() as u64;

        if changes.is_noop() {
            info!("no changes upstream, refreshing metadata only");
            let metadata =
                SyncMetadata::new(now, total, changes, &self.config.version, SyncType::None)
                    .with_pages(fetched.successful_pages, fetched.failed_pages);
            if let Err(e) = repository::save_metadata(&self.store, &metadata) {
                warn!(error = %e, "failed to write metadata");
            }
            return Ok((false, false));
        }

        let mut backed_up = false;
        if !old.is_empty() {
            match repository::save_backup(&self.store, old) {
                Ok(()) => backed_up = true,
                Err(e) => warn!(error = %e, "failed to back up previous table"),
            }
        }

        repository::save_table(&self.store, &fetched.table)?;

        let metadata =
            SyncMetadata::new(now, total, changes, &self.config.version, SyncType::Delta)
                .with_pages(fetched.successful_pages, fetched.failed_pages);
        if let Err(e) = repository::save_metadata(&self.store, &metadata) {
            warn!(error = %e, "table written but metadata update failed");
        }

        Ok((true, backed_up))
    }

    /// Marks the run failed and records fallback metadata for the old table.
    fn handle_error(&self, error: &SyncError, old: &CodeTable, page_counts: (u32, u32)) {
        error!(error = %error, "sync failed");
        self.set_state(SyncState::Failed);
        {
            let mut stats = self.stats.write();
            stats.runs_failed += 1;
            stats.last_run_time = Some(Instant::now());
            stats.last_error = Some(error.to_string());
        }

        let metadata = SyncMetadata::new(
            OffsetDateTime::now_utc(),
            old.len() as u64,
            ChangeSummary::unchanged(old.len()),
            &self.config.version,
            SyncType::ErrorFallback,
        )
        .with_pages(page_counts.0, page_counts.1)
        .with_error(error.to_string());
        if let Err(e) = repository::save_metadata(&self.store, &metadata) {
            warn!(error = %e, "failed to write fallback metadata");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{MockUpstream, TreeNode};
    use hscode_core::Description;
    use hscode_storage::InMemoryStore;
    use std::sync::Arc;

    type TestEngine = SyncEngine<Arc<MockUpstream>, Arc<InMemoryStore>>;

    fn engine(pages: u32) -> (TestEngine, Arc<MockUpstream>, Arc<InMemoryStore>) {
        let upstream = Arc::new(MockUpstream::new(pages));
        let store = Arc::new(InMemoryStore::new());
        let config = SyncConfig::default()
            .with_total_pages(pages)
            .with_page_delay(Duration::ZERO)
            .with_version("test");
        let engine = SyncEngine::new(config, Arc::clone(&upstream), Arc::clone(&store));
        (engine, upstream, store)
    }

    fn page(entries: &[(&str, &str)]) -> TreeNode {
        entries
            .iter()
            .fold(TreeNode::group("Chapter"), |node, (code, desc)| {
                node.with_child(TreeNode::leaf(*code, *desc))
            })
    }

    #[test]
    fn sync_state_checks() {
        assert!(SyncState::Idle.can_start_sync());
        assert!(SyncState::Succeeded.can_start_sync());
        assert!(SyncState::Failed.can_start_sync());
        assert!(!SyncState::Fetching.can_start_sync());
        assert!(SyncState::Diffing.is_active());
        assert!(SyncState::Persisting.is_active());
        assert!(!SyncState::Idle.is_active());
    }

    #[test]
    fn sync_engine_initial_state() {
        let (engine, _, _) = engine(1);
        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.stats().runs_completed, 0);
    }

    #[test]
    fn first_sync_persists_without_backup() {
        let (engine, upstream, store) = engine(2);
        upstream.set_page(1, page(&[("0101", "Horses")]));
        upstream.set_page(2, page(&[("0102", "Bovine")]));

        let report = engine.run().unwrap();
        assert_eq!(engine.state(), SyncState::Succeeded);
        assert_eq!(report.changes.added, 2);
        assert!(report.persisted);
        assert!(!report.backed_up);
        assert_eq!(report.sync_type(), SyncType::Delta);

        let table = repository::load_table(&*store).unwrap().unwrap();
        assert_eq!(
            table.get("0101"),
            Some(&Description::new(["Chapter", "Horses"]))
        );
        assert!(repository::load_backup(&*store).unwrap().is_none());

        let metadata = repository::load_metadata(&*store).unwrap().unwrap();
        assert_eq!(metadata.sync_type, SyncType::Delta);
        assert_eq!(metadata.total_records, 2);
        assert_eq!(metadata.version, "test");
    }

    #[test]
    fn failed_run_keeps_table_and_writes_fallback() {
        let (engine, upstream, store) = engine(2);
        upstream.set_page(1, page(&[("0101", "Horses")]));
        upstream.set_page(2, page(&[("0102", "Bovine")]));
        engine.run().unwrap();
        let before = repository::load_table(&*store).unwrap();

        upstream.fail_page(1, "HTTP 503");
        upstream.fail_page(2, "HTTP 503");
        let err = engine.run().unwrap_err();
        assert!(matches!(err, SyncError::UpstreamUnavailable { pages: 2 }));
        assert_eq!(engine.state(), SyncState::Failed);
        assert_eq!(repository::load_table(&*store).unwrap(), before);

        let metadata = repository::load_metadata(&*store).unwrap().unwrap();
        assert_eq!(metadata.sync_type, SyncType::ErrorFallback);
        assert_eq!(metadata.total_records, 2);
        assert_eq!(metadata.failed_pages, 2);
        assert!(metadata.error.unwrap().contains("unavailable"));

        let stats = engine.stats();
        assert_eq!(stats.runs_completed, 1);
        assert_eq!(stats.runs_failed, 1);
        assert!(stats.last_error.is_some());
    }

    #[test]
    fn can_run_again_after_failure() {
        let (engine, upstream, _) = engine(1);
        assert!(engine.run().is_err());
        upstream.set_page(1, page(&[("0101", "Horses")]));
        assert!(engine.run().is_ok());
    }
}
