//! Service façade.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler, SharedStore, SharedUpstream};
use crate::messages::{
    HealthResponse, StatsResponse, StatusListsResponse, StatusUpdateRequest, StatusUpdateResponse,
    SyncStatusResponse, SyncTriggerResponse, VerifyRequest, VerifyResponse,
};
use hscode_sync_engine::SyncConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// The HS code verification service.
///
/// The service does not bind a socket. A transport maps its routes onto the
/// `handle_*` methods and [`ServerError::status_code`] onto its responses.
///
/// # Example
///
/// ```
/// use hscode_server::{HsCodeService, ServerConfig, VerifyRequest};
/// use hscode_storage::InMemoryStore;
/// use hscode_sync_engine::{MockUpstream, SyncConfig};
/// use std::sync::Arc;
///
/// let service = HsCodeService::new(
///     ServerConfig::default(),
///     SyncConfig::default(),
///     Arc::new(InMemoryStore::new()),
///     Arc::new(MockUpstream::new(1)),
/// );
///
/// let response = service
///     .handle_verify(VerifyRequest { code: "0101 21".into() })
///     .unwrap();
/// assert!(!response.found);
/// ```
pub struct HsCodeService {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl HsCodeService {
    /// Creates a new service.
    pub fn new(
        config: ServerConfig,
        sync_config: SyncConfig,
        store: SharedStore,
        upstream: SharedUpstream,
    ) -> Self {
        let context = Arc::new(HandlerContext::new(config, sync_config, store, upstream));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Returns the shared handler context.
    pub fn context(&self) -> &Arc<HandlerContext> {
        &self.context
    }

    /// Handles a liveness probe.
    pub fn handle_health(&self) -> HealthResponse {
        self.handler.handle_health()
    }

    /// Handles a verify request.
    pub fn handle_verify(&self, request: VerifyRequest) -> ServerResult<VerifyResponse> {
        self.handler.handle_verify(request)
    }

    /// Handles a stats request.
    pub fn handle_stats(&self) -> StatsResponse {
        self.handler.handle_stats()
    }

    /// Handles a status-list listing.
    pub fn handle_status_lists(&self) -> StatusListsResponse {
        self.handler.handle_status_lists()
    }

    /// Handles a status-list replacement.
    pub fn handle_status_update(
        &self,
        authorization: Option<&str>,
        request: StatusUpdateRequest,
    ) -> ServerResult<StatusUpdateResponse> {
        self.handler.handle_status_update(authorization, request)
    }

    /// Handles a manual sync trigger. Blocks for the duration of the run.
    pub fn handle_sync_trigger(
        &self,
        authorization: Option<&str>,
    ) -> ServerResult<SyncTriggerResponse> {
        self.handler.handle_sync_trigger(authorization)
    }

    /// Handles a sync status request.
    pub fn handle_sync_status(&self) -> SyncStatusResponse {
        self.handler.handle_sync_status()
    }

    /// Starts the scheduled sync if the configuration asks for one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_schedule(&self) -> Option<JoinHandle<()>> {
        self.context
            .config
            .sync_interval
            .map(|interval| self.spawn_scheduled_sync(interval))
    }

    /// Runs a sync every `interval` on the blocking pool.
    ///
    /// The first run happens one interval after the call. Ticks that find a
    /// run in progress are skipped. Must be called from within a Tokio
    /// runtime.
    pub fn spawn_scheduled_sync(&self, interval: Duration) -> JoinHandle<()> {
        let context = Arc::clone(&self.context);
        info!(interval_secs = interval.as_secs(), "scheduled sync enabled");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let context = Arc::clone(&context);
                match tokio::task::spawn_blocking(move || context.run_sync()).await {
                    Ok(Ok(report)) => info!(
                        added = report.changes.added,
                        updated = report.changes.updated,
                        removed = report.changes.removed,
                        "scheduled sync completed"
                    ),
                    Ok(Err(ServerError::Busy)) => debug!("scheduled sync skipped, a run is active"),
                    Ok(Err(e)) => warn!(error = %e, "scheduled sync failed"),
                    Err(e) => error!(error = %e, "scheduled sync task failed"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hscode_core::{repository, SyncType};
    use hscode_storage::{FileStore, InMemoryStore};
    use hscode_sync_engine::{MockUpstream, TreeNode};

    fn upstream() -> Arc<MockUpstream> {
        let upstream = Arc::new(MockUpstream::new(1));
        upstream.set_page(
            1,
            TreeNode::group("Animals")
                .with_child(TreeNode::leaf("0101", "Horses"))
                .with_child(TreeNode::leaf("010121", "Pure-bred")),
        );
        upstream
    }

    fn sync_config() -> SyncConfig {
        SyncConfig::default()
            .with_total_pages(1)
            .with_page_delay(Duration::ZERO)
    }

    #[test]
    fn service_lifecycle() {
        let service = HsCodeService::new(
            ServerConfig::default(),
            sync_config(),
            Arc::new(InMemoryStore::new()),
            upstream(),
        );
        let health = service.handle_health();
        assert_eq!(health.status, "ok");
        assert_eq!(health.records, 0);
        assert!(service.handle_sync_status().metadata.is_none());
        assert!(service.start_schedule().is_none());
    }

    #[test]
    fn sync_and_verify_over_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let service = HsCodeService::new(
            ServerConfig::default().with_sync_token("t"),
            sync_config(),
            store,
            upstream(),
        );

        service.handle_sync_trigger(Some("Bearer t")).unwrap();
        let response = service
            .handle_verify(VerifyRequest {
                code: "0101".into(),
            })
            .unwrap();
        assert!(response.is_general_code);
        assert!(response.exact_match);
        assert_eq!(response.subcode_count, 1);

        let stats = service.handle_stats();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.sync_type, Some(SyncType::Delta));
    }

    #[tokio::test]
    async fn scheduled_sync_runs_on_interval() {
        let store = Arc::new(InMemoryStore::new());
        let upstream = upstream();
        let service = HsCodeService::new(
            ServerConfig::default(),
            sync_config(),
            Arc::clone(&store) as SharedStore,
            Arc::clone(&upstream) as SharedUpstream,
        );

        let handle = service.spawn_scheduled_sync(Duration::from_millis(20));
        for _ in 0..100 {
            if repository::load_metadata(&*store).unwrap().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert!(!upstream.requests().is_empty());
        let metadata = repository::load_metadata(&*store).unwrap().unwrap();
        assert_eq!(metadata.sync_type, SyncType::Delta);
    }
}
