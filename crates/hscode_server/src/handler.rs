//! Request handlers for the service endpoints.

use crate::auth::TokenValidator;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::messages::{
    HealthResponse, StatsResponse, StatusListView, StatusListsResponse, StatusUpdateRequest,
    StatusUpdateResponse, SyncStatusResponse, SyncTriggerResponse, VerifyRequest, VerifyResponse,
};
use hscode_core::{
    repository, resolve, CacheConfig, CodeTable, StatusKind, StatusList, StatusRegistry,
    TableCache,
};
use hscode_storage::KvStore;
use hscode_sync_engine::{SyncConfig, SyncEngine, SyncReport, UpstreamSource};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Store shared by the cache, the sync engine and the list updates.
pub type SharedStore = Arc<dyn KvStore>;

/// Upstream used by the sync engine.
pub type SharedUpstream = Arc<dyn UpstreamSource>;

/// Shared state behind every handler.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    store: SharedStore,
    cache: TableCache<SharedStore>,
    registry: RwLock<Arc<StatusRegistry>>,
    engine: SyncEngine<SharedUpstream, SharedStore>,
    sync_slot: Mutex<()>,
    admin_auth: TokenValidator,
    sync_auth: TokenValidator,
}

impl HandlerContext {
    /// Creates a handler context and loads the status lists.
    pub fn new(
        config: ServerConfig,
        sync_config: SyncConfig,
        store: SharedStore,
        upstream: SharedUpstream,
    ) -> Self {
        let cache = TableCache::new(
            Arc::clone(&store),
            CacheConfig::new().with_ttl(config.cache_ttl),
        );
        let registry = StatusRegistry::load(&*store);
        let engine = SyncEngine::new(sync_config, upstream, Arc::clone(&store));
        let admin_auth = TokenValidator::new("admin", config.admin_token.as_deref());
        let sync_auth = TokenValidator::new("sync", config.sync_token.as_deref());

        Self {
            config,
            store,
            cache,
            registry: RwLock::new(Arc::new(registry)),
            engine,
            sync_slot: Mutex::new(()),
            admin_auth,
            sync_auth,
        }
    }

    /// Returns the store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Returns the current code table snapshot.
    pub fn table(&self) -> Arc<CodeTable> {
        self.cache.get()
    }

    /// Returns the current status lists.
    pub fn registry(&self) -> Arc<StatusRegistry> {
        Arc::clone(&self.registry.read())
    }

    /// Re-reads both status lists from the store.
    pub fn reload_status_lists(&self) {
        *self.registry.write() = Arc::new(StatusRegistry::load(&*self.store));
    }

    /// Returns true while a sync run is in progress.
    pub fn is_syncing(&self) -> bool {
        self.engine.state().is_active()
    }

    /// Runs one sync through the single sync slot.
    ///
    /// Fails with [`ServerError::Busy`] if a run is already in progress.
    pub fn run_sync(&self) -> ServerResult<SyncReport> {
        let Some(_slot) = self.sync_slot.try_lock() else {
            debug!("sync requested while another run is active");
            return Err(ServerError::Busy);
        };

        let report = self.engine.run()?;
        self.cache.invalidate();
        self.reload_status_lists();
        Ok(report)
    }

    fn replace_list(&self, kind: StatusKind, list: StatusList) {
        let mut registry = self.registry.write();
        let mut next = StatusRegistry::clone(&registry);
        match kind {
            StatusKind::Sanctioned => next.sanctioned = list,
            StatusKind::Controlled => next.controlled = list,
        }
        *registry = Arc::new(next);
    }
}

/// Handler for service requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a liveness probe.
    pub fn handle_health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".into(),
            version: self.context.config.version.clone(),
            records: self.context.table().len(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Resolves one code.
    pub fn handle_verify(&self, request: VerifyRequest) -> ServerResult<VerifyResponse> {
        let table = self.context.table();
        let registry = self.context.registry();
        let result = resolve(&request.code, &table, &registry)?;
        debug!(query = %result.query, code = %result.code, kind = ?result.kind, "verified code");
        Ok(VerifyResponse::from(&result))
    }

    /// Reports table and list statistics.
    pub fn handle_stats(&self) -> StatsResponse {
        let metadata = self.load_metadata();
        let registry = self.context.registry();
        StatsResponse {
            total_records: self.context.table().len(),
            last_sync: metadata.as_ref().map(|m| m.last_sync),
            sync_type: metadata.as_ref().map(|m| m.sync_type),
            changes: metadata.as_ref().map(|m| m.changes),
            version: metadata
                .map(|m| m.version)
                .unwrap_or_else(|| self.context.config.version.clone()),
            sanctioned_count: registry.sanctioned.len(),
            sanepid_count: registry.controlled.len(),
        }
    }

    /// Returns both status lists.
    pub fn handle_status_lists(&self) -> StatusListsResponse {
        let registry = self.context.registry();
        StatusListsResponse {
            sanctions: StatusListView::from(&registry.sanctioned),
            sanepid: StatusListView::from(&registry.controlled),
        }
    }

    /// Replaces one status list. Requires the admin token.
    pub fn handle_status_update(
        &self,
        authorization: Option<&str>,
        request: StatusUpdateRequest,
    ) -> ServerResult<StatusUpdateResponse> {
        self.context.admin_auth.validate(authorization)?;

        let now = OffsetDateTime::now_utc();
        let kind = request.kind;
        let (list, outcome) = StatusList::replace(request.codes, now);
        repository::save_status_list(&*self.context.store, kind, &list)?;
        self.context.replace_list(kind, list);

        info!(
            list = %kind,
            accepted = outcome.accepted,
            submitted = outcome.submitted,
            "status list replaced"
        );
        Ok(StatusUpdateResponse::new(kind, outcome, now))
    }

    /// Runs a sync. Requires the sync token.
    pub fn handle_sync_trigger(
        &self,
        authorization: Option<&str>,
    ) -> ServerResult<SyncTriggerResponse> {
        self.context.sync_auth.validate(authorization)?;
        info!("manual sync triggered");
        let report = self.context.run_sync()?;
        Ok(SyncTriggerResponse::from(&report))
    }

    /// Reports the last sync attempt.
    pub fn handle_sync_status(&self) -> SyncStatusResponse {
        SyncStatusResponse {
            running: self.context.is_syncing(),
            metadata: self.load_metadata(),
        }
    }

    fn load_metadata(&self) -> Option<hscode_core::SyncMetadata> {
        repository::load_metadata(&*self.context.store).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read sync metadata");
            None
        })
    }
}
