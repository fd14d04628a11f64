//! Time-bounded cache of the current code table.

use crate::config::CacheConfig;
use crate::repository;
use crate::table::CodeTable;
use hscode_storage::KvStore;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Source of the current time for TTL checks.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

struct Snapshot {
    table: Arc<CodeTable>,
    loaded_at: Instant,
}

/// Caches the current code table in front of the store.
///
/// Within the TTL every [`get`](Self::get) returns the same `Arc`; after it
/// expires, the next call reads the store once and swaps in the new
/// snapshot. Readers hold their own `Arc`, so a swap never disturbs a
/// resolution in progress.
///
/// A failed or empty read caches an empty table for the TTL rather than
/// surfacing the error.
///
/// A refresh that overlaps an [`invalidate`](Self::invalidate) returns what
/// it read but does not cache it, so the next call reads the store again.
pub struct TableCache<S: KvStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
    generation: AtomicU64,
    refresh_lock: Mutex<()>,
}

impl<S: KvStore> TableCache<S, SystemClock> {
    /// Creates a cache using the system clock.
    pub fn new(store: S, config: CacheConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: KvStore, C: Clock> TableCache<S, C> {
    /// Creates a cache using the given clock.
    pub fn with_clock(store: S, config: CacheConfig, clock: C) -> Self {
        Self {
            store,
            clock,
            ttl: config.ttl,
            snapshot: RwLock::new(None),
            generation: AtomicU64::new(0),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the current table, reading the store if the cached snapshot
    /// is missing or expired.
    pub fn get(&self) -> Arc<CodeTable> {
        if let Some(table) = self.fresh() {
            return table;
        }

        // One refresh at a time; callers that waited re-check first.
        let _guard = self.refresh_lock.lock();
        if let Some(table) = self.fresh() {
            return table;
        }

        let generation = self.generation.load(Ordering::Acquire);
        let table = Arc::new(self.read_store());

        let mut snapshot = self.snapshot.write();
        if self.generation.load(Ordering::Acquire) == generation {
            *snapshot = Some(Snapshot {
                table: Arc::clone(&table),
                loaded_at: self.clock.now(),
            });
        } else {
            debug!("cache invalidated during refresh, not caching read");
        }
        table
    }

    /// Forces the next [`get`](Self::get) to read the store, including when
    /// a refresh is already in flight.
    pub fn invalidate(&self) {
        let mut snapshot = self.snapshot.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *snapshot = None;
        debug!("code table cache invalidated");
    }

    fn fresh(&self) -> Option<Arc<CodeTable>> {
        let snapshot = self.snapshot.read();
        let snapshot = snapshot.as_ref()?;
        let age = self.clock.now().saturating_duration_since(snapshot.loaded_at);
        (age < self.ttl).then(|| Arc::clone(&snapshot.table))
    }

    fn read_store(&self) -> CodeTable {
        match repository::load_table(&self.store) {
            Ok(Some(table)) => {
                debug!(records = table.len(), "loaded code table");
                table
            }
            Ok(None) => {
                warn!("no code table in store, serving empty table");
                CodeTable::new()
            }
            Err(e) => {
                warn!(error = %e, "code table unavailable, serving empty table");
                CodeTable::new()
            }
        }
    }
}
