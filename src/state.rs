//! Shared application state.
//!
//! [`AppState`] bundles the configuration cache and the analysis/quote stores
//! so boundary operations receive one handle instead of reaching for globals.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::pricing::config::{self, ConfigSnapshot, SnapshotSource};
use crate::pricing::PricingError;
use crate::store::{AnalysisStore, MemoryStore, QuoteStore};

/// How long a loaded snapshot is served before the next read reloads it.
pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(5 * 60);

struct CachedSnapshot {
    snapshot: Arc<ConfigSnapshot>,
    loaded_at: Instant,
}

/// Read-mostly, time-boxed cache of the configuration snapshot.
///
/// Readers clone the current `Arc` under a read lock. Loads are serialized
/// by a separate reload mutex and only the pointer swap takes the write lock,
/// so a slow source never blocks readers of a fresh snapshot. Readers that
/// miss at the same expiry wait for the one load in flight and share its
/// result. The cache never retries a failed load on its own.
pub struct SnapshotCache {
    source: Box<dyn SnapshotSource>,
    ttl: Duration,
    current: RwLock<Option<CachedSnapshot>>,
    reload: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(source: impl SnapshotSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            ttl: DEFAULT_SNAPSHOT_TTL,
            current: RwLock::new(None),
            reload: Mutex::new(()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot, reloading it first when absent or expired.
    pub fn snapshot(&self) -> Result<Arc<ConfigSnapshot>, PricingError> {
        if let Some(snapshot) = self.fresh()? {
            return Ok(snapshot);
        }
        let _reload = self.lock_reload()?;
        // Another reader may have finished the load while this one waited.
        if let Some(snapshot) = self.fresh()? {
            return Ok(snapshot);
        }
        self.load_and_swap()
    }

    fn fresh(&self) -> Result<Option<Arc<ConfigSnapshot>>, PricingError> {
        let current = self
            .current
            .read()
            .map_err(|e| PricingError::ConfigUnavailable(format!("snapshot lock poisoned: {e}")))?;
        Ok(current
            .as_ref()
            .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.snapshot)))
    }

    fn lock_reload(&self) -> Result<std::sync::MutexGuard<'_, ()>, PricingError> {
        self.reload
            .lock()
            .map_err(|e| PricingError::ConfigUnavailable(format!("reload lock poisoned: {e}")))
    }

    /// Load from the source now and swap the result in.
    ///
    /// # Errors
    /// [`PricingError::ConfigUnavailable`] when the source fails,
    /// [`PricingError::Config`] when the loaded snapshot is invalid. On error
    /// the previously cached snapshot (if any) is left in place.
    pub fn refresh(&self) -> Result<Arc<ConfigSnapshot>, PricingError> {
        let _reload = self.lock_reload()?;
        self.load_and_swap()
    }

    fn load_and_swap(&self) -> Result<Arc<ConfigSnapshot>, PricingError> {
        let loaded = self.source.load_snapshot()?;
        config::validate(&loaded)?;
        let snapshot = Arc::new(loaded);

        let mut current = self
            .current
            .write()
            .map_err(|e| PricingError::ConfigUnavailable(format!("snapshot lock poisoned: {e}")))?;
        *current = Some(CachedSnapshot {
            snapshot: Arc::clone(&snapshot),
            loaded_at: Instant::now(),
        });
        tracing::info!(version = snapshot.version, "configuration snapshot refreshed");
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next read reloads.
    pub fn invalidate(&self) -> Result<(), PricingError> {
        let mut current = self
            .current
            .write()
            .map_err(|e| PricingError::ConfigUnavailable(format!("snapshot lock poisoned: {e}")))?;
        *current = None;
        Ok(())
    }
}

/// Root state handed to every boundary operation.
pub struct AppState {
    pub snapshots: SnapshotCache,
    pub analyses: Arc<dyn AnalysisStore>,
    pub quotes: Arc<dyn QuoteStore>,
}

impl AppState {
    pub fn new(
        snapshots: SnapshotCache,
        analyses: Arc<dyn AnalysisStore>,
        quotes: Arc<dyn QuoteStore>,
    ) -> Self {
        Self {
            snapshots,
            analyses,
            quotes,
        }
    }

    /// State backed by one [`MemoryStore`] for both analyses and quotes.
    pub fn in_memory(source: impl SnapshotSource + 'static) -> Self {
        let store = Arc::new(MemoryStore::default());
        Self::new(SnapshotCache::new(source), store.clone(), store)
    }
}
