//! Storage gateway
//!
//! Every storage operation goes through [`StorageGateway`]. It routes to the
//! durable backend while the [`StorageHandle`] says `Durable`, and on a
//! connectivity failure flips the handle to `Volatile` and retries the
//! operation once against the volatile backend. Once volatile, the durable
//! backend is only probed again by [`StorageGateway::recheck`].

mod backend;
mod error;
mod handle;
mod memory;
mod scope_locks;
mod sqlite;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use handle::{BackendKind, StorageHandle};
pub use memory::MemoryBackend;
pub use scope_locks::ScopeLocks;
pub use sqlite::SqliteBackend;

use chrono::NaiveDate;
use salescribe_common::config::ServiceConfig;
use salescribe_common::models::{
    Article, DataSummary, NewArticle, NewUploadBatch, Record, SalesRow, Scope, UploadBatch,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Article query filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Only articles generated on or after this date
    pub since: Option<NaiveDate>,
}

impl ArticleFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn since(date: NaiveDate) -> Self {
        Self { since: Some(date) }
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.since.map_or(true, |since| article.generated_date >= since)
    }
}

/// Entities removed by a scope clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearCounts {
    pub records: u64,
    pub batches: u64,
    pub articles: u64,
}

/// Totals across all scopes of one backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredCounts {
    pub batches: u64,
    pub scopes: u64,
}

/// Storage health as reported by `/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageHealth {
    pub active_backend: BackendKind,
    pub durable_configured: bool,
    /// Whether the durable backend currently answers a probe
    pub reachable: bool,
    pub stored_batch_count: u64,
    pub stored_scope_count: u64,
    pub failover_count: u64,
}

impl StorageHealth {
    /// Durable storage configured but not serving
    pub fn is_degraded(&self) -> bool {
        self.durable_configured && self.active_backend == BackendKind::Volatile
    }
}

pub struct StorageGateway {
    handle: StorageHandle,
    durable: Option<Arc<dyn StorageBackend>>,
    /// A durable store was requested, even if it could not be opened
    durable_configured: bool,
    volatile: Arc<dyn StorageBackend>,
    locks: ScopeLocks,
}

impl StorageGateway {
    /// Gateway over the given backends. Starts `Durable` iff one is present.
    pub fn new(
        durable: Option<Arc<dyn StorageBackend>>,
        volatile: Arc<dyn StorageBackend>,
    ) -> Self {
        let initial = if durable.is_some() {
            BackendKind::Durable
        } else {
            BackendKind::Volatile
        };
        Self {
            handle: StorageHandle::new(initial),
            durable_configured: durable.is_some(),
            durable,
            volatile,
            locks: ScopeLocks::new(),
        }
    }

    /// Volatile gateway for a configured durable store that failed to open.
    /// Reports degraded until restarted.
    pub fn durable_unavailable(volatile: Arc<dyn StorageBackend>) -> Self {
        Self {
            durable_configured: true,
            ..Self::new(None, volatile)
        }
    }

    /// Volatile-only gateway
    pub fn volatile_only() -> Self {
        Self::new(None, Arc::new(MemoryBackend::new()))
    }

    /// Build the gateway from configuration
    ///
    /// A missing database URL, or a durable backend that cannot be opened,
    /// starts the service on the volatile backend.
    pub async fn connect(config: &ServiceConfig) -> Self {
        let volatile: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());

        let Some(url) = config.database_url.as_deref() else {
            warn!("No database URL configured, using volatile storage");
            return Self::new(None, volatile);
        };

        let acquire_timeout = Duration::from_millis(config.database_acquire_timeout_ms);
        match SqliteBackend::connect(url, config.database_max_connections, acquire_timeout).await {
            Ok(backend) => {
                info!("Durable storage ready");
                Self::new(Some(Arc::new(backend)), volatile)
            }
            Err(e) => {
                error!(error = %e, "Durable storage unavailable at startup, using volatile storage");
                Self::durable_unavailable(volatile)
            }
        }
    }

    pub fn handle(&self) -> &StorageHandle {
        &self.handle
    }

    pub fn active_backend(&self) -> BackendKind {
        self.handle.active()
    }

    /// Scopes currently holding a lock entry
    pub async fn locked_scope_count(&self) -> usize {
        self.locks.tracked_scopes().await
    }

    /// Run `op` on the active backend, failing over once on connectivity errors
    async fn with_failover<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T, StorageError>
    where
        F: Fn(Arc<dyn StorageBackend>) -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        if self.handle.active() == BackendKind::Durable {
            if let Some(durable) = &self.durable {
                match op(Arc::clone(durable)).await {
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_connectivity() => {
                        if self.handle.degrade() {
                            warn!(
                                operation,
                                error = %err,
                                failover_count = self.handle.failover_count(),
                                "Durable storage unreachable, failing over to volatile storage"
                            );
                        } else {
                            debug!(operation, error = %err, "Durable storage failed after failover");
                        }
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        op(Arc::clone(&self.volatile)).await
    }

    pub async fn find_batch(
        &self,
        scope: &Scope,
        fingerprint: &str,
    ) -> Result<Option<UploadBatch>, StorageError> {
        self.with_failover("find_batch", |backend| async move {
            backend.find_batch(scope, fingerprint).await
        })
        .await
    }

    /// Store a batch together with its rows
    pub async fn persist_upload(
        &self,
        scope: &Scope,
        batch: NewUploadBatch,
        rows: Vec<SalesRow>,
    ) -> Result<UploadBatch, StorageError> {
        let _guard = self.locks.shared(scope).await;
        let batch = &batch;
        let rows = rows.as_slice();
        self.with_failover("persist_upload", |backend| async move {
            backend.insert_upload(scope, batch, rows).await
        })
        .await
    }

    pub async fn persist_article(
        &self,
        scope: &Scope,
        article: NewArticle,
    ) -> Result<Article, StorageError> {
        let _guard = self.locks.shared(scope).await;
        let article = &article;
        self.with_failover("persist_article", |backend| async move {
            backend.insert_article(scope, article).await
        })
        .await
    }

    pub async fn query_records(&self, scope: &Scope) -> Result<Vec<Record>, StorageError> {
        self.with_failover("query_records", |backend| async move {
            backend.records(scope).await
        })
        .await
    }

    pub async fn query_articles(
        &self,
        scope: &Scope,
        filter: ArticleFilter,
    ) -> Result<Vec<Article>, StorageError> {
        let filter = &filter;
        self.with_failover("query_articles", |backend| async move {
            backend.articles(scope, filter).await
        })
        .await
    }

    /// Aggregate summary of the scope's records
    pub async fn summary(&self, scope: &Scope) -> Result<DataSummary, StorageError> {
        let records = self.query_records(scope).await?;
        Ok(DataSummary::from_rows(records.iter().map(|r| &r.row)))
    }

    /// Remove all records, batches and articles of `scope` atomically
    pub async fn clear(&self, scope: &Scope) -> Result<ClearCounts, StorageError> {
        let guard = self.locks.exclusive(scope).await;
        let result = self
            .with_failover("clear", |backend| async move { backend.clear_scope(scope).await })
            .await;
        drop(guard);
        self.locks.release(scope).await;

        let counts = result?;
        info!(
            scope = %scope,
            records = counts.records,
            batches = counts.batches,
            articles = counts.articles,
            "Scope cleared"
        );
        Ok(counts)
    }

    /// Current storage health. Probes the durable backend but never changes
    /// the active backend.
    pub async fn health(&self) -> StorageHealth {
        let active = self.handle.active();
        let reachable = match &self.durable {
            Some(durable) => durable.ping().await.is_ok(),
            None => false,
        };

        let backend = match (active, &self.durable) {
            (BackendKind::Durable, Some(durable)) => Arc::clone(durable),
            _ => Arc::clone(&self.volatile),
        };
        let counts = match backend.counts().await {
            Ok(counts) => counts,
            Err(e) => {
                warn!(error = %e, "Failed to count stored entities");
                StoredCounts::default()
            }
        };

        StorageHealth {
            active_backend: active,
            durable_configured: self.durable_configured,
            reachable,
            stored_batch_count: counts.batches,
            stored_scope_count: counts.scopes,
            failover_count: self.handle.failover_count(),
        }
    }

    /// Probe the durable backend and, if reachable, make it active again
    pub async fn recheck(&self) -> StorageHealth {
        if let Some(durable) = &self.durable {
            match durable.ping().await {
                Ok(()) => {
                    if self.handle.restore() {
                        info!("Durable storage reachable again, restored as active backend");
                    }
                }
                Err(e) => warn!(error = %e, "Durable storage still unreachable"),
            }
        }
        self.health().await
    }
}
