//! Storage backend test doubles and fixtures

use async_trait::async_trait;
use salescribe_common::models::{
    Article, NewArticle, NewUploadBatch, Record, SalesRow, Scope, UploadBatch,
};
use salescribe_server::storage::{
    ArticleFilter, ClearCounts, MemoryBackend, SqliteBackend, StorageBackend,
    StorageError, StorageGateway, StoredCounts,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Wraps a backend, counting calls and optionally simulating an outage
pub struct ProbeBackend {
    inner: Arc<dyn StorageBackend>,
    down: AtomicBool,
    reject_articles: AtomicBool,
    calls: AtomicUsize,
}

impl ProbeBackend {
    pub fn new(inner: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
            reject_articles: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// While down, every operation fails with a connectivity error
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// While set, article inserts fail with an internal error
    pub fn set_reject_articles(&self, reject: bool) {
        self.reject_articles.store(reject, Ordering::SeqCst);
    }

    /// Operations attempted, pings excluded
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            Err(StorageError::Connectivity("probe backend is down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageBackend for ProbeBackend {
    async fn ping(&self) -> Result<(), StorageError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StorageError::Connectivity("probe backend is down".to_string()));
        }
        self.inner.ping().await
    }

    async fn find_batch(
        &self,
        scope: &Scope,
        fingerprint: &str,
    ) -> Result<Option<UploadBatch>, StorageError> {
        self.enter()?;
        self.inner.find_batch(scope, fingerprint).await
    }

    async fn insert_upload(
        &self,
        scope: &Scope,
        batch: &NewUploadBatch,
        rows: &[SalesRow],
    ) -> Result<UploadBatch, StorageError> {
        self.enter()?;
        self.inner.insert_upload(scope, batch, rows).await
    }

    async fn insert_article(
        &self,
        scope: &Scope,
        article: &NewArticle,
    ) -> Result<Article, StorageError> {
        self.enter()?;
        if self.reject_articles.load(Ordering::SeqCst) {
            return Err(StorageError::Internal("article insert rejected".to_string()));
        }
        self.inner.insert_article(scope, article).await
    }

    async fn records(&self, scope: &Scope) -> Result<Vec<Record>, StorageError> {
        self.enter()?;
        self.inner.records(scope).await
    }

    async fn articles(
        &self,
        scope: &Scope,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, StorageError> {
        self.enter()?;
        self.inner.articles(scope, filter).await
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<ClearCounts, StorageError> {
        self.enter()?;
        self.inner.clear_scope(scope).await
    }

    async fn counts(&self) -> Result<StoredCounts, StorageError> {
        self.inner.counts().await
    }
}

/// Gateway over a file-backed SQLite durable backend and a memory volatile
/// backend, both wrapped in probes
pub struct DurableFixture {
    pub dir: TempDir,
    pub sqlite: Arc<SqliteBackend>,
    pub durable: Arc<ProbeBackend>,
    pub volatile: Arc<ProbeBackend>,
    pub gateway: Arc<StorageGateway>,
}

pub async fn durable_gateway() -> DurableFixture {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("salescribe.db").display());
    let sqlite = Arc::new(
        SqliteBackend::connect(&url, 4, Duration::from_secs(2))
            .await
            .unwrap(),
    );
    let durable = Arc::new(ProbeBackend::new(sqlite.clone()));
    let volatile = Arc::new(ProbeBackend::memory());
    let gateway = Arc::new(StorageGateway::new(
        Some(durable.clone() as Arc<dyn StorageBackend>),
        volatile.clone() as Arc<dyn StorageBackend>,
    ));

    DurableFixture {
        dir,
        sqlite,
        durable,
        volatile,
        gateway,
    }
}
