//! Backend abstraction implemented by the durable and volatile stores

use super::{ArticleFilter, ClearCounts, StorageError, StoredCounts};
use async_trait::async_trait;
use salescribe_common::models::{
    Article, NewArticle, NewUploadBatch, Record, SalesRow, Scope, UploadBatch,
};

/// Scope-qualified persistence operations
///
/// Every method touches only entities of the given scope. Multi-entity
/// writes (`insert_upload`, `clear_scope`) are all-or-nothing.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Cheap reachability probe
    async fn ping(&self) -> Result<(), StorageError>;

    async fn find_batch(
        &self,
        scope: &Scope,
        fingerprint: &str,
    ) -> Result<Option<UploadBatch>, StorageError>;

    /// Insert a batch and its rows together
    ///
    /// # Errors
    /// [`StorageError::ConstraintViolation`] if `(scope, fingerprint)` exists
    async fn insert_upload(
        &self,
        scope: &Scope,
        batch: &NewUploadBatch,
        rows: &[SalesRow],
    ) -> Result<UploadBatch, StorageError>;

    async fn insert_article(
        &self,
        scope: &Scope,
        article: &NewArticle,
    ) -> Result<Article, StorageError>;

    /// Records in insertion order
    async fn records(&self, scope: &Scope) -> Result<Vec<Record>, StorageError>;

    /// Articles, newest first
    async fn articles(
        &self,
        scope: &Scope,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, StorageError>;

    /// Remove every record, batch and article of the scope
    async fn clear_scope(&self, scope: &Scope) -> Result<ClearCounts, StorageError>;

    /// Totals across all scopes
    async fn counts(&self) -> Result<StoredCounts, StorageError>;
}
