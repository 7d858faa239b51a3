//! Volatile in-process backend
//!
//! All state sits behind one lock, so every multi-entity write is applied
//! in a single critical section. Contents are lost on restart.

use super::backend::StorageBackend;
use super::{ArticleFilter, ClearCounts, StorageError, StoredCounts};
use async_trait::async_trait;
use salescribe_common::models::{
    Article, NewArticle, NewUploadBatch, Record, SalesRow, Scope, UploadBatch,
};
use salescribe_common::time;
use std::collections::BTreeSet;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    batches: Vec<UploadBatch>,
    records: Vec<Record>,
    articles: Vec<Article>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn find_batch(
        &self,
        scope: &Scope,
        fingerprint: &str,
    ) -> Result<Option<UploadBatch>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .batches
            .iter()
            .find(|b| &b.scope == scope && b.fingerprint == fingerprint)
            .cloned())
    }

    async fn insert_upload(
        &self,
        scope: &Scope,
        batch: &NewUploadBatch,
        rows: &[SalesRow],
    ) -> Result<UploadBatch, StorageError> {
        let mut state = self.state.write().await;

        if state
            .batches
            .iter()
            .any(|b| &b.scope == scope && b.fingerprint == batch.fingerprint)
        {
            return Err(StorageError::ConstraintViolation(format!(
                "upload batch {} already exists in scope {}",
                batch.fingerprint, scope
            )));
        }

        let stored = UploadBatch {
            id: state.allocate_id(),
            scope: scope.clone(),
            fingerprint: batch.fingerprint.clone(),
            filename: batch.filename.clone(),
            row_count: batch.row_count,
            received_at: batch.received_at,
        };

        let created_at = time::now();
        for row in rows {
            let id = state.allocate_id();
            state.records.push(Record {
                id,
                scope: scope.clone(),
                batch_id: stored.id,
                row: row.clone(),
                created_at,
            });
        }
        state.batches.push(stored.clone());

        Ok(stored)
    }

    async fn insert_article(
        &self,
        scope: &Scope,
        article: &NewArticle,
    ) -> Result<Article, StorageError> {
        let mut state = self.state.write().await;
        let stored = Article {
            id: state.allocate_id(),
            scope: scope.clone(),
            kind: article.kind,
            title: article.title.clone(),
            body: article.body.clone(),
            generated_date: article.generated_date,
            created_at: time::now(),
        };
        state.articles.push(stored.clone());
        Ok(stored)
    }

    async fn records(&self, scope: &Scope) -> Result<Vec<Record>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|r| &r.scope == scope)
            .cloned()
            .collect())
    }

    async fn articles(
        &self,
        scope: &Scope,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, StorageError> {
        let state = self.state.read().await;
        let mut articles: Vec<Article> = state
            .articles
            .iter()
            .filter(|a| &a.scope == scope && filter.matches(a))
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(articles)
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<ClearCounts, StorageError> {
        let mut state = self.state.write().await;

        let before = (state.records.len(), state.batches.len(), state.articles.len());
        state.records.retain(|r| &r.scope != scope);
        state.batches.retain(|b| &b.scope != scope);
        state.articles.retain(|a| &a.scope != scope);

        Ok(ClearCounts {
            records: (before.0 - state.records.len()) as u64,
            batches: (before.1 - state.batches.len()) as u64,
            articles: (before.2 - state.articles.len()) as u64,
        })
    }

    async fn counts(&self) -> Result<StoredCounts, StorageError> {
        let state = self.state.read().await;
        let scopes: BTreeSet<&Scope> = state
            .batches
            .iter()
            .map(|b| &b.scope)
            .chain(state.articles.iter().map(|a| &a.scope))
            .collect();
        Ok(StoredCounts {
            batches: state.batches.len() as u64,
            scopes: scopes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use salescribe_common::models::AgentKind;

    fn batch(fingerprint: &str) -> NewUploadBatch {
        NewUploadBatch {
            fingerprint: fingerprint.to_string(),
            filename: "sales.csv".to_string(),
            row_count: 1,
            received_at: time::now(),
        }
    }

    fn row() -> SalesRow {
        SalesRow {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            product: "Widget".to_string(),
            category: "Hardware".to_string(),
            amount: Decimal::new(1050, 2),
            quantity: 1,
            region: "North".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_batch_rejected_per_scope() {
        let backend = MemoryBackend::new();
        let a = Scope::parse("a").unwrap();
        let b = Scope::parse("b").unwrap();

        backend.insert_upload(&a, &batch("f1"), &[row()]).await.unwrap();
        let err = backend.insert_upload(&a, &batch("f1"), &[row()]).await.unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
        assert_eq!(backend.records(&a).await.unwrap().len(), 1);

        backend.insert_upload(&b, &batch("f1"), &[row()]).await.unwrap();
        assert_eq!(backend.counts().await.unwrap().scopes, 2);
    }

    #[tokio::test]
    async fn test_clear_only_touches_scope() {
        let backend = MemoryBackend::new();
        let a = Scope::parse("a").unwrap();
        let b = Scope::parse("b").unwrap();

        backend.insert_upload(&a, &batch("f1"), &[row(), row()]).await.unwrap();
        backend.insert_upload(&b, &batch("f2"), &[row()]).await.unwrap();
        backend
            .insert_article(
                &a,
                &NewArticle {
                    kind: AgentKind::ExecutiveBriefer,
                    title: "t".to_string(),
                    body: "b".to_string(),
                    generated_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                },
            )
            .await
            .unwrap();

        let counts = backend.clear_scope(&a).await.unwrap();
        assert_eq!(
            counts,
            ClearCounts {
                records: 2,
                batches: 1,
                articles: 1
            }
        );
        assert!(backend.records(&a).await.unwrap().is_empty());
        assert_eq!(backend.records(&b).await.unwrap().len(), 1);
    }
}
