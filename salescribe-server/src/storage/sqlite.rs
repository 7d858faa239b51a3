//! Durable backend on SQLite via sqlx
//!
//! Amounts are stored as decimal text so they round-trip exactly.

use super::backend::StorageBackend;
use super::{ArticleFilter, ClearCounts, StorageError, StoredCounts};
use async_trait::async_trait;
use rust_decimal::Decimal;
use salescribe_common::models::{
    AgentKind, Article, NewArticle, NewUploadBatch, Record, SalesRow, Scope, UploadBatch,
};
use salescribe_common::time;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

/// SQLite busy_timeout per connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (creating if missing) the database at `url` and ensure the schema
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        // Every in-memory connection is its own database
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = if in_memory {
            options
        } else {
            options.journal_mode(SqliteJournalMode::Wal)
        };
        let pool_options = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
        let pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections)
        };

        tracing::debug!(url, max_connections, in_memory, "Opening durable storage");
        let pool = pool_options.connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and ensure the schema
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        init_tables(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn init_tables(pool: &SqlitePool) -> Result<(), StorageError> {
    // (id, scope) is unique so records can reference both
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS upload_batches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            filename TEXT NOT NULL,
            row_count INTEGER NOT NULL CHECK (row_count >= 0),
            received_at TEXT NOT NULL,
            UNIQUE (scope, fingerprint),
            UNIQUE (id, scope)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope TEXT NOT NULL,
            batch_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            product TEXT NOT NULL,
            category TEXT NOT NULL,
            amount TEXT NOT NULL CHECK (CAST(amount AS REAL) >= 0),
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            region TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (batch_id, scope) REFERENCES upload_batches (id, scope) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_scope ON records (scope)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope TEXT NOT NULL,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            generated_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_articles_scope_date ON articles (scope, generated_date)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (upload_batches, records, articles)");
    Ok(())
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> StorageError {
    StorageError::Corrupt(format!("{}: {}", what, err))
}

fn scope_column(row: &SqliteRow) -> Result<Scope, StorageError> {
    let raw: String = row.try_get("scope")?;
    Scope::parse(&raw).map_err(|e| corrupt("scope", e))
}

fn batch_from_row(row: &SqliteRow) -> Result<UploadBatch, StorageError> {
    let row_count: i64 = row.try_get("row_count")?;
    Ok(UploadBatch {
        id: row.try_get("id")?,
        scope: scope_column(row)?,
        fingerprint: row.try_get("fingerprint")?,
        filename: row.try_get("filename")?,
        row_count: u64::try_from(row_count).map_err(|e| corrupt("row_count", e))?,
        received_at: row.try_get("received_at")?,
    })
}

fn record_from_row(row: &SqliteRow) -> Result<Record, StorageError> {
    let amount: String = row.try_get("amount")?;
    let quantity: i64 = row.try_get("quantity")?;
    Ok(Record {
        id: row.try_get("id")?,
        scope: scope_column(row)?,
        batch_id: row.try_get("batch_id")?,
        row: SalesRow {
            date: row.try_get("date")?,
            product: row.try_get("product")?,
            category: row.try_get("category")?,
            amount: Decimal::from_str(&amount).map_err(|e| corrupt("amount", e))?,
            quantity: u32::try_from(quantity).map_err(|e| corrupt("quantity", e))?,
            region: row.try_get("region")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn article_from_row(row: &SqliteRow) -> Result<Article, StorageError> {
    let kind: String = row.try_get("kind")?;
    Ok(Article {
        id: row.try_get("id")?,
        scope: scope_column(row)?,
        kind: AgentKind::from_str(&kind).map_err(|e| corrupt("kind", e))?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        generated_date: row.try_get("generated_date")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_batch(
        &self,
        scope: &Scope,
        fingerprint: &str,
    ) -> Result<Option<UploadBatch>, StorageError> {
        let row = sqlx::query(
            "SELECT id, scope, fingerprint, filename, row_count, received_at
             FROM upload_batches WHERE scope = ? AND fingerprint = ?",
        )
        .bind(scope.as_str())
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(batch_from_row).transpose()
    }

    async fn insert_upload(
        &self,
        scope: &Scope,
        batch: &NewUploadBatch,
        rows: &[SalesRow],
    ) -> Result<UploadBatch, StorageError> {
        let row_count =
            i64::try_from(batch.row_count).map_err(|e| StorageError::Internal(e.to_string()))?;
        let mut tx = self.pool.begin().await?;

        let batch_id = sqlx::query(
            "INSERT INTO upload_batches (scope, fingerprint, filename, row_count, received_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(scope.as_str())
        .bind(&batch.fingerprint)
        .bind(&batch.filename)
        .bind(row_count)
        .bind(batch.received_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let created_at = time::now();
        for row in rows {
            sqlx::query(
                "INSERT INTO records
                 (scope, batch_id, date, product, category, amount, quantity, region, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(scope.as_str())
            .bind(batch_id)
            .bind(row.date)
            .bind(&row.product)
            .bind(&row.category)
            .bind(row.amount.to_string())
            .bind(i64::from(row.quantity))
            .bind(&row.region)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(UploadBatch {
            id: batch_id,
            scope: scope.clone(),
            fingerprint: batch.fingerprint.clone(),
            filename: batch.filename.clone(),
            row_count: batch.row_count,
            received_at: batch.received_at,
        })
    }

    async fn insert_article(
        &self,
        scope: &Scope,
        article: &NewArticle,
    ) -> Result<Article, StorageError> {
        let created_at = time::now();
        let id = sqlx::query(
            "INSERT INTO articles (scope, kind, title, body, generated_date, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(scope.as_str())
        .bind(article.kind.as_str())
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.generated_date)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Article {
            id,
            scope: scope.clone(),
            kind: article.kind,
            title: article.title.clone(),
            body: article.body.clone(),
            generated_date: article.generated_date,
            created_at,
        })
    }

    async fn records(&self, scope: &Scope) -> Result<Vec<Record>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, scope, batch_id, date, product, category, amount, quantity, region, created_at
             FROM records WHERE scope = ? ORDER BY id",
        )
        .bind(scope.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn articles(
        &self,
        scope: &Scope,
        filter: &ArticleFilter,
    ) -> Result<Vec<Article>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, scope, kind, title, body, generated_date, created_at
             FROM articles
             WHERE scope = ? AND generated_date >= COALESCE(?, generated_date)
             ORDER BY created_at DESC, id DESC",
        )
        .bind(scope.as_str())
        .bind(filter.since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(article_from_row).collect()
    }

    async fn clear_scope(&self, scope: &Scope) -> Result<ClearCounts, StorageError> {
        let mut tx = self.pool.begin().await?;

        let records = sqlx::query("DELETE FROM records WHERE scope = ?")
            .bind(scope.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let batches = sqlx::query("DELETE FROM upload_batches WHERE scope = ?")
            .bind(scope.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let articles = sqlx::query("DELETE FROM articles WHERE scope = ?")
            .bind(scope.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(ClearCounts {
            records,
            batches,
            articles,
        })
    }

    async fn counts(&self) -> Result<StoredCounts, StorageError> {
        let batches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM upload_batches")
            .fetch_one(&self.pool)
            .await?;
        let scopes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM (SELECT scope FROM upload_batches UNION SELECT scope FROM articles)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoredCounts {
            batches: batches.max(0) as u64,
            scopes: scopes.max(0) as u64,
        })
    }
}
