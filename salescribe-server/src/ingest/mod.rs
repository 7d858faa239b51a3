//! Upload ingestion pipeline
//!
//! Raw bytes flow through format detection, column mapping and quality
//! filtering before the accepted rows are persisted as one upload batch.
//! An upload whose fingerprint already exists in the scope is reported as a
//! successful duplicate and stores nothing.

pub mod column_mapper;
pub mod format_detector;
pub mod insights;
pub mod quality_filter;

pub use column_mapper::{map_columns, CanonicalField, ColumnMapping};
pub use format_detector::{detect, DetectedFormat, TextEncoding};
pub use quality_filter::{filter_rows, FilterOutcome};

use crate::storage::{StorageError, StorageGateway};
use salescribe_common::models::{DataSummary, NewUploadBatch, Scope};
use salescribe_common::time;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Batch-level ingestion failures
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("No header: {0}")]
    NoHeader(String),

    #[error("Required column missing: {field}")]
    RequiredColumnMissing { field: &'static str },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Upload as received from a client
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub filename: &'a str,
    pub bytes: &'a [u8],
}

/// Format details reported back to the client
#[derive(Debug, Clone, Serialize)]
pub struct FormatReport {
    pub encoding: TextEncoding,
    pub delimiter: String,
}

/// Outcome of one ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub rows_processed: u64,
    pub rows_stored: u64,
    pub dropped_row_count: u64,
    pub fingerprint: String,
    pub duplicate_upload: bool,
    /// Scope-wide summary after the upload
    pub summary: DataSummary,
    pub insights: Vec<String>,
    pub format: FormatReport,
}

/// Detected, mapped and filtered upload, not yet stored
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub format: DetectedFormat,
    pub outcome: FilterOutcome,
}

/// Run detection, mapping and filtering on a raw buffer
pub fn prepare(bytes: &[u8]) -> Result<PreparedUpload, IngestError> {
    let decoded = detect(bytes)?;
    let mapping = map_columns(&decoded.format.header)?;
    let outcome = filter_rows(&decoded.text, decoded.format.delimiter, &mapping)?;
    Ok(PreparedUpload {
        format: decoded.format,
        outcome,
    })
}

/// Ingestion entry point bound to a storage gateway
pub struct IngestPipeline {
    storage: Arc<StorageGateway>,
}

impl IngestPipeline {
    pub fn new(storage: Arc<StorageGateway>) -> Self {
        Self { storage }
    }

    /// Ingest one upload into `scope`
    pub async fn ingest(&self, scope: &Scope, upload: Upload<'_>) -> Result<IngestReport, IngestError> {
        let bytes = upload.bytes.to_vec();
        let prepared = tokio::task::spawn_blocking(move || prepare(&bytes))
            .await
            .map_err(|e| IngestError::UnreadableFile(format!("parsing task failed: {}", e)))??;

        let format = FormatReport {
            encoding: prepared.format.encoding,
            delimiter: (prepared.format.delimiter as char).to_string(),
        };
        let outcome = prepared.outcome;

        if self
            .storage
            .find_batch(scope, &outcome.fingerprint)
            .await?
            .is_some()
        {
            info!(scope = %scope, fingerprint = %outcome.fingerprint, "Duplicate upload skipped");
            return self.duplicate_report(scope, outcome.fingerprint, format).await;
        }

        let rows_stored = outcome.rows.len() as u64;
        let batch = NewUploadBatch {
            fingerprint: outcome.fingerprint.clone(),
            filename: upload.filename.to_string(),
            row_count: rows_stored,
            received_at: time::now(),
        };

        match self.storage.persist_upload(scope, batch, outcome.rows).await {
            Ok(stored) => {
                info!(
                    scope = %scope,
                    batch_id = stored.id,
                    filename = upload.filename,
                    rows_processed = outcome.rows_processed,
                    rows_stored,
                    dropped = outcome.dropped_row_count,
                    "Upload stored"
                );
            }
            // A concurrent identical upload won the race
            Err(StorageError::ConstraintViolation(msg)) => {
                warn!(scope = %scope, fingerprint = %outcome.fingerprint, error = %msg, "Upload lost race to identical upload");
                return self.duplicate_report(scope, outcome.fingerprint, format).await;
            }
            Err(e) => return Err(e.into()),
        }

        let summary = self.storage.summary(scope).await?;
        let insights = insights::upload_insights(
            outcome.dropped_row_count,
            rows_stored as usize,
            &summary,
        );

        Ok(IngestReport {
            rows_processed: outcome.rows_processed,
            rows_stored,
            dropped_row_count: outcome.dropped_row_count,
            fingerprint: outcome.fingerprint,
            duplicate_upload: false,
            summary,
            insights,
            format,
        })
    }

    async fn duplicate_report(
        &self,
        scope: &Scope,
        fingerprint: String,
        format: FormatReport,
    ) -> Result<IngestReport, IngestError> {
        Ok(IngestReport {
            rows_processed: 0,
            rows_stored: 0,
            dropped_row_count: 0,
            fingerprint,
            duplicate_upload: true,
            summary: self.storage.summary(scope).await?,
            insights: vec![insights::DUPLICATE_UPLOAD_NOTE.to_string()],
            format,
        })
    }
}
