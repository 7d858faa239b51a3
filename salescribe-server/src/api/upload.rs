//! Upload endpoint
//!
//! POST /upload-data with a multipart `file` field holding a `.csv` file.

use super::scope::RequestScope;
use crate::error::{ApiError, ApiResult};
use crate::ingest::{FormatReport, IngestReport, Upload};
use crate::AppState;
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use salescribe_common::models::DataSummary;
use serde::Serialize;

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub rows_processed: u64,
    pub rows_stored: u64,
    pub dropped_row_count: u64,
    pub fingerprint: String,
    pub duplicate_upload: bool,
    pub summary: DataSummary,
    pub insights: Vec<String>,
    pub format: FormatReport,
}

impl From<IngestReport> for UploadResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            status: "success",
            rows_processed: report.rows_processed,
            rows_stored: report.rows_stored,
            dropped_row_count: report.dropped_row_count,
            fingerprint: report.fingerprint,
            duplicate_upload: report.duplicate_upload,
            summary: report.summary,
            insights: report.insights,
            format: report.format,
        }
    }
}

/// File pulled out of a multipart body
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Read the `file` field of a multipart body, validating name and content
///
/// Returns `None` when the body has no `file` field.
pub async fn read_upload(mut multipart: Multipart) -> ApiResult<Option<UploadedFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(ApiError::BadRequest(
                "only CSV files are supported".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
        }

        return Ok(Some(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// Ingest an uploaded file into the request scope
pub async fn ingest_file(
    state: &AppState,
    scope: &salescribe_common::models::Scope,
    file: &UploadedFile,
) -> ApiResult<UploadResponse> {
    let report = state
        .ingest
        .ingest(
            scope,
            Upload {
                filename: &file.filename,
                bytes: &file.bytes,
            },
        )
        .await?;
    Ok(report.into())
}

/// POST /upload-data
pub async fn upload_data(
    State(state): State<AppState>,
    RequestScope(scope): RequestScope,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let file = read_upload(multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("missing multipart field '{}'", FILE_FIELD)))?;

    tracing::info!(scope = %scope, filename = %file.filename, bytes = file.bytes.len(), "Upload received");
    Ok(Json(ingest_file(&state, &scope, &file).await?))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload-data", post(upload_data))
}
