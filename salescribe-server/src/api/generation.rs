//! Article generation endpoint
//!
//! POST /generate-articles, optionally with a multipart `file` that is
//! ingested before generation starts.

use super::scope::RequestScope;
use super::upload::{ingest_file, read_upload, UploadResponse};
use crate::error::{ApiError, ApiResult};
use crate::generation::{AgentOutcome, GenerationReport};
use crate::AppState;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDate;
use salescribe_common::models::{AgentKind, DataSummary};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub kind: &'static str,
    pub message: String,
}

/// One entry per agent kind
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArticleEntry {
    Generated {
        kind: AgentKind,
        id: i64,
        title: String,
        body: String,
        generated_date: NaiveDate,
    },
    Failed {
        kind: AgentKind,
        error: FailureBody,
    },
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub status: &'static str,
    pub articles_generated: usize,
    pub articles: Vec<ArticleEntry>,
    pub generation_date: NaiveDate,
    pub data_summary: DataSummary,
    /// Present when the request carried a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadResponse>,
}

impl GenerationResponse {
    fn new(report: GenerationReport, upload: Option<UploadResponse>) -> Self {
        let articles_generated = report.articles_generated();
        let articles = report
            .results
            .into_iter()
            .map(|(kind, outcome)| match outcome {
                AgentOutcome::Generated(article) => ArticleEntry::Generated {
                    kind,
                    id: article.id,
                    title: article.title,
                    body: article.body,
                    generated_date: article.generated_date,
                },
                AgentOutcome::Failed(failure) => ArticleEntry::Failed {
                    kind,
                    error: FailureBody {
                        kind: failure.tag(),
                        message: failure.to_string(),
                    },
                },
            })
            .collect();

        Self {
            status: "success",
            articles_generated,
            articles,
            generation_date: report.generation_date,
            data_summary: report.data_summary,
            upload,
        }
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

/// POST /generate-articles
pub async fn generate_articles(
    State(state): State<AppState>,
    RequestScope(scope): RequestScope,
    request: Request,
) -> ApiResult<Json<GenerationResponse>> {
    let upload = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        match read_upload(multipart).await? {
            Some(file) => Some(ingest_file(&state, &scope, &file).await?),
            None => None,
        }
    } else {
        None
    };

    let report = state.orchestrator.generate(&scope).await?;
    Ok(Json(GenerationResponse::new(report, upload)))
}

pub fn generation_routes() -> Router<AppState> {
    Router::new().route("/generate-articles", post(generate_articles))
}
