//! Article listing, stats and scope clearing

use super::scope::RequestScope;
use crate::error::{ApiError, ApiResult};
use crate::storage::{ArticleFilter, ClearCounts, StorageHealth};
use crate::AppState;
use axum::extract::{Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::Duration;
use salescribe_common::models::{Article, DataSummary};
use salescribe_common::time;
use serde::{Deserialize, Serialize};

const DEFAULT_RECENT_DAYS: i64 = 7;
const MAX_RECENT_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecentArticlesResponse {
    pub status: &'static str,
    pub days: i64,
    pub count: usize,
    pub articles: Vec<Article>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub storage: StorageHealth,
    pub data_summary: DataSummary,
    pub recent_articles_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub deleted: ClearCounts,
}

fn recent_filter(days: i64) -> ArticleFilter {
    ArticleFilter::since(time::today() - Duration::days(days))
}

/// GET /articles/recent?days=N
pub async fn recent_articles(
    State(state): State<AppState>,
    RequestScope(scope): RequestScope,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<RecentArticlesResponse>> {
    let days = query.days.unwrap_or(DEFAULT_RECENT_DAYS);
    if !(1..=MAX_RECENT_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_RECENT_DAYS
        )));
    }

    let articles = state.storage.query_articles(&scope, recent_filter(days)).await?;
    Ok(Json(RecentArticlesResponse {
        status: "success",
        days,
        count: articles.len(),
        articles,
    }))
}

/// GET /stats
pub async fn stats(
    State(state): State<AppState>,
    RequestScope(scope): RequestScope,
) -> ApiResult<Json<StatsResponse>> {
    let data_summary = state.storage.summary(&scope).await?;
    let recent = state
        .storage
        .query_articles(&scope, recent_filter(DEFAULT_RECENT_DAYS))
        .await?;

    Ok(Json(StatsResponse {
        status: "success",
        storage: state.storage.health().await,
        data_summary,
        recent_articles_count: recent.len(),
    }))
}

/// DELETE /data
pub async fn clear_data(
    State(state): State<AppState>,
    RequestScope(scope): RequestScope,
) -> ApiResult<Json<ClearResponse>> {
    let deleted = state.storage.clear(&scope).await?;
    Ok(Json(ClearResponse {
        status: "success",
        deleted,
    }))
}

pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/articles/recent", get(recent_articles))
        .route("/stats", get(stats))
        .route("/data", delete(clear_data))
}
