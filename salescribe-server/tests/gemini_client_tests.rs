//! Gemini client tests against a local mock server

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use salescribe_common::config::{GenerationConfig, ServiceConfig};
use salescribe_common::models::{AgentKind, DataSummary};
use salescribe_server::generation::{AgentFailure, GeminiClient, Prompt, TextGenerator};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const API_KEY: &str = "test-key";

#[derive(Clone)]
struct MockReply {
    status: StatusCode,
    body: Value,
    delay: Duration,
}

async fn mock_generate(
    State(reply): State<MockReply>,
    Query(query): Query<HashMap<String, String>>,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    if query.get("key").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    if request["contents"][0]["parts"][0]["text"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "no prompt"})));
    }
    tokio::time::sleep(reply.delay).await;
    (reply.status, Json(reply.body))
}

/// Start a mock generation service and return its base URL
async fn spawn_mock(reply: MockReply) -> String {
    let app = Router::new().fallback(mock_generate).with_state(reply);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1beta", address)
}

fn client(base_url: String, request_timeout_secs: u64) -> GeminiClient {
    let config = GenerationConfig {
        api_key: Some(API_KEY.to_string()),
        base_url,
        request_timeout_secs,
        ..ServiceConfig::default().generation
    };
    GeminiClient::new(&config).unwrap()
}

fn prompt() -> Prompt {
    Prompt::build(AgentKind::TrendForecaster, &DataSummary::empty())
}

fn reply(status: StatusCode, body: Value) -> MockReply {
    MockReply {
        status,
        body,
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_successful_generation() {
    let base_url = spawn_mock(reply(
        StatusCode::OK,
        json!({"candidates": [{"content": {"parts": [{"text": "Quarterly outlook"}], "role": "model"}}]}),
    ))
    .await;

    let text = client(base_url, 5)
        .generate(AgentKind::TrendForecaster, &prompt())
        .await
        .unwrap();
    assert_eq!(text, "Quarterly outlook");
}

#[tokio::test]
async fn test_rate_limit() {
    let base_url = spawn_mock(reply(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"status": "RESOURCE_EXHAUSTED"}}),
    ))
    .await;

    let err = client(base_url, 5)
        .generate(AgentKind::TrendForecaster, &prompt())
        .await
        .unwrap_err();
    assert_eq!(err, AgentFailure::RateLimited);
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let base_url = spawn_mock(reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "upstream exploded"}),
    ))
    .await;

    let err = client(base_url, 5)
        .generate(AgentKind::TrendForecaster, &prompt())
        .await
        .unwrap_err();
    match err {
        AgentFailure::ServiceError(message) => {
            assert!(message.starts_with("HTTP 500"), "{}", message);
            assert!(message.contains("upstream exploded"));
        }
        other => panic!("unexpected failure: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_candidates() {
    let base_url = spawn_mock(reply(StatusCode::OK, json!({"candidates": []}))).await;

    let err = client(base_url, 5)
        .generate(AgentKind::TrendForecaster, &prompt())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentFailure::ServiceError(_)));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let base_url = spawn_mock(MockReply {
        status: StatusCode::OK,
        body: json!({"candidates": []}),
        delay: Duration::from_secs(5),
    })
    .await;

    let err = client(base_url, 1)
        .generate(AgentKind::TrendForecaster, &prompt())
        .await
        .unwrap_err();
    assert_eq!(err, AgentFailure::Timeout);
}
