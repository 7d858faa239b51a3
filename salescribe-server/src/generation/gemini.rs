//! Gemini `generateContent` client
//!
//! # API Reference
//! - Endpoint: `{base_url}/models/{model}:generateContent?key=...`
//! - HTTP 429 maps to [`AgentFailure::RateLimited`]

use super::{AgentFailure, Prompt, TextGenerator};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use salescribe_common::config::GenerationConfig;
use salescribe_common::models::AgentKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MAX_OUTPUT_TOKENS: u32 = 800;
const TEMPERATURE: f32 = 0.7;

/// Characters of an error body kept in failure messages
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    max_output_tokens: u32,
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        Some(text).filter(|t| !t.trim().is_empty())
    }
}

pub struct GeminiClient {
    http_client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn request_failure(err: reqwest::Error) -> AgentFailure {
    if err.is_timeout() {
        AgentFailure::Timeout
    } else {
        AgentFailure::ServiceError(format!("request failed: {}", err))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, kind: AgentKind, prompt: &Prompt) -> Result<String, AgentFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AgentFailure::ServiceError(
                "generation API key not configured".to_string(),
            ));
        };

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.render(),
                }],
            }],
            generation_config: GenerationParams {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
                response_mime_type: "text/plain",
            },
        };

        debug!(agent = kind.as_str(), model = %self.model, "Requesting generation");
        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(request_failure)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentFailure::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(AgentFailure::ServiceError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AgentFailure::Timeout
            } else {
                AgentFailure::ServiceError(format!("invalid response: {}", e))
            }
        })?;

        parsed
            .text()
            .ok_or_else(|| AgentFailure::ServiceError("response contained no text".to_string()))
    }
}
