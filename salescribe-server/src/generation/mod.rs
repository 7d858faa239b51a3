//! Concurrent article generation
//!
//! One task per [`AgentKind`] runs against a shared read-only
//! [`DataSummary`]. A task's failure is recorded as that agent's outcome and
//! never affects its siblings.

pub mod gemini;
pub mod orchestrator;
pub mod personas;
pub mod prompt;

pub use gemini::GeminiClient;
pub use orchestrator::GenerationOrchestrator;
pub use prompt::Prompt;

use crate::storage::StorageError;
use async_trait::async_trait;
use chrono::NaiveDate;
use salescribe_common::models::{AgentKind, Article, DataSummary};
use thiserror::Error;

/// Why one agent produced no article
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentFailure {
    #[error("generation service rate limit reached")]
    RateLimited,

    #[error("generation timed out")]
    Timeout,

    #[error("generation service error: {0}")]
    ServiceError(String),

    /// Text was generated but could not be stored
    #[error("failed to store article: {0}")]
    Storage(String),
}

impl AgentFailure {
    /// Stable tag used in responses
    pub fn tag(&self) -> &'static str {
        match self {
            AgentFailure::RateLimited => "rate_limited",
            AgentFailure::Timeout => "timeout",
            AgentFailure::ServiceError(_) => "service_error",
            AgentFailure::Storage(_) => "storage_error",
        }
    }
}

/// External text generation capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, kind: AgentKind, prompt: &Prompt) -> Result<String, AgentFailure>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    Generated(Article),
    Failed(AgentFailure),
}

impl AgentOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, AgentOutcome::Generated(_))
    }
}

/// Result of one generation run, one entry per kind in [`AgentKind::ALL`] order
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub generation_date: NaiveDate,
    pub data_summary: DataSummary,
    pub results: Vec<(AgentKind, AgentOutcome)>,
}

impl GenerationReport {
    pub fn articles_generated(&self) -> usize {
        self.results.iter().filter(|(_, o)| o.is_generated()).count()
    }

    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.results.iter().filter_map(|(_, outcome)| match outcome {
            AgentOutcome::Generated(article) => Some(article),
            AgentOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (AgentKind, &AgentFailure)> {
        self.results.iter().filter_map(|(kind, outcome)| match outcome {
            AgentOutcome::Failed(failure) => Some((*kind, failure)),
            AgentOutcome::Generated(_) => None,
        })
    }
}

/// Run-level generation failures
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No data available for generation, upload data first")]
    NoData,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
