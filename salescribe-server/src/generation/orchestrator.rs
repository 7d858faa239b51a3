//! Fan-out of one generation task per agent kind
//!
//! Tasks share only an `Arc<DataSummary>`. Each task, generation and
//! persistence together, is bounded by its own timeout; there is no overall
//! deadline and no task cancels another.

use super::prompt::{article_title, Prompt};
use super::{AgentFailure, AgentOutcome, GenerationError, GenerationReport, TextGenerator};
use crate::storage::StorageGateway;
use chrono::NaiveDate;
use futures::future::join_all;
use salescribe_common::models::{AgentKind, DataSummary, NewArticle, Scope};
use salescribe_common::time;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct GenerationOrchestrator {
    storage: Arc<StorageGateway>,
    generator: Arc<dyn TextGenerator>,
    task_timeout: Duration,
}

impl GenerationOrchestrator {
    pub fn new(
        storage: Arc<StorageGateway>,
        generator: Arc<dyn TextGenerator>,
        task_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            generator,
            task_timeout,
        }
    }

    /// Generate and store one article per agent kind for `scope`
    ///
    /// # Errors
    /// - [`GenerationError::NoData`] when the scope has no records
    /// - [`GenerationError::Storage`] when the records cannot be read
    ///
    /// Per-agent failures are reported in the returned outcomes.
    pub async fn generate(&self, scope: &Scope) -> Result<GenerationReport, GenerationError> {
        let records = self.storage.query_records(scope).await?;
        if records.is_empty() {
            return Err(GenerationError::NoData);
        }

        let summary = Arc::new(DataSummary::from_rows(records.iter().map(|r| &r.row)));
        drop(records);
        let generation_date = time::today();

        info!(
            scope = %scope,
            record_count = summary.record_count,
            agents = AgentKind::ALL.len(),
            "Starting article generation"
        );

        let handles: Vec<_> = AgentKind::ALL
            .into_iter()
            .map(|kind| {
                let task = AgentTask {
                    kind,
                    scope: scope.clone(),
                    summary: Arc::clone(&summary),
                    generator: Arc::clone(&self.generator),
                    storage: Arc::clone(&self.storage),
                    timeout: self.task_timeout,
                    generation_date,
                };
                (kind, tokio::spawn(task.run()))
            })
            .collect();

        let results = join_all(handles.into_iter().map(|(kind, handle)| async move {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(agent = kind.as_str(), error = %e, "Agent task aborted");
                    AgentOutcome::Failed(AgentFailure::ServiceError(format!(
                        "agent task aborted: {}",
                        e
                    )))
                }
            };
            (kind, outcome)
        }))
        .await;

        let report = GenerationReport {
            generation_date,
            data_summary: DataSummary::clone(&summary),
            results,
        };
        info!(
            scope = %scope,
            generated = report.articles_generated(),
            failed = report.failures().count(),
            "Article generation finished"
        );
        Ok(report)
    }
}

struct AgentTask {
    kind: AgentKind,
    scope: Scope,
    summary: Arc<DataSummary>,
    generator: Arc<dyn TextGenerator>,
    storage: Arc<StorageGateway>,
    timeout: Duration,
    generation_date: NaiveDate,
}

impl AgentTask {
    async fn run(self) -> AgentOutcome {
        match tokio::time::timeout(self.timeout, self.execute()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    agent = self.kind.as_str(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Agent task timed out"
                );
                AgentOutcome::Failed(AgentFailure::Timeout)
            }
        }
    }

    async fn execute(&self) -> AgentOutcome {
        let agent = self.kind.as_str();
        let prompt = Prompt::build(self.kind, &self.summary);
        let started = Instant::now();

        let body = match self.generator.generate(self.kind, &prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!(agent, "Generator returned empty text");
                return AgentOutcome::Failed(AgentFailure::ServiceError(
                    "generator returned empty text".to_string(),
                ));
            }
            Err(failure) => {
                warn!(agent, reason = failure.tag(), error = %failure, "Generation failed");
                return AgentOutcome::Failed(failure);
            }
        };
        debug!(agent, elapsed_ms = started.elapsed().as_millis() as u64, "Text generated");

        let article = NewArticle {
            kind: self.kind,
            title: article_title(self.kind, self.generation_date),
            body,
            generated_date: self.generation_date,
        };
        match self.storage.persist_article(&self.scope, article).await {
            Ok(stored) => AgentOutcome::Generated(stored),
            Err(e) => {
                warn!(agent, scope = %self.scope, error = %e, "Failed to store article");
                AgentOutcome::Failed(AgentFailure::Storage(e.to_string()))
            }
        }
    }
}
