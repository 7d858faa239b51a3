//! Text generator test doubles

use async_trait::async_trait;
use salescribe_common::models::AgentKind;
use salescribe_server::generation::{AgentFailure, Prompt, TextGenerator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

/// Generator with per-kind scripted failures
#[derive(Default)]
pub struct ScriptedGenerator {
    failures: HashMap<AgentKind, AgentFailure>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, kind: AgentKind, failure: AgentFailure) -> Self {
        self.failures.insert(kind, failure);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, kind: AgentKind, prompt: &Prompt) -> Result<String, AgentFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.get(&kind) {
            Some(failure) => Err(failure.clone()),
            None => Ok(format!("{} report\n\n{}", kind, prompt.context)),
        }
    }
}

/// Generator whose calls only complete once every agent has started
///
/// A sequential orchestrator would never get past the first call; the wait is
/// bounded so such a failure shows up as timeouts instead of a hang.
pub struct BarrierGenerator {
    barrier: Barrier,
    wait_limit: Duration,
}

impl BarrierGenerator {
    pub fn new() -> Self {
        Self {
            barrier: Barrier::new(AgentKind::ALL.len()),
            wait_limit: Duration::from_secs(5),
        }
    }
}

#[async_trait]
impl TextGenerator for BarrierGenerator {
    async fn generate(&self, kind: AgentKind, _prompt: &Prompt) -> Result<String, AgentFailure> {
        match tokio::time::timeout(self.wait_limit, self.barrier.wait()).await {
            Ok(_) => Ok(format!("{} report", kind)),
            Err(_) => Err(AgentFailure::Timeout),
        }
    }
}
