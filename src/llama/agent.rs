// src/llama/agent.rs
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::llama::client::{LlamaClient, RemoteAgent};
use crate::llama::models::{ExtractionJob, JobStatus};
use crate::llama::{AgentRef, ExtractionAgent};
use crate::utils::error::LlamaError;

/// An agent reference that is looked up once and then reused.
///
/// Constructing it never touches the network. `warm_up` resolves it at
/// startup; when that fails (a missing API key, say) the error is only
/// logged, and the first real call tries again and reports it. A failed
/// lookup is never cached.
pub struct AgentHandle {
    client: Arc<LlamaClient>,
    reference: AgentRef,
    resolved: OnceCell<RemoteAgent>,
}

impl AgentHandle {
    pub fn new(client: Arc<LlamaClient>, reference: AgentRef) -> Self {
        Self {
            client,
            reference,
            resolved: OnceCell::new(),
        }
    }

    pub fn reference(&self) -> &AgentRef {
        &self.reference
    }

    pub async fn resolve(&self) -> Result<&RemoteAgent, LlamaError> {
        self.resolved
            .get_or_try_init(|| RemoteAgent::resolve(self.client.clone(), &self.reference))
            .await
    }

    pub async fn warm_up(&self) {
        match self.resolve().await {
            Ok(agent) => tracing::debug!("Agent {} ready", agent.info()),
            Err(e) => tracing::warn!("Could not resolve agent {} at startup: {}", self.reference, e),
        }
    }
}

#[async_trait]
impl ExtractionAgent for AgentHandle {
    async fn extract(&self, path: &Path) -> Result<Value, LlamaError> {
        // Reading the file first keeps a bad path from costing a lookup.
        if !path.is_file() {
            return Err(LlamaError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a readable file"),
            });
        }
        self.resolve().await?.extract(path).await
    }

    async fn queue_extraction(&self, files: &[PathBuf]) -> Result<Vec<ExtractionJob>, LlamaError> {
        self.resolve().await?.queue_extraction(files).await
    }

    async fn get_extraction_job(&self, job_id: &str) -> Result<JobStatus, LlamaError> {
        self.resolve().await?.get_extraction_job(job_id).await
    }

    async fn get_extraction_run_for_job(&self, job_id: &str) -> Result<Option<Value>, LlamaError> {
        self.resolve().await?.get_extraction_run_for_job(job_id).await
    }
}
