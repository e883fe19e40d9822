// src/llama/mod.rs
pub mod agent;
pub mod client;
pub mod models;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::error::LlamaError;
use models::{ExtractionJob, JobStatus};

/// How an extraction agent is looked up on the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentRef {
    Id(String),
    Name(String),
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRef::Id(id) => write!(f, "id {}", id),
            AgentRef::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

/// The operations the rest of the crate needs from a remote extraction agent.
#[async_trait]
pub trait ExtractionAgent: Send + Sync {
    /// Extract one document, waiting until the structured result is available.
    async fn extract(&self, path: &Path) -> Result<Value, LlamaError>;

    /// Queue every file for extraction. One job per file, each carrying its source path.
    async fn queue_extraction(&self, files: &[PathBuf]) -> Result<Vec<ExtractionJob>, LlamaError>;

    /// Current status of a queued job.
    async fn get_extraction_job(&self, job_id: &str) -> Result<JobStatus, LlamaError>;

    /// Result data of a finished job, `None` when the run carries no data.
    async fn get_extraction_run_for_job(&self, job_id: &str) -> Result<Option<Value>, LlamaError>;
}


#[cfg(test)]
pub mod test_server {
    //! One-shot HTTP responder for exercising the REST client.

    /// Answers a single request with a canned response and hands back the request line.
    pub async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{}", addr), handle)
    }
}
