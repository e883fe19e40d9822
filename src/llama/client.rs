// src/llama/client.rs
use async_trait::async_trait;
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::llama::models::{
    display_name, AgentInfo, CreateJobRequest, ExtractionJob, ExtractionRun, JobRecord, JobStatus,
    UploadedFile,
};
use crate::llama::{AgentRef, ExtractionAgent};
use crate::utils::config::Settings;
use crate::utils::error::LlamaError;

const USER_AGENT: &str = concat!("termsheet-extractor/", env!("CARGO_PKG_VERSION"));
// Status checks while a single `extract` call waits on its job.
const EXTRACT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Thin REST client for the LlamaCloud extraction API.
pub struct LlamaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LlamaClient {
    pub fn new(settings: &Settings) -> Result<Self, LlamaError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Sends the request and decodes a JSON body, mapping error statuses.
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T, LlamaError> {
        let response = builder.send().await?;
        let response = check_status(response, what).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| LlamaError::Parse(format!("{}: {}", what, e)))
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>, LlamaError> {
        tracing::debug!("Listing extraction agents");
        self.send_json(
            self.request(Method::GET, "extraction/extraction-agents"),
            "extraction agents",
        )
        .await
    }

    pub async fn get_agent_info(&self, agent: &AgentRef) -> Result<AgentInfo, LlamaError> {
        let (path, what) = match agent {
            AgentRef::Id(id) => (
                format!("extraction/extraction-agents/{}", id),
                format!("extraction agent with id {}", id),
            ),
            AgentRef::Name(name) => (
                format!("extraction/extraction-agents/by-name/{}", urlencoding::encode(name)),
                format!("extraction agent named '{}'", name),
            ),
        };
        let info: AgentInfo = self.send_json(self.request(Method::GET, &path), &what).await?;
        tracing::info!("Resolved extraction agent {}", info);
        Ok(info)
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile, LlamaError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| LlamaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Uploading {} ({} bytes)", path.display(), bytes.len());

        let part = multipart::Part::bytes(bytes)
            .file_name(display_name(path))
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("upload_file", part);

        self.send_json(
            self.request(Method::POST, "files").multipart(form),
            &format!("upload of {}", path.display()),
        )
        .await
    }

    async fn create_job(&self, agent_id: &str, file_id: &str) -> Result<JobRecord, LlamaError> {
        let body = CreateJobRequest {
            extraction_agent_id: agent_id,
            file_id,
        };
        self.send_json(
            self.request(Method::POST, "extraction/jobs").json(&body),
            "extraction job creation",
        )
        .await
    }

    async fn get_job(&self, job_id: &str) -> Result<JobRecord, LlamaError> {
        self.send_json(
            self.request(Method::GET, &format!("extraction/jobs/{}", job_id)),
            &format!("extraction job {}", job_id),
        )
        .await
    }

    async fn get_run_for_job(&self, job_id: &str) -> Result<ExtractionRun, LlamaError> {
        self.send_json(
            self.request(Method::GET, &format!("extraction/runs/by-job/{}", job_id)),
            &format!("extraction run for job {}", job_id),
        )
        .await
    }
}

/// Maps non-2xx responses onto `LlamaError`, keeping the service's message.
async fn check_status(response: Response, what: &str) -> Result<Response, LlamaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("HTTP error status {} for {}: {}", status, what, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(LlamaError::Unauthorized(status, body)),
        StatusCode::NOT_FOUND => Err(LlamaError::NotFound {
            what: what.to_string(),
            body,
        }),
        _ => Err(LlamaError::Http(status, body)),
    }
}

/// A resolved agent bound to the client that found it.
pub struct RemoteAgent {
    info: AgentInfo,
    client: Arc<LlamaClient>,
}

impl RemoteAgent {
    pub async fn resolve(client: Arc<LlamaClient>, agent: &AgentRef) -> Result<Self, LlamaError> {
        let info = client.get_agent_info(agent).await?;
        Ok(Self { info, client })
    }

    pub fn info(&self) -> &AgentInfo {
        &self.info
    }

    async fn submit(&self, path: &Path) -> Result<JobRecord, LlamaError> {
        let file = self.client.upload_file(path).await?;
        let job = self.client.create_job(&self.info.id, &file.id).await?;
        tracing::debug!("Created extraction job {} for {}", job.id, path.display());
        Ok(job)
    }
}

#[async_trait]
impl ExtractionAgent for RemoteAgent {
    async fn extract(&self, path: &Path) -> Result<Value, LlamaError> {
        tracing::info!("Extracting {} with agent {}", path.display(), self.info);
        let job = self.submit(path).await?;

        loop {
            let record = self.client.get_job(&job.id).await?;
            match JobStatus::from_remote(&record.status) {
                JobStatus::Completed => break,
                JobStatus::Failed => {
                    return Err(LlamaError::JobFailed {
                        job_id: record.id,
                        message: record.error.unwrap_or(record.status),
                    })
                }
                JobStatus::Queued => tokio::time::sleep(EXTRACT_POLL_INTERVAL).await,
            }
        }

        let run = self.client.get_run_for_job(&job.id).await?;
        Ok(run.data.unwrap_or(Value::Null))
    }

    async fn queue_extraction(&self, files: &[PathBuf]) -> Result<Vec<ExtractionJob>, LlamaError> {
        let mut jobs = Vec::with_capacity(files.len());
        for file in files {
            let record = self.submit(file).await?;
            let mut job = ExtractionJob::new(record.id, file.clone());
            job.status = JobStatus::from_remote(&record.status);
            jobs.push(job);
        }
        Ok(jobs)
    }

    async fn get_extraction_job(&self, job_id: &str) -> Result<JobStatus, LlamaError> {
        let record = self.client.get_job(job_id).await?;
        let status = JobStatus::from_remote(&record.status);
        tracing::debug!("Job {} is {} ({})", job_id, status, record.status);
        Ok(status)
    }

    async fn get_extraction_run_for_job(&self, job_id: &str) -> Result<Option<Value>, LlamaError> {
        let run = self.client.get_run_for_job(job_id).await?;
        Ok(run.data)
    }
}
