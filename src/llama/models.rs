// src/llama/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// An extraction agent as listed by `GET /api/v1/extraction/extraction-agents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
}

impl fmt::Display for AgentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Response of `POST /api/v1/files`.
#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub id: String,
}

/// Body of `POST /api/v1/extraction/jobs`.
#[derive(Debug, Serialize)]
pub struct CreateJobRequest<'a> {
    pub extraction_agent_id: &'a str,
    pub file_id: &'a str,
}

/// A job as returned by the create and status endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /api/v1/extraction/runs/by-job/{job_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRun {
    #[serde(default)]
    pub data: Option<Value>,
}

/// Remote job state, collapsed to what callers act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Completed,
    Failed,
}

impl JobStatus {
    /// Maps the service's status strings. Anything not known to be finished
    /// is treated as still queued.
    pub fn from_remote(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "SUCCESS" | "PARTIAL_SUCCESS" | "COMPLETED" => JobStatus::Completed,
            "ERROR" | "FAILED" | "CANCELLED" => JobStatus::Failed,
            _ => JobStatus::Queued,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Handle for one queued document. The source path travels with the job so
/// results are matched to files by identity, not by list position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionJob {
    pub id: String,
    pub source: PathBuf,
    pub status: JobStatus,
}

impl ExtractionJob {
    pub fn new(id: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            status: JobStatus::Queued,
        }
    }

    pub fn source_name(&self) -> String {
        display_name(&self.source)
    }
}

/// File name component of a path, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_statuses_map_to_three_states() {
        assert_eq!(JobStatus::from_remote("PENDING"), JobStatus::Queued);
        assert_eq!(JobStatus::from_remote("SUCCESS"), JobStatus::Completed);
        assert_eq!(JobStatus::from_remote("PARTIAL_SUCCESS"), JobStatus::Completed);
        assert_eq!(JobStatus::from_remote("ERROR"), JobStatus::Failed);
        assert_eq!(JobStatus::from_remote("cancelled"), JobStatus::Failed);
        assert_eq!(JobStatus::from_remote("SOMETHING_NEW"), JobStatus::Queued);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn job_record_tolerates_extra_fields() {
        let json = r#"{"id":"job-1","status":"PENDING","extraction_agent":{"id":"a"},"file":{"id":"f"}}"#;
        let job: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "job-1");
        assert!(job.error.is_none());
    }

    #[test]
    fn new_job_starts_queued_with_its_source() {
        let job = ExtractionJob::new("job-9", "/data/in/Note A.pdf");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.source_name(), "Note A.pdf");
    }
}
