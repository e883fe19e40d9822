// src/batch/mod.rs
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llama::models::{ExtractionJob, JobStatus};
use crate::llama::ExtractionAgent;
use crate::storage::StorageManager;
use crate::utils::AppError;

pub const DEFAULT_OUTPUT_SUBDIR: &str = "extracted_data";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// How job statuses are polled until the batch is done.
///
/// The default waits forever at a fixed 3 second interval.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Number of status sweeps before giving up; `None` waits indefinitely.
    pub max_attempts: Option<u32>,
    /// Multiplier applied to the interval after each sweep; 1.0 keeps it fixed.
    pub backoff: f64,
    /// Upper bound for the backed-off interval.
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            backoff: 1.0,
            max_interval: Duration::from_secs(60),
        }
    }
}

impl PollPolicy {
    /// Delay to wait after the given (zero-based) sweep.
    pub fn delay_after(&self, sweep: u32) -> Duration {
        let factor = self.backoff.max(1.0).powi(sweep.min(i32::MAX as u32) as i32);
        let delay = self.interval.mul_f64(factor.min(1e6));
        delay.min(self.max_interval.max(self.interval))
    }
}

#[derive(Debug)]
pub enum BatchOutcome {
    /// The input directory held no PDFs; nothing was submitted or written.
    NoInputs,
    Completed(BatchReport),
}

#[derive(Debug)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub saved: Vec<PathBuf>,
    /// Jobs whose run came back without data.
    pub empty: usize,
    /// Jobs the service reported as failed.
    pub failed_jobs: usize,
    /// Jobs whose result could not be fetched or written.
    pub fetch_errors: usize,
    /// Jobs still unfinished when the attempt limit was reached.
    pub timed_out: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// `<input_dir>/extracted_data`
pub fn default_output_dir(input_dir: &Path) -> PathBuf {
    input_dir.join(DEFAULT_OUTPUT_SUBDIR)
}

/// Lists regular files directly inside `dir` whose extension is `pdf` in any
/// case, sorted by file name.
pub fn discover_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Drives one directory of term sheets through the extraction service.
pub struct BatchOrchestrator<'a, A: ExtractionAgent + ?Sized> {
    agent: &'a A,
    policy: PollPolicy,
}

impl<'a, A: ExtractionAgent + ?Sized> BatchOrchestrator<'a, A> {
    pub fn new(agent: &'a A, policy: PollPolicy) -> Self {
        Self { agent, policy }
    }

    pub async fn run(&self, input_dir: &Path, output_dir: Option<&Path>) -> Result<BatchOutcome, AppError> {
        let started_at = Utc::now();

        let pdf_files = discover_pdfs(input_dir)?;
        if pdf_files.is_empty() {
            tracing::info!("No PDF files found in {}", input_dir.display());
            return Ok(BatchOutcome::NoInputs);
        }
        tracing::info!("Found {} PDF files to process", pdf_files.len());

        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_dir(input_dir));
        let storage = StorageManager::new(&output_dir)?;

        let mut jobs = self.agent.queue_extraction(&pdf_files).await?;
        tracing::info!("Queued {} extraction jobs", jobs.len());

        let failed_jobs = self.wait_for_jobs(&mut jobs).await;

        let mut report = BatchReport {
            output_dir,
            saved: Vec::new(),
            empty: 0,
            failed_jobs,
            fetch_errors: 0,
            timed_out: 0,
            started_at,
            finished_at: started_at,
        };
        self.persist_results(&jobs, &storage, &mut report).await;
        report.finished_at = Utc::now();

        tracing::info!(
            "Batch finished. Saved: {}, Empty: {}, Failed jobs: {}, Fetch errors: {}, Timed out: {}",
            report.saved.len(),
            report.empty,
            report.failed_jobs,
            report.fetch_errors,
            report.timed_out
        );
        Ok(BatchOutcome::Completed(report))
    }

    /// Re-checks every job each sweep until all are terminal or the attempt
    /// limit runs out. Returns the number of failed jobs.
    async fn wait_for_jobs(&self, jobs: &mut [ExtractionJob]) -> usize {
        let total = jobs.len();
        let mut reported_failures: HashSet<String> = HashSet::new();
        let mut sweep: u32 = 0;

        loop {
            let mut completed = 0;
            for job in jobs.iter_mut() {
                match self.agent.get_extraction_job(&job.id).await {
                    Ok(status) => job.status = status,
                    Err(e) => tracing::warn!("Could not check status of job {}: {}", job.id, e),
                }
                match job.status {
                    JobStatus::Completed => completed += 1,
                    JobStatus::Failed => {
                        if reported_failures.insert(job.id.clone()) {
                            tracing::error!("Job {} failed ({})", job.id, job.source_name());
                        }
                        completed += 1;
                    }
                    JobStatus::Queued => {}
                }
            }
            sweep += 1;

            if completed == total {
                tracing::info!("All jobs completed!");
                break;
            }
            tracing::info!("Progress: {}/{} completed", completed, total);

            if let Some(max) = self.policy.max_attempts {
                if sweep >= max {
                    tracing::warn!(
                        "Giving up after {} status checks with {} of {} jobs unfinished",
                        sweep,
                        total - completed,
                        total
                    );
                    break;
                }
            }
            tokio::time::sleep(self.policy.delay_after(sweep - 1)).await;
        }

        reported_failures.len()
    }

    async fn persist_results(&self, jobs: &[ExtractionJob], storage: &StorageManager, report: &mut BatchReport) {
        for job in jobs {
            let source_name = job.source_name();

            if !job.status.is_terminal() {
                tracing::warn!("Job {} for {} did not finish; skipping", job.id, source_name);
                report.timed_out += 1;
                continue;
            }

            match self.agent.get_extraction_run_for_job(&job.id).await {
                Ok(Some(data)) if !is_empty_result(&data) => match storage.save_result(&job.source, &data) {
                    Ok(path) => {
                        tracing::info!("Saved results for {} to {}", source_name, path.display());
                        report.saved.push(path);
                    }
                    Err(e) => {
                        tracing::error!("Failed to save results for {}: {}", source_name, e);
                        report.fetch_errors += 1;
                    }
                },
                Ok(_) => {
                    tracing::warn!("No results for job {} ({})", job.id, source_name);
                    report.empty += 1;
                }
                Err(e) => {
                    tracing::error!("Error retrieving results for job {}: {}", job.id, e);
                    report.fetch_errors += 1;
                }
            }
        }
    }
}
