use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{Error, Result};
use crate::openai::Client;

/// Remote job states. The remote service is the sole writer; unknown future
/// states are treated as non-terminal so polling degrades to waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    ValidatingFiles,
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ValidatingFiles => "validating_files",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FineTuneJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub fine_tuned_model: Option<String>,
    #[serde(default)]
    pub error: Option<JobError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    #[serde(default)]
    pub message: Option<String>,
}

/// Remote fine-tuning operations. Seam so the orchestration and poll loop
/// are testable against a scripted backend.
pub trait FineTuneBackend {
    async fn upload_file(&self, path: &Path) -> Result<String>;
    async fn create_job(&self, file_id: &str, model: &str) -> Result<String>;
    async fn retrieve_job(&self, job_id: &str) -> Result<FineTuneJob>;
}

pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Deserialize)]
struct CreatedJob {
    id: String,
}

impl FineTuneBackend for HttpBackend {
    async fn upload_file(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "training_data.jsonl".into());
        let form = Form::new()
            .text("purpose", "fine-tune")
            .part("file", Part::bytes(bytes).file_name(file_name));

        let uploaded: UploadedFile = self
            .client
            .post_multipart("/files", form)
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;
        Ok(uploaded.id)
    }

    async fn create_job(&self, file_id: &str, model: &str) -> Result<String> {
        let body = json!({
            "training_file": file_id,
            "model": model,
            "method": { "type": "supervised" }
        });
        let job: CreatedJob = self
            .client
            .post_json("/fine_tuning/jobs", &body)
            .await
            .map_err(|e| Error::JobCreation(e.to_string()))?;
        Ok(job.id)
    }

    async fn retrieve_job(&self, job_id: &str) -> Result<FineTuneJob> {
        self.client
            .get_json(&format!("/fine_tuning/jobs/{job_id}"))
            .await
            .map_err(|e| Error::TrainingFailed(format!("status poll failed: {e}")))
    }
}

/// Upload the validated corpus, create a supervised job, and poll it to a
/// terminal state. Returns the fine-tuned model id.
pub async fn run_fine_tuning<B: FineTuneBackend>(
    backend: &B,
    corpus_path: &Path,
    model: &str,
    poll_interval: Duration,
) -> Result<String> {
    let file_id = backend.upload_file(corpus_path).await?;
    info!("uploaded training file: {file_id}");

    let job_id = backend.create_job(&file_id, model).await?;
    info!("created fine-tuning job: {job_id}");

    poll_job(backend, &job_id, poll_interval).await
}

/// Poll until the job reaches a terminal state. Deliberately unbounded:
/// training duration is unpredictable and the remote service owns the
/// lifecycle, so the loop relies on it reaching a terminal state.
pub async fn poll_job<B: FineTuneBackend>(
    backend: &B,
    job_id: &str,
    poll_interval: Duration,
) -> Result<String> {
    loop {
        let job = backend.retrieve_job(job_id).await?;
        info!("job {}: {}", job.id, job.status);

        match job.status {
            JobStatus::Succeeded => {
                return job.fine_tuned_model.ok_or_else(|| {
                    Error::TrainingFailed(
                        "job succeeded but no fine-tuned model id was returned".into(),
                    )
                });
            }
            JobStatus::Failed => {
                let message = job
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "Unknown error".into());
                return Err(Error::TrainingFailed(message));
            }
            JobStatus::Cancelled => return Err(Error::TrainingCancelled),
            _ => tokio::time::sleep(poll_interval).await,
        }
    }
}

// ── Tests ──
