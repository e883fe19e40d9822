// src/web/mod.rs
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::llama::ExtractionAgent;
use crate::termsheet::{html, DownloadArtifact, TermSheetView};
use crate::utils::error::LlamaError;
use crate::utils::AppError;

pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn ExtractionAgent>,
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error during extraction: {0}")]
    Extraction(#[from] LlamaError),
    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            WebError::BadRequest(_) | WebError::Multipart(_) => StatusCode::BAD_REQUEST,
            WebError::Extraction(_) => StatusCode::BAD_GATEWAY,
            WebError::Io(_) | WebError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The upload page again, with this error shown inline.
    fn into_page(self, upload_name: Option<&str>) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Upload failed: {}", self);
        } else {
            tracing::warn!("Upload rejected: {}", self);
        }
        (status, Html(html::render_error_page(upload_name, &self.to_string()))).into_response()
    }
}

struct Upload {
    name: String,
    bytes: Vec<u8>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/extract", post(extract_upload))
        .route("/health", get(|| async { "ok" }))
        // Leave room for multipart framing around the file itself.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Web UI listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web UI stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn index() -> Html<String> {
    Html(html::render_upload_page())
}

async fn extract_upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return e.into_page(None),
    };

    match run_extraction(state.agent.as_ref(), &upload).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => e.into_page(Some(&upload.name)),
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, WebError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        let is_pdf = name.to_ascii_lowercase().ends_with(".pdf");
        if !is_pdf {
            return Err(WebError::BadRequest(format!("Only PDF files are accepted (got '{}')", name)));
        }
        if bytes.is_empty() {
            return Err(WebError::BadRequest(format!("Uploaded file '{}' is empty", name)));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(WebError::BadRequest(format!(
                "File too large. Maximum {}MB.",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }

        return Ok(Upload {
            name,
            bytes: bytes.to_vec(),
        });
    }
    Err(WebError::BadRequest("No file provided.".to_string()))
}

/// Stages the upload in a temporary file, extracts it and renders the result.
/// The temporary file is removed whether or not extraction succeeds.
async fn run_extraction(agent: &dyn ExtractionAgent, upload: &Upload) -> Result<String, WebError> {
    let mut staged = tempfile::Builder::new()
        .prefix("termsheet-")
        .suffix(".pdf")
        .tempfile()?;
    staged.write_all(&upload.bytes)?;
    staged.flush()?;

    tracing::info!("Extracting uploaded file {} ({} bytes)", upload.name, upload.bytes.len());
    let result = agent.extract(staged.path()).await;
    drop(staged);
    let result = result?;

    let artifact = DownloadArtifact::new(&upload.name, &result)?;
    let view = TermSheetView::from_result(&result);
    tracing::info!("Extraction complete for {}", upload.name);
    Ok(html::render_result_page(&upload.name, &view, &artifact))
}
