// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum LlamaError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {0}: {1}")]
    Http(reqwest::StatusCode, String), // Non-2xx status with the response body

    #[error("Extraction service rejected the credentials ({0}): {1}; check LLAMA_CLOUD_API_KEY")]
    Unauthorized(reqwest::StatusCode, String),

    #[error("Not found: {what}: {body}")]
    NotFound { what: String, body: String },

    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Extraction agent error: {0}")]
    Agent(String),

    #[error("Failed to parse extraction service response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Cannot derive an output file name from {0}")]
    InvalidSourceName(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction service call failed: {0}")]
    Llama(#[from] LlamaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llama_errors_convert_into_app_error_verbatim() {
        let err: AppError = LlamaError::Agent("schema mismatch".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Extraction service call failed: Extraction agent error: schema mismatch"
        );
    }

    #[test]
    fn io_error_names_the_file() {
        let err = LlamaError::Io {
            path: PathBuf::from("/tmp/missing.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(err.to_string(), "Could not read /tmp/missing.pdf: No such file");
    }
}
