// src/utils/config.rs
use std::fmt;
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "LLAMA_CLOUD_API_KEY";
pub const BASE_URL_ENV: &str = "LLAMA_CLOUD_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.cloud.llamaindex.ai";

/// Agent used by the interactive paths (`extract`, `serve`, `check`).
pub const DEFAULT_AGENT_NAME: &str = "sp termsheet";
/// Structured Product Termsheet agent used by `batch`.
pub const DEFAULT_BATCH_AGENT_ID: &str = "50297c9a-d871-4218-90b7-79548adbd6ce";

/// What happened when looking for a `.env` file.
#[derive(Debug, PartialEq)]
pub enum DotenvOutcome {
    Loaded(PathBuf),
    NotFound,
    Unreadable(String),
}

impl DotenvOutcome {
    fn from_result(result: dotenvy::Result<PathBuf>) -> Self {
        match result {
            Ok(path) => DotenvOutcome::Loaded(path),
            Err(e) if e.not_found() => DotenvOutcome::NotFound,
            Err(e) => DotenvOutcome::Unreadable(e.to_string()),
        }
    }

    /// Reports the outcome; call once logging is set up.
    pub fn log(&self) {
        match self {
            DotenvOutcome::Loaded(path) => tracing::debug!("Loaded environment from {}", path.display()),
            DotenvOutcome::NotFound => tracing::debug!("No .env file found"),
            DotenvOutcome::Unreadable(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }
    }
}

/// Loads a `.env` file from the working directory (or a parent) if one exists.
/// Must run before CLI parsing so `env = ...` clap attributes see its values.
pub fn load_dotenv() -> DotenvOutcome {
    DotenvOutcome::from_result(dotenvy::dotenv())
}

/// Connection settings for the extraction service.
#[derive(Clone)]
pub struct Settings {
    /// Missing key is not an error here; the first remote call fails instead.
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup(API_KEY_ENV)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let base_url = lookup(BASE_URL_ENV)
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if api_key.is_none() {
            tracing::warn!("{} is not set; requests to the extraction service will likely be rejected", API_KEY_ENV);
        }

        Self { api_key, base_url }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}
