use std::env;
use std::path::PathBuf;

use crate::error::ApiError;

pub const DEFAULT_SESSION_DB: &str = "sqlite://console-session.db";

#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Base URL of the REST backend, without the `/api/v1` prefix.
    pub api_base_url: String,
    pub session_db_url: String,
    pub export_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            session_db_url: DEFAULT_SESSION_DB.to_string(),
            export_dir: PathBuf::from("."),
        }
    }

    pub fn new_from_env() -> Result<Self, ApiError> {
        let api_base_url = env::var("CONSOLE_API_URL")
            .map_err(|_| ApiError::Config("CONSOLE_API_URL is not set".to_string()))?;
        if api_base_url.trim().is_empty() {
            return Err(ApiError::Config("CONSOLE_API_URL is empty".to_string()));
        }

        let session_db_url =
            env::var("CONSOLE_SESSION_DB").unwrap_or_else(|_| DEFAULT_SESSION_DB.to_string());
        let export_dir = env::var("CONSOLE_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Ok(Self {
            api_base_url,
            session_db_url,
            export_dir,
        })
    }
}
