use std::path::PathBuf;

/// Environment variable names understood by the application
const ENV_BACKEND_URL: &str = "BANTER_BACKEND_URL";
const ENV_SYSTEM_PROMPT: &str = "BANTER_SYSTEM_PROMPT";
const ENV_REQUEST_TIMEOUT_SECS: &str = "BANTER_REQUEST_TIMEOUT_SECS";
const ENV_DATA_DIR: &str = "BANTER_DATA_DIR";

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Application settings, derived from the environment.
///
/// CLI flags override these at the composition point.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the completion backend
    pub backend_url: String,
    /// System prompt forwarded with every completion request
    pub system_prompt: Option<String>,
    /// Timeout for completion requests, in seconds
    pub request_timeout_secs: u64,
    /// Override for the durable store directory
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            backend_url: std::env::var(ENV_BACKEND_URL)
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            system_prompt: std::env::var(ENV_SYSTEM_PROMPT)
                .ok()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            request_timeout_secs: std::env::var(ENV_REQUEST_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            data_dir: std::env::var(ENV_DATA_DIR).ok().map(PathBuf::from),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            system_prompt: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}
