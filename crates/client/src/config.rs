use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Which backend strategy serves cameras and fences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Rest,
    Firestore,
}

impl FromStr for BackendKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "firestore" => Ok(Self::Firestore),
            other => Err(ClientError::Config(format!(
                "GATEWATCH_BACKEND must be 'rest' or 'firestore', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rest => "rest",
            Self::Firestore => "firestore",
        })
    }
}

/// Backend configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// REST API root, without trailing slash.
    pub api_base_url: String,
    pub firestore_project_id: Option<String>,
    pub firestore_api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl BackendConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `GATEWATCH_BACKEND`    | `rest`                   |
    /// | `API_BASE_URL`         | `http://127.0.0.1:5000`  |
    /// | `FIRESTORE_PROJECT_ID` | (required for firestore) |
    /// | `FIRESTORE_API_KEY`    | (none)                   |
    /// | `REQUEST_TIMEOUT_SECS` | `10`                     |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let kind = match non_empty("GATEWATCH_BACKEND") {
            Some(raw) => raw.parse()?,
            None => BackendKind::Rest,
        };

        let api_base_url = non_empty("API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_secs = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                ClientError::Config(format!("REQUEST_TIMEOUT_SECS must be a valid u64, got '{raw}'"))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let firestore_project_id = non_empty("FIRESTORE_PROJECT_ID");
        if kind == BackendKind::Firestore && firestore_project_id.is_none() {
            return Err(ClientError::Config(
                "FIRESTORE_PROJECT_ID is required when GATEWATCH_BACKEND=firestore".into(),
            ));
        }

        Ok(Self {
            kind,
            api_base_url,
            firestore_project_id,
            firestore_api_key: non_empty("FIRESTORE_API_KEY"),
            request_timeout_secs,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shared HTTP client honouring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, ClientError> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()?)
    }
}
