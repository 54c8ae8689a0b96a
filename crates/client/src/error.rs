use gatewatch_core::error::CoreError;

/// Errors from the backend HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// 2xx response whose payload reports `"status": "error"`.
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// An id that cannot be sent as a single URL path segment.
    #[error("Invalid path segment: {0:?}")]
    InvalidSegment(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Config(msg) => CoreError::InvalidState(msg),
            ClientError::InvalidSegment(segment) => {
                CoreError::Validation(format!("'{segment}' is not a usable id"))
            }
            other => CoreError::Transport(other.to_string()),
        }
    }
}

