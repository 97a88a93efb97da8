use thiserror::Error;

/// Errors raised while fetching comment pages.
///
/// Per-page variants are collected into the fetch report. `Discovery` and `Config` abort the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed with HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Page 0 produced no usable page count.
    #[error("discovery of page count failed: {0}")]
    Discovery(String),

    #[error("page not fetched before the run deadline")]
    Cancelled,

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FetchError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        FetchError::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// Transient failures worth another attempt: timeouts, refused
    /// connections, throttling and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(e) => e.is_timeout() || e.is_connect(),
            FetchError::HttpStatus(code) => *code == 429 || (500..600).contains(code),
            FetchError::MalformedPayload { .. }
            | FetchError::Discovery(_)
            | FetchError::Cancelled
            | FetchError::Worker(_)
            | FetchError::Config(_) => false,
        }
    }
}
