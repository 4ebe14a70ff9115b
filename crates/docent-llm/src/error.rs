use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing or invalid API key for {provider}")]
    Authentication { provider: String },

    #[error("rate limited by {provider}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("{provider} did not answer within {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    #[error("{provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("{provider} generation failed: {message}")]
    Generation { provider: String, message: String },

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Classify a transport-level `reqwest` failure.
    ///
    /// Connection failures mean the backend is unreachable; everything else is reported as a
    /// failed generation carrying the transport diagnostic.
    #[must_use]
    pub fn transport(provider: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Unavailable {
                provider: provider.to_owned(),
                reason: err.to_string(),
            }
        } else if err.is_timeout() {
            Self::Generation {
                provider: provider.to_owned(),
                message: format!("transport timeout: {err}"),
            }
        } else {
            Self::Http(err)
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-provided wait hint attached to a rate-limit response, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
