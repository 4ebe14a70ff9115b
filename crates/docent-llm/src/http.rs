//! Shared HTTP client construction and response classification for hosted backends.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::LlmError;
use crate::model::MAX_TIMEOUT_SECONDS;

const MAX_DIAGNOSTIC_CHARS: usize = 512;

/// Create a shared HTTP client with standard Docent configuration.
///
/// Config: 30s connect timeout, request timeout just above the largest generation budget
/// (the per-query budget is enforced by the caller), `docent/{version}` user-agent.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized (should never happen with rustls).
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(MAX_TIMEOUT_SECONDS + 10))
        .user_agent(concat!("docent/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("default HTTP client construction must not fail")
}

/// Map a non-success status into the shared error taxonomy.
///
/// # Errors
///
/// Returns the classified error for any non-2xx status.
pub(crate) fn check_status(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> Result<(), LlmError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::warn!(provider, %status, "credential rejected");
            Err(LlmError::Authentication {
                provider: provider.to_owned(),
            })
        }
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!(provider, ?retry_after, "rate limited");
            Err(LlmError::RateLimited {
                provider: provider.to_owned(),
                retry_after,
            })
        }
        _ => {
            tracing::error!(provider, %status, "API error: {body}");
            Err(LlmError::Generation {
                provider: provider.to_owned(),
                message: format!("status {status}: {}", truncate_chars(body, MAX_DIAGNOSTIC_CHARS)),
            })
        }
    }
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Key present and non-blank, or an authentication error before any request is built.
pub(crate) fn require_key<'a>(provider: &str, key: Option<&'a str>) -> Result<&'a str, LlmError> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| LlmError::Authentication {
            provider: provider.to_owned(),
        })
}
