use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Parse a `Retry-After` header given in (possibly fractional) seconds.
///
/// HTTP-date values, negative numbers and values too large for a `Duration` are ignored;
/// the caller falls back to its own backoff.
#[must_use]
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let secs = value.trim().parse::<f64>().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Pick the wait before a retry: the server hint when present, else the configured base.
#[must_use]
pub fn backoff_delay(hint: Option<Duration>, base: Duration) -> Duration {
    hint.unwrap_or(base)
}
