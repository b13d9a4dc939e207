//! HTTP retry helpers for transient errors.
//!
//! Every outbound request made by this crate (Horizons queries and
//! leap-second downloads) goes through [`send_text`] or [`send_json`]
//! instead of calling `reqwest::RequestBuilder::send()` directly, so each
//! gets automatic retry with exponential backoff for timeouts, connection
//! resets, server errors, and rate limiting.
//!
//! ```ignore
//! let body = retry::send_text(|| client.get(&url)).await?;
//! let value: MyResponse = retry::send_json(|| client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::EphemerisError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (2s, 4s, 8s) the total wait before giving up
/// is 14 seconds, which stays well inside the chart request timeout.
const MAX_RETRIES: u32 = 3;

/// Maximum number of full re-fetch attempts when the response body
/// cannot be read or decoded.
const MAX_BODY_RETRIES: u32 = 2;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// How a response status should be handled by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// 2xx/3xx: hand the response to the caller.
    Accept,
    /// 429 or 5xx: wait and try again.
    Retry,
    /// Any other 4xx: permanent failure.
    Fail,
}

/// Classifies an HTTP status for the retry loop.
#[must_use]
pub fn classify_status(status: reqwest::StatusCode) -> StatusAction {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusAction::Retry
    } else if status.is_client_error() {
        StatusAction::Fail
    } else {
        StatusAction::Accept
    }
}

/// Sends an HTTP request and returns the response body as a `String`.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// Returns [`EphemerisError`] if the request fails after all retries, the
/// server returns a non-retryable status, or the body cannot be read.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(build_request: F) -> Result<String, EphemerisError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    for body_attempt in 0..=MAX_BODY_RETRIES {
        let response = send_inner(&build_request, MAX_RETRIES).await?;
        let url = response.url().to_string();

        match response.text().await {
            Ok(text) => return Ok(text),
            Err(e) => {
                if body_attempt < MAX_BODY_RETRIES {
                    let delay = backoff(body_attempt + 1);
                    log::warn!(
                        "Body read failed for {url} (body retry {}/{MAX_BODY_RETRIES}), \
                         re-fetching in {delay:?}: {e}",
                        body_attempt + 1,
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                log::error!("Body read failed for {url} after {MAX_BODY_RETRIES} retries: {e}");
                return Err(EphemerisError::Http(e));
            }
        }
    }

    unreachable!("send_text body retry loop exited without returning")
}

/// Sends an HTTP request and deserializes the JSON response body.
///
/// A body that arrives but fails to parse (truncated or garbled) triggers
/// a full re-fetch, up to [`MAX_BODY_RETRIES`] times.
///
/// # Errors
///
/// Returns [`EphemerisError`] if the request fails after all retries or
/// the body never parses as `T`.
#[allow(clippy::future_not_send)]
pub async fn send_json<T, F>(build_request: F) -> Result<T, EphemerisError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    for body_attempt in 0..=MAX_BODY_RETRIES {
        let text = send_text(&build_request).await?;

        match serde_json::from_str(&text) {
            Ok(value) => return Ok(value),
            Err(json_err) => {
                let preview = preview(&text);
                if body_attempt < MAX_BODY_RETRIES {
                    let delay = backoff(body_attempt + 1);
                    log::warn!(
                        "JSON parse failed (body retry {}/{MAX_BODY_RETRIES}), \
                         re-fetching in {delay:?}...\n  \
                         parse error: {json_err}\n  \
                         body preview: {preview}",
                        body_attempt + 1,
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                log::error!(
                    "JSON parse failed after {MAX_BODY_RETRIES} retries, giving up.\n  \
                     parse error: {json_err}\n  \
                     body preview: {preview}",
                );
                return Err(EphemerisError::MalformedResponse {
                    message: format!("JSON parse failed: {json_err}"),
                });
            }
        }
    }

    unreachable!("send_json body retry loop exited without returning")
}

/// Core retry loop shared by [`send_text`] and [`send_json`].
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    max_retries: u32,
) -> Result<reqwest::Response, EphemerisError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<EphemerisError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(EphemerisError::Http(e));
                    continue;
                }
                return Err(EphemerisError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                let url = response.url().to_string();
                let status_error = || EphemerisError::HttpStatus {
                    url: url.clone(),
                    status: status.as_u16(),
                };

                match classify_status(status) {
                    StatusAction::Accept => return Ok(response),
                    StatusAction::Fail => return Err(status_error()),
                    StatusAction::Retry if attempt < max_retries => {
                        log::warn!("  HTTP {status} from {url}");
                        last_error = Some(status_error());
                    }
                    StatusAction::Retry => return Err(status_error()),
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| EphemerisError::Service {
        message: "request failed after all retries".to_string(),
    }))
}

/// Returns `true` if the error is likely transient and worth retrying.
#[must_use]
pub fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

/// Exponential backoff: 2s, 4s, 8s, ...
const fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt)
}

fn preview(text: &str) -> String {
    if text.len() > BODY_PREVIEW_LEN {
        let mut end = BODY_PREVIEW_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn server_errors_and_throttling_retry() {
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), StatusAction::Retry);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), StatusAction::Retry);
        assert_eq!(classify_status(StatusCode::SERVICE_UNAVAILABLE), StatusAction::Retry);
    }

    #[test]
    fn client_errors_fail_immediately() {
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), StatusAction::Fail);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusAction::Fail);
    }

    #[test]
    fn success_is_accepted() {
        assert_eq!(classify_status(StatusCode::OK), StatusAction::Accept);
        assert_eq!(classify_status(StatusCode::NOT_MODIFIED), StatusAction::Accept);
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let text = "\u{2609}".repeat(200);
        let shortened = preview(&text);
        assert!(shortened.ends_with("..."));
        assert!(shortened.len() <= BODY_PREVIEW_LEN + 3);
    }
}
