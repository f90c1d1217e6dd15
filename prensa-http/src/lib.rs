//! Minimal HTTP client with safe logging and a reusable retry policy.
//!
//! - Request options: headers, query params, timeout
//! - Redacts credential headers and never logs secret values
//! - [`RetryPolicy`]: bounded retries with *linear* backoff, gated on a
//!   retryable-condition predicate (currently HTTP 429) so the same policy
//!   can wrap other flaky external calls
//!
//! Timeout and retry exhaustion surface as errors to the caller; what is
//! recoverable (and how) is the caller's decision.

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl HttpError {
    /// Whether this error is the backend's throttling signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            HttpError::Api {
                status: StatusCode::TOO_MANY_REQUESTS,
                ..
            }
        )
    }
}

/// Bounded retry with linear backoff.
///
/// Attempt `k` (1-based) is preceded by a wait of `k × base_delay`; the
/// first attempt never waits. Only responses matching [`RetryPolicy::retryable`]
/// are retried — anything else fails immediately.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn linear(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait to apply before retry number `retry` (1-based).
    pub fn delay_before(&self, retry: usize) -> Duration {
        self.base_delay.saturating_mul(retry as u32)
    }

    /// Rate limiting is the only transient-retryable response class.
    pub fn retryable(&self, status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(3, Duration::from_secs(2))
    }
}

/// Per-request tuning knobs.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// Override the client-level retry policy for this request.
    pub retry: Option<RetryPolicy>,
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub retry: RetryPolicy,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(20),
            retry: RetryPolicy::none(),
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST JSON with per-request options.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, Some(body), opts).await
    }

    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let policy = opts.retry.unwrap_or(self.retry);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut attempt = 1usize;
        loop {
            let mut rb = self.inner.request(method.clone(), url.clone()).timeout(timeout);

            if let Some(q) = &opts.query {
                let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
                rb = rb.query(&pairs);
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }
            if let Some(b) = body {
                rb = rb.json(b);
            }

            tracing::debug!(
                attempt,
                max_attempts = policy.max_attempts,
                method = %method,
                host_path = %format!("{}{}", url.domain().unwrap_or("-"), url.path()),
                headers = ?opts.headers.as_ref().map(redact_headers),
                timeout_ms = timeout.as_millis() as u64,
                has_body = body.is_some(),
                "http.request.start"
            );

            let started = std::time::Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    // Network failures are not the throttling signal; fail
                    // immediately and let the caller decide how to degrade.
                    tracing::warn!(attempt, error = %err, "http.network_error");
                    return Err(HttpError::Network(err.to_string()));
                }
            };

            let status = resp.status();
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| HttpError::Network(e.to_string()))?;

            tracing::debug!(
                attempt,
                %status,
                duration_ms = started.elapsed().as_millis() as u64,
                body_len = bytes.len(),
                "http.response"
            );

            if status.is_success() {
                let snippet = snip_body(&bytes);
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        serde_err = %e,
                        body_snippet = %snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let message = extract_error_message(&bytes);

            if policy.retryable(status) && attempt < policy.max_attempts {
                let delay = policy.delay_before(attempt);
                tracing::warn!(
                    %status,
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    message = %message,
                    "http.rate_limited.retrying"
                );
                sleep(delay).await;
                attempt += 1;
                continue;
            }

            tracing::warn!(%status, message = %message, "http.error");
            return Err(HttpError::Api { status, message });
        }
    }
}

/// Redact credential-looking headers for logging.
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let lower = key.to_ascii_lowercase();
            let secret = lower == "authorization" || lower.contains("key") || lower.contains("token");
            let val = if secret {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

/// Pull a human-readable message out of common JSON error envelopes.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        snip.truncate(500);
        snip.push_str("...");
    }
    snip
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn linear_policy_waits_grow_linearly() {
        let policy = RetryPolicy::linear(3, Duration::from_secs(2));
        assert_eq!(policy.delay_before(1), Duration::from_secs(2));
        assert_eq!(policy.delay_before(2), Duration::from_secs(4));
        assert_eq!(policy.delay_before(3), Duration::from_secs(6));
    }

    #[test]
    fn only_429_is_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!policy.retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!policy.retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn none_policy_is_a_single_attempt() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn credential_headers_are_redacted_in_logs() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rapidapi-key", HeaderValue::from_static("secret"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let redacted = redact_headers(&headers);
        assert!(redacted.contains(&("x-rapidapi-key".into(), "<redacted>".into())));
        assert!(redacted.contains(&("content-type".into(), "application/json".into())));
    }

    #[test]
    fn error_message_extraction_prefers_known_keys() {
        assert_eq!(
            extract_error_message(br#"{"message":"too many requests"}"#),
            "too many requests"
        );
        assert_eq!(extract_error_message(br#"{"error":"nope"}"#), "nope");
        assert_eq!(extract_error_message(b"plain text"), "plain text");
    }
}
