//! Polite HTTP fetcher
//!
//! Every physical request, retries included, passes through the shared
//! [`RateGate`] first. Transient failures (429, 5xx, network errors and
//! timeouts) are retried with exponential backoff and jitter; a server
//! `Retry-After` raises the next delay. Other 4xx answers fail immediately.
//! Redirects are followed here rather than inside the HTTP client, so each
//! hop is its own physical request and waits on the gate too.
//! Bodies are decoded using the declared charset, falling back to a
//! `<meta charset>` sniff and finally UTF-8.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::Utc;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION, RETRY_AFTER};
use reqwest::{redirect, Client};
use tracing::{debug, warn};
use url::Url;

use super::headers::{build_default_headers, merge_headers};
use super::rate_gate::RateGate;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::utils::error::FetchError;
use crate::utils::retry::{parse_retry_after, AttemptOutcome, RetryPolicy};

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("Invalid META_CHARSET regex")
});

/// Bytes inspected when sniffing a `<meta charset>` declaration
const SNIFF_LIMIT: usize = 1024;

/// Redirect hops followed for one fetch
pub const MAX_REDIRECTS: u32 = 5;

/// HTTP fetcher with pacing, retry and charset decoding
#[derive(Debug, Clone)]
pub struct Fetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Gate shared with every other fetcher of the process
    gate: Arc<RateGate>,

    /// Retry and backoff schedule
    policy: RetryPolicy,

    /// User agent and content negotiation headers
    default_headers: HeaderMap,
}

impl Fetcher {
    /// Create a fetcher
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the user agent is invalid or the HTTP client
    /// cannot be created
    pub fn new(
        gate: Arc<RateGate>,
        user_agent: &str,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let default_headers =
            build_default_headers(user_agent).map_err(|e| Error::config(e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            gate,
            policy,
            default_headers,
        })
    }

    /// Create a fetcher from configuration
    pub fn from_config(config: &Config, gate: Arc<RateGate>) -> Result<Self> {
        Self::new(
            gate,
            &config.scraper.user_agent,
            config.request_timeout(),
            config.retry.clone(),
        )
    }

    /// The gate this fetcher paces through
    pub fn gate(&self) -> &Arc<RateGate> {
        &self.gate
    }

    /// The retry schedule in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch a page with the default headers only
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        self.fetch(url, &HeaderMap::new()).await
    }

    /// Fetch a page, retrying transient failures
    ///
    /// `headers` are merged over the defaults; the identifying user agent is
    /// always kept.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if `url` is not an absolute http(s) URL; nothing is sent
    /// - `Error::FetchFailed` on a fatal status, once every attempt failed, or
    ///   after more than [`MAX_REDIRECTS`] redirect hops
    pub async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<String> {
        let parsed = Url::parse(url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| Error::invalid_input(format!("not an http(s) URL: {url}")))?;

        let headers = merge_headers(&self.default_headers, headers);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut current = parsed;
        let mut attempt = 1;
        let mut hops = 0;

        loop {
            self.gate.acquire().await;
            debug!(url, target = %current, attempt, max_attempts, "Fetching page");

            match self.attempt(&current, &headers).await {
                AttemptOutcome::Success(body) => {
                    if attempt > 1 {
                        debug!(url, attempt, "Fetch succeeded after retry");
                    }
                    return Ok(body);
                }
                AttemptOutcome::Redirect(next) => {
                    hops += 1;
                    if hops > MAX_REDIRECTS {
                        warn!(url, hops, "Too many redirects");
                        return Err(Error::fetch_failed(
                            url,
                            attempt,
                            FetchError::TooManyRedirects(MAX_REDIRECTS),
                        ));
                    }
                    debug!(url, from = %current, to = %next, hops, "Following redirect");
                    current = next;
                }
                AttemptOutcome::Fatal(cause) => {
                    warn!(url, attempt, error = %cause, "Fetch failed");
                    return Err(Error::fetch_failed(url, attempt, cause));
                }
                AttemptOutcome::Retryable { cause, retry_after } => {
                    if !self.policy.has_attempts_left(attempt) {
                        warn!(url, attempts = attempt, error = %cause, "Retries exhausted");
                        return Err(Error::fetch_failed(url, attempt, cause));
                    }

                    let delay =
                        self.policy
                            .delay_for(attempt, retry_after, self.policy.sample_jitter());
                    warn!(
                        url,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %cause,
                        "Transient fetch failure, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One physical request
    async fn attempt(&self, url: &Url, headers: &HeaderMap) -> AttemptOutcome {
        let response = match self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return RetryPolicy::classify_transport(e),
        };

        let status = response.status();
        if status.is_redirection() {
            if let Some(location) = response.headers().get(LOCATION) {
                return redirect_target(url, location.to_str().ok());
            }
        }

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));
            return RetryPolicy::classify_status(status.as_u16(), retry_after);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();

        match response.bytes().await {
            Ok(bytes) => AttemptOutcome::Success(decode_bytes(&bytes, &content_type)),
            Err(e) => RetryPolicy::classify_transport(e),
        }
    }
}

/// Resolve a `Location` header against the URL that answered with it
fn redirect_target(from: &Url, location: Option<&str>) -> AttemptOutcome {
    match location.and_then(|loc| from.join(loc.trim()).ok()) {
        Some(next) if matches!(next.scheme(), "http" | "https") => AttemptOutcome::Redirect(next),
        _ => AttemptOutcome::Fatal(FetchError::InvalidUrl(format!(
            "unusable redirect from {from}: {}",
            location.unwrap_or("<non-ascii>")
        ))),
    }
}

/// Decode a response body to a string
///
/// Resolution order: `charset` in the Content-Type, then a `<meta charset>`
/// declaration near the top of the document, then UTF-8. Undecodable bytes
/// become U+FFFD rather than failing the fetch.
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> String {
    let encoding = charset_from_content_type(content_type)
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(
            encoding = used.name(),
            "Body contained invalid sequences, replaced"
        );
    }

    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| {
            Encoding::for_label(value.trim().trim_matches(|c| c == '"' || c == '\'').as_bytes())
        })
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(SNIFF_LIMIT)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}
