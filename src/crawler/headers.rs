use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use crate::utils::error::FetchError;

/// Accept header sent with every page request
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Norwegian first, English as fallback
pub const ACCEPT_LANGUAGE_NB: &str = "nb-NO,nb;q=0.9,no;q=0.8,en;q=0.6";

/// Build the headers attached to every request
///
/// The user agent is the identifying one from configuration, not a browser
/// string, so the site operator can reach whoever runs the scraper.
///
/// # Errors
///
/// Returns `FetchError::Client` if the user agent is not a valid header value
///
/// # Examples
///
/// ```
/// use doffin::crawler::headers::build_default_headers;
///
/// let headers = build_default_headers("doffin-scraper/0.1 (+ops@example.com)").unwrap();
/// assert!(headers.contains_key("user-agent"));
/// ```
pub fn build_default_headers(user_agent: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();

    let user_agent = HeaderValue::from_str(user_agent.trim())
        .map_err(|e| FetchError::Client(format!("invalid user agent: {e}")))?;
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_NB));

    Ok(headers)
}

/// Merge caller headers over the defaults
///
/// Callers may add or override anything except the user agent, which always
/// stays the configured one.
pub fn merge_headers(defaults: &HeaderMap, extra: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();

    for (name, value) in extra {
        if name == USER_AGENT {
            continue;
        }
        merged.insert(name.clone(), value.clone());
    }

    merged
}
