//! Low-level error causes for the doffin scraper
//!
//! These are the causes carried inside the caller-facing [`crate::error::Error`].
//! A [`FetchError`] classified as recoverable is retried by the fetcher and only
//! surfaces once attempts are exhausted.

use thiserror::Error;

/// Errors that can occur during a single HTTP attempt
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, reset or other transport-level failure
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-success status code
    #[error("HTTP status {0}")]
    Status(u16),

    /// Response body could not be read or decoded
    #[error("decoding error: {0}")]
    Decode(String),

    /// URL could not be parsed or uses an unsupported scheme
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Redirect chain longer than the fetcher follows
    #[error("more than {0} redirects")]
    TooManyRedirects(u32),

    /// HTTP client could not be constructed
    #[error("client setup failed: {0}")]
    Client(String),
}

impl FetchError {
    /// Classify a transport error from reqwest
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err)
        }
    }

    /// Check whether another attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status(code) => is_retryable_status(*code),
            Self::Decode(_)
            | Self::InvalidUrl(_)
            | Self::TooManyRedirects(_)
            | Self::Client(_) => false,
        }
    }

    /// HTTP status code, if the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Retry on 429 (Too Many Requests) and every 5xx.
/// Other 4xx codes are caller errors and never retried.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Errors that can occur while extracting a notice from markup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// None of the title strategies matched; the page layout likely changed
    #[error("title not found in notice page")]
    TitleNotFound,

    /// Neither an identifier nor a canonical URL could be determined
    #[error("notice identifier not found")]
    IdentifierNotFound,
}
