//! Unified error handling for the doffin crate
//!
//! Callers of the scraper see exactly one of the kinds below:
//!
//! - [`Error::FetchFailed`] - retries exhausted or a fatal HTTP status
//! - [`Error::ParseFailed`] - page structure unrecognizable
//! - [`Error::NotFound`] - the notice does not exist (404-class answer)
//! - [`Error::InvalidInput`] - malformed filter, date, page or identifier
//!
//! Transient fetch failures never appear here unless every attempt failed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use doffin::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Input => eprintln!("fix the request: {err}"),
//!         _ if err.is_recoverable() => eprintln!("try again later: {err}"),
//!         _ => eprintln!("fatal: {err}"),
//!     }
//! }
//! ```

use thiserror::Error;

pub use crate::utils::error::{FetchError, ParseError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Markup extraction errors
    Parsing,
    /// Caller supplied something malformed
    Input,
    /// Configuration and setup errors
    Config,
    /// Faults inside the crate itself
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Input => "input",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the doffin crate
#[derive(Error, Debug)]
pub enum Error {
    /// Retries exhausted or fatal HTTP status
    #[error("fetch failed for {url} after {attempts} attempt(s): {cause}")]
    FetchFailed {
        url: String,
        attempts: u32,
        #[source]
        cause: FetchError,
    },

    /// Page structure could not be recognized
    #[error("could not parse {url}: {cause}")]
    ParseFailed {
        url: String,
        #[source]
        cause: ParseError,
    },

    /// Notice does not exist
    #[error("notice not found: {url} (HTTP {status})")]
    NotFound { url: String, status: u16 },

    /// Malformed caller input; no request was made
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(String),

    /// Fault inside the crate, not caused by the caller or the site
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a fetch failure
    pub fn fetch_failed(url: impl Into<String>, attempts: u32, cause: FetchError) -> Self {
        Self::FetchFailed {
            url: url.into(),
            attempts,
            cause,
        }
    }

    /// Create a parse failure
    pub fn parse_failed(url: impl Into<String>, cause: ParseError) -> Self {
        Self::ParseFailed {
            url: url.into(),
            cause,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FetchFailed { .. } | Self::NotFound { .. } => ErrorCategory::Network,
            Self::ParseFailed { .. } => ErrorCategory::Parsing,
            Self::InvalidInput(_) => ErrorCategory::Input,
            Self::Config(_) => ErrorCategory::Config,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Check if a later call could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::FetchFailed { cause, .. } => cause.is_recoverable(),
            Self::ParseFailed { .. }
            | Self::NotFound { .. }
            | Self::InvalidInput(_)
            | Self::Config(_)
            | Self::Internal(_) => false,
        }
    }

    /// HTTP status code involved, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FetchFailed { cause, .. } => cause.status(),
            Self::NotFound { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// URL involved, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::FetchFailed { url, .. }
            | Self::ParseFailed { url, .. }
            | Self::NotFound { url, .. } => Some(url),
            Self::InvalidInput(_) | Self::Config(_) | Self::Internal(_) => None,
        }
    }

    /// Short machine-readable kind name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FetchFailed { .. } => "FetchFailed",
            Self::ParseFailed { .. } => "ParseFailed",
            Self::NotFound { .. } => "NotFound",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Config(_) => "Config",
            Self::Internal(_) => "Internal",
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
