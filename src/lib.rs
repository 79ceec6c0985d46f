//! doffin - polite scraper for Norwegian public procurement notices
//!
//! Searches doffin.no and reads individual notices, returning structured
//! records. Every outbound request is paced through one shared gate and
//! transient failures are retried with backoff.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Rate gate, fetcher, URL construction and the [`NoticeClient`]
//! - [`parser`] - HTML parsing and data extraction
//! - [`models`] - Core data structures and types
//! - [`tools`] - Named tool definitions and JSON dispatch
//! - [`utils`] - Retry policy, low-level errors and helpers
//!
//! # Example
//!
//! ```no_run
//! use doffin::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = NoticeClient::new(&config)?;
//!
//!     let filter = SearchFilter::new().query("API").county("Oslo");
//!     let response = client.search_notices(&filter).await?;
//!     for notice in &response.results {
//!         println!("{} {}", notice.id, notice.title.as_deref().unwrap_or("-"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod tools;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{Fetcher, NoticeClient, QueryBuilder, RateGate};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        DocumentRef, NoticeDetail, NoticeRef, NoticeSummary, SearchFilter, SearchResponse,
    };
    pub use crate::parser::{parse_notice, parse_search};
    pub use crate::tools::NoticeTools;
    pub use crate::utils::retry::RetryPolicy;
}

// Direct re-exports for convenience
pub use crawler::NoticeClient;
pub use models::{DocumentRef, NoticeDetail, NoticeRef, NoticeSummary, SearchFilter};
