//! Doffin client: polite fetching plus page parsing
//!
//! [`NoticeClient`] ties together URL construction, the paced and retrying
//! [`Fetcher`] and the page parsers. All clients created from one
//! [`RateGate`] share a single request budget.

pub mod fetcher;
pub mod headers;
pub mod query;
pub mod rate_gate;

pub use fetcher::Fetcher;
pub use query::QueryBuilder;
pub use rate_gate::RateGate;

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{Error, FetchError, Result};
use crate::models::{NoticeDetail, NoticeRef, SearchFilter, SearchResponse};
use crate::parser::{DetailParser, SearchParser};

/// Status codes meaning the notice does not exist
const GONE_STATUSES: &[u16] = &[404, 410];

/// High-level client for searching and reading Doffin notices
#[derive(Debug, Clone)]
pub struct NoticeClient {
    fetcher: Fetcher,
    query: QueryBuilder,
    search_parser: SearchParser,
    detail_parser: DetailParser,
}

impl NoticeClient {
    /// Create a client with its own rate gate
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid
    pub fn new(config: &Config) -> Result<Self> {
        let gate = Arc::new(RateGate::new(config.min_interval()));
        Self::with_gate(config, gate)
    }

    /// Create a client pacing through an existing gate
    pub fn with_gate(config: &Config, gate: Arc<RateGate>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::config(format!("invalid configuration: {e}")))?;

        Ok(Self {
            fetcher: Fetcher::from_config(config, gate)?,
            query: QueryBuilder::new(&config.scraper.base_url)?,
            search_parser: SearchParser::new(&config.scraper.base_url)?,
            detail_parser: DetailParser::new(),
        })
    }

    /// Underlying fetcher
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// URL builder for this client's site root
    pub fn query_builder(&self) -> &QueryBuilder {
        &self.query
    }

    /// Run a search and return the notices on the requested page
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` for an invalid filter; no request is made
    /// - `Error::FetchFailed` if the listing could not be retrieved
    #[instrument(skip(self, filter), fields(page = filter.page))]
    pub async fn search_notices(&self, filter: &SearchFilter) -> Result<SearchResponse> {
        let source_url = self.query.build_search_url(filter)?;
        let html = self.fetcher.fetch_html(&source_url).await?;
        let results = self.search_parser.parse(&html);

        info!(url = %source_url, count = results.len(), "Search completed");

        Ok(SearchResponse {
            results,
            source_url,
        })
    }

    /// Fetch and parse a single notice
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` for a blank identifier or a URL off the
    ///   configured site; no request is made
    /// - `Error::NotFound` if the site answers 404 or 410
    /// - `Error::FetchFailed` for other fetch failures
    /// - `Error::ParseFailed` if the page has no recognizable title
    #[instrument(skip(self, notice), fields(notice = %notice))]
    pub async fn get_notice(&self, notice: &NoticeRef) -> Result<NoticeDetail> {
        let url = match notice {
            NoticeRef::Id(id) => self.query.notice_url(id)?,
            NoticeRef::Url(url) => self.query.check_notice_url(url)?,
        };

        let html = match self.fetcher.fetch_html(&url).await {
            Ok(html) => html,
            Err(Error::FetchFailed {
                url,
                cause: FetchError::Status(status),
                ..
            }) if GONE_STATUSES.contains(&status) => {
                return Err(Error::NotFound { url, status });
            }
            Err(e) => return Err(e),
        };

        let detail = self
            .detail_parser
            .parse(&html, &url)
            .map_err(|cause| Error::parse_failed(&url, cause))?;

        info!(id = %detail.id, "Notice retrieved");
        Ok(detail)
    }
}
