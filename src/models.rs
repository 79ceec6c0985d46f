// Core data structures for the doffin scraper
//
// Every value here is fetch-scoped: built fresh per call, serialized into the
// response and dropped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::is_http_url;

/// Structured search filter
///
/// All fields are optional except `page`, which defaults to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub query: Option<String>,
    pub buyer: Option<String>,
    pub published_from: Option<NaiveDate>,
    pub published_to: Option<NaiveDate>,
    pub deadline_to: Option<NaiveDate>,
    pub county: Option<String>,
    pub procedure: Option<String>,
    pub cpv_codes: Vec<String>,
    pub page: u32,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            query: None,
            buyer: None,
            published_from: None,
            published_to: None,
            deadline_to: None,
            county: None,
            procedure: None,
            cpv_codes: Vec::new(),
            page: 1,
        }
    }
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn buyer(mut self, buyer: impl Into<String>) -> Self {
        self.buyer = Some(buyer.into());
        self
    }

    pub fn published_from(mut self, date: NaiveDate) -> Self {
        self.published_from = Some(date);
        self
    }

    pub fn published_to(mut self, date: NaiveDate) -> Self {
        self.published_to = Some(date);
        self
    }

    pub fn deadline_to(mut self, date: NaiveDate) -> Self {
        self.deadline_to = Some(date);
        self
    }

    pub fn county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn procedure(mut self, procedure: impl Into<String>) -> Self {
        self.procedure = Some(procedure.into());
        self
    }

    pub fn cpv<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cpv_codes.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Parse a calendar date given as `YYYY-MM-DD`
    ///
    /// Malformed dates are a caller error and are never silently dropped.
    pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
            Error::invalid_input(format!(
                "{field}: '{value}' is not a valid date (expected YYYY-MM-DD): {e}"
            ))
        })
    }

    /// Reject filters that cannot be turned into a request
    pub fn validate(&self) -> Result<()> {
        if self.page < 1 {
            return Err(Error::invalid_input("page must be 1 or greater"));
        }

        if let (Some(from), Some(to)) = (self.published_from, self.published_to) {
            if from > to {
                return Err(Error::invalid_input(format!(
                    "published_from ({from}) is after published_to ({to})"
                )));
            }
        }

        Ok(())
    }
}

/// One row of a search listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeSummary {
    /// Notice identifier (never empty)
    pub id: String,
    pub title: Option<String>,
    pub buyer: Option<String>,
    pub published: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub cpv_codes: Vec<String>,
    /// Canonical detail URL (never empty)
    pub url: String,
}

/// Downloadable document attached to a notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub url: String,
}

/// Full notice record from a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeDetail {
    pub id: String,
    pub title: String,
    pub buyer: Option<String>,
    pub description: Option<String>,
    pub cpv_codes: Vec<String>,
    pub published: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub documents: Vec<DocumentRef>,
    pub url: String,
    /// Visible page text, truncated
    pub raw_text: Option<String>,
}

/// Result of a search call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<NoticeSummary>,
    pub source_url: String,
}

/// What `get_notice` was asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeRef {
    /// Known identifier, resolved to the canonical detail URL
    Id(String),
    /// Direct URL to a detail page
    Url(String),
}

impl NoticeRef {
    /// Interpret user input as a URL or an identifier
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(Error::invalid_input("notice identifier or URL is empty"));
        }

        if input.starts_with("http://") || input.starts_with("https://") {
            if is_http_url(input) {
                return Ok(Self::Url(input.to_string()));
            }
            return Err(Error::invalid_input(format!("malformed notice URL: {input}")));
        }

        let valid_id = input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && input.chars().any(|c| c.is_ascii_alphanumeric());
        if !valid_id {
            return Err(Error::invalid_input(format!(
                "'{input}' is neither a notice identifier nor an http(s) URL"
            )));
        }

        Ok(Self::Id(input.to_string()))
    }
}

impl std::fmt::Display for NoticeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}
