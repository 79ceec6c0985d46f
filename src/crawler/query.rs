//! Search and notice URL construction
//!
//! URLs are a pure function of the filter: parameters always appear in the
//! same order, values are form-encoded, and empty values are left out.

use url::form_urlencoded;
use url::Url;

use crate::error::{Error, Result};
use crate::models::SearchFilter;

/// Path of the search listing under the site root
pub const SEARCH_PATH: &str = "search";

/// Path prefix of notice detail pages
pub const NOTICE_PATH: &str = "notices";

/// Query parameter names, in emission order
pub mod params {
    pub const QUERY: &str = "q";
    pub const BUYER: &str = "buyer";
    pub const PUBLISHED_FROM: &str = "publishedFrom";
    pub const PUBLISHED_TO: &str = "publishedTo";
    pub const DEADLINE_TO: &str = "deadlineTo";
    pub const COUNTY: &str = "county";
    pub const PROCEDURE: &str = "procedure";
    pub const CPV: &str = "cpvCodesLabel";
    pub const PAGE: &str = "page";
}

/// Builds request URLs relative to a site root
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base: Url,
}

impl QueryBuilder {
    /// Create a builder for the given site root
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `base_url` is not an absolute http(s) URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url.trim())
            .map_err(|e| Error::config(format!("invalid base URL '{base_url}': {e}")))?;

        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base URL must be an absolute http(s) URL: {base_url}"
            )));
        }

        Ok(Self { base })
    }

    /// Site root
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build the search listing URL for a filter
    ///
    /// The first page carries no `page` parameter.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for page 0 or an inverted date range
    pub fn build_search_url(&self, filter: &SearchFilter) -> Result<String> {
        filter.validate()?;

        let mut url = self.endpoint(&[SEARCH_PATH])?;
        let query = encode_params(&search_params(filter));
        url.set_query((!query.is_empty()).then_some(query.as_str()));

        Ok(url.to_string())
    }

    /// Canonical detail URL of a notice
    pub fn notice_url(&self, id: &str) -> Result<String> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::invalid_input("notice identifier is empty"));
        }

        Ok(self.endpoint(&[NOTICE_PATH, id])?.to_string())
    }

    /// Accept a caller-supplied notice URL only if it points at this site
    ///
    /// The host and port must match the site root; a leading `www.` on
    /// either side is ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a non-http(s) URL or another host
    pub fn check_notice_url(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url.trim())
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| Error::invalid_input(format!("not an http(s) URL: {url}")))?;

        let same_host = match (parsed.host_str(), self.base.host_str()) {
            (Some(host), Some(base)) => bare_host(host).eq_ignore_ascii_case(bare_host(base)),
            _ => false,
        };
        if !same_host || parsed.port_or_known_default() != self.base.port_or_known_default() {
            return Err(Error::invalid_input(format!(
                "notice URL must be on {}: {url}",
                self.base
            )));
        }

        Ok(parsed.to_string())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|()| Error::config(format!("base URL cannot carry a path: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Ordered name/value pairs for a filter, empty values removed
pub fn search_params(filter: &SearchFilter) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();

    push_text(&mut pairs, params::QUERY, filter.query.as_deref());
    push_text(&mut pairs, params::BUYER, filter.buyer.as_deref());

    let dates = [
        (params::PUBLISHED_FROM, filter.published_from),
        (params::PUBLISHED_TO, filter.published_to),
        (params::DEADLINE_TO, filter.deadline_to),
    ];
    for (name, date) in dates {
        if let Some(date) = date {
            pairs.push((name, date.format("%Y-%m-%d").to_string()));
        }
    }

    push_text(&mut pairs, params::COUNTY, filter.county.as_deref());
    push_text(&mut pairs, params::PROCEDURE, filter.procedure.as_deref());

    let cpv = filter
        .cpv_codes
        .iter()
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    push_text(&mut pairs, params::CPV, Some(&cpv));

    if filter.page > 1 {
        pairs.push((params::PAGE, filter.page.to_string()));
    }

    pairs
}

fn push_text(pairs: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        pairs.push((name, value.to_string()));
    }
}

fn encode_params(pairs: &[(&'static str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}
