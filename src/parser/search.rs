//! Search listing parser

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;

use super::selectors::{
    all_texts, first_converted, first_match, Scope, LISTING_FALLBACK, LISTING_ITEMS,
    SUMMARY_BUYER, SUMMARY_CPV_TAGS, SUMMARY_DEADLINE, SUMMARY_ID, SUMMARY_LINK,
    SUMMARY_PUBLISHED, SUMMARY_TITLE,
};
use super::{extract_notice_id, last_path_segment, normalize_date, notice_url, split_cpv_codes};
use crate::config::DEFAULT_BASE_URL;
use crate::error::{Error, Result};
use crate::models::NoticeSummary;
use crate::utils::resolve_url;

/// Extracts notice summaries from a search results page
#[derive(Debug, Clone)]
pub struct SearchParser {
    /// Site root relative links are resolved against
    base: Url,
}

impl SearchParser {
    /// Create a parser resolving links against `base_url`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `base_url` is not a valid URL
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid base URL '{base_url}': {e}")))?;
        Ok(Self { base })
    }

    /// Parse a listing page
    ///
    /// Items are returned in page order. An item without both an identifier
    /// and a link is skipped; a notice listed twice is kept once.
    pub fn parse(&self, html: &str) -> Vec<NoticeSummary> {
        let document = Html::parse_document(html);
        let items = listing_items(&document);

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            match self.parse_item(item) {
                Some(summary) => {
                    if seen.insert(summary.id.clone()) {
                        results.push(summary);
                    }
                }
                None => warn!(index, "Skipping listing item without identifier or link"),
            }
        }

        debug!(count = results.len(), "Parsed search listing");
        results
    }

    fn parse_item(&self, item: ElementRef<'_>) -> Option<NoticeSummary> {
        let scope = Scope::of(item);

        let link = first_converted(&SUMMARY_LINK, &scope, |href| resolve_url(&self.base, href));
        let id = first_match(&SUMMARY_ID, &scope)
            .or_else(|| link.as_deref().and_then(extract_notice_id))
            .or_else(|| link.as_deref().and_then(last_path_segment))?;
        let url = match link {
            Some(link) => link,
            None => notice_url(&self.base, &id)?,
        };

        Some(NoticeSummary {
            title: first_match(&SUMMARY_TITLE, &scope),
            buyer: first_match(&SUMMARY_BUYER, &scope),
            published: first_converted(&SUMMARY_PUBLISHED, &scope, normalize_date),
            deadline: first_converted(&SUMMARY_DEADLINE, &scope, normalize_date),
            cpv_codes: split_cpv_codes(all_texts(&SUMMARY_CPV_TAGS, item)),
            id,
            url,
        })
    }
}

impl Default for SearchParser {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        }
    }
}

/// Item containers of the first layout that matches, or bare notice links
fn listing_items(document: &Html) -> Vec<ElementRef<'_>> {
    for selector in LISTING_ITEMS.iter() {
        let items: Vec<_> = document.select(selector).collect();
        if !items.is_empty() {
            return items;
        }
    }

    let links: Vec<_> = document.select(&LISTING_FALLBACK).collect();
    if !links.is_empty() {
        debug!(
            count = links.len(),
            "No result cards found, using notice links"
        );
    }
    links
}
