//! Notice detail page parser
//!
//! Structured data (`application/ld+json`) is consulted first for every
//! field, then the visible markup. Relative links resolve against the URL
//! the page was fetched from.

use std::collections::HashSet;

use scraper::Html;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::sanitize::clean_inline;
use super::selectors::{
    all_texts, block_text, first_converted, first_match, json_ld_list, Scope, BODY,
    DETAIL_BUYER, DETAIL_CANONICAL, DETAIL_CPV_TAGS, DETAIL_CPV_TEXT, DETAIL_DEADLINE,
    DETAIL_DESCRIPTION, DETAIL_ID, DETAIL_PUBLISHED, DETAIL_TITLE, DOCUMENT_LINKS, JSON_LD,
};
use super::{extract_notice_id, last_path_segment, normalize_date, split_cpv_codes};
use crate::models::{DocumentRef, NoticeDetail};
use crate::utils::error::ParseError;
use crate::utils::{resolve_url, truncate_chars};

/// Upper bound on the characters kept in `raw_text`
pub const MAX_RAW_TEXT_CHARS: usize = 200_000;

/// Structured data keys holding CPV codes
const JSON_LD_CPV_KEYS: &[&str] = &["cpv", "cpvCodes", "cpvCode"];

/// Structured data types describing the site rather than the notice
const SITE_TYPES: &[&str] = &[
    "WebSite",
    "Organization",
    "GovernmentOrganization",
    "BreadcrumbList",
    "SearchAction",
    "WebPage",
    "ItemPage",
    "CollectionPage",
    "SearchResultsPage",
];

/// Extracts a full notice record from a detail page
#[derive(Debug, Clone)]
pub struct DetailParser {
    max_raw_text_chars: usize,
}

impl DetailParser {
    pub fn new() -> Self {
        Self {
            max_raw_text_chars: MAX_RAW_TEXT_CHARS,
        }
    }

    /// Parser keeping at most `limit` characters of page text
    pub fn with_raw_text_limit(limit: usize) -> Self {
        Self {
            max_raw_text_chars: limit,
        }
    }

    /// Parse a detail page fetched from `source_url`
    ///
    /// # Errors
    ///
    /// - `ParseError::TitleNotFound` if no title strategy matches
    /// - `ParseError::IdentifierNotFound` if neither the page nor its URL
    ///   yields an identifier
    pub fn parse(&self, html: &str, source_url: &str) -> Result<NoticeDetail, ParseError> {
        let document = Html::parse_document(html);
        let json_ld = collect_json_ld(&document);
        let scope = Scope {
            element: document.root_element(),
            json_ld: &json_ld,
        };
        let source = Url::parse(source_url).ok();

        let title = first_match(&DETAIL_TITLE, &scope).ok_or(ParseError::TitleNotFound)?;

        let url = first_converted(&DETAIL_CANONICAL, &scope, |href| {
            resolve_against(source.as_ref(), href)
        })
        .or_else(|| source.as_ref().map(Url::to_string))
        .ok_or(ParseError::IdentifierNotFound)?;

        let id = first_match(&DETAIL_ID, &scope)
            .or_else(|| extract_notice_id(&url))
            .or_else(|| extract_notice_id(source_url))
            .or_else(|| last_path_segment(&url))
            .ok_or(ParseError::IdentifierNotFound)?;

        let link_base = source.or_else(|| Url::parse(&url).ok());

        let detail = NoticeDetail {
            id,
            title,
            buyer: first_match(&DETAIL_BUYER, &scope),
            description: first_match(&DETAIL_DESCRIPTION, &scope),
            cpv_codes: self.cpv_codes(&document, &scope),
            published: first_converted(&DETAIL_PUBLISHED, &scope, normalize_date),
            deadline: first_converted(&DETAIL_DEADLINE, &scope, normalize_date),
            documents: documents(&document, link_base.as_ref()),
            url,
            raw_text: self.raw_text(&document),
        };

        debug!(
            id = %detail.id,
            documents = detail.documents.len(),
            cpv = detail.cpv_codes.len(),
            "Parsed notice"
        );

        Ok(detail)
    }

    fn cpv_codes(&self, document: &Html, scope: &Scope<'_>) -> Vec<String> {
        let from_json = json_ld_list(scope.json_ld, JSON_LD_CPV_KEYS);
        if !from_json.is_empty() {
            return split_cpv_codes(from_json);
        }

        let tags = all_texts(&DETAIL_CPV_TAGS, document.root_element());
        if !tags.is_empty() {
            return split_cpv_codes(tags);
        }

        split_cpv_codes(first_match(&DETAIL_CPV_TEXT, scope))
    }

    fn raw_text(&self, document: &Html) -> Option<String> {
        let body = document.select(&BODY).next()?;
        let text = block_text(body);
        if text.is_empty() {
            return None;
        }
        Some(truncate_chars(&text, self.max_raw_text_chars).to_string())
    }
}

impl Default for DetailParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Document links in page order, one entry per distinct URL
fn documents(document: &Html, base: Option<&Url>) -> Vec<DocumentRef> {
    let mut seen = HashSet::new();

    document
        .select(&DOCUMENT_LINKS)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let url = resolve_against(base, href)?;
            if !seen.insert(url.clone()) {
                return None;
            }

            let name = Some(clean_inline(&link.text().collect::<String>()))
                .filter(|text| !text.is_empty())
                .or_else(|| {
                    link.value()
                        .attr("title")
                        .map(clean_inline)
                        .filter(|text| !text.is_empty())
                })
                .or_else(|| last_path_segment(&url))
                .unwrap_or_else(|| url.clone());

            Some(DocumentRef { name, url })
        })
        .collect()
}

fn resolve_against(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => resolve_url(base, href),
        None => {
            let url = Url::parse(href.trim()).ok()?;
            matches!(url.scheme(), "http" | "https").then(|| url.to_string())
        }
    }
}

/// Every notice-level object from the page's structured data blocks
///
/// Arrays and `@graph` containers are flattened. Malformed blocks are ignored.
fn collect_json_ld(document: &Html) -> Vec<Map<String, Value>> {
    let mut objects = Vec::new();

    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => flatten_json_ld(value, &mut objects),
            Err(e) => debug!(error = %e, "Ignoring malformed JSON-LD block"),
        }
    }

    objects
}

fn flatten_json_ld(value: Value, out: &mut Vec<Map<String, Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, out);
            }
        }
        Value::Object(mut object) => {
            if let Some(graph) = object.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            let site_level = match object.get("@type") {
                Some(Value::String(kind)) => SITE_TYPES.contains(&kind.as_str()),
                Some(Value::Array(kinds)) => kinds
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|kind| SITE_TYPES.contains(&kind)),
                _ => false,
            };
            if !site_level && !object.is_empty() {
                out.push(object);
            }
        }
        _ => {}
    }
}
