//! HTML parsing and data extraction
//!
//! Turns Doffin listing pages into [`NoticeSummary`] rows and detail pages
//! into [`NoticeDetail`] records. Parsing is tolerant: a missing field is
//! `None`, never an error. The only hard failure is a detail page with no
//! recognizable title.

pub mod detail;
pub mod sanitize;
pub mod search;
pub mod selectors;

pub use detail::{DetailParser, MAX_RAW_TEXT_CHARS};
pub use search::SearchParser;

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use url::Url;

use crate::models::{NoticeDetail, NoticeSummary};
use crate::utils::error::ParseError;

static NOTICE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/notices/([^/?#\s]+)").expect("Invalid NOTICE_ID regex"));

static ISO_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("Invalid ISO_DATE regex")
});

static DOTTED_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").expect("Invalid DOTTED_DATE regex")
});

static WRITTEN_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\.?\s+(jan|feb|mar|apr|mai|jun|jul|aug|sep|okt|nov|des)[a-zæøå]*\.?\s+(\d{4})\b",
    )
    .expect("Invalid WRITTEN_DATE regex")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y.%m.%d"];

/// Parse a search listing page using the default site root
///
/// Never fails; an unrecognizable page yields an empty list.
pub fn parse_search(html: &str) -> Vec<NoticeSummary> {
    SearchParser::default().parse(html)
}

/// Parse a notice detail page fetched from `source_url`
///
/// # Errors
///
/// Returns `ParseError::TitleNotFound` when no title strategy matches
pub fn parse_notice(html: &str, source_url: &str) -> Result<NoticeDetail, ParseError> {
    DetailParser::default().parse(html, source_url)
}

/// Normalize a date in any of the formats seen on the site to a calendar date
///
/// Accepts RFC 3339 timestamps, ISO dates, Norwegian `dd.mm.yyyy`, and
/// written dates like `15. januar 2024`, also when embedded in other text.
/// Timestamps keep the date as written, without converting time zones.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use doffin::parser::normalize_date;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
/// assert_eq!(normalize_date("2024-01-15"), expected);
/// assert_eq!(normalize_date("15.01.2024"), expected);
/// assert_eq!(normalize_date("Publisert 15. januar 2024"), expected);
/// assert_eq!(normalize_date("snart"), None);
/// ```
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    // Dates embedded in surrounding text
    if let Some(caps) = ISO_DATE_REGEX.captures(raw) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = DOTTED_DATE_REGEX.captures(raw) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    if let Some(caps) = WRITTEN_DATE_REGEX.captures(raw) {
        let month = month_number(&caps[2].to_lowercase())?;
        let day = caps[1].parse().ok()?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(prefix: &str) -> Option<u32> {
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "mai" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "okt" => 10,
        "nov" => 11,
        "des" => 12,
        _ => return None,
    };
    Some(month)
}

/// Identifier from a `/notices/{id}` URL or path
///
/// # Examples
///
/// ```
/// use doffin::parser::extract_notice_id;
///
/// assert_eq!(
///     extract_notice_id("https://doffin.no/notices/2024-123456?tab=docs").as_deref(),
///     Some("2024-123456")
/// );
/// assert_eq!(extract_notice_id("https://doffin.no/search"), None);
/// ```
pub fn extract_notice_id(url: &str) -> Option<String> {
    NOTICE_ID_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Last non-empty path segment of an absolute URL
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Canonical detail URL for an identifier under `base`
pub fn notice_url(base: &Url, id: &str) -> Option<String> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(["notices", id]);
    Some(url.to_string())
}

/// Split raw CPV values on `,` `;` and newlines, trim, drop empties and
/// duplicates while keeping first-seen order
///
/// # Examples
///
/// ```
/// use doffin::parser::split_cpv_codes;
///
/// let codes = split_cpv_codes(["72000000, 48000000", "72000000;\n30200000"]);
/// assert_eq!(codes, vec!["72000000", "48000000", "30200000"]);
/// ```
pub fn split_cpv_codes<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut codes = Vec::new();

    for value in values {
        for code in value.as_ref().split([',', ';', '\n']) {
            let code = code.trim();
            if !code.is_empty() && seen.insert(code.to_string()) {
                codes.push(code.to_string());
            }
        }
    }

    codes
}
