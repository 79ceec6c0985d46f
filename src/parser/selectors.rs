//! Extraction strategies for Doffin listing and notice pages
//!
//! Every field has an ordered list of [`Strategy`] values. The first strategy
//! producing a non-empty value wins, so a markup change that breaks the
//! primary selector degrades to a fallback instead of losing the field.

use lazy_static::lazy_static;
use scraper::{ElementRef, Node, Selector};
use serde_json::{Map, Value};

use super::sanitize::{clean_inline, sanitize_text};

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// Label texts (lowercase prefixes) for definition-list style fields
pub const BUYER_LABELS: &[&str] = &["oppdragsgiver", "innkjøper", "buyer"];
pub const PUBLISHED_LABELS: &[&str] = &[
    "publisert",
    "kunngjøringsdato",
    "publiseringsdato",
    "published",
];
pub const DEADLINE_LABELS: &[&str] = &["tilbudsfrist", "frist", "deadline"];
pub const CPV_LABELS: &[&str] = &["cpv"];

/// Elements whose text never counts as visible content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line in block text
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section",
    "article", "dd", "dt",
];

/// Where a strategy looks
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// Element to search in (the item card, or the document root)
    pub element: ElementRef<'a>,
    /// Structured data objects found on the page
    pub json_ld: &'a [Map<String, Value>],
}

impl<'a> Scope<'a> {
    /// Scope without structured data
    pub fn of(element: ElementRef<'a>) -> Self {
        Self {
            element,
            json_ld: &[],
        }
    }
}

/// One way of finding a field value
#[derive(Debug)]
pub enum Strategy {
    /// First non-empty string under any of the keys, searched across structured data objects
    JsonLd(&'static [&'static str]),
    /// Single-line text of the first non-empty match
    Text(Selector),
    /// Multi-line text of the first non-empty match, paragraph breaks kept
    Block(Selector),
    /// Attribute of the first match carrying a non-empty value
    Attr(Selector, &'static str),
    /// Value cell following a `<dt>`/`<th>` whose text starts with one of the labels
    Labeled(&'static [&'static str]),
    /// Like `Labeled`, keeping line breaks inside the value cell
    LabeledBlock(&'static [&'static str]),
}

impl Strategy {
    /// Apply the strategy; `None` when nothing usable was found
    pub fn extract(&self, scope: &Scope<'_>) -> Option<String> {
        match self {
            Self::JsonLd(keys) => json_ld_text(scope.json_ld, keys),
            Self::Text(selector) => self_and_descendants(scope.element, selector)
                .map(|el| clean_inline(&el.text().collect::<String>()))
                .find(|text| !text.is_empty()),
            Self::Block(selector) => self_and_descendants(scope.element, selector)
                .map(block_text)
                .find(|text| !text.is_empty()),
            Self::Attr(selector, attr) => self_and_descendants(scope.element, selector)
                .filter_map(|el| el.value().attr(attr))
                .map(clean_inline)
                .find(|value| !value.is_empty()),
            Self::Labeled(labels) => labeled_value(scope.element, labels, |el| {
                clean_inline(&el.text().collect::<String>())
            }),
            Self::LabeledBlock(labels) => labeled_value(scope.element, labels, block_text),
        }
    }
}

/// First value produced by the strategy list
pub fn first_match(strategies: &[Strategy], scope: &Scope<'_>) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy.extract(scope))
}

/// First value that also survives `convert`
///
/// A strategy whose raw value cannot be converted (an unparsable date, say)
/// falls through to the next one.
pub fn first_converted<T>(
    strategies: &[Strategy],
    scope: &Scope<'_>,
    convert: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    strategies
        .iter()
        .filter_map(|strategy| strategy.extract(scope))
        .find_map(|raw| convert(&raw))
}

/// Texts of every match of the first selector that matches anything
pub fn all_texts(selectors: &[Selector], scope: ElementRef<'_>) -> Vec<String> {
    selectors
        .iter()
        .map(|selector| {
            scope
                .select(selector)
                .map(|el| clean_inline(&el.text().collect::<String>()))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .find(|texts| !texts.is_empty())
        .unwrap_or_default()
}

/// The scope element itself if it matches, followed by matching descendants
fn self_and_descendants<'a, 'b>(
    scope: ElementRef<'a>,
    selector: &'b Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    let own = selector.matches(&scope).then_some(scope);
    own.into_iter().chain(scope.select(selector))
}

fn labeled_value(
    scope: ElementRef<'_>,
    labels: &[&str],
    value_text: impl Fn(ElementRef<'_>) -> String,
) -> Option<String> {
    for wanted in labels {
        for cell in scope.select(&LABEL_CELLS) {
            let label = clean_inline(&cell.text().collect::<String>()).to_lowercase();
            let label = label.trim_end_matches(':').trim();
            if !label.starts_with(wanted) {
                continue;
            }

            let value = cell
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .next()
                .map(&value_text);

            if let Some(value) = value.filter(|v| !v.is_empty()) {
                return Some(value);
            }
        }
    }
    None
}

fn json_ld_text(objects: &[Map<String, Value>], keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        objects
            .iter()
            .filter_map(|object| object.get(*key))
            .find_map(json_value_text)
    })
}

/// Every string under the first key present in structured data
pub fn json_ld_list(objects: &[Map<String, Value>], keys: &[&str]) -> Vec<String> {
    for key in keys {
        for object in objects {
            let values: Vec<String> = match object.get(*key) {
                Some(Value::Array(items)) => items.iter().filter_map(json_value_text).collect(),
                Some(other) => json_value_text(other).into_iter().collect(),
                None => continue,
            };
            if !values.is_empty() {
                return values;
            }
        }
    }
    Vec::new()
}

fn json_value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => clean_inline(s),
        Value::Number(n) => n.to_string(),
        Value::Object(object) => {
            return object
                .get("name")
                .or_else(|| object.get("value"))
                .and_then(json_value_text)
        }
        Value::Array(items) => return items.iter().find_map(json_value_text),
        Value::Null | Value::Bool(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Multi-line text of an element, skipping scripts and styles
pub fn block_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(|parent| parent.value().as_element().map(|el| el.name()))
                    .is_some_and(|name| HIDDEN_ELEMENTS.contains(&name));
                if !hidden {
                    out.push_str(text);
                }
            }
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => out.push('\n'),
            _ => {}
        }
    }

    sanitize_text(&out)
}

lazy_static! {
    static ref LABEL_CELLS: Selector = parse_selector!("dt, th");

    // Search listing
    pub static ref LISTING_ITEMS: Vec<Selector> = vec![
        parse_selector!(".notice-card"),
        parse_selector!("[data-test='notice-card']"),
        parse_selector!(".search-result"),
        parse_selector!("article.notice"),
        parse_selector!("li.notice"),
    ];

    /// Last resort when no card container matches: every notice link is an item
    pub static ref LISTING_FALLBACK: Selector = parse_selector!("a[href*='/notices/']");

    pub static ref SUMMARY_LINK: Vec<Strategy> = vec![
        Strategy::Attr(parse_selector!("a[href*='/notices/']"), "href"),
        Strategy::Attr(parse_selector!("a[data-test='notice-link']"), "href"),
        Strategy::Attr(parse_selector!("h2 a, h3 a"), "href"),
    ];

    pub static ref SUMMARY_ID: Vec<Strategy> = vec![
        Strategy::Attr(parse_selector!("[data-notice-id]"), "data-notice-id"),
        Strategy::Attr(parse_selector!("[data-id]"), "data-id"),
    ];

    pub static ref SUMMARY_TITLE: Vec<Strategy> = vec![
        Strategy::Text(parse_selector!(".notice-title")),
        Strategy::Text(parse_selector!("[data-test='notice-title']")),
        Strategy::Text(parse_selector!("h2")),
        Strategy::Text(parse_selector!("h3")),
        Strategy::Text(parse_selector!("a[href*='/notices/']")),
    ];

    pub static ref SUMMARY_BUYER: Vec<Strategy> = vec![
        Strategy::Text(parse_selector!(".notice-buyer")),
        Strategy::Text(parse_selector!("[data-test='buyer']")),
        Strategy::Labeled(BUYER_LABELS),
    ];

    pub static ref SUMMARY_PUBLISHED: Vec<Strategy> = vec![
        Strategy::Attr(parse_selector!("time[datetime][data-test='published']"), "datetime"),
        Strategy::Attr(parse_selector!(".notice-published time[datetime]"), "datetime"),
        Strategy::Text(parse_selector!(".notice-published")),
        Strategy::Text(parse_selector!("[data-test='published']")),
        Strategy::Labeled(PUBLISHED_LABELS),
    ];

    pub static ref SUMMARY_DEADLINE: Vec<Strategy> = vec![
        Strategy::Attr(parse_selector!("time[datetime][data-test='deadline']"), "datetime"),
        Strategy::Attr(parse_selector!(".notice-deadline time[datetime]"), "datetime"),
        Strategy::Text(parse_selector!(".notice-deadline")),
        Strategy::Text(parse_selector!("[data-test='deadline']")),
        Strategy::Labeled(DEADLINE_LABELS),
    ];

    pub static ref SUMMARY_CPV_TAGS: Vec<Selector> = vec![
        parse_selector!(".notice-cpv .tag"),
        parse_selector!("[data-test='cpv'] .tag"),
        parse_selector!(".cpv .tag"),
    ];

    // Notice detail page
    pub static ref JSON_LD: Selector = parse_selector!("script[type='application/ld+json']");

    pub static ref BODY: Selector = parse_selector!("body");

    pub static ref DETAIL_ID: Vec<Strategy> = vec![
        Strategy::JsonLd(&["identifier", "noticeId"]),
        Strategy::Attr(parse_selector!("[data-notice-id]"), "data-notice-id"),
    ];

    pub static ref DETAIL_CANONICAL: Vec<Strategy> = vec![
        Strategy::Attr(parse_selector!("link[rel='canonical']"), "href"),
        Strategy::Attr(parse_selector!("meta[property='og:url']"), "content"),
    ];

    pub static ref DETAIL_TITLE: Vec<Strategy> = vec![
        Strategy::JsonLd(&["title", "headline"]),
        Strategy::Text(parse_selector!("h1")),
        Strategy::Text(parse_selector!("[data-test='title']")),
        Strategy::Attr(parse_selector!("meta[property='og:title']"), "content"),
    ];

    pub static ref DETAIL_BUYER: Vec<Strategy> = vec![
        Strategy::JsonLd(&["buyer", "contractingAuthority"]),
        Strategy::Text(parse_selector!("[data-test='buyer-name']")),
        Strategy::Text(parse_selector!(".buyer .value")),
        Strategy::Text(parse_selector!(".notice-buyer")),
        Strategy::Labeled(BUYER_LABELS),
    ];

    pub static ref DETAIL_DESCRIPTION: Vec<Strategy> = vec![
        Strategy::JsonLd(&["description"]),
        Strategy::Block(parse_selector!(".notice-description")),
        Strategy::Block(parse_selector!("[data-test='description']")),
        Strategy::Block(parse_selector!("article")),
    ];

    pub static ref DETAIL_PUBLISHED: Vec<Strategy> = vec![
        Strategy::JsonLd(&["published", "datePublished", "publicationDate"]),
        Strategy::Attr(parse_selector!("time[datetime][data-test='published']"), "datetime"),
        Strategy::Text(parse_selector!("[data-test='published']")),
        Strategy::Text(parse_selector!(".notice-published")),
        Strategy::Labeled(PUBLISHED_LABELS),
    ];

    pub static ref DETAIL_DEADLINE: Vec<Strategy> = vec![
        Strategy::JsonLd(&["deadline", "tenderDeadline", "validThrough"]),
        Strategy::Attr(parse_selector!("time[datetime][data-test='deadline']"), "datetime"),
        Strategy::Text(parse_selector!("[data-test='deadline']")),
        Strategy::Text(parse_selector!(".notice-deadline")),
        Strategy::Labeled(DEADLINE_LABELS),
    ];

    pub static ref DETAIL_CPV_TAGS: Vec<Selector> = vec![
        parse_selector!("[data-test='cpv'] .tag"),
        parse_selector!(".cpv .tag"),
        parse_selector!(".notice-cpv .tag"),
    ];

    pub static ref DETAIL_CPV_TEXT: Vec<Strategy> = vec![
        Strategy::Block(parse_selector!("[data-test='cpv']")),
        Strategy::LabeledBlock(CPV_LABELS),
    ];

    pub static ref DOCUMENT_LINKS: Selector = parse_selector!(
        "a[href$='.pdf'], a[href$='.PDF'], a[href*='/Document/'], a[href*='/document/'], a[data-test='document-link']"
    );
}
