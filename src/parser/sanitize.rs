//! Text cleanup for values extracted from notice pages
//!
//! Single-line fields (titles, buyer names, labels) go through
//! [`clean_inline`]; multi-line fields (descriptions, page text) go through
//! [`sanitize_text`], which keeps paragraph breaks.

use regex::Regex;
use std::sync::LazyLock;

static SPACES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").expect("Invalid SPACES regex"));

static MULTI_NEWLINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid MULTI_NEWLINE regex"));

static ANY_WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\u{00A0}]+").expect("Invalid ANY_WHITESPACE regex"));

/// Sanitize multi-line text
///
/// Steps, in order:
/// 1. Remove zero-width characters
/// 2. Remove control characters (except newline/tab)
/// 3. Decode leftover HTML entities
/// 4. Collapse runs of spaces and tabs
/// 5. Trim each line
/// 6. Collapse three or more newlines into one blank line
///
/// # Examples
///
/// ```
/// use doffin::parser::sanitize::sanitize_text;
///
/// let dirty = "Rammeavtale\u{200B} for   drift\n\n\n\nav IT-tjenester";
/// assert_eq!(sanitize_text(dirty), "Rammeavtale for drift\n\nav IT-tjenester");
/// ```
pub fn sanitize_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = remove_zero_width(&text);
    let text = remove_control_chars(&text);
    let text = decode_html_entities(&text);
    let text = SPACES_REGEX.replace_all(&text, " ");
    let text = trim_lines(&text);
    let text = MULTI_NEWLINE_REGEX.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Clean a single-line value: every whitespace run becomes one space
///
/// # Examples
///
/// ```
/// use doffin::parser::sanitize::clean_inline;
///
/// assert_eq!(clean_inline("  Oslo\n   kommune "), "Oslo kommune");
/// ```
pub fn clean_inline(text: &str) -> String {
    let text = remove_zero_width(text);
    let text = decode_html_entities(&text);
    ANY_WHITESPACE_REGEX
        .replace_all(text.trim(), " ")
        .trim()
        .to_string()
}

/// Remove zero-width spaces, direction marks and the BOM
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Remove control characters, keeping `\n` and `\t`
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Decode entities that survive double escaping in CMS output
///
/// # Examples
///
/// ```
/// use doffin::parser::sanitize::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Bygg &amp; anlegg"), "Bygg & anlegg");
/// ```
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&aring;", "å")
        .replace("&oslash;", "ø")
        .replace("&aelig;", "æ")
        .replace("&Aring;", "Å")
        .replace("&Oslash;", "Ø")
        .replace("&AElig;", "Æ")
        .replace("&amp;", "&")
}

fn trim_lines(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}
