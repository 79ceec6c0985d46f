//! Tool adapter for protocol front-ends
//!
//! Exposes `search_notices` and `get_notice` as named tools with JSON input
//! schemas, and dispatches JSON arguments to [`NoticeClient`]. Results and
//! errors are plain JSON values so any front-end can forward them as-is.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::crawler::NoticeClient;
use crate::error::{Error, Result};
use crate::models::{NoticeRef, SearchFilter};

/// Tool name for searching notices
pub const SEARCH_NOTICES: &str = "search_notices";

/// Tool name for fetching one notice
pub const GET_NOTICE: &str = "get_notice";

/// Tool description as advertised to a front-end
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Arguments of `search_notices`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchNoticesArgs {
    pub q: Option<String>,
    pub cpv: Option<Vec<String>>,
    pub buyer: Option<String>,
    pub published_from: Option<String>,
    pub published_to: Option<String>,
    pub deadline_to: Option<String>,
    pub county: Option<String>,
    pub procedure: Option<String>,
    /// Signed so that 0 and negative pages are reported, not rejected by serde
    pub page: Option<i64>,
}

impl SearchNoticesArgs {
    /// Validate the arguments and build a filter
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for malformed dates or a page below 1
    pub fn into_filter(self) -> Result<SearchFilter> {
        let parse = |field: &str, value: Option<String>| -> Result<_> {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| SearchFilter::parse_date(field, &v))
                .transpose()
        };

        let page = match self.page {
            None => 1,
            Some(page) if page >= 1 => u32::try_from(page)
                .map_err(|_| Error::invalid_input(format!("page {page} is too large")))?,
            Some(page) => {
                return Err(Error::invalid_input(format!(
                    "page must be 1 or greater, got {page}"
                )))
            }
        };

        let filter = SearchFilter {
            query: self.q,
            buyer: self.buyer,
            published_from: parse("published_from", self.published_from)?,
            published_to: parse("published_to", self.published_to)?,
            deadline_to: parse("deadline_to", self.deadline_to)?,
            county: self.county,
            procedure: self.procedure,
            cpv_codes: self.cpv.unwrap_or_default(),
            page,
        };

        filter.validate()?;
        Ok(filter)
    }
}

/// Arguments of `get_notice`; `url` wins when both are given
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GetNoticeArgs {
    pub notice_id: Option<String>,
    pub url: Option<String>,
}

impl GetNoticeArgs {
    /// Resolve to what should be fetched
    pub fn into_ref(self) -> Result<NoticeRef> {
        match (self.url, self.notice_id) {
            (Some(url), _) if !url.trim().is_empty() => NoticeRef::parse(&url),
            (_, Some(id)) if !id.trim().is_empty() => NoticeRef::parse(&id),
            _ => Err(Error::invalid_input(
                "either notice_id or url must be provided",
            )),
        }
    }
}

/// Dispatches tool calls to a shared client
#[derive(Debug, Clone)]
pub struct NoticeTools {
    client: Arc<NoticeClient>,
}

impl NoticeTools {
    pub fn new(client: Arc<NoticeClient>) -> Self {
        Self { client }
    }

    /// Definitions of every tool this adapter serves
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: SEARCH_NOTICES,
                description: "Search public procurement notices on doffin.no",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "q": {"type": "string", "description": "Free-text query"},
                        "cpv": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "CPV codes"
                        },
                        "buyer": {"type": "string", "description": "Contracting authority"},
                        "published_from": {"type": "string", "format": "date"},
                        "published_to": {"type": "string", "format": "date"},
                        "deadline_to": {"type": "string", "format": "date"},
                        "county": {"type": "string"},
                        "procedure": {"type": "string"},
                        "page": {"type": "integer", "minimum": 1, "default": 1}
                    },
                    "additionalProperties": false
                }),
            },
            ToolDefinition {
                name: GET_NOTICE,
                description: "Fetch and parse a single notice page from doffin.no",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "notice_id": {"type": "string", "description": "Notice identifier"},
                        "url": {"type": "string", "description": "Direct notice URL"}
                    },
                    "additionalProperties": false
                }),
            },
        ]
    }

    /// Run the named tool with JSON arguments
    ///
    /// `null` arguments are treated as an empty object.
    ///
    /// # Errors
    ///
    /// `Error::InvalidInput` for an unknown tool or malformed arguments, and
    /// whatever the underlying operation returns otherwise
    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        let args = if args.is_null() { json!({}) } else { args };

        let output = match name {
            SEARCH_NOTICES => {
                let filter = parse_args::<SearchNoticesArgs>(name, args)?.into_filter()?;
                let response = self.client.search_notices(&filter).await?;
                to_json(&response)?
            }
            GET_NOTICE => {
                let notice = parse_args::<GetNoticeArgs>(name, args)?.into_ref()?;
                let detail = self.client.get_notice(&notice).await?;
                to_json(&detail)?
            }
            other => return Err(Error::invalid_input(format!("unknown tool: {other}"))),
        };

        info!(tool = name, "Tool call completed");
        Ok(output)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::invalid_input(format!("invalid arguments for {tool}: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::internal(format!("serialization failed: {e}")))
}

/// JSON error payload for a failed call
///
/// Carries the kind, a message, and the URL and HTTP status when known.
pub fn error_payload(err: &Error) -> Value {
    json!({
        "error": {
            "kind": err.kind(),
            "category": err.category().as_str(),
            "message": err.to_string(),
            "url": err.url(),
            "status": err.status(),
            "recoverable": err.is_recoverable(),
        }
    })
}
