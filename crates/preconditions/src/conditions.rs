//! Conditional request headers.
//!
//! Malformed values are dropped while parsing, so a garbled header behaves
//! exactly like a missing one.

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_UNMODIFIED_SINCE};
use http::HeaderName;

use crate::http_date;

/// One member of an `If-Match` / `If-None-Match` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagToken {
    /// The `*` wildcard
    Any,
    /// A quoted entity tag exactly as sent, including any `W/` prefix
    Tag(String),
}

impl TagToken {
    /// Parse a single list member.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value == "*" {
            return Some(Self::Any);
        }

        let opaque = value.strip_prefix("W/").unwrap_or(value);
        let well_formed = opaque.len() >= 2
            && opaque.starts_with('"')
            && opaque.ends_with('"')
            && !opaque[1..opaque.len() - 1].contains('"');

        well_formed.then(|| Self::Tag(value.to_string()))
    }

    /// Whether this is the wildcard.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Exact comparison against a quoted local tag. The wildcard never
    /// matches here.
    pub fn matches(&self, quoted: &str) -> bool {
        match self {
            Self::Any => false,
            Self::Tag(tag) => tag == quoted,
        }
    }
}

/// Split an entity tag list on commas that are not inside quotes.
pub fn parse_tag_list(value: &str) -> Vec<TagToken> {
    let mut tokens = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                tokens.extend(TagToken::parse(&value[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.extend(TagToken::parse(&value[start..]));

    tokens
}

/// The conditional headers carried by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConditions {
    /// `If-Match` tokens in order
    pub if_match: Vec<TagToken>,
    /// `If-None-Match` tokens in order
    pub if_none_match: Vec<TagToken>,
    /// `If-Modified-Since`
    pub if_modified_since: Option<DateTime<Utc>>,
    /// `If-Unmodified-Since`
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl RequestConditions {
    /// No conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read conditions from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            if_match: tag_lists(headers, &IF_MATCH),
            if_none_match: tag_lists(headers, &IF_NONE_MATCH),
            if_modified_since: date_header(headers, &IF_MODIFIED_SINCE),
            if_unmodified_since: date_header(headers, &IF_UNMODIFIED_SINCE),
        }
    }

    /// Append `If-Match` tokens from a raw header value.
    #[must_use]
    pub fn with_if_match(mut self, value: &str) -> Self {
        self.if_match.extend(parse_tag_list(value));
        self
    }

    /// Append `If-None-Match` tokens from a raw header value.
    #[must_use]
    pub fn with_if_none_match(mut self, value: &str) -> Self {
        self.if_none_match.extend(parse_tag_list(value));
        self
    }

    /// Set `If-Modified-Since`.
    #[must_use]
    pub fn with_if_modified_since(mut self, ts: DateTime<Utc>) -> Self {
        self.if_modified_since = Some(ts);
        self
    }

    /// Set `If-Unmodified-Since`.
    #[must_use]
    pub fn with_if_unmodified_since(mut self, ts: DateTime<Utc>) -> Self {
        self.if_unmodified_since = Some(ts);
        self
    }

    /// Whether the request carries no usable condition.
    pub fn is_empty(&self) -> bool {
        self.if_match.is_empty()
            && self.if_none_match.is_empty()
            && self.if_modified_since.is_none()
            && self.if_unmodified_since.is_none()
    }
}

fn tag_lists(headers: &HeaderMap, name: &HeaderName) -> Vec<TagToken> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_tag_list)
        .collect()
}

fn date_header(headers: &HeaderMap, name: &HeaderName) -> Option<DateTime<Utc>> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(http_date::parse)
}
