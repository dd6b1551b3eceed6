//! Wire types shared by the HTTP server and client.
//!
//! Request and response bodies are JSON envelopes (`{"dream": ...}`,
//! `{"dreams": [...]}`), keys in camelCase.

use crate::{error::Result, Dream, DreamId, DreamStats, DreamType};
use serde::{Deserialize, Serialize};

/// Header carrying the raw Telegram init data.
pub const AUTH_HEADER: &str = "X-Telegram-Auth";

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page the server will return.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Value of the `type` filter that means "any type".
pub const ALL_TYPES: &str = "all";

/// Parse an optional `type` filter; `None`, empty and `"all"` mean no filter.
pub fn parse_type_filter(value: Option<&str>) -> Result<Option<DreamType>> {
    match value.map(str::trim) {
        None | Some("") | Some(ALL_TYPES) => Ok(None),
        Some(name) => name.parse().map(Some),
    }
}

/// Query parameters for listing dreams.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Case-insensitive substring over title, content and tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dream_type: Option<String>,
}

impl ListQuery {
    pub fn page(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_type(mut self, dream_type: DreamType) -> Self {
        self.dream_type = Some(dream_type.as_str().to_string());
        self
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        self.limit
            .map(|l| l.clamp(1, MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn type_filter(&self) -> Result<Option<DreamType>> {
        parse_type_filter(self.dream_type.as_deref())
    }

    /// `ILIKE` pattern for the search term, wildcards in the term escaped.
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }

    /// The query for the page after one that returned `returned` rows, or
    /// `None` when that page was the last.
    pub fn next_page(&self, returned: usize) -> Option<ListQuery> {
        let limit = self.limit();
        if (returned as i64) < limit {
            return None;
        }
        Some(ListQuery {
            offset: Some(self.offset() + limit),
            limit: Some(limit),
            ..self.clone()
        })
    }
}

/// Query parameters for statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    /// RFC 3339 instant; dreams before it are excluded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// RFC 3339 instant; the whole UTC day it falls on is included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub dream_type: Option<String>,
}

impl StatsQuery {
    pub fn type_filter(&self) -> Result<Option<DreamType>> {
        parse_type_filter(self.dream_type.as_deref())
    }
}

/// `{"dream": ...}` request or response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamEnvelope<T> {
    pub dream: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamsResponse {
    pub dreams: Vec<Dream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: DreamId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: DreamStats,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
