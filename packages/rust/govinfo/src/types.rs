//! GovInfo API request and response types.
//!
//! Field names follow the API's camelCase. Anything the API sends that is not
//! modelled here is kept in an `extra` map and read through typed accessors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Sort clause for the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSort {
    pub field: String,
    pub sort_order: String,
}

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub page_size: u32,
    pub offset_mark: String,
    pub result_level: String,
    pub historical: bool,
    pub sorts: Vec<SearchSort>,
}

impl SearchRequest {
    /// First page of `query`, sorted by publish date ascending.
    pub fn new(query: impl Into<String>, page_size: u32) -> Self {
        Self {
            query: query.into(),
            page_size,
            offset_mark: "*".into(),
            result_level: "default".into(),
            historical: true,
            sorts: vec![SearchSort {
                field: "publishdate".into(),
                sort_order: "ASC".into(),
            }],
        }
    }

    /// Same query, starting at `offset_mark`.
    pub fn with_offset_mark(mut self, offset_mark: impl Into<String>) -> Self {
        self.offset_mark = offset_mark.into();
        self
    }
}

/// Query for every bill published or ingested on `date`.
pub fn bills_for_date_query(date: NaiveDate) -> String {
    let d = date.format("%Y-%m-%d");
    format!("collection:BILLS AND (publishdate:{d} OR ingestdate:{d})")
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub package_id: String,
    #[serde(default)]
    pub granule_id: Option<String>,
    #[serde(default)]
    pub collection_code: Option<String>,
    /// Link to the package summary JSON.
    #[serde(default)]
    pub result_link: String,
    #[serde(default)]
    pub related_link: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub date_issued: Option<String>,
    #[serde(default)]
    pub date_ingested: Option<String>,
    #[serde(default)]
    pub government_author: Vec<String>,
    /// Artifact links keyed by kind (`xmlLink`, `pdfLink`, `txtLink`, ...).
    #[serde(default)]
    pub download: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn xml_link(&self) -> Option<&str> {
        self.download.get("xmlLink").map(String::as_str)
    }

    pub fn date_issued(&self) -> Option<NaiveDate> {
        self.date_issued.as_deref().and_then(parse_date)
    }

    /// Raw value of a field the API sent but this type does not model.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra(key).and_then(Value::as_str)
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub count: u64,
    /// Cursor for the next page; absent on the last page.
    #[serde(default)]
    pub offset_mark: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

// ---------------------------------------------------------------------------
// Package summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTitle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// The package summary JSON behind a search result's `resultLink`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub short_titles: Vec<ShortTitle>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publisher: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub congress: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub session: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_chamber: String,
    /// Page count; the API sends either a number or a numeric string.
    #[serde(default)]
    pub pages: Option<Value>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_appropriation: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bill_version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bill_type: String,
    #[serde(default)]
    pub date_issued: Option<String>,
    #[serde(default)]
    pub committees: Vec<Value>,
    #[serde(default)]
    pub members: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageSummary {
    /// Non-empty short titles in API order.
    pub fn short_title_texts(&self) -> Vec<String> {
        self.short_titles
            .iter()
            .filter_map(|st| st.title.as_deref())
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn num_pages(&self) -> Option<u32> {
        match self.pages.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `dateIssued` as a date; `None` when missing or unparsable.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date_issued.as_deref().and_then(parse_date)
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra(key).and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub collection_code: String,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default)]
    pub package_count: Option<u64>,
    #[serde(default)]
    pub granule_count: Option<u64>,
}

/// Response of `GET /collections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    #[serde(default)]
    pub collections: Vec<CollectionItem>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse `YYYY-MM-DD`, tolerating a trailing time component.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}
