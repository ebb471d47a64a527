//! Search query model and history entries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::lenient;
use crate::api::types::{AdvancedSearchRequest, SearchRequest};
use crate::error::AgentError;

/// How the backend matches a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Hybrid,
    Semantic,
    Keyword,
    Fuzzy,
    Exact,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Hybrid => "hybrid",
            SearchMode::Semantic => "semantic",
            SearchMode::Keyword => "keyword",
            SearchMode::Fuzzy => "fuzzy",
            SearchMode::Exact => "exact",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hybrid" => Ok(SearchMode::Hybrid),
            "semantic" => Ok(SearchMode::Semantic),
            "keyword" => Ok(SearchMode::Keyword),
            "fuzzy" => Ok(SearchMode::Fuzzy),
            "exact" => Ok(SearchMode::Exact),
            other => Err(AgentError::Validation(format!("Unknown search mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(AgentError::Validation(format!("Unknown sort order: {}", other))),
        }
    }
}

/// Column a result list is sorted by
///
/// `Other` keeps a key the client does not know how to compare; sorting by
/// it leaves the order untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    #[default]
    Relevance,
    Date,
    Title,
    Category,
    Other(String),
}

impl SortKey {
    /// Field name sent as `sort_by`; relevance is the backend default
    pub fn api_field(&self) -> Option<String> {
        match self {
            SortKey::Relevance => None,
            SortKey::Date => Some("created_at".to_string()),
            SortKey::Title => Some("title".to_string()),
            SortKey::Category => Some("category".to_string()),
            SortKey::Other(field) => Some(field.clone()),
        }
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "relevance" | "score" => SortKey::Relevance,
            "date" | "created_at" => SortKey::Date,
            "title" => SortKey::Title,
            "category" => SortKey::Category,
            _ => SortKey::Other(s),
        }
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortKey::from(s.to_string()))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Relevance => f.write_str("relevance"),
            SortKey::Date => f.write_str("date"),
            SortKey::Title => f.write_str("title"),
            SortKey::Category => f.write_str("category"),
            SortKey::Other(field) => f.write_str(field),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Range from user-typed bounds; `None` when neither is given.
    pub fn from_bounds(since: Option<&str>, until: Option<&str>) -> Result<Option<Self>, AgentError> {
        let range = DateRange {
            start: since.map(|raw| parse_bound(raw, false)).transpose()?,
            end: until.map(|raw| parse_bound(raw, true)).transpose()?,
        };
        if let (Some(start), Some(end)) = (range.start, range.end) {
            if start > end {
                return Err(AgentError::Validation(
                    "The start date is after the end date".to_string(),
                ));
            }
        }
        Ok((!range.is_empty()).then_some(range))
    }
}

/// A timestamp, or a bare `YYYY-MM-DD` date. A bare end date covers the whole day.
fn parse_bound(raw: &str, is_end: bool) -> Result<DateTime<Utc>, AgentError> {
    let raw = raw.trim();
    if let Some(at) = lenient::timestamp::parse(raw) {
        return Ok(at);
    }

    let invalid = || AgentError::Validation(format!("Invalid date: {}", raw));
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let at = if is_end {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    at.map(|naive| naive.and_utc()).ok_or_else(invalid)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub date_range: Option<DateRange>,
    pub min_score: Option<f64>,
}

impl SearchFilters {
    /// No filter set; such queries go to the basic search endpoint
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.tags.is_empty()
            && self.date_range.as_ref().map_or(true, DateRange::is_empty)
            && self.min_score.is_none()
    }
}

/// A search as issued by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub sort_key: SortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: SearchMode::default(),
            filters: SearchFilters::default(),
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            offset: 0,
            limit: default_limit(),
        }
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn to_request(&self) -> SearchRequest {
        SearchRequest {
            query: self.text.trim().to_string(),
            search_type: self.mode,
            filters: Map::new(),
            sort_by: self.sort_key.api_field(),
            sort_order: self.sort_order,
            limit: self.limit,
            offset: self.offset,
        }
    }

    pub fn to_advanced_request(&self) -> AdvancedSearchRequest {
        let date_range = self.filters.date_range.as_ref().and_then(|range| {
            let mut bounds = BTreeMap::new();
            if let Some(start) = range.start {
                bounds.insert("start".to_string(), start);
            }
            if let Some(end) = range.end {
                bounds.insert("end".to_string(), end);
            }
            (!bounds.is_empty()).then_some(bounds)
        });

        AdvancedSearchRequest {
            query: self.text.trim().to_string(),
            search_type: self.mode,
            date_range,
            categories: non_empty(&self.filters.categories),
            tags: non_empty(&self.filters.tags),
            sort_by: self.sort_key.api_field(),
            sort_order: self.sort_order,
            limit: self.limit,
            offset: self.offset,
            min_score: self.filters.min_score.unwrap_or(0.0),
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// One entry of the recent-search list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub query: String,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub filters: SearchFilters,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub result_count: u64,
}

/// A named search kept by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: Uuid,
    pub name: String,
    pub query: SearchQuery,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub use_count: u32,
    #[serde(default)]
    pub result_count: u64,
}

/// Counts per facet value, e.g. `category -> {"tech": 4}`
pub type Facets = BTreeMap<String, BTreeMap<String, u64>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("score".parse::<SortKey>().unwrap(), SortKey::Relevance);
        assert_eq!("created_at".parse::<SortKey>().unwrap(), SortKey::Date);
        assert_eq!("Title".parse::<SortKey>().unwrap(), SortKey::Title);
        assert_eq!(
            "author".parse::<SortKey>().unwrap(),
            SortKey::Other("author".to_string())
        );
    }

    #[test]
    fn test_date_bounds() {
        let range = DateRange::from_bounds(Some("2024-03-01"), Some("2024-03-31"))
            .unwrap()
            .unwrap();
        assert_eq!(range.start.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(range.end.unwrap().to_rfc3339(), "2024-03-31T23:59:59+00:00");

        let open_ended = DateRange::from_bounds(Some("2024-03-01T12:00:00Z"), None)
            .unwrap()
            .unwrap();
        assert!(open_ended.end.is_none());

        assert!(DateRange::from_bounds(None, None).unwrap().is_none());
        assert!(matches!(
            DateRange::from_bounds(Some("March"), None),
            Err(AgentError::Validation(_))
        ));
        assert!(matches!(
            DateRange::from_bounds(Some("2024-04-01"), Some("2024-03-01")),
            Err(AgentError::Validation(_))
        ));
    }

    #[test]
    fn test_filters_emptiness() {
        let mut filters = SearchFilters::default();
        assert!(filters.is_empty());

        filters.date_range = Some(DateRange::default());
        assert!(filters.is_empty());

        filters.tags.push("rust".to_string());
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_advanced_request_omits_unset_filters() {
        let query = SearchQuery::new("  sensors ").with_filters(SearchFilters {
            categories: vec!["iot".to_string()],
            ..SearchFilters::default()
        });

        let body = serde_json::to_value(query.to_advanced_request()).unwrap();
        assert_eq!(body["query"], "sensors");
        assert_eq!(body["categories"], serde_json::json!(["iot"]));
        assert!(body.get("tags").is_none());
        assert!(body.get("date_range").is_none());
        assert_eq!(body["search_type"], "hybrid");
        assert_eq!(body["sort_order"], "desc");
    }

    #[test]
    fn test_basic_request_sort_field() {
        let mut query = SearchQuery::new("rust");
        assert!(query.to_request().sort_by.is_none());

        query.sort_key = SortKey::Date;
        assert_eq!(query.to_request().sort_by.as_deref(), Some("created_at"));
    }
}
