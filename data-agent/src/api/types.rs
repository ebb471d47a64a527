//! Wire types for the backend REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::lenient;
use crate::error::{AgentError, Result};
use crate::search::types::{SearchMode, SortOrder};

/// Record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
    Deleted,
    Processing,
    Error,
}

/// A stored record, as returned by the data endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "lenient::timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Payload for creating a record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: Map<String, Value>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub metadata: Map<String, Value>,
}

/// Partial update; absent fields are left untouched by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Pagination block reported by the list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    #[serde(default)]
    pub offset: u32,
    pub has_next: bool,
    pub has_prev: bool,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub prev_page: Option<u32>,
}

/// One page of records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPage {
    pub data: Vec<Record>,
    pub pagination: Pagination,
    pub total_count: u64,
    #[serde(default)]
    pub returned_count: u64,
}

/// Delete acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: String,
    pub record_id: String,
}

/// Result of server-side validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Bulk operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperationKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkOperation {
    pub operation: BulkOperationKind,
    pub records: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Map<String, Value>>,
}

/// Outcome of a bulk operation or a file import
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub processed_count: u64,
    #[serde(default)]
    pub error_count: u64,
    /// Per-row failures, e.g. `{"index": 3, "errors": ["Title is required"]}`
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub record_ids: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Seconds
    #[serde(default)]
    pub processing_time: Option<f64>,
}

impl BulkReport {
    /// The backend answers 200 with `success: false` when the whole batch fails
    pub fn ensure_success(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(AgentError::Server {
            status: 200,
            message: self
                .error
                .unwrap_or_else(|| "The bulk operation failed".to_string()),
        })
    }
}

/// File formats accepted by the import endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Json,
    Csv,
    Xlsx,
    Txt,
}

impl ImportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportFormat::Json => "json",
            ImportFormat::Csv => "csv",
            ImportFormat::Xlsx => "xlsx",
            ImportFormat::Txt => "txt",
        }
    }

    /// Guess from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportFormat {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ImportFormat::Json),
            "csv" => Ok(ImportFormat::Csv),
            "xlsx" => Ok(ImportFormat::Xlsx),
            "txt" | "text" => Ok(ImportFormat::Txt),
            other => Err(AgentError::Validation(format!("Unsupported import format: {}", other))),
        }
    }
}

/// Dataset-wide counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_records: u64,
    #[serde(default)]
    pub active_records: u64,
    #[serde(default)]
    pub categories: BTreeMap<String, u64>,
    #[serde(default)]
    pub created_today: u64,
    #[serde(default)]
    pub updated_today: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryStats {
    #[serde(default)]
    pub categories: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeDistribution {
    #[serde(default)]
    pub distribution: BTreeMap<String, u64>,
}

/// Body for `POST /search/`
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub search_type: SearchMode,
    pub filters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

/// Body for `POST /search/advanced`
#[derive(Debug, Clone, Serialize)]
pub struct AdvancedSearchRequest {
    pub query: String,
    pub search_type: SearchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<BTreeMap<String, DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub offset: usize,
    pub min_score: f64,
}

/// One hit from the search endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub highlights: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Search response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub returned_count: u64,
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub facets: BTreeMap<String, BTreeMap<String, u64>>,
    #[serde(default)]
    pub insights: Option<Value>,
}

/// A suggestion as sent by either suggestion endpoint: plain text or an object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuggestionItem {
    Text(String),
    Detailed {
        text: String,
        #[serde(default)]
        search_type: Option<SearchMode>,
        #[serde(default)]
        confidence: Option<f64>,
    },
}

impl SuggestionItem {
    pub fn text(&self) -> &str {
        match self {
            SuggestionItem::Text(text) => text,
            SuggestionItem::Detailed { text, .. } => text,
        }
    }

    pub fn mode(&self) -> Option<SearchMode> {
        match self {
            SuggestionItem::Text(_) => None,
            SuggestionItem::Detailed { search_type, .. } => *search_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<SuggestionItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacetsResponse {
    #[serde(default)]
    pub facets: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Body for `POST /ai/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_records: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub context_count: u64,
    /// Server-side processing time in milliseconds
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Structured reading of a natural-language query (`POST /ai/process-query`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessedQuery {
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub filters: Map<String, Value>,
    #[serde(default)]
    pub search_type: Option<SearchMode>,
    #[serde(default)]
    pub original_query: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body for `POST /ai/generate-insights`
#[derive(Debug, Clone, Default, Serialize)]
pub struct InsightsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Insights generated by the hosted model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightsReport {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_patterns: Vec<String>,
    #[serde(default)]
    pub top_terms: Vec<String>,
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub anomalies: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub data_quality: Option<DataQuality>,
    #[serde(default)]
    pub data_size: Option<u64>,
}

/// Body for `POST /ai/analyze`
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub analysis_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Map<String, Value>>,
    pub limit: usize,
}

/// Analysis result; `result` is free text that may embed JSON
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub analysis_type: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub summary_stats: Option<Value>,
    #[serde(default)]
    pub record_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default)]
    pub embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub dimension: usize,
}

/// `GET /health` and `GET /ai/health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub services: BTreeMap<String, String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
