use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::lenient;
use crate::api::types::{AnalysisReport, DataQuality, InsightsReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTrigger {
    /// Timer tick; skipped while another refresh is running
    Automatic,
    /// User request; always runs
    Forced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InsightsScope {
    Dataset,
    Search { query: String, record_ids: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sentiment {
    pub positive: Option<f64>,
    pub neutral: Option<f64>,
    pub negative: Option<f64>,
    pub overall: Option<String>,
}

impl Sentiment {
    /// Pull sentiment figures out of free-text model output.
    ///
    /// Accepts the figures at the top level or nested under `sentiment` /
    /// `sentiment_distribution`; `overall` may also be `overall_sentiment`.
    pub fn from_analysis_text(text: &str) -> Option<Self> {
        let root = lenient::extract_object(text)?;
        let scope = ["sentiment", "sentiment_distribution"]
            .iter()
            .find_map(|key| root.get(*key).filter(|v| v.is_object()))
            .unwrap_or(&root);

        let number = |key: &str| scope.get(key).and_then(Value::as_f64);
        let overall = ["overall", "overall_sentiment"]
            .iter()
            .find_map(|key| scope.get(*key).or_else(|| root.get(*key)))
            .and_then(Value::as_str)
            .map(str::to_string);

        let sentiment = Sentiment {
            positive: number("positive"),
            neutral: number("neutral"),
            negative: number("negative"),
            overall,
        };

        (sentiment != Sentiment::default()).then_some(sentiment)
    }
}

/// The model-generated part of a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightsBody {
    pub summary: String,
    pub key_patterns: Vec<String>,
    pub trends: Vec<String>,
    pub top_terms: Vec<String>,
    pub anomalies: Vec<String>,
    pub recommendations: Vec<String>,
    pub data_quality: Option<DataQuality>,
    pub record_count: Option<u64>,
}

impl From<InsightsReport> for InsightsBody {
    fn from(report: InsightsReport) -> Self {
        Self {
            summary: report.summary,
            key_patterns: report.key_patterns,
            trends: report.trends,
            top_terms: report.top_terms,
            anomalies: report.anomalies,
            recommendations: report.recommendations,
            data_quality: report.data_quality,
            record_count: report.data_size,
        }
    }
}

impl From<AnalysisReport> for InsightsBody {
    /// The analysis text is usually JSON-ish; fall back to the raw text as summary.
    fn from(report: AnalysisReport) -> Self {
        let text = report.result.unwrap_or_default();
        let record_count = report.record_count;

        let Some(parsed) = lenient::extract_object(&text) else {
            return Self {
                summary: text.trim().to_string(),
                record_count,
                ..Self::default()
            };
        };

        let summary = ["summary", "overview", "analysis"]
            .iter()
            .find_map(|key| parsed.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| text.trim().to_string());

        Self {
            summary,
            key_patterns: string_list(&parsed, &["key_patterns", "key_findings", "insights", "patterns"]),
            trends: string_list(&parsed, &["trends"]),
            top_terms: string_list(&parsed, &["top_terms", "keywords"]),
            anomalies: string_list(&parsed, &["anomalies", "outliers"]),
            recommendations: string_list(&parsed, &["recommendations"]),
            data_quality: parsed
                .get("data_quality")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            record_count,
        }
    }
}

/// First listed key holding an array; objects contribute a descriptive field
fn string_list(value: &Value, keys: &[&str]) -> Vec<String> {
    let Some(items) = keys
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => ["description", "title", "name", "pattern", "trend"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::to_string)
                .or_else(|| Some(item.to_string())),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

/// Everything the dashboard shows, rebuilt wholesale on each refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsSnapshot {
    pub scope: InsightsScope,
    pub body: Option<InsightsBody>,
    pub categories: BTreeMap<String, u64>,
    pub time_buckets: BTreeMap<String, u64>,
    pub sentiment: Option<Sentiment>,
    pub generated_at: DateTime<Utc>,
}

impl InsightsSnapshot {
    pub fn summary(&self) -> Option<&str> {
        self.body.as_ref().map(|b| b.summary.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Snapshot replaced; `error` holds the failure of any part that did not load
    Refreshed { error: Option<String> },
    /// Automatic refresh while another was running
    Skipped,
    /// A newer refresh started before this one finished; nothing was written
    Superseded,
}
