//! CSV and JSON export of result lists

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs;

use crate::api::types::SearchResult;
use crate::error::{AgentError, Result};

pub const CSV_HEADER: &str = "id,title,description,category,tags,score,created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// `search-results-<timestamp>.<ext>`
    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        format!("search-results-{}.{}", at.format("%Y%m%d-%H%M%S"), self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(AgentError::Validation(format!("Unsupported export format: {}", other))),
        }
    }
}

/// Quote a field only when it holds a quote, comma, CR or LF; inner quotes are doubled.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn to_csv<'a>(results: impl IntoIterator<Item = &'a SearchResult>) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for result in results {
        let tags = result.tags.join(";");
        let score = result.score.to_string();
        let created_at = result.created_at.to_rfc3339();
        let row = [
            result.id.as_str(),
            result.title.as_str(),
            result.description.as_deref().unwrap_or(""),
            result.category.as_deref().unwrap_or(""),
            tags.as_str(),
            score.as_str(),
            created_at.as_str(),
        ];

        let line: Vec<Cow<'_, str>> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    query: &'a str,
    exported_at: DateTime<Utc>,
    count: usize,
    results: Vec<&'a SearchResult>,
}

pub fn to_json<'a>(
    query: &str,
    results: impl IntoIterator<Item = &'a SearchResult>,
    exported_at: DateTime<Utc>,
) -> Result<String> {
    let results: Vec<&SearchResult> = results.into_iter().collect();
    let document = ExportDocument {
        query,
        exported_at,
        count: results.len(),
        results,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub async fn write_export(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content.as_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::collections::BTreeMap;

    fn result(id: &str, title: &str, tags: &[&str]) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            title: title.to_string(),
            description: Some("plain".to_string()),
            content: Map::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: None,
            score: 0.75,
            highlights: BTreeMap::new(),
            metadata: Map::new(),
            created_at: DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_quote_doubling() {
        assert_eq!(csv_field(r#"He said "hi""#), r#""He said ""hi""""#);
    }

    #[test]
    fn test_minimal_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(csv_field("cr\rhere"), "\"cr\rhere\"");
    }

    #[test]
    fn test_csv_rows() {
        let results = vec![result("r1", r#"He said "hi""#, &["a", "b"])];
        let csv = to_csv(&results);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            r#"r1,"He said ""hi""",plain,,a;b,0.75,2024-03-01T10:00:00+00:00"#
        );
    }

    #[test]
    fn test_json_document() {
        let results = vec![result("r1", "one", &[]), result("r2", "two", &[])];
        let exported_at = Utc::now();
        let json = to_json("sensors", &results, exported_at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["query"], "sensors");
        assert_eq!(value["count"], 2);
        assert_eq!(value["results"][1]["id"], "r2");
        assert!(value["exported_at"].is_string());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
