//! Tolerant parsing for backend and model output
//!
//! The hosted model often wraps JSON in prose or markdown fences, and the
//! backend emits naive ISO timestamps without an offset.

use serde_json::Value;

/// Parse `text` as JSON, falling back to the outermost `{...}` span.
pub fn extract_object(text: &str) -> Option<Value> {
    extract_between(text, '{', '}').filter(Value::is_object)
}

/// Parse `text` as JSON, falling back to the outermost `[...]` span.
pub fn extract_array(text: &str) -> Option<Value> {
    extract_between(text, '[', ']').filter(Value::is_array)
}

fn extract_between(text: &str, open: char, close: char) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find(open)?;
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Serde adapter for timestamps that may lack a UTC offset.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_plain_json_object() {
        let value = extract_object(r#"{"positive": 0.7}"#).unwrap();
        assert_eq!(value["positive"], 0.7);
    }

    #[test]
    fn test_object_inside_markdown_fence() {
        let text = "Here is the analysis:\n```json\n{\"summary\": \"Mostly tech\"}\n```\nDone.";
        let value = extract_object(text).unwrap();
        assert_eq!(value["summary"], "Mostly tech");
    }

    #[test]
    fn test_array_inside_prose() {
        let value = extract_array("Try these: [\"recent notes\", \"tagged rust\"] ok").unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_no_json_found() {
        assert!(extract_object("no structured content here").is_none());
        assert!(extract_object("[1, 2]").is_none());
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let dt = timestamp::parse("2024-03-05T10:20:30.123456").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_rfc3339_timestamp_with_offset() {
        let dt = timestamp::parse("2024-03-05T10:20:30+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }
}
