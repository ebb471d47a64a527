use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::types::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// Step of the chat pipeline currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    #[default]
    Idle,
    IntentClassifying,
    Searching,
    InsightsGenerating,
    Responding,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Wall time from submission to reply
    pub latency_ms: u64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub context_count: u64,
    #[serde(default)]
    pub searched_for: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub search_results: Option<Vec<SearchResult>>,
    #[serde(default)]
    pub insights: Option<String>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub is_error: bool,
}

/// Message ids: millisecond timestamps, bumped so they strictly increase
#[derive(Debug, Default)]
pub struct MessageIds {
    last: u64,
}

impl MessageIds {
    pub fn next(&mut self, now: DateTime<Utc>) -> u64 {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        self.last = millis.max(self.last + 1);
        self.last
    }
}
