//! Intent classification for chat input
//!
//! Decides whether a chat message should trigger a search, and with which
//! query. Two implementations: one backed by the hosted model, one offline
//! keyword heuristic.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::api::ApiClient;
use crate::error::{AgentError, Result};
use crate::search::SearchMode;

/// Classifier verdict
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub should_search: bool,
    /// Query to run when `should_search` is set
    pub query: String,
    pub mode: Option<SearchMode>,
}

impl Intent {
    pub fn no_search() -> Self {
        Self {
            should_search: false,
            query: String::new(),
            mode: None,
        }
    }
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Intent>;

    fn name(&self) -> &str;
}

/// Intents reported by `/ai/process-query` that mean "look something up"
const SEARCH_INTENTS: &[&str] = &["search", "find", "filter", "lookup", "list"];

/// Backed by `POST /ai/process-query`
pub struct RemoteIntentClassifier {
    api: ApiClient,
}

impl RemoteIntentClassifier {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IntentClassifier for RemoteIntentClassifier {
    async fn classify(&self, text: &str) -> Result<Intent> {
        let processed = self.api.process_query(text).await?;
        let intent = processed.intent.trim().to_lowercase();
        debug!("process-query intent '{}' ({} keywords)", intent, processed.keywords.len());

        if !SEARCH_INTENTS.contains(&intent.as_str()) {
            return Ok(Intent::no_search());
        }

        let keywords: Vec<&str> = processed
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        let query = if keywords.is_empty() {
            text.trim().to_string()
        } else {
            keywords.join(" ")
        };

        Ok(Intent {
            should_search: true,
            query,
            mode: processed.search_type,
        })
    }

    fn name(&self) -> &str {
        "remote"
    }
}

const SEARCH_VERBS: &str =
    r"(?i)\b(search(?:\s+for)?|find|look(?:ing)?\s+(?:for|up)|lookup|show(?:\s+me)?|list|filter|which|where\s+(?:are|is))\b";

const FILLER: &str = r"(?i)\b(me|all|the|any|some|records?|entries|items|data|about|for|with|that|mention|mentioning|please)\b";

/// Offline heuristic: a search verb anywhere in the message means search,
/// and the query is what is left after dropping verbs and filler words.
#[derive(Debug, Default)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, text: &str) -> Result<Intent> {
        let verbs = Regex::new(SEARCH_VERBS).map_err(|e| AgentError::Config(e.to_string()))?;
        if !verbs.is_match(text) {
            return Ok(Intent::no_search());
        }

        let filler = Regex::new(FILLER).map_err(|e| AgentError::Config(e.to_string()))?;
        let stripped = verbs.replace_all(text, " ");
        let stripped = filler.replace_all(&stripped, " ");
        let query = stripped
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Intent {
            should_search: true,
            query: if query.is_empty() { text.trim().to_string() } else { query },
            mode: None,
        })
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
