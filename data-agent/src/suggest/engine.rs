//! Suggestion engine
//!
//! After the debounce interval, three sources are queried concurrently:
//! hosted-model suggestions, backend keyword suggestions and matching recent
//! searches. A failing source is skipped. The merged list keeps source
//! order (model, keyword, recent) and drops case-insensitive duplicates.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::debounce::Debouncer;
use crate::api::types::SuggestionItem;
use crate::api::ApiClient;
use crate::error::Result;
use crate::events::{AgentEvent, EventBus};
use crate::search::{SearchHistory, SearchMode, SearchOrchestrator, SearchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Ai,
    Keyword,
    Recent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub mode: Option<SearchMode>,
    pub source: SuggestionSource,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, source: SuggestionSource) -> Self {
        Self {
            text: text.into(),
            mode: None,
            source,
        }
    }

    fn from_item(item: SuggestionItem, source: SuggestionSource) -> Self {
        Self {
            mode: item.mode(),
            text: item.text().to_string(),
            source,
        }
    }
}

/// Concatenate sources in order, keeping the first of each text
/// (compared trimmed and case-insensitively). Blank entries are dropped.
pub fn merge_suggestions(sources: Vec<Vec<Suggestion>>) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .flatten()
        .filter_map(|mut suggestion| {
            let trimmed = suggestion.text.trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                return None;
            }
            suggestion.text = trimmed.to_string();
            Some(suggestion)
        })
        .collect()
}

/// Suggestion dropdown with keyboard-style navigation
#[derive(Debug, Clone, Default)]
pub struct SuggestionList {
    items: Vec<Suggestion>,
    highlighted: Option<usize>,
}

impl SuggestionList {
    pub fn new(items: Vec<Suggestion>) -> Self {
        Self {
            items,
            highlighted: None,
        }
    }

    pub fn items(&self) -> &[Suggestion] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Move down, wrapping from the last item to the first
    pub fn next(&mut self) -> Option<&Suggestion> {
        if self.items.is_empty() {
            return None;
        }
        let index = match self.highlighted {
            None => 0,
            Some(i) => (i + 1) % self.items.len(),
        };
        self.highlighted = Some(index);
        self.items.get(index)
    }

    /// Move up, wrapping from the first item to the last
    pub fn previous(&mut self) -> Option<&Suggestion> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        let index = match self.highlighted {
            None | Some(0) => last,
            Some(i) => i - 1,
        };
        self.highlighted = Some(index);
        self.items.get(index)
    }

    pub fn select(&self) -> Option<Suggestion> {
        self.highlighted.and_then(|i| self.items.get(i)).cloned()
    }

    pub fn cancel(&mut self) {
        self.items.clear();
        self.highlighted = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestOutcome {
    /// Blank input; the list was cleared
    Ignored,
    Updated(Vec<Suggestion>),
    /// Newer input arrived during the debounce or the fetch
    Superseded,
}

#[derive(Clone)]
pub struct SuggestionEngine {
    api: ApiClient,
    history: SearchHistory,
    search: SearchOrchestrator,
    debouncer: Debouncer,
    bus: EventBus,
    limit: usize,
    list: Arc<RwLock<SuggestionList>>,
}

impl SuggestionEngine {
    pub fn new(
        api: ApiClient,
        search: SearchOrchestrator,
        debouncer: Debouncer,
        bus: EventBus,
        limit: usize,
    ) -> Self {
        Self {
            api,
            history: search.history().clone(),
            search,
            debouncer,
            bus,
            limit,
            list: Arc::new(RwLock::new(SuggestionList::default())),
        }
    }

    /// Handle one keystroke worth of input
    pub async fn suggest(&self, input: &str) -> SuggestOutcome {
        let input = input.trim();
        if input.is_empty() {
            self.cancel().await;
            return SuggestOutcome::Ignored;
        }

        let Some(ticket) = self.debouncer.settle().await else {
            debug!("Suggestion input '{}' superseded during debounce", input);
            return SuggestOutcome::Superseded;
        };

        let merged = self.fetch(input).await;

        if !self.debouncer.is_current(ticket) {
            debug!("Discarding stale suggestions for '{}'", input);
            return SuggestOutcome::Superseded;
        }

        *self.list.write().await = SuggestionList::new(merged.clone());
        self.bus.publish(AgentEvent::SuggestionsUpdated {
            input: input.to_string(),
            count: merged.len(),
        });
        SuggestOutcome::Updated(merged)
    }

    /// Query every source for `input` and merge, without debouncing
    pub async fn fetch(&self, input: &str) -> Vec<Suggestion> {
        let (ai, keyword) = tokio::join!(
            self.api.ai_suggestions(input),
            self.api.keyword_suggestions(input, self.limit),
        );

        let ai = self.collect("ai", ai, SuggestionSource::Ai);
        let keyword = self.collect("keyword", keyword, SuggestionSource::Keyword);
        let recent = match self.history.matching(input) {
            Ok(entries) => entries
                .into_iter()
                .take(self.limit)
                .map(|entry| Suggestion {
                    text: entry.query,
                    mode: Some(entry.mode),
                    source: SuggestionSource::Recent,
                })
                .collect(),
            Err(e) => {
                warn!("Recent-search suggestions unavailable: {}", e);
                Vec::new()
            }
        };

        merge_suggestions(vec![ai, keyword, recent])
    }

    fn collect(&self, name: &str, items: Result<Vec<SuggestionItem>>, source: SuggestionSource) -> Vec<Suggestion> {
        match items {
            Ok(items) => items
                .into_iter()
                .take(self.limit)
                .map(|item| Suggestion::from_item(item, source))
                .collect(),
            Err(e) => {
                warn!("Skipping {} suggestions: {}", name, e);
                Vec::new()
            }
        }
    }

    pub async fn list(&self) -> SuggestionList {
        self.list.read().await.clone()
    }

    pub async fn next(&self) -> Option<Suggestion> {
        self.list.write().await.next().cloned()
    }

    pub async fn previous(&self) -> Option<Suggestion> {
        self.list.write().await.previous().cloned()
    }

    /// Run the highlighted suggestion as a search. The list is closed first.
    pub async fn select(&self) -> Result<Option<SearchOutcome>> {
        let chosen = {
            let mut list = self.list.write().await;
            let chosen = list.select();
            if chosen.is_some() {
                list.cancel();
            }
            chosen
        };

        match chosen {
            Some(suggestion) => {
                self.bus.publish(AgentEvent::SuggestionsCleared);
                Ok(Some(self.search.run_suggestion(&suggestion).await?))
            }
            None => Ok(None),
        }
    }

    /// Close the list and drop pending input
    pub async fn cancel(&self) {
        self.debouncer.cancel();
        self.list.write().await.cancel();
        self.bus.publish(AgentEvent::SuggestionsCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(texts: &[&str]) -> SuggestionList {
        SuggestionList::new(
            texts
                .iter()
                .map(|t| Suggestion::new(*t, SuggestionSource::Keyword))
                .collect(),
        )
    }

    #[test]
    fn test_merge_order_and_dedup() {
        let merged = merge_suggestions(vec![
            vec![Suggestion::new("Rust async", SuggestionSource::Ai)],
            vec![
                Suggestion::new("rust async ", SuggestionSource::Keyword),
                Suggestion::new("rust traits", SuggestionSource::Keyword),
                Suggestion::new("   ", SuggestionSource::Keyword),
            ],
            vec![Suggestion::new("RUST TRAITS", SuggestionSource::Recent)],
        ]);

        let texts: Vec<&str> = merged.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Rust async", "rust traits"]);
        assert_eq!(merged[0].source, SuggestionSource::Ai);
        assert_eq!(merged[1].source, SuggestionSource::Keyword);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut list = list(&["a", "b", "c"]);

        assert_eq!(list.next().unwrap().text, "a");
        assert_eq!(list.next().unwrap().text, "b");
        assert_eq!(list.next().unwrap().text, "c");
        assert_eq!(list.next().unwrap().text, "a");

        assert_eq!(list.previous().unwrap().text, "c");
        assert_eq!(list.previous().unwrap().text, "b");
        assert_eq!(list.select().unwrap().text, "b");
    }

    #[test]
    fn test_previous_from_nothing_goes_to_last() {
        let mut list = list(&["a", "b"]);
        assert_eq!(list.previous().unwrap().text, "b");
    }

    #[test]
    fn test_cancel_clears() {
        let mut list = list(&["a"]);
        list.next();
        list.cancel();

        assert!(list.is_empty());
        assert!(list.highlighted().is_none());
        assert!(list.select().is_none());
        assert!(list.next().is_none());
    }
}
