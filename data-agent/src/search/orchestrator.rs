//! Search orchestrator
//!
//! Issues searches against the backend, keeps the latest result set and
//! records history. Responses that arrive after a newer search was issued
//! are dropped without touching state.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::history::SearchHistory;
use super::types::{Facets, RecentSearch, SavedSearch, SearchQuery};
use crate::api::types::{SearchResponse, SearchResult};
use crate::api::ApiClient;
use crate::error::{AgentError, Result};
use crate::events::{AgentEvent, EventBus};
use crate::sequence::RequestSequence;
use crate::suggest::{Debouncer, Suggestion};

/// Observable search state
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: Option<SearchQuery>,
    pub results: Vec<SearchResult>,
    pub total_count: u64,
    /// Backend-reported processing time in milliseconds
    pub processing_time: f64,
    pub loading: bool,
    pub error: Option<String>,
    /// "Did you mean" hints returned alongside results
    pub hints: Vec<String>,
    /// Inline insights, only sent by smart search
    pub insights: Option<Value>,
}

impl SearchState {
    fn begin(&mut self, query: SearchQuery) {
        self.query = Some(query);
        self.loading = true;
        self.error = None;
    }

    fn complete(&mut self, results: Vec<SearchResult>, response: SearchResponse) {
        self.results = results;
        self.total_count = response.total_count;
        self.processing_time = response.processing_time;
        self.hints = response.suggestions;
        self.insights = response.insights;
        self.loading = false;
        self.error = None;
    }

    fn fail(&mut self, message: String) {
        self.results.clear();
        self.total_count = 0;
        self.hints.clear();
        self.insights = None;
        self.loading = false;
        self.error = Some(message);
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    /// Query text of the current result set
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_ref().map(|q| q.text.trim())
    }
}

/// What happened to a search call
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Blank input, no request issued
    Ignored,
    Completed { result_count: usize, total_count: u64 },
    /// A newer search was issued before this one finished
    Superseded,
}

/// Backend route for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Basic,
    Advanced,
    Smart,
}

/// Keep the first occurrence of every id
pub fn dedup_by_id(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|result| seen.insert(result.id.clone()))
        .collect()
}

#[derive(Clone)]
pub struct SearchOrchestrator {
    api: ApiClient,
    history: SearchHistory,
    bus: EventBus,
    sequence: Arc<RequestSequence>,
    debouncer: Debouncer,
    state: Arc<RwLock<SearchState>>,
    result_limit: usize,
}

impl SearchOrchestrator {
    pub fn new(api: ApiClient, history: SearchHistory, bus: EventBus, debouncer: Debouncer, result_limit: usize) -> Self {
        Self {
            api,
            history,
            bus,
            sequence: Arc::new(RequestSequence::new()),
            debouncer,
            state: Arc::new(RwLock::new(SearchState::default())),
            result_limit,
        }
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> SearchState {
        self.state.read().await.clone()
    }

    pub async fn results(&self) -> Vec<SearchResult> {
        self.state.read().await.results.clone()
    }

    /// Ids of the first `n` results, in display order
    pub async fn top_ids(&self, n: usize) -> Vec<String> {
        self.state
            .read()
            .await
            .results
            .iter()
            .take(n)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Query with the configured page size
    pub fn query(&self, text: &str) -> SearchQuery {
        SearchQuery::new(text).with_limit(self.result_limit)
    }

    pub async fn search_text(&self, text: &str) -> Result<SearchOutcome> {
        self.search(self.query(text)).await
    }

    /// Run one search. Filtered queries go to the advanced endpoint.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchOutcome> {
        let route = if query.filters.is_empty() {
            Route::Basic
        } else {
            Route::Advanced
        };
        self.execute(query, route).await
    }

    /// Search with server-side query processing. Filters are not sent; the
    /// response may carry inline insights.
    pub async fn smart_search(&self, query: SearchQuery) -> Result<SearchOutcome> {
        self.execute(query, Route::Smart).await
    }

    async fn execute(&self, query: SearchQuery, route: Route) -> Result<SearchOutcome> {
        if query.is_blank() {
            debug!("Ignoring blank search");
            return Ok(SearchOutcome::Ignored);
        }

        let ticket = self.sequence.issue();
        let text = query.text.trim().to_string();

        self.state.write().await.begin(query.clone());
        self.bus.publish(AgentEvent::SearchStarted { query: text.clone() });
        info!("🔍 Searching '{}' (mode: {}, {:?}, ticket {})", text, query.mode, route, ticket.value());

        let response = match route {
            Route::Basic => self.api.search(&query.to_request()).await,
            Route::Advanced => self.api.advanced_search(&query.to_advanced_request()).await,
            Route::Smart => self.api.smart_search(&query.to_request()).await,
        };

        if !self.sequence.is_latest(ticket) {
            debug!("Discarding superseded response for '{}'", text);
            self.remember(&query, 0);
            self.bus.publish(AgentEvent::SearchSuperseded { query: text });
            return Ok(SearchOutcome::Superseded);
        }

        match response {
            Ok(mut response) => {
                let results = dedup_by_id(std::mem::take(&mut response.results));
                let result_count = results.len();
                let total_count = response.total_count;

                self.state.write().await.complete(results, response);
                self.remember(&query, total_count);

                info!("✅ '{}': {} results ({} total)", text, result_count, total_count);
                self.bus.publish(AgentEvent::SearchCompleted {
                    query: text,
                    result_count,
                    total_count,
                });

                Ok(SearchOutcome::Completed {
                    result_count,
                    total_count,
                })
            }
            Err(e) => {
                let message = e.user_message();
                warn!("Search '{}' failed: {}", text, e);

                self.state.write().await.fail(message.clone());
                self.remember(&query, 0);
                self.bus.publish(AgentEvent::SearchFailed { query: text, message });

                Err(e)
            }
        }
    }

    /// Real-time search: waits out the debounce interval and only the
    /// newest keystroke reaches the backend.
    pub async fn search_as_you_type(&self, text: &str) -> Result<SearchOutcome> {
        if self.debouncer.settle().await.is_none() {
            return Ok(SearchOutcome::Superseded);
        }
        self.search_text(text).await
    }

    /// Search using a suggestion's text, and its mode when it carries one
    pub async fn run_suggestion(&self, suggestion: &Suggestion) -> Result<SearchOutcome> {
        let mut query = self.query(&suggestion.text);
        if let Some(mode) = suggestion.mode {
            query = query.with_mode(mode);
        }
        self.search(query).await
    }

    /// Drop the current results and invalidate in-flight searches
    pub async fn clear(&self) {
        self.sequence.cancel();
        self.debouncer.cancel();
        *self.state.write().await = SearchState::default();
    }

    pub fn recent(&self) -> Result<Vec<RecentSearch>> {
        self.history.recent()
    }

    pub fn clear_recent(&self) -> Result<()> {
        self.history.clear_recent()
    }

    pub fn saved(&self) -> Result<Vec<SavedSearch>> {
        self.history.saved()
    }

    /// Save the current query under `name`
    pub async fn save(&self, name: &str) -> Result<SavedSearch> {
        let (query, total) = {
            let state = self.state.read().await;
            let query = state
                .query
                .clone()
                .ok_or_else(|| AgentError::Validation("Run a search before saving it".to_string()))?;
            (query, state.total_count)
        };
        let saved = self.history.save(name, query, total)?;
        info!("Saved search '{}' ({})", saved.name, saved.id);
        Ok(saved)
    }

    pub async fn run_saved(&self, id: Uuid) -> Result<SearchOutcome> {
        let saved = self.history.mark_used(id)?;
        let outcome = self.search(saved.query).await?;
        if let SearchOutcome::Completed { total_count, .. } = outcome {
            self.history.update_result_count(id, total_count)?;
        }
        Ok(outcome)
    }

    pub fn remove_saved(&self, id: Uuid) -> Result<bool> {
        self.history.remove_saved(id)
    }

    /// Category, tag and status counts for `text`
    pub async fn facets(&self, text: &str) -> Result<Facets> {
        Ok(self.api.facets(text.trim()).await?.facets)
    }

    fn remember(&self, query: &SearchQuery, result_count: u64) {
        let entry = RecentSearch {
            query: query.text.trim().to_string(),
            mode: query.mode,
            filters: query.filters.clone(),
            timestamp: Utc::now(),
            result_count,
        };
        if let Err(e) = self.history.record(entry) {
            warn!("Could not record recent search: {}", e);
        }
    }
}
