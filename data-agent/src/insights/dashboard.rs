//! Insights dashboard
//!
//! Each refresh fetches four independent parts concurrently and replaces
//! the snapshot wholesale. A part that fails is left empty and its error is
//! reported once; the others still render. Only the most recently started
//! refresh may write its snapshot.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{InsightsBody, InsightsScope, InsightsSnapshot, RefreshOutcome, RefreshTrigger, Sentiment};
use crate::api::types::{AnalyzeRequest, InsightsRequest};
use crate::api::ApiClient;
use crate::error::Result;
use crate::events::{AgentEvent, EventBus};
use crate::search::SearchOrchestrator;
use crate::sequence::RequestSequence;

/// Records sampled by dataset-wide analyses
const ANALYSIS_LIMIT: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub snapshot: Option<InsightsSnapshot>,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// Decrements the in-flight counter when the refresh ends, however it ends
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    /// Only succeeds when nothing else is running
    fn exclusive(counter: &Arc<AtomicUsize>) -> Option<Self> {
        counter
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(counter.clone()))
    }

    fn shared(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct InsightsDashboard {
    api: ApiClient,
    search: Option<SearchOrchestrator>,
    bus: EventBus,
    state: Arc<RwLock<DashboardState>>,
    in_flight: Arc<AtomicUsize>,
    sequence: Arc<RequestSequence>,
    scope_limit: usize,
}

impl InsightsDashboard {
    pub fn new(api: ApiClient, bus: EventBus, scope_limit: usize) -> Self {
        Self {
            api,
            search: None,
            bus,
            state: Arc::new(RwLock::new(DashboardState::default())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            sequence: Arc::new(RequestSequence::new()),
            scope_limit,
        }
    }

    /// Scope insights to the results held by `search` whenever it has any
    pub fn with_search(mut self, search: SearchOrchestrator) -> Self {
        self.search = Some(search);
        self
    }

    pub async fn state(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Dataset-wide, or the top results of the active search
    pub async fn scope(&self) -> InsightsScope {
        let Some(search) = &self.search else {
            return InsightsScope::Dataset;
        };

        let state = search.state().await;
        match state.query_text() {
            Some(query) if state.has_results() => InsightsScope::Search {
                query: query.to_string(),
                record_ids: state
                    .results
                    .iter()
                    .take(self.scope_limit)
                    .map(|r| r.id.clone())
                    .collect(),
            },
            _ => InsightsScope::Dataset,
        }
    }

    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let _guard = match trigger {
            RefreshTrigger::Automatic => match InFlight::exclusive(&self.in_flight) {
                Some(guard) => guard,
                None => {
                    debug!("Automatic insights refresh skipped: another refresh is running");
                    self.bus.publish(AgentEvent::InsightsRefreshSkipped);
                    return RefreshOutcome::Skipped;
                }
            },
            RefreshTrigger::Forced => InFlight::shared(&self.in_flight),
        };

        let ticket = self.sequence.issue();
        self.bus.publish(AgentEvent::InsightsRefreshStarted(trigger));
        let scope = self.scope().await;
        info!("📊 Refreshing insights ({:?}, {:?})", trigger, scope);

        let sentiment_request = AnalyzeRequest {
            analysis_type: "sentiment".to_string(),
            filters: None,
            limit: ANALYSIS_LIMIT,
        };

        let (body, categories, timeline, sentiment) = tokio::join!(
            self.fetch_body(&scope),
            self.api.category_stats(),
            self.api.time_distribution(),
            self.api.analyze(&sentiment_request),
        );

        let mut errors = Vec::new();
        let body = keep("insights", body, &mut errors);
        let categories = keep("categories", categories, &mut errors)
            .map(|c| c.categories)
            .unwrap_or_default();
        let time_buckets = keep("time distribution", timeline, &mut errors)
            .map(|t| t.distribution)
            .unwrap_or_default();
        let sentiment = keep("sentiment", sentiment, &mut errors)
            .and_then(|report| report.result)
            .and_then(|text| Sentiment::from_analysis_text(&text));

        let now = Utc::now();
        let snapshot = InsightsSnapshot {
            scope,
            body,
            categories,
            time_buckets,
            sentiment,
            generated_at: now,
        };
        let error = errors.into_iter().next();

        {
            let mut state = self.state.write().await;
            if !self.sequence.is_latest(ticket) {
                debug!("Dropping insights from refresh {}: a newer one started", ticket.value());
                drop(state);
                self.bus.publish(AgentEvent::InsightsRefreshSuperseded);
                return RefreshOutcome::Superseded;
            }
            state.snapshot = Some(snapshot);
            state.error = error.clone();
            state.last_refreshed = Some(now);
        }

        self.bus.publish(AgentEvent::InsightsRefreshed { error: error.clone() });
        RefreshOutcome::Refreshed { error }
    }

    async fn fetch_body(&self, scope: &InsightsScope) -> Result<InsightsBody> {
        match scope {
            InsightsScope::Search { query, record_ids } => {
                let request = InsightsRequest {
                    record_ids: Some(record_ids.clone()),
                    search_query: Some(query.clone()),
                    limit: self.scope_limit,
                };
                Ok(self.api.generate_insights(&request).await?.into())
            }
            InsightsScope::Dataset => {
                let request = AnalyzeRequest {
                    analysis_type: "summary".to_string(),
                    filters: None,
                    limit: ANALYSIS_LIMIT,
                };
                Ok(self.api.analyze(&request).await?.into())
            }
        }
    }

    /// Refresh now and then every `interval` until `cancel` fires.
    ///
    /// Each tick runs in its own task, so a slow refresh does not delay the
    /// timer; overlapping ticks are skipped by the in-flight check.
    pub fn spawn_auto_refresh(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let dashboard = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Insights auto-refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let dashboard = dashboard.clone();
                        tokio::spawn(async move {
                            dashboard.refresh(RefreshTrigger::Automatic).await;
                        });
                    }
                }
            }
        })
    }
}

fn keep<T>(part: &str, result: Result<T>, errors: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Insights part '{}' failed: {}", part, e);
            errors.push(e.user_message());
            None
        }
    }
}
