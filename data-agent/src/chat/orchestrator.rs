//! AI chat orchestrator
//!
//! One submission runs strictly in order:
//! intent → search (if asked for) → insights (if the search found
//! anything) → chat completion. Any failure stops the pipeline and leaves a
//! single error reply in the transcript.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::intent::IntentClassifier;
use super::types::{ChatMessage, ChatPhase, MessageIds, MessageMetadata, Sender};
use crate::api::types::{ChatRequest, InsightsRequest, SearchResult};
use crate::api::ApiClient;
use crate::error::Result;
use crate::events::{AgentEvent, EventBus};
use crate::search::{SearchOrchestrator, SearchOutcome};

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub phase: ChatPhase,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// Blank input, nothing appended
    Ignored,
    /// The assistant reply (possibly an error reply)
    Answered(ChatMessage),
}

/// Tunables for one orchestrator
#[derive(Debug, Clone, Copy)]
pub struct ChatLimits {
    /// Results passed to the completion as context and attached to the reply
    pub context_limit: usize,
    /// Results used to scope insights
    pub scope_limit: usize,
}

impl Default for ChatLimits {
    fn default() -> Self {
        Self {
            context_limit: 5,
            scope_limit: 20,
        }
    }
}

struct Gathered {
    results: Vec<SearchResult>,
    insights: Option<String>,
    searched_for: Option<String>,
}

#[derive(Clone)]
pub struct ChatOrchestrator {
    api: ApiClient,
    classifier: Arc<dyn IntentClassifier>,
    search: SearchOrchestrator,
    bus: EventBus,
    limits: ChatLimits,
    state: Arc<RwLock<ChatState>>,
    ids: Arc<std::sync::Mutex<MessageIds>>,
}

impl ChatOrchestrator {
    pub fn new(
        api: ApiClient,
        classifier: Arc<dyn IntentClassifier>,
        search: SearchOrchestrator,
        bus: EventBus,
        limits: ChatLimits,
    ) -> Self {
        Self {
            api,
            classifier,
            search,
            bus,
            limits,
            state: Arc::new(RwLock::new(ChatState::default())),
            ids: Arc::new(std::sync::Mutex::new(MessageIds::default())),
        }
    }

    pub async fn state(&self) -> ChatState {
        self.state.read().await.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    pub async fn phase(&self) -> ChatPhase {
        self.state.read().await.phase
    }

    /// Empty the transcript
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.messages.clear();
        state.error = None;
        self.bus.publish(AgentEvent::ChatCleared);
    }

    pub async fn submit(&self, text: &str) -> Result<ChatOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(ChatOutcome::Ignored);
        }

        let started = Instant::now();

        self.append(Sender::User, text.to_string(), |_| {}).await;
        info!("💬 Chat: {}", text);

        let reply = match self.run_pipeline(text, started).await {
            Ok(reply) => {
                self.state.write().await.error = None;
                reply
            }
            Err(e) => {
                warn!("Chat pipeline stopped: {}", e);
                let message = e.user_message();
                self.state.write().await.error = Some(message.clone());
                self.append(Sender::Ai, message, |m| m.is_error = true).await
            }
        };

        self.set_phase(ChatPhase::Idle).await;
        Ok(ChatOutcome::Answered(reply))
    }

    async fn run_pipeline(&self, text: &str, started: Instant) -> Result<ChatMessage> {
        let gathered = self.gather(text).await?;

        self.set_phase(ChatPhase::Responding).await;
        let context: Vec<SearchResult> = gathered
            .results
            .iter()
            .take(self.limits.context_limit)
            .cloned()
            .collect();
        let request = ChatRequest {
            message: text.to_string(),
            context_records: (!context.is_empty())
                .then(|| context.iter().map(|r| r.id.clone()).collect()),
        };
        let reply = self.api.chat(&request).await?;

        let metadata = MessageMetadata {
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            confidence: reply.confidence,
            context_count: reply.context_count,
            searched_for: gathered.searched_for,
        };
        let insights = gathered.insights;

        Ok(self
            .append(Sender::Ai, reply.response, move |m| {
                m.search_results = (!context.is_empty()).then_some(context);
                m.insights = insights;
                m.metadata = Some(metadata);
            })
            .await)
    }

    /// Intent, then search and insights as the intent and results allow
    async fn gather(&self, text: &str) -> Result<Gathered> {
        self.set_phase(ChatPhase::IntentClassifying).await;
        let intent = self.classifier.classify(text).await?;
        debug!("Intent via {}: {:?}", self.classifier.name(), intent);

        if !intent.should_search {
            return Ok(Gathered {
                results: Vec::new(),
                insights: None,
                searched_for: None,
            });
        }

        self.set_phase(ChatPhase::Searching).await;
        let mut query = self.search.query(&intent.query);
        if let Some(mode) = intent.mode {
            query = query.with_mode(mode);
        }
        let results = match self.search.search(query).await? {
            SearchOutcome::Completed { .. } => self.search.results().await,
            SearchOutcome::Ignored | SearchOutcome::Superseded => Vec::new(),
        };

        if results.is_empty() {
            return Ok(Gathered {
                results,
                insights: None,
                searched_for: Some(intent.query),
            });
        }

        self.set_phase(ChatPhase::InsightsGenerating).await;
        let request = InsightsRequest {
            record_ids: Some(
                results
                    .iter()
                    .take(self.limits.scope_limit)
                    .map(|r| r.id.clone())
                    .collect(),
            ),
            search_query: Some(intent.query.clone()),
            limit: self.limits.scope_limit,
        };
        let report = self.api.generate_insights(&request).await?;

        Ok(Gathered {
            results,
            insights: (!report.summary.trim().is_empty()).then_some(report.summary),
            searched_for: Some(intent.query),
        })
    }

    async fn set_phase(&self, phase: ChatPhase) {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.phase != phase;
            state.phase = phase;
            changed
        };
        if changed {
            self.bus.publish(AgentEvent::ChatPhaseChanged(phase));
        }
    }

    async fn append<F>(&self, sender: Sender, content: String, fill: F) -> ChatMessage
    where
        F: FnOnce(&mut ChatMessage),
    {
        let now = Utc::now();
        let id = match self.ids.lock() {
            Ok(mut ids) => ids.next(now),
            Err(poisoned) => poisoned.into_inner().next(now),
        };

        let mut message = ChatMessage {
            id,
            sender,
            content,
            timestamp: now,
            search_results: None,
            insights: None,
            metadata: None,
            is_error: false,
        };
        fill(&mut message);

        self.state.write().await.messages.push(message.clone());
        self.bus.publish(AgentEvent::ChatMessageAdded {
            id,
            sender,
            is_error: message.is_error,
        });
        message
    }
}
