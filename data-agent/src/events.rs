//! Typed state-change notifications
//!
//! Orchestrators publish on a shared [`EventBus`]; front ends subscribe and
//! re-read whichever state container changed.

use tokio::sync::broadcast;
use tracing::trace;

use crate::chat::types::{ChatPhase, Sender};
use crate::insights::types::RefreshTrigger;
use crate::push::PushMessage;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum AgentEvent {
    SearchStarted {
        query: String,
    },
    SearchCompleted {
        query: String,
        result_count: usize,
        total_count: u64,
    },
    SearchFailed {
        query: String,
        message: String,
    },
    /// A response arrived after a newer request was issued and was dropped
    SearchSuperseded {
        query: String,
    },
    SuggestionsUpdated {
        input: String,
        count: usize,
    },
    SuggestionsCleared,
    ChatPhaseChanged(ChatPhase),
    ChatMessageAdded {
        id: u64,
        sender: Sender,
        is_error: bool,
    },
    ChatCleared,
    InsightsRefreshStarted(RefreshTrigger),
    InsightsRefreshSkipped,
    /// A refresh finished after a newer one had started; its snapshot was dropped
    InsightsRefreshSuperseded,
    InsightsRefreshed {
        error: Option<String>,
    },
    DataPageLoaded {
        page: u32,
        total_pages: u32,
    },
    RecordCreated {
        id: String,
    },
    RecordUpdated {
        id: String,
    },
    RecordDeleted {
        id: String,
    },
    RecordsImported {
        processed: u64,
        failed: u64,
    },
    DataFailed {
        message: String,
    },
    Push(PushMessage),
}

/// Broadcast channel shared by every orchestrator
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; having no subscriber is fine
    pub fn publish(&self, event: AgentEvent) {
        trace!("event: {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(AgentEvent::SuggestionsCleared);
    }

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(AgentEvent::SearchStarted {
            query: "rust".to_string(),
        });
        bus.publish(AgentEvent::SearchSuperseded {
            query: "rust".to_string(),
        });

        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::SearchStarted { .. }));
        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::SearchSuperseded { .. }));
    }
}
