//! AI chat
//!
//! Provides the chat pipeline:
//! - [`intent`]: pluggable intent classification
//! - [`orchestrator`]: the sequential intent/search/insights/reply pipeline
//! - [`types`]: transcript messages and pipeline phases

pub mod intent;
pub mod orchestrator;
pub mod types;

pub use intent::{Intent, IntentClassifier, KeywordIntentClassifier, RemoteIntentClassifier};
pub use orchestrator::{ChatLimits, ChatOrchestrator, ChatOutcome, ChatState};
pub use types::{ChatMessage, ChatPhase, MessageMetadata, Sender};
