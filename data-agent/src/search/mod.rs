//! Search orchestration
//!
//! Query model, recent/saved search history and the orchestrator that owns
//! the current result set.

pub mod history;
pub mod orchestrator;
pub mod types;

pub use history::SearchHistory;
pub use orchestrator::{SearchOrchestrator, SearchOutcome, SearchState};
pub use types::*;
