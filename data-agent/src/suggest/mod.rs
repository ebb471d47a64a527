//! Query suggestions
//!
//! - [`debounce`]: quiet-period gate shared with real-time search
//! - [`engine`]: source fan-out, merge and dropdown navigation

pub mod debounce;
pub mod engine;

pub use debounce::Debouncer;
pub use engine::{
    merge_suggestions, SuggestOutcome, Suggestion, SuggestionEngine, SuggestionList, SuggestionSource,
};
