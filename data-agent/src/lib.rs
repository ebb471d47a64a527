//! data-agent: client orchestration for an AI data agent
//!
//! Everything a front end needs to drive a document store with hosted-model
//! search, chat and insights, reached over REST and an optional WebSocket.
//!
//! # Features
//!
//! - **Search**: basic and filtered search, superseded responses discarded
//! - **Suggestions**: debounced, merged from model, keyword and history sources
//! - **Results**: stable sorting, selection, CSV/JSON export
//! - **Records**: paginated listing and create/update/delete
//! - **Chat**: intent → search → insights → reply pipeline
//! - **Insights**: periodically refreshed dashboard with partial-failure tolerance
//!
//! # Example
//!
//! ```no_run
//! use data_agent::config::AgentConfig;
//! use data_agent::Agent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = Agent::from_config(AgentConfig::load(None)?)?;
//!
//!     agent.search.search_text("solar sensors").await?;
//!     for result in agent.search.results().await {
//!         println!("{} ({:.2})", result.title, result.score);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`api`]: REST client and wire types
//! - [`storage`]: local key-value store
//! - [`search`], [`suggest`], [`results`]: search flow
//! - [`data`]: record management
//! - [`chat`]: AI chat pipeline
//! - [`insights`]: insights dashboard
//! - [`push`]: WebSocket push channel
//! - [`events`]: state-change notifications

pub mod agent;
pub mod api;
pub mod chat;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod insights;
pub mod push;
pub mod results;
pub mod search;
pub mod sequence;
pub mod storage;
pub mod suggest;

pub use agent::Agent;
pub use api::ApiClient;
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use events::{AgentEvent, EventBus};
