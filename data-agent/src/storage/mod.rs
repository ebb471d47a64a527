//! Local key-value storage
//!
//! Provides storage backends behind the [`KvStore`] trait:
//! - [`memory`]: in-process map, nothing persisted
//! - [`file`]: single JSON document rewritten atomically on every mutation
//!
//! Values are JSON. Orchestrators go through [`load_json`] / [`save_json`].

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::error::{AgentError, Result};

/// Key for the recent-search list
pub const RECENT_SEARCHES_KEY: &str = "recent_searches";
/// Key for the saved-search list
pub const SAVED_SEARCHES_KEY: &str = "saved_searches";
/// Key for user preferences
pub const PREFERENCES_KEY: &str = "preferences";

/// Embedded key-value store
///
/// There are no cross-key transactions; each `set`/`remove` stands alone.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Returns whether the key existed
    fn remove(&self, key: &str) -> Result<bool>;

    fn keys(&self) -> Result<Vec<String>>;
}

pub type SharedStore = Arc<dyn KvStore>;

/// Read and decode a typed value.
///
/// A value that no longer decodes (older layout, hand edits) is treated as
/// absent so callers fall back to their defaults.
pub fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        None => Ok(None),
        Some(value) => match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                warn!("Ignoring undecodable value for '{}': {}", key, e);
                Ok(None)
            }
        },
    }
}

pub fn save_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|e| AgentError::Storage(format!("Failed to encode '{}': {}", key, e)))?;
    store.set(key, value)
}

/// Results view layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultsLayout {
    #[default]
    Table,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// User preferences kept in the local store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub results_layout: ResultsLayout,
}

impl Preferences {
    pub fn load(store: &dyn KvStore) -> Result<Self> {
        Ok(load_json(store, PREFERENCES_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<()> {
        save_json(store, PREFERENCES_KEY, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_default_when_missing() {
        let store = MemoryStore::new();
        assert_eq!(Preferences::load(&store).unwrap(), Preferences::default());
    }

    #[test]
    fn test_preferences_persist() {
        let store = MemoryStore::new();
        let prefs = Preferences {
            theme: Theme::Dark,
            results_layout: ResultsLayout::Compact,
        };
        prefs.save(&store).unwrap();

        assert_eq!(Preferences::load(&store).unwrap(), prefs);
        assert_eq!(
            store.get(PREFERENCES_KEY).unwrap(),
            Some(serde_json::json!({"theme": "dark", "results_layout": "compact"}))
        );
    }

    #[test]
    fn test_undecodable_value_is_absent() {
        let store = MemoryStore::new();
        store.set(RECENT_SEARCHES_KEY, serde_json::json!("garbage")).unwrap();

        let loaded: Option<Vec<String>> = load_json(&store, RECENT_SEARCHES_KEY).unwrap();
        assert!(loaded.is_none());
    }
}
