//! Recent and saved searches, persisted in the local store

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

use super::types::{RecentSearch, SavedSearch, SearchQuery};
use crate::error::{AgentError, Result};
use crate::storage::{load_json, save_json, SharedStore, RECENT_SEARCHES_KEY, SAVED_SEARCHES_KEY};

/// Insert `entry` at the front, dropping any older entry with the same text
/// and anything beyond `cap`.
pub fn push_recent(list: &mut Vec<RecentSearch>, entry: RecentSearch, cap: usize) {
    list.retain(|existing| existing.query != entry.query);
    list.insert(0, entry);
    list.truncate(cap);
}

/// Clones share one write lock; every load-modify-save runs under it.
#[derive(Clone)]
pub struct SearchHistory {
    store: SharedStore,
    limit: usize,
    write_lock: Arc<Mutex<()>>,
}

impl SearchHistory {
    pub fn new(store: SharedStore, limit: usize) -> Self {
        Self {
            store,
            limit,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Most recent first
    pub fn recent(&self) -> Result<Vec<RecentSearch>> {
        let mut list: Vec<RecentSearch> =
            load_json(self.store.as_ref(), RECENT_SEARCHES_KEY)?.unwrap_or_default();
        list.truncate(self.limit);
        Ok(list)
    }

    pub fn record(&self, entry: RecentSearch) -> Result<Vec<RecentSearch>> {
        let _guard = self.lock();
        let mut list = self.recent()?;
        push_recent(&mut list, entry, self.limit);
        save_json(self.store.as_ref(), RECENT_SEARCHES_KEY, &list)?;
        debug!("Recent searches: {}", list.len());
        Ok(list)
    }

    /// Recent searches whose text contains `partial`, ignoring case
    pub fn matching(&self, partial: &str) -> Result<Vec<RecentSearch>> {
        let needle = partial.trim().to_lowercase();
        Ok(self
            .recent()?
            .into_iter()
            .filter(|entry| entry.query.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn clear_recent(&self) -> Result<()> {
        let _guard = self.lock();
        self.store.remove(RECENT_SEARCHES_KEY)?;
        Ok(())
    }

    pub fn saved(&self) -> Result<Vec<SavedSearch>> {
        Ok(load_json(self.store.as_ref(), SAVED_SEARCHES_KEY)?.unwrap_or_default())
    }

    /// Save `query` under `name`. Saving the same query text again replaces
    /// the older entry.
    pub fn save(&self, name: &str, query: SearchQuery, result_count: u64) -> Result<SavedSearch> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AgentError::Validation("A saved search needs a name".to_string()));
        }
        if query.is_blank() {
            return Err(AgentError::Validation("Nothing to save: the query is empty".to_string()));
        }

        let saved = SavedSearch {
            id: Uuid::new_v4(),
            name: name.to_string(),
            query,
            created_at: Utc::now(),
            last_used: None,
            use_count: 0,
            result_count,
        };

        let _guard = self.lock();
        let mut list = self.saved()?;
        list.retain(|existing| existing.query.text != saved.query.text);
        list.insert(0, saved.clone());
        list.truncate(self.limit);
        save_json(self.store.as_ref(), SAVED_SEARCHES_KEY, &list)?;

        Ok(saved)
    }

    /// Bump usage counters and return the saved search
    pub fn mark_used(&self, id: Uuid) -> Result<SavedSearch> {
        let _guard = self.lock();
        let mut list = self.saved()?;
        let entry = list
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| AgentError::NotFound(format!("Saved search {}", id)))?;

        entry.use_count += 1;
        entry.last_used = Some(Utc::now());
        let updated = entry.clone();

        save_json(self.store.as_ref(), SAVED_SEARCHES_KEY, &list)?;
        Ok(updated)
    }

    pub fn update_result_count(&self, id: Uuid, result_count: u64) -> Result<()> {
        let _guard = self.lock();
        let mut list = self.saved()?;
        if let Some(entry) = list.iter_mut().find(|entry| entry.id == id) {
            entry.result_count = result_count;
            save_json(self.store.as_ref(), SAVED_SEARCHES_KEY, &list)?;
        }
        Ok(())
    }

    pub fn remove_saved(&self, id: Uuid) -> Result<bool> {
        let _guard = self.lock();
        let mut list = self.saved()?;
        let before = list.len();
        list.retain(|entry| entry.id != id);
        if list.len() == before {
            return Ok(false);
        }
        save_json(self.store.as_ref(), SAVED_SEARCHES_KEY, &list)?;
        Ok(true)
    }
}
