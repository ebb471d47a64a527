use std::collections::HashSet;

use crate::api::types::SearchResult;

/// Ids of the results the user has ticked
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id; returns whether it is now selected
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Select every result, or clear if every result is already selected
    pub fn toggle_all(&mut self, results: &[SearchResult]) {
        let all_selected = !results.is_empty() && results.iter().all(|r| self.ids.contains(&r.id));
        if all_selected {
            self.ids.clear();
        } else {
            self.ids.extend(results.iter().map(|r| r.id.clone()));
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Results in their given order, restricted to the selection
    pub fn pick<'a>(&self, results: &'a [SearchResult]) -> Vec<&'a SearchResult> {
        results.iter().filter(|r| self.ids.contains(&r.id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;
    use std::collections::BTreeMap;

    fn results(ids: &[&str]) -> Vec<SearchResult> {
        ids.iter()
            .map(|id| SearchResult {
                id: id.to_string(),
                title: id.to_string(),
                description: None,
                content: Map::new(),
                tags: vec![],
                category: None,
                score: 0.0,
                highlights: BTreeMap::new(),
                metadata: Map::new(),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_toggle() {
        let mut selection = Selection::new();
        assert!(selection.toggle("a"));
        assert!(selection.is_selected("a"));
        assert!(!selection.toggle("a"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_all_selects_then_clears() {
        let results = results(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.toggle("b");

        selection.toggle_all(&results);
        assert_eq!(selection.len(), 3);

        selection.toggle_all(&results);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_pick_follows_result_order() {
        let results = results(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.toggle("c");
        selection.toggle("a");

        let picked: Vec<&str> = selection.pick(&results).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(picked, vec!["a", "c"]);
    }
}
