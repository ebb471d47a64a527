#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

use data_agent::chat::IntentClassifier;
use data_agent::storage::MemoryStore;
use data_agent::{Agent, AgentConfig};

/// Config pointed at a mock backend, with an in-memory store and a short debounce
pub fn test_config(base_url: &str) -> AgentConfig {
    let mut config = AgentConfig::default();
    config.api.base_url = base_url.to_string();
    config.storage.path = None;
    config.search.debounce_ms = 20;
    config
}

pub fn agent(base_url: &str) -> Agent {
    Agent::from_config(test_config(base_url)).unwrap()
}

pub fn agent_with_classifier(base_url: &str, classifier: Arc<dyn IntentClassifier>) -> Agent {
    Agent::with_parts(test_config(base_url), Arc::new(MemoryStore::new()), classifier).unwrap()
}

pub fn search_hit(id: &str, title: &str, score: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("About {}", title),
        "content": {},
        "tags": ["sensor"],
        "category": "tech",
        "score": score,
        "highlights": {},
        "metadata": {},
        "created_at": "2024-03-01T10:00:00"
    })
}

/// `n` hits with ids `r0..r{n-1}`, best score first
pub fn many_hits(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| search_hit(&format!("r{}", i), &format!("Record {}", i), 1.0 - i as f64 / 100.0))
        .collect()
}

/// JSON bodies of every request the mock server received on `route`
pub async fn request_bodies(server: &MockServer, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == route)
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

pub fn search_body(query: &str, hits: Vec<Value>) -> Value {
    let total = hits.len();
    json!({
        "query": query,
        "results": hits,
        "total_count": total,
        "returned_count": total,
        "processing_time": 12.5,
        "suggestions": [],
        "facets": {}
    })
}

pub fn record(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "content": {"a": 1},
        "tags": [],
        "category": null,
        "status": "active",
        "metadata": {},
        "created_at": "2024-03-01T10:00:00",
        "updated_at": "2024-03-01T10:00:00"
    })
}

pub fn record_page(records: Vec<Value>, page: u32, total_pages: u32) -> Value {
    let total = records.len();
    let next_page = (page < total_pages).then_some(page + 1);
    let prev_page = (page > 1).then(|| page - 1);
    let offset = (page - 1) * 10;
    let has_next = next_page.is_some();
    let has_prev = prev_page.is_some();
    json!({
        "data": records,
        "pagination": {
            "current_page": page,
            "total_pages": total_pages,
            "page_size": 10,
            "offset": offset,
            "has_next": has_next,
            "has_prev": has_prev,
            "next_page": next_page,
            "prev_page": prev_page
        },
        "total_count": total,
        "returned_count": total
    })
}
