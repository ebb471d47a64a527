mod common;

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{agent, agent_with_classifier, many_hits, request_bodies, search_body, search_hit};
use data_agent::chat::{ChatOutcome, ChatPhase, KeywordIntentClassifier, Sender};
use data_agent::AgentEvent;

async fn mount_chat_reply(server: &MockServer, response: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": response,
            "context_count": 0,
            "processing_time": 40.0,
            "confidence": 0.8
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_conversational_message_skips_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/process-query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "intent": "question",
            "keywords": ["hello"],
            "search_type": "semantic"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-insights"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_chat_reply(&server, "Hi! Ask me about your data.").await;

    let agent = agent(&server.uri());
    let ChatOutcome::Answered(reply) = agent.chat.submit("hello there").await.unwrap() else {
        panic!("expected a reply");
    };

    assert_eq!(reply.sender, Sender::Ai);
    assert!(!reply.is_error);
    assert!(reply.search_results.is_none());
    assert!(reply.metadata.unwrap().searched_for.is_none());

    let messages = agent.chat.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert!(messages[0].id < messages[1].id);
    assert_eq!(agent.chat.phase().await, ChatPhase::Idle);
}

#[tokio::test]
async fn test_search_intent_runs_full_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/process-query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "intent": "search",
            "keywords": ["solar", "panels"],
            "search_type": "semantic"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search/"))
        .and(body_partial_json(json!({"query": "solar panels", "search_type": "semantic"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            "solar panels",
            vec![search_hit("r1", "Panel A", 0.9), search_hit("r2", "Panel B", 0.8)],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-insights"))
        .and(body_partial_json(json!({"record_ids": ["r1", "r2"], "search_query": "solar panels"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "Two panel records, both recent.",
            "key_patterns": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/chat"))
        .and(body_partial_json(json!({"context_records": ["r1", "r2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Found two panels.",
            "context_count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    let mut events = agent.bus.subscribe();

    let ChatOutcome::Answered(reply) = agent.chat.submit("find solar panels").await.unwrap() else {
        panic!("expected a reply");
    };

    assert_eq!(reply.content, "Found two panels.");
    assert_eq!(reply.search_results.as_ref().map(Vec::len), Some(2));
    assert_eq!(reply.insights.as_deref(), Some("Two panel records, both recent."));
    let metadata = reply.metadata.unwrap();
    assert_eq!(metadata.searched_for.as_deref(), Some("solar panels"));
    assert_eq!(metadata.context_count, 2);

    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let AgentEvent::ChatPhaseChanged(phase) = event {
            phases.push(phase);
        }
    }
    assert_eq!(
        phases,
        vec![
            ChatPhase::IntentClassifying,
            ChatPhase::Searching,
            ChatPhase::InsightsGenerating,
            ChatPhase::Responding,
            ChatPhase::Idle,
        ]
    );
}

#[tokio::test]
async fn test_failed_completion_appends_error_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/process-query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"intent": "question"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Chat failed: model unavailable"})))
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    let ChatOutcome::Answered(reply) = agent.chat.submit("how are you?").await.unwrap() else {
        panic!("expected an error reply");
    };

    assert!(reply.is_error);
    assert_eq!(reply.content, "Chat failed: model unavailable");

    let state = agent.chat.state().await;
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.error.as_deref(), Some("Chat failed: model unavailable"));
    assert_eq!(state.phase, ChatPhase::Idle);
}

#[tokio::test]
async fn test_blank_message_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    assert_eq!(agent.chat.submit("  ").await.unwrap(), ChatOutcome::Ignored);
    assert!(agent.chat.messages().await.is_empty());
}

#[tokio::test]
async fn test_offline_classifier_searches_without_process_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/process-query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search/"))
        .and(body_partial_json(json!({"query": "invoices"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("invoices", vec![])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-insights"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_chat_reply(&server, "I could not find any invoices.").await;

    let agent = agent_with_classifier(&server.uri(), Arc::new(KeywordIntentClassifier::new()));
    let ChatOutcome::Answered(reply) = agent.chat.submit("show me all invoices").await.unwrap() else {
        panic!("expected a reply");
    };

    assert!(!reply.is_error);
    assert!(reply.search_results.is_none());
    assert!(reply.insights.is_none());

    agent.chat.clear().await;
    assert!(agent.chat.messages().await.is_empty());
}

async fn mount_search_intent(server: &MockServer, keywords: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/process-query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "intent": "search",
            "keywords": keywords
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_context_is_capped_at_top_five() {
    let server = MockServer::start().await;
    mount_search_intent(&server, json!(["battery"])).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("battery", many_hits(30))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "Battery records"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_chat_reply(&server, "Here are the battery records.").await;

    let agent = agent(&server.uri());
    let ChatOutcome::Answered(reply) = agent.chat.submit("find battery records").await.unwrap() else {
        panic!("expected a reply");
    };

    let attached: Vec<&str> = reply
        .search_results
        .as_ref()
        .unwrap()
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(attached, vec!["r0", "r1", "r2", "r3", "r4"]);

    let chat_bodies = request_bodies(&server, "/api/v1/ai/chat").await;
    assert_eq!(chat_bodies[0]["context_records"], json!(["r0", "r1", "r2", "r3", "r4"]));

    let insight_bodies = request_bodies(&server, "/api/v1/ai/generate-insights").await;
    assert_eq!(insight_bodies[0]["record_ids"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_failed_search_step_stops_pipeline() {
    let server = MockServer::start().await;
    mount_search_intent(&server, json!(["invoices"])).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "Search backend unavailable"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-insights"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    let ChatOutcome::Answered(reply) = agent.chat.submit("find invoices").await.unwrap() else {
        panic!("expected an error reply");
    };

    assert!(reply.is_error);
    assert_eq!(reply.content, "Search backend unavailable");

    let messages = agent.chat.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages.iter().filter(|m| m.sender == Sender::Ai).count(), 1);
    assert_eq!(agent.chat.phase().await, ChatPhase::Idle);
}

#[tokio::test]
async fn test_embeddings_for_texts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-embeddings"))
        .and(body_partial_json(json!({ "texts": ["solar", "wind"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]],
            "count": 2,
            "dimension": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    let texts = vec!["solar".to_string(), "wind".to_string()];
    let response = agent.api.generate_embeddings(&texts).await.unwrap();

    assert_eq!(response.count, 2);
    assert_eq!(response.dimension, 3);
    assert_eq!(response.embeddings.len(), 2);
    assert_eq!(response.embeddings[1].len(), 3);
}

#[tokio::test]
async fn test_ai_health_reports_degraded_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/ai/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "degraded",
            "services": { "llm": "unavailable", "embeddings": "ok" }
        })))
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    let health = agent.api.ai_health().await.unwrap();

    assert!(!health.is_healthy());
    assert_eq!(health.services.get("llm").map(String::as_str), Some("unavailable"));
}
