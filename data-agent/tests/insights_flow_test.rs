mod common;

use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{agent, many_hits, request_bodies, search_body, search_hit};
use data_agent::insights::{InsightsScope, RefreshOutcome, RefreshTrigger};

/// Mounts every insights endpoint; `summary_delay` slows the summary analysis down
async fn mount_insights(server: &MockServer, summary_delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/analyze"))
        .and(body_partial_json(json!({"analysis_type": "summary"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "analysis_type": "summary",
                    "result": "{\"summary\": \"42 records across 3 categories\", \"trends\": [\"More sensor data each week\"]}",
                    "record_count": 42
                }))
                .set_delay(summary_delay),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/analyze"))
        .and(body_partial_json(json!({"analysis_type": "sentiment"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "analysis_type": "sentiment",
            "result": "Overall tone: {\"positive\": 0.6, \"neutral\": 0.3, \"negative\": 0.1, \"overall\": \"positive\"}"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/data/analytics/time-distribution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "distribution": {"2024-02": 10, "2024-03": 32}
        })))
        .mount(server)
        .await;
}

async fn mount_categories(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/data/analytics/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": {"tech": 30, "science": 12}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_dataset_refresh_fills_every_part() {
    let server = MockServer::start().await;
    mount_insights(&server, Duration::ZERO).await;
    mount_categories(&server).await;

    let agent = agent(&server.uri());
    let outcome = agent.insights.refresh(RefreshTrigger::Forced).await;
    assert_eq!(outcome, RefreshOutcome::Refreshed { error: None });

    let state = agent.insights.state().await;
    let snapshot = state.snapshot.unwrap();
    assert_eq!(snapshot.scope, InsightsScope::Dataset);
    let body = snapshot.body.as_ref().unwrap();
    assert_eq!(body.summary, "42 records across 3 categories");
    assert_eq!(body.trends, vec!["More sensor data each week"]);
    assert_eq!(body.record_count, Some(42));
    assert_eq!(snapshot.categories.get("tech"), Some(&30));
    assert_eq!(snapshot.time_buckets.len(), 2);

    let sentiment = snapshot.sentiment.unwrap();
    assert_eq!(sentiment.positive, Some(0.6));
    assert_eq!(sentiment.overall.as_deref(), Some("positive"));
    assert!(state.last_refreshed.is_some());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_partial_failure_keeps_other_parts() {
    let server = MockServer::start().await;
    mount_insights(&server, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/data/analytics/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Category stats failed"})))
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    let outcome = agent.insights.refresh(RefreshTrigger::Forced).await;
    assert_eq!(
        outcome,
        RefreshOutcome::Refreshed {
            error: Some("Category stats failed".to_string())
        }
    );

    let snapshot = agent.insights.state().await.snapshot.unwrap();
    assert!(snapshot.categories.is_empty());
    assert_eq!(snapshot.summary(), Some("42 records across 3 categories"));
    assert_eq!(snapshot.time_buckets.len(), 2);
}

#[tokio::test]
async fn test_automatic_refresh_skipped_while_one_is_running() {
    let server = MockServer::start().await;
    mount_insights(&server, Duration::from_millis(300)).await;
    mount_categories(&server).await;

    let agent = agent(&server.uri());

    let first = {
        let insights = agent.insights.clone();
        tokio::spawn(async move { insights.refresh(RefreshTrigger::Automatic).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(agent.insights.in_flight(), 1);

    assert_eq!(
        agent.insights.refresh(RefreshTrigger::Automatic).await,
        RefreshOutcome::Skipped
    );

    let first = first.await.unwrap();
    assert_eq!(first, RefreshOutcome::Refreshed { error: None });
    assert_eq!(agent.insights.in_flight(), 0);
}

#[tokio::test]
async fn test_forced_refresh_wins_over_slower_automatic() {
    let server = MockServer::start().await;
    // The first summary request, made by the automatic refresh, is slow and stale
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/analyze"))
        .and(body_partial_json(json!({"analysis_type": "summary"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"analysis_type": "summary", "result": "Stale summary"}))
                .set_delay(Duration::from_millis(400)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_insights(&server, Duration::ZERO).await;
    mount_categories(&server).await;

    let agent = agent(&server.uri());

    let automatic = {
        let insights = agent.insights.clone();
        tokio::spawn(async move { insights.refresh(RefreshTrigger::Automatic).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(agent.insights.in_flight(), 1);

    let forced = agent.insights.refresh(RefreshTrigger::Forced).await;
    assert_eq!(forced, RefreshOutcome::Refreshed { error: None });
    assert_eq!(automatic.await.unwrap(), RefreshOutcome::Superseded);
    assert_eq!(agent.insights.in_flight(), 0);

    let snapshot = agent.insights.state().await.snapshot.unwrap();
    assert_eq!(snapshot.summary(), Some("42 records across 3 categories"));
}

#[tokio::test]
async fn test_insights_follow_active_search() {
    let server = MockServer::start().await;
    mount_insights(&server, Duration::ZERO).await;
    mount_categories(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(
            "battery",
            vec![search_hit("b1", "Battery A", 0.9), search_hit("b2", "Battery B", 0.6)],
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-insights"))
        .and(body_partial_json(json!({"record_ids": ["b1", "b2"], "search_query": "battery"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "Two battery records",
            "anomalies": ["b2 scores low"],
            "data_size": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    agent.search.search_text("battery").await.unwrap();

    agent.insights.refresh(RefreshTrigger::Forced).await;
    let snapshot = agent.insights.state().await.snapshot.unwrap();

    assert_eq!(
        snapshot.scope,
        InsightsScope::Search {
            query: "battery".to_string(),
            record_ids: vec!["b1".to_string(), "b2".to_string()],
        }
    );
    let body = snapshot.body.unwrap();
    assert_eq!(body.summary, "Two battery records");
    assert_eq!(body.anomalies, vec!["b2 scores low"]);
}

#[tokio::test]
async fn test_auto_refresh_stops_on_cancel() {
    let server = MockServer::start().await;
    mount_insights(&server, Duration::ZERO).await;
    mount_categories(&server).await;

    let agent = agent(&server.uri());
    let cancel = CancellationToken::new();
    let handle = agent
        .insights
        .spawn_auto_refresh(Duration::from_millis(50), cancel.clone());

    tokio::time::sleep(Duration::from_millis(150)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(agent.insights.state().await.snapshot.is_some());
}

#[tokio::test]
async fn test_search_scope_is_capped_at_top_twenty() {
    let server = MockServer::start().await;
    mount_insights(&server, Duration::ZERO).await;
    mount_categories(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("sensor", many_hits(30))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ai/generate-insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "Sensor records"})))
        .expect(1)
        .mount(&server)
        .await;

    let agent = agent(&server.uri());
    agent.search.search_text("sensor").await.unwrap();
    assert_eq!(agent.search.results().await.len(), 30);

    agent.insights.refresh(RefreshTrigger::Forced).await;

    let bodies = request_bodies(&server, "/api/v1/ai/generate-insights").await;
    let ids: Vec<&str> = bodies[0]["record_ids"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|id| id.as_str())
        .collect();
    let expected: Vec<String> = (0..20).map(|i| format!("r{}", i)).collect();
    assert_eq!(ids, expected);

    let snapshot = agent.insights.state().await.snapshot.unwrap();
    let InsightsScope::Search { record_ids, .. } = snapshot.scope else {
        panic!("expected a search scope");
    };
    assert_eq!(record_ids.len(), 20);
}
