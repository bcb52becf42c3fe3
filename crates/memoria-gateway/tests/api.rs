// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use memoria_core::Metadata;
use memoria_gateway::{router, GatewayState};
use memoria_memory::{MemoryService, MemorySettings};
use memoria_test_utils::{InMemoryIndex, MockEmbedder, MockProvider};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    service: Arc<MemoryService>,
    index: InMemoryIndex,
}

fn test_app(provider: MockProvider) -> TestApp {
    let index = InMemoryIndex::new();
    let service = Arc::new(MemoryService::new(
        Arc::new(provider),
        Arc::new(MockEmbedder::new()),
        Arc::new(index.clone()),
        MemorySettings::default(),
    ));
    TestApp {
        app: router(GatewayState::new(service.clone())),
        service,
        index,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let t = test_app(MockProvider::new());
    let (status, body) = send(&t.app, request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn add_memory_stores_extracted_fact() {
    let provider = MockProvider::with_responses(vec![
        r#"{"fact": "Likes green tea"}"#.to_string(),
        r#"{"memory": [{"id": "0", "text": "Likes green tea", "event": "ADD"}]}"#.to_string(),
    ]);
    let t = test_app(provider);

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/v1/memory/",
            json!({
                "messages": [{"role": "user", "content": "I really like green tea"}],
                "user_id": "alice"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Memory processed and stored successfully");
    assert_eq!(body["results"], json!(["Likes green tea"]));
    assert_eq!(body["report"]["added"], 1);

    let stored = t.index.records().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].metadata["user_id"], "alice");
    assert_eq!(stored[0].metadata["content"], "Likes green tea");
}

#[tokio::test]
async fn add_memory_without_trailing_slash() {
    let provider = MockProvider::with_responses(vec![r#"{"fact": ""}"#.to_string()]);
    let t = test_app(provider);

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/v1/memory",
            json!({"messages": [{"role": "user", "content": "hi"}], "user_id": "alice"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "success", "message": "No facts to process", "results": []})
    );
    assert_eq!(t.index.write_count(), 0);
}

#[tokio::test]
async fn provider_failure_is_reported_in_body() {
    let provider = MockProvider::new();
    provider.add_failure("upstream unavailable").await;
    let t = test_app(provider);

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/v1/memory/",
            json!({"messages": [{"role": "user", "content": "I moved to Lisbon"}], "user_id": "bob"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(
        body["message"].as_str().unwrap().contains("upstream unavailable"),
        "got: {body}"
    );
    assert!(body.get("results").is_none());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let t = test_app(MockProvider::new());
    let (status, _) = send(&t.app, post_json("/api/v1/memory/", json!({"user_id": "alice"}))).await;
    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn search_filters_by_owner() {
    let t = test_app(MockProvider::new());
    let store = t.service.store();
    store
        .add("Likes green tea", "alice", Metadata::new())
        .await
        .unwrap();
    store
        .add("Likes green tea", "bob", Metadata::new())
        .await
        .unwrap();

    let (status, body) = send(
        &t.app,
        request("GET", "/api/v1/memory/alice?query=Likes%20green%20tea"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["user_id"], "alice");
    assert_eq!(results[0]["memory"], "Likes green tea");
    assert!(results[0]["score"].as_f64().unwrap() > 0.99);
}

#[tokio::test]
async fn missing_query_lists_all_memories() {
    let t = test_app(MockProvider::new());
    let store = t.service.store();
    for text in ["Likes green tea", "Lives in Lisbon", "Plays the cello"] {
        store.add(text, "alice", Metadata::new()).await.unwrap();
    }
    store.add("Owns a cat", "bob", Metadata::new()).await.unwrap();

    let (_, body) = send(&t.app, request("GET", "/api/v1/memory/alice")).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn search_swallows_store_errors() {
    let t = test_app(MockProvider::new());
    t.index.fail_operation("query").await;

    let (status, body) = send(&t.app, request("GET", "/api/v1/memory/alice?query=tea")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "results": []}));
}

#[tokio::test]
async fn delete_all_removes_only_that_owner() {
    let t = test_app(MockProvider::new());
    let store = t.service.store();
    store.add("Likes green tea", "alice", Metadata::new()).await.unwrap();
    store.add("Owns a cat", "bob", Metadata::new()).await.unwrap();

    let (_, body) = send(&t.app, request("DELETE", "/api/v1/memory/alice")).await;
    assert_eq!(
        body,
        json!({"status": "success", "message": "Successfully deleted all memories", "results": ""})
    );

    let remaining = t.index.records().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].metadata["user_id"], "bob");
}

#[tokio::test]
async fn delete_by_id_route() {
    let t = test_app(MockProvider::new());
    let record = t
        .service
        .store()
        .add("Likes green tea", "alice", Metadata::new())
        .await
        .unwrap();

    let uri = format!("/api/v1/memory/id/{}", record.id);
    let (_, body) = send(&t.app, request("DELETE", &uri)).await;
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        format!("Successfully deleted memory by id: {}", record.id)
    );
    assert!(t.index.records().await.is_empty());
}

#[tokio::test]
async fn delete_failure_is_reported_in_body() {
    let t = test_app(MockProvider::new());
    t.index.fail_operation("delete").await;

    let (status, body) = send(&t.app, request("DELETE", "/api/v1/memory/alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
}
