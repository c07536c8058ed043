//! Shared test utilities for integration tests.
//!
//! This module provides common test infrastructure including:
//! - `test_server` - a `TestServer` over the in-memory `MockSqlStorage`
//! - helpers to seed posts and inspect responses

use axum::http::StatusCode;
use axum_test::TestServer;
use blog_services::{config::Config, database::MockSqlStorage, routes};
use serde_json::{Value, json};

/// Builds a test server and returns the storage behind it for inspection.
pub async fn test_server() -> (TestServer, MockSqlStorage) {
    let storage = MockSqlStorage::new();
    let app = routes(storage.clone(), Config::new_for_test()).await;
    let server = TestServer::new(app).expect("test server should start");
    (server, storage)
}

/// Creates a post via `POST /api/posts` and returns its `data` object.
pub async fn create_post(server: &TestServer, title: &str, tags: &[&str]) -> Value {
    let response = server
        .post("/api/posts")
        .json(&json!({
            "title": title,
            "content": format!("content of {title}"),
            "tags": tags,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

/// Extracts `data.id` as an i64.
pub fn id_of(data: &Value) -> i64 {
    data["id"].as_i64().expect("object should have an id")
}

/// Asserts an error envelope with the given status.
pub fn assert_error(body: &Value, status: StatusCode) {
    assert_eq!(body["code"], status.as_u16());
    assert_eq!(body["status"], "error");
    assert!(body["data"].is_string());
}
