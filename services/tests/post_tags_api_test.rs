mod common;

use axum::http::StatusCode;
use common::{assert_error, create_post, id_of, test_server};
use serde_json::{Value, json};

fn tag_id(post: &Value, label: &str) -> i64 {
    post["tags"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["label"] == label)
        .map(id_of)
        .unwrap()
}

#[tokio::test]
async fn test_list_links() {
    let (server, _) = test_server().await;
    let first = create_post(&server, "first", &["a", "b"]).await;
    create_post(&server, "second", &["b"]).await;

    let response = server.get("/api/postTags").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[0],
        json!({"post_id": id_of(&first), "tag_id": tag_id(&first, "a")})
    );
}

#[tokio::test]
async fn test_list_links_search_matches_label_or_title() {
    let (server, _) = test_server().await;
    create_post(&server, "Rust book", &["books"]).await;
    create_post(&server, "Travel", &["rust-belt"]).await;
    create_post(&server, "Cooking", &["food"]).await;

    let body: Value = server
        .get("/api/postTags")
        .add_query_param("searchBy", "ust")
        .await
        .json();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_links_for_post_and_tag() {
    let (server, _) = test_server().await;
    let post = create_post(&server, "p", &["a", "b"]).await;
    let post_id = id_of(&post);
    let b = tag_id(&post, "b");

    let body: Value = server
        .get(&format!("/api/postTags/post/{post_id}"))
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let body: Value = server.get(&format!("/api/postTags/tag/{b}")).await.json();
    assert_eq!(body["data"], json!([{"post_id": post_id, "tag_id": b}]));
}

#[tokio::test]
async fn test_delete_links_for_post() {
    let (server, storage) = test_server().await;
    let post = create_post(&server, "p", &["a", "b"]).await;
    let post_id = id_of(&post);

    let response = server
        .delete(&format!("/api/postTags/post/{post_id}"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["removed"], 2);
    assert!(body["data"]["message"].is_string());

    assert_eq!(storage.link_count(), 0);
    assert_eq!(storage.post_count(), 1);
    assert_eq!(storage.tag_count(), 2);

    // Nothing left to remove is still a success
    let body: Value = server
        .delete(&format!("/api/postTags/post/{post_id}"))
        .await
        .json();
    assert_eq!(body["data"]["removed"], 0);
}

#[tokio::test]
async fn test_delete_links_for_tag() {
    let (server, storage) = test_server().await;
    let first = create_post(&server, "one", &["shared"]).await;
    create_post(&server, "two", &["shared", "solo"]).await;
    let shared = tag_id(&first, "shared");

    let body: Value = server
        .delete(&format!("/api/postTags/tag/{shared}"))
        .await
        .json();
    assert_eq!(body["data"]["removed"], 2);
    assert_eq!(storage.link_count(), 1);
}

#[tokio::test]
async fn test_missing_parent_is_404() {
    let (server, _) = test_server().await;

    let response = server.get("/api/postTags/post/1").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_error(&response.json::<Value>(), StatusCode::NOT_FOUND);
    server
        .get("/api/postTags/tag/1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete("/api/postTags/post/1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete("/api/postTags/tag/1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/api/postTags/post/x")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
