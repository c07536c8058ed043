use axum_test::TestServer;
use blog_services::{config::Config, database::MockSqlStorage, openapi::ApiDoc, routes};
use utoipa::OpenApi;

/// Replaces every `{param}` segment with a concrete id.
fn concrete(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                "1"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[tokio::test]
async fn test_documented_paths_are_routed() {
    let app = routes(MockSqlStorage::new(), Config::new_for_test()).await;
    let server = TestServer::new(app).unwrap();

    let doc = ApiDoc::openapi();
    assert!(!doc.paths.paths.is_empty());

    for (path, item) in &doc.paths.paths {
        if item.get.is_none() {
            continue;
        }
        let response = server.get(&concrete(path)).await;
        assert_ne!(
            response.text(),
            "nothing to see here",
            "{path} is documented but not routed"
        );
    }
}

#[tokio::test]
async fn test_link_paths_use_camel_case_params() {
    let doc = ApiDoc::openapi();

    assert!(doc.paths.paths.contains_key("/api/postTags/post/{postId}"));
    assert!(doc.paths.paths.contains_key("/api/postTags/tag/{tagId}"));
}
