use crate::config::Config;
use crate::database::SqlStorage;
use crate::state::AppState;
use axum::{
    Router,
    extract::{Extension, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{any, get},
};
use opentelemetry::{global, propagation::Extractor};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod openapi;
pub mod pagination;
pub mod post_tags;
pub mod posts;
pub mod state;
pub mod tags;
pub mod telemetry;
pub mod validation;
pub mod version;

struct HeaderExtractor<'a>(&'a axum::http::HeaderMap);

impl<'a> Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Builds the application router on top of the given storage.
pub async fn routes<S: SqlStorage>(sql_storage: S, config: Config) -> Router {
    let state = AppState::new(sql_storage);

    let mut router = Router::new()
        .route("/", get(home))
        .route("/is-health", get(health_check::<S>))
        .nest("/api", api::routes::<S>());

    if let Some(docs) = openapi::create_openapi_routes::<S>(&config) {
        router = router.merge(docs);
    }

    router
        .fallback(any(catch_all))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                // Check if the request has a trace context header
                let parent_context = global::get_text_map_propagator(|propagator| {
                    propagator.extract(&HeaderExtractor(request.headers()))
                });

                let span = tracing::info_span!(
                    "http_request",
                    http_request.method = ?request.method(),
                    http_request.uri = ?request.uri(),
                    http_request.version = ?request.version(),
                    http_request.user_agent = ?request.headers().get(axum::http::header::USER_AGENT),
                );

                span.set_parent(parent_context);

                span
            }),
        )
        .layer(Extension(config))
        .with_state(state)
}

async fn home() -> &'static str {
    "Welcome Home!"
}

async fn health_check<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Extension(config): Extension<Config>,
) -> impl IntoResponse {
    let mut response = if state.sql_storage.is_connected().await {
        (StatusCode::OK, "OK").into_response()
    } else {
        tracing::warn!("Health check failed: database unreachable");
        (StatusCode::BAD_GATEWAY, "502").into_response()
    };

    let headers = [
        ("x-service-env", config.environment().to_string()),
        (
            "x-service-version",
            version::format_version_for_env(config.environment()),
        ),
    ];
    for (name, value) in headers {
        // Non-ASCII values are left out
        if let Ok(value) = HeaderValue::from_str(&value) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(name), value);
        }
    }

    response
}

async fn catch_all() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Env;
    use crate::database::MockSqlStorage;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn send_get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check_connected() {
        let app = routes(MockSqlStorage::new(), Config::new_for_test()).await;
        let response = send_get(app, "/is-health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check_disconnected() {
        let app = routes(MockSqlStorage::disconnected(), Config::new_for_test()).await;
        let response = send_get(app, "/is-health").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health_check_includes_headers() {
        let app = routes(MockSqlStorage::new(), Config::new_for_test()).await;
        let response = send_get(app, "/is-health").await;

        let env_header = response
            .headers()
            .get("x-service-env")
            .and_then(|v| v.to_str().ok());
        assert_eq!(env_header, Some("local"));

        let version_header = response
            .headers()
            .get("x-service-version")
            .and_then(|v| v.to_str().ok());
        let expected_version = version::format_version_for_env(&Env::Local);
        assert_eq!(version_header, Some(expected_version.as_str()));
    }

    #[tokio::test]
    async fn test_home() {
        let app = routes(MockSqlStorage::new(), Config::new_for_test()).await;
        let response = send_get(app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = routes(MockSqlStorage::new(), Config::new_for_test()).await;
        let response = send_get(app, "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_docs_hidden_in_prod() {
        let config = Config::new_for_test_with_env(Env::Prod);
        let app = routes(MockSqlStorage::new(), config).await;
        let response = send_get(app, "/openapi.json").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_docs_served_locally() {
        let app = routes(MockSqlStorage::new(), Config::new_for_test()).await;
        let response = send_get(app, "/openapi.json").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
