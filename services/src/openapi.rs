//! OpenAPI documentation module.
//!
//! Serves the generated document at `/openapi.json` and a Scalar UI at
//! `/docs`. Both are off in production unless `ENABLE_DOCS` is set.

use axum::{Router, routing::get};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::{post_tags, posts, tags, types};
use crate::config::Config;
use crate::database::SqlStorage;
use crate::state::AppState;

/// OpenAPI documentation structure.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog API",
        version = "1.0.0",
        description = "Posts, tags and the links between them",
        license(
            name = "MIT",
            identifier = "MIT"
        )
    ),
    tags(
        (name = "posts", description = "Post management; writes reconcile tag links"),
        (name = "tags", description = "Tag management endpoints"),
        (name = "post-tags", description = "Post-tag link endpoints"),
    ),
    paths(
        // Posts
        posts::list,
        posts::get,
        posts::create,
        posts::update,
        posts::delete,
        // Tags
        tags::list,
        tags::get,
        tags::create,
        tags::update,
        tags::delete,
        // Post tags
        post_tags::list,
        post_tags::list_for_post,
        post_tags::list_for_tag,
        post_tags::delete_for_post,
        post_tags::delete_for_tag,
    ),
    components(
        schemas(
            types::ErrorResponse,
            types::PostRequest,
            types::PostItem,
            types::TagSummary,
            types::TagRequest,
            types::TagItem,
            types::PostSummary,
            types::PostTagItem,
            types::DeleteResponse,
            types::UnlinkResponse,
        ),
    ),
)]
pub struct ApiDoc;

/// Create OpenAPI documentation routes if enabled for the environment.
///
/// Returns `Some(Router)` with `/docs` and `/openapi.json` routes if docs are
/// enabled, otherwise returns `None`.
pub fn create_openapi_routes<S: SqlStorage>(config: &Config) -> Option<Router<AppState<S>>> {
    if !config.docs_enabled() {
        return None;
    }

    let api = ApiDoc::openapi();
    let api_clone = api.clone();

    let routes = Router::new()
        .route(
            "/openapi.json",
            get(move || async move { axum::Json(api_clone) }),
        )
        .merge(Scalar::with_url("/docs", api));

    Some(routes)
}
