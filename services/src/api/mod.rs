//! REST API mounted under `/api`.
//!
//! - `posts` - post CRUD; writes reconcile tag links
//! - `tags` - tag CRUD
//! - `post_tags` - listing and bulk removal of links
//! - `types` - envelopes, request bodies and response items

pub mod post_tags;
pub mod posts;
pub mod tags;
pub mod types;

use crate::database::SqlStorage;
use crate::error::ServiceError;
use crate::state::AppState;
use axum::{Json, Router, extract::rejection::JsonRejection, routing::get};

/// Unwraps a JSON body, turning any rejection into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::Validation(rejection.body_text()))
}

/// Creates the API router with all endpoints.
pub fn routes<S: SqlStorage>() -> Router<AppState<S>> {
    Router::new()
        // Posts
        .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
        .route(
            "/posts/{id}",
            get(posts::get::<S>)
                .put(posts::update::<S>)
                .delete(posts::delete::<S>),
        )
        // Tags
        .route("/tags", get(tags::list::<S>).post(tags::create::<S>))
        .route(
            "/tags/{id}",
            get(tags::get::<S>)
                .put(tags::update::<S>)
                .delete(tags::delete::<S>),
        )
        // Post-tag links
        .route("/postTags", get(post_tags::list::<S>))
        .route(
            "/postTags/post/{postId}",
            get(post_tags::list_for_post::<S>).delete(post_tags::delete_for_post::<S>),
        )
        .route(
            "/postTags/tag/{tagId}",
            get(post_tags::list_for_tag::<S>).delete(post_tags::delete_for_tag::<S>),
        )
}
