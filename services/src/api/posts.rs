//! `/api/posts` handlers.

use super::json_body;
use super::types::{
    DeleteResponse, ErrorResponse, ListResponse, PostItem, PostRequest, WebResponse, parse_id,
};
use crate::database::SqlStorage;
use crate::error::ServiceError;
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};

/// List posts with their tags.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of posts", body = WebResponse<ListResponse<PostItem>>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn list<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<WebResponse<ListResponse<PostItem>>>, ServiceError> {
    let page = Page::from(query);
    tracing::info!(page_no = page.page_no, page_size = page.page_size, "List posts");

    let posts = state.posts.list(&page).await?;
    let items = posts.into_iter().map(PostItem::from).collect();
    Ok(Json(WebResponse::ok(ListResponse::new(items, &page))))
}

/// Get a post by id.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = WebResponse<PostItem>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
    )
)]
pub async fn get<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<WebResponse<PostItem>>, ServiceError> {
    let id = parse_id(&id, "post id")?;
    tracing::info!(post_id = id, "Get post");

    let post = state.posts.get(id).await?;
    Ok(Json(WebResponse::ok(PostItem::from(post))))
}

/// Create a post, creating any tags that do not exist yet.
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post created", body = WebResponse<PostItem>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Tag conflict", body = ErrorResponse),
    )
)]
pub async fn create<S: SqlStorage>(
    State(state): State<AppState<S>>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WebResponse<PostItem>>), ServiceError> {
    let request = json_body(payload)?;
    tracing::info!("Create post");

    let post = state.posts.create(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(WebResponse::new(StatusCode::CREATED, PostItem::from(post))),
    ))
}

/// Update a post.
///
/// `tags` replaces the post's tags when present; `[]` removes them all and an
/// absent or `null` value keeps them.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i32, Path, description = "Post id")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post updated", body = WebResponse<PostItem>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 409, description = "Tag conflict", body = ErrorResponse),
    )
)]
pub async fn update<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<Json<WebResponse<PostItem>>, ServiceError> {
    let id = parse_id(&id, "post id")?;
    let request = json_body(payload)?;
    tracing::info!(post_id = id, "Update post");

    let post = state.posts.update(id, request.into()).await?;
    Ok(Json(WebResponse::ok(PostItem::from(post))))
}

/// Delete a post and its tag links. Tags themselves are kept.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = WebResponse<DeleteResponse>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
    )
)]
pub async fn delete<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<WebResponse<DeleteResponse>>, ServiceError> {
    let id = parse_id(&id, "post id")?;
    tracing::info!(post_id = id, "Delete post");

    state.posts.delete(id).await?;
    Ok(Json(WebResponse::ok(DeleteResponse { id, deleted: true })))
}
