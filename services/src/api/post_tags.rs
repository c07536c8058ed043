//! `/api/postTags` handlers.

use super::types::{ErrorResponse, ListResponse, PostTagItem, UnlinkResponse, WebResponse, parse_id};
use crate::database::{PostTagRow, SqlStorage};
use crate::error::ServiceError;
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};

fn into_items(rows: Vec<PostTagRow>) -> Vec<PostTagItem> {
    rows.into_iter().map(PostTagItem::from).collect()
}

/// List links. `searchBy` matches the tag label or the post title.
#[utoipa::path(
    get,
    path = "/api/postTags",
    tag = "post-tags",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of links", body = WebResponse<ListResponse<PostTagItem>>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn list<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<WebResponse<ListResponse<PostTagItem>>>, ServiceError> {
    let page = Page::from(query);
    tracing::info!(page_no = page.page_no, page_size = page.page_size, "List post tags");

    let rows = state.post_tags.list(&page).await?;
    Ok(Json(WebResponse::ok(ListResponse::new(
        into_items(rows),
        &page,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/postTags/post/{postId}",
    tag = "post-tags",
    params(("postId" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "Links of the post", body = WebResponse<Vec<PostTagItem>>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
    )
)]
pub async fn list_for_post<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(post_id): Path<String>,
) -> Result<Json<WebResponse<Vec<PostTagItem>>>, ServiceError> {
    let post_id = parse_id(&post_id, "post id")?;
    tracing::info!(post_id, "List tags of post");

    let rows = state.post_tags.list_for_post(post_id).await?;
    Ok(Json(WebResponse::ok(into_items(rows))))
}

#[utoipa::path(
    get,
    path = "/api/postTags/tag/{tagId}",
    tag = "post-tags",
    params(("tagId" = i32, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Links of the tag", body = WebResponse<Vec<PostTagItem>>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse),
    )
)]
pub async fn list_for_tag<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(tag_id): Path<String>,
) -> Result<Json<WebResponse<Vec<PostTagItem>>>, ServiceError> {
    let tag_id = parse_id(&tag_id, "tag id")?;
    tracing::info!(tag_id, "List posts of tag");

    let rows = state.post_tags.list_for_tag(tag_id).await?;
    Ok(Json(WebResponse::ok(into_items(rows))))
}

/// Unlink every tag from a post.
#[utoipa::path(
    delete,
    path = "/api/postTags/post/{postId}",
    tag = "post-tags",
    params(("postId" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "Links removed", body = WebResponse<UnlinkResponse>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
    )
)]
pub async fn delete_for_post<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(post_id): Path<String>,
) -> Result<Json<WebResponse<UnlinkResponse>>, ServiceError> {
    let post_id = parse_id(&post_id, "post id")?;
    tracing::info!(post_id, "Clear tags of post");

    let removed = state.post_tags.delete_for_post(post_id).await?;
    Ok(Json(WebResponse::ok(UnlinkResponse {
        message: format!("removed {removed} tag link(s) from post {post_id}"),
        removed,
    })))
}

/// Unlink every post from a tag.
#[utoipa::path(
    delete,
    path = "/api/postTags/tag/{tagId}",
    tag = "post-tags",
    params(("tagId" = i32, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Links removed", body = WebResponse<UnlinkResponse>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse),
    )
)]
pub async fn delete_for_tag<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(tag_id): Path<String>,
) -> Result<Json<WebResponse<UnlinkResponse>>, ServiceError> {
    let tag_id = parse_id(&tag_id, "tag id")?;
    tracing::info!(tag_id, "Clear posts of tag");

    let removed = state.post_tags.delete_for_tag(tag_id).await?;
    Ok(Json(WebResponse::ok(UnlinkResponse {
        message: format!("removed {removed} post link(s) from tag {tag_id}"),
        removed,
    })))
}
