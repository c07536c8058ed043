//! `/api/tags` handlers.

use super::json_body;
use super::types::{
    DeleteResponse, ErrorResponse, ListResponse, TagItem, TagRequest, WebResponse, parse_id,
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

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of tags", body = WebResponse<ListResponse<TagItem>>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn list<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<WebResponse<ListResponse<TagItem>>>, ServiceError> {
    let page = Page::from(query);
    tracing::info!(page_no = page.page_no, page_size = page.page_size, "List tags");

    let tags = state.tags.list(&page).await?;
    let items = tags.into_iter().map(TagItem::from).collect();
    Ok(Json(WebResponse::ok(ListResponse::new(items, &page))))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    tag = "tags",
    params(("id" = i32, Path, description = "Tag id")),
    responses(
        (status = 200, description = "The tag with its posts", body = WebResponse<TagItem>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse),
    )
)]
pub async fn get<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<WebResponse<TagItem>>, ServiceError> {
    let id = parse_id(&id, "tag id")?;
    tracing::info!(tag_id = id, "Get tag");

    let tag = state.tags.get(id).await?;
    Ok(Json(WebResponse::ok(TagItem::from(tag))))
}

/// Create a tag. Fails with 409 when the label is taken.
#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "tags",
    request_body = TagRequest,
    responses(
        (status = 201, description = "Tag created", body = WebResponse<TagItem>),
        (status = 400, description = "Invalid label", body = ErrorResponse),
        (status = 409, description = "Label already exists", body = ErrorResponse),
    )
)]
pub async fn create<S: SqlStorage>(
    State(state): State<AppState<S>>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WebResponse<TagItem>>), ServiceError> {
    let request = json_body(payload)?;
    tracing::info!("Create tag");

    let tag = state.tags.create(&request.label).await?;
    Ok((
        StatusCode::CREATED,
        Json(WebResponse::new(StatusCode::CREATED, TagItem::from(tag))),
    ))
}

/// Rename a tag.
#[utoipa::path(
    put,
    path = "/api/tags/{id}",
    tag = "tags",
    params(("id" = i32, Path, description = "Tag id")),
    request_body = TagRequest,
    responses(
        (status = 200, description = "Tag updated", body = WebResponse<TagItem>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse),
        (status = 409, description = "Label already exists", body = ErrorResponse),
    )
)]
pub async fn update<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> Result<Json<WebResponse<TagItem>>, ServiceError> {
    let id = parse_id(&id, "tag id")?;
    let request = json_body(payload)?;
    tracing::info!(tag_id = id, "Update tag");

    let tag = state.tags.update(id, &request.label).await?;
    Ok(Json(WebResponse::ok(TagItem::from(tag))))
}

/// Delete a tag and unlink it from every post.
#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    tag = "tags",
    params(("id" = i32, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag deleted", body = WebResponse<DeleteResponse>),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse),
    )
)]
pub async fn delete<S: SqlStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<WebResponse<DeleteResponse>>, ServiceError> {
    let id = parse_id(&id, "tag id")?;
    tracing::info!(tag_id = id, "Delete tag");

    state.tags.delete(id).await?;
    Ok(Json(WebResponse::ok(DeleteResponse { id, deleted: true })))
}
