//! Request and response types for the `/api` endpoints.

use crate::database::PostTagRow;
use crate::error::ServiceError;
use crate::pagination::Page;
use crate::posts::{PostDraft, PostWithTags};
use crate::tags::TagWithPosts;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

/// Envelope wrapping every successful response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebResponse<T> {
    /// Mirrors the HTTP status code.
    pub code: u16,
    /// Always `"success"`.
    pub status: String,
    pub data: T,
}

impl<T> WebResponse<T> {
    pub fn new(code: StatusCode, data: T) -> Self {
        Self {
            code: code.as_u16(),
            status: STATUS_SUCCESS.to_owned(),
            data,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }
}

/// Envelope wrapping every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    /// Always `"error"`.
    pub status: String,
    /// Human-readable message.
    pub data: String,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            status: STATUS_ERROR.to_owned(),
            data: message.into(),
        }
    }
}

/// One page of results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    /// Number of items on this page.
    pub total: usize,
    pub page_no: u32,
    pub page_size: u32,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, page: &Page) -> Self {
        Self {
            total: items.len(),
            items,
            page_no: page.page_no,
            page_size: page.page_size,
        }
    }
}

// =============================================================================
// Posts
// =============================================================================

/// Body of `POST /api/posts` and `PUT /api/posts/{id}`.
///
/// Missing `title`/`content` are read as empty strings and rejected by
/// validation. On update, a missing or `null` `tags` keeps the current links
/// and `[]` removes them all.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl From<PostRequest> for PostDraft {
    fn from(req: PostRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            tags: req.tags,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagSummary {
    pub id: i32,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostItem {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub tags: Vec<TagSummary>,
}

impl From<PostWithTags> for PostItem {
    fn from(value: PostWithTags) -> Self {
        Self {
            id: value.post.id,
            title: value.post.title,
            content: value.post.content,
            tags: value
                .tags
                .into_iter()
                .map(|t| TagSummary {
                    id: t.id,
                    label: t.label,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Body of `POST /api/tags` and `PUT /api/tags/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TagRequest {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostSummary {
    pub id: i32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagItem {
    pub id: i32,
    pub label: String,
    pub posts: Vec<PostSummary>,
}

impl From<TagWithPosts> for TagItem {
    fn from(value: TagWithPosts) -> Self {
        Self {
            id: value.tag.id,
            label: value.tag.label,
            posts: value
                .posts
                .into_iter()
                .map(|p| PostSummary {
                    id: p.id,
                    title: p.title,
                    content: p.content,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Links
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostTagItem {
    pub post_id: i32,
    pub tag_id: i32,
}

impl From<PostTagRow> for PostTagItem {
    fn from(row: PostTagRow) -> Self {
        Self {
            post_id: row.post_id,
            tag_id: row.tag_id,
        }
    }
}

/// Result of deleting a post or tag.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub id: i32,
    pub deleted: bool,
}

/// Result of clearing links in bulk.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnlinkResponse {
    pub message: String,
    pub removed: u64,
}

/// Parses a path segment into an id, rejecting anything that is not an integer.
pub fn parse_id(raw: &str, name: &str) -> Result<i32, ServiceError> {
    raw.parse::<i32>()
        .map_err(|_| ServiceError::Validation(format!("invalid {name}: {raw:?}")))
}
