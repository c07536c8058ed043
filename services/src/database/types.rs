//! Row and input types shared by the `SqlStorage` implementations.

use sqlx::FromRow;

/// A row of the `posts` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PostRow {
    pub id: i32,
    pub title: String,
    pub content: String,
}

/// A row of the `tags` table. `label` is unique across all rows.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TagRow {
    pub id: i32,
    pub label: String,
}

/// A row of the `post_tags` join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRow)]
pub struct PostTagRow {
    pub post_id: i32,
    pub tag_id: i32,
}

/// A tag linked to a post, as returned by the batched association lookup.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PostTagLabelRow {
    pub post_id: i32,
    pub tag_id: i32,
    pub label: String,
}

/// A post linked to a tag, as returned by the batched association lookup.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TagPostRow {
    pub tag_id: i32,
    pub post_id: i32,
    pub title: String,
    pub content: String,
}

/// Offset pagination plus an optional substring filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub limit: i64,
    pub offset: i64,
    /// Raw search term. `None` means no filter.
    pub search: Option<String>,
}

impl ListParams {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.is_empty()).then_some(search);
        self
    }
}

/// Input for inserting a post together with its tag links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInsert {
    pub title: String,
    pub content: String,
    /// Already-resolved, de-duplicated tag ids.
    pub tag_ids: Vec<i32>,
}

/// Input for updating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    /// `Some` replaces the post's links with exactly this set; `None` keeps them.
    pub tag_ids: Option<Vec<i32>>,
}

/// Error type for SQL storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlStorageError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Db(String),
}

impl From<sqlx::Error> for SqlStorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::UniqueViolation(db.message().to_owned())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::ForeignKeyViolation(db.message().to_owned())
            }
            _ => Self::Db(err.to_string()),
        }
    }
}
