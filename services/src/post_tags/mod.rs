//! Direct access to the post↔tag join rows.

use crate::database::{PostTagRow, SqlStorage};
use crate::error::ServiceError;
use crate::pagination::Page;

#[derive(Clone)]
pub struct PostTagService<S> {
    storage: S,
}

impl<S: SqlStorage> PostTagService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Lists links; the search term matches the tag label or the post title.
    pub async fn list(&self, page: &Page) -> Result<Vec<PostTagRow>, ServiceError> {
        Ok(self.storage.post_tags_list(page.to_list_params()).await?)
    }

    pub async fn list_for_post(&self, post_id: i32) -> Result<Vec<PostTagRow>, ServiceError> {
        self.require_post(post_id).await?;
        Ok(self.storage.post_tags_list_for_post(post_id).await?)
    }

    pub async fn list_for_tag(&self, tag_id: i32) -> Result<Vec<PostTagRow>, ServiceError> {
        self.require_tag(tag_id).await?;
        Ok(self.storage.post_tags_list_for_tag(tag_id).await?)
    }

    /// Unlinks every tag from the post. Returns the number of removed links.
    pub async fn delete_for_post(&self, post_id: i32) -> Result<u64, ServiceError> {
        self.require_post(post_id).await?;
        let removed = self.storage.post_tags_delete_for_post(post_id).await?;
        tracing::info!(post_id, removed, "Cleared post tags");
        Ok(removed)
    }

    /// Unlinks every post from the tag. Returns the number of removed links.
    pub async fn delete_for_tag(&self, tag_id: i32) -> Result<u64, ServiceError> {
        self.require_tag(tag_id).await?;
        let removed = self.storage.post_tags_delete_for_tag(tag_id).await?;
        tracing::info!(tag_id, removed, "Cleared tag posts");
        Ok(removed)
    }

    async fn require_post(&self, id: i32) -> Result<(), ServiceError> {
        match self.storage.posts_get(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::post_not_found(id)),
        }
    }

    async fn require_tag(&self, id: i32) -> Result<(), ServiceError> {
        match self.storage.tags_get(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::tag_not_found(id)),
        }
    }
}
