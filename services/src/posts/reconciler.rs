//! Keeps a post's tag links in line with the labels a client sends.

use super::PostWithTags;
use crate::database::{PostInsert, PostUpdate, SqlStorage, TagRow};
use crate::error::ServiceError;
use crate::tags::TagResolver;
use crate::validation::{validate_content, validate_title};

/// Create, replace and clear paths for post↔tag links.
///
/// Labels are turned into tags through [`TagResolver`]; the post row and its
/// links are then written in a single storage transaction, so a failure never
/// leaves a post with half of its tags.
#[derive(Clone)]
pub struct AssociationReconciler<S> {
    storage: S,
    resolver: TagResolver<S>,
}

fn validate_post(title: &str, content: &str) -> Result<(), ServiceError> {
    validate_title(title)?;
    validate_content(content)
}

fn tag_ids(tags: &[TagRow]) -> Vec<i32> {
    tags.iter().map(|t| t.id).collect()
}

impl<S: SqlStorage> AssociationReconciler<S> {
    pub fn new(storage: S) -> Self {
        Self {
            resolver: TagResolver::new(storage.clone()),
            storage,
        }
    }

    /// Creates a post linked to the tags named by `labels`.
    pub async fn create(
        &self,
        title: String,
        content: String,
        labels: &[String],
    ) -> Result<PostWithTags, ServiceError> {
        validate_post(&title, &content)?;

        let tags = self.resolver.resolve_all(labels).await?;
        let post = self
            .storage
            .posts_insert(PostInsert {
                title,
                content,
                tag_ids: tag_ids(&tags),
            })
            .await?;

        tracing::info!(post_id = post.id, tags = tags.len(), "Created post");
        Ok(PostWithTags { post, tags })
    }

    /// Updates a post.
    ///
    /// `labels: None` leaves the links alone. `Some` replaces them with
    /// exactly the resolved set; an empty list clears every link.
    pub async fn update(
        &self,
        id: i32,
        title: String,
        content: String,
        labels: Option<&[String]>,
    ) -> Result<PostWithTags, ServiceError> {
        validate_post(&title, &content)?;

        // Check first so a missing post never creates tags as a side effect
        if self.storage.posts_get(id).await?.is_none() {
            return Err(ServiceError::post_not_found(id));
        }

        let desired = match labels {
            Some(labels) => Some(self.resolver.resolve_all(labels).await?),
            None => None,
        };

        let post = self
            .storage
            .posts_update(
                id,
                PostUpdate {
                    title,
                    content,
                    tag_ids: desired.as_deref().map(tag_ids),
                },
            )
            .await?
            .ok_or_else(|| ServiceError::post_not_found(id))?;

        let tags = match desired {
            Some(tags) => {
                tracing::info!(post_id = id, tags = tags.len(), "Replaced post tags");
                tags
            }
            None => self.current_tags(id).await?,
        };

        tracing::info!(post_id = id, "Updated post");
        Ok(PostWithTags { post, tags })
    }

    /// Clears the post's links, then deletes it.
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if !self.storage.posts_delete(id).await? {
            return Err(ServiceError::post_not_found(id));
        }

        tracing::info!(post_id = id, "Deleted post");
        Ok(())
    }

    async fn current_tags(&self, id: i32) -> Result<Vec<TagRow>, ServiceError> {
        let rows = self.storage.post_tags_tags_for_posts(&[id]).await?;
        Ok(rows
            .into_iter()
            .map(|row| TagRow {
                id: row.tag_id,
                label: row.label,
            })
            .collect())
    }
}
