//! Tag service: explicit CRUD on tags plus the label resolver used by posts.

pub mod resolver;

pub use resolver::TagResolver;

use crate::database::{PostRow, SqlStorage, SqlStorageError, TagRow};
use crate::error::ServiceError;
use crate::pagination::Page;
use crate::validation::validate_label;
use std::collections::HashMap;

/// A tag together with the posts linked to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagWithPosts {
    pub tag: TagRow,
    pub posts: Vec<PostRow>,
}

#[derive(Clone)]
pub struct TagService<S> {
    storage: S,
}

fn duplicate_label(label: &str) -> impl FnOnce(SqlStorageError) -> ServiceError + '_ {
    move |err| match err {
        SqlStorageError::UniqueViolation(_) => {
            ServiceError::Conflict(format!("tag with label {label:?} already exists"))
        }
        other => other.into(),
    }
}

impl<S: SqlStorage> TagService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Creates a tag. Unlike [`TagResolver::resolve`], an existing label is
    /// an error.
    pub async fn create(&self, label: &str) -> Result<TagWithPosts, ServiceError> {
        validate_label(label)?;

        let tag = self
            .storage
            .tags_insert(label)
            .await
            .map_err(duplicate_label(label))?;

        tracing::info!(tag_id = tag.id, "Created tag");
        Ok(TagWithPosts {
            tag,
            posts: Vec::new(),
        })
    }

    pub async fn get(&self, id: i32) -> Result<TagWithPosts, ServiceError> {
        let tag = self
            .storage
            .tags_get(id)
            .await?
            .ok_or_else(|| ServiceError::tag_not_found(id))?;

        let mut tags = self.with_posts(vec![tag]).await?;
        tags.pop().ok_or_else(|| ServiceError::tag_not_found(id))
    }

    pub async fn list(&self, page: &Page) -> Result<Vec<TagWithPosts>, ServiceError> {
        let tags = self.storage.tags_list(page.to_list_params()).await?;
        self.with_posts(tags).await
    }

    /// Renames a tag. Its links are kept.
    pub async fn update(&self, id: i32, label: &str) -> Result<TagWithPosts, ServiceError> {
        validate_label(label)?;

        let tag = self
            .storage
            .tags_update_label(id, label)
            .await
            .map_err(duplicate_label(label))?
            .ok_or_else(|| ServiceError::tag_not_found(id))?;

        tracing::info!(tag_id = tag.id, "Updated tag");
        let mut tags = self.with_posts(vec![tag]).await?;
        tags.pop().ok_or_else(|| ServiceError::tag_not_found(id))
    }

    /// Removes the tag's links, then the tag itself.
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        if !self.storage.tags_delete(id).await? {
            return Err(ServiceError::tag_not_found(id));
        }

        tracing::info!(tag_id = id, "Deleted tag");
        Ok(())
    }

    async fn with_posts(&self, tags: Vec<TagRow>) -> Result<Vec<TagWithPosts>, ServiceError> {
        let ids: Vec<i32> = tags.iter().map(|t| t.id).collect();
        let mut posts_by_tag: HashMap<i32, Vec<PostRow>> = HashMap::new();
        for row in self.storage.post_tags_posts_for_tags(&ids).await? {
            posts_by_tag.entry(row.tag_id).or_default().push(PostRow {
                id: row.post_id,
                title: row.title,
                content: row.content,
            });
        }

        Ok(tags
            .into_iter()
            .map(|tag| TagWithPosts {
                posts: posts_by_tag.remove(&tag.id).unwrap_or_default(),
                tag,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MockSqlStorage, PostInsert};

    #[tokio::test]
    async fn test_create_duplicate_label_conflicts() {
        let service = TagService::new(MockSqlStorage::new());
        service.create("rust").await.unwrap();

        let err = service.create("rust").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg.contains("rust")));
    }

    #[tokio::test]
    async fn test_get_includes_linked_posts() {
        let storage = MockSqlStorage::new();
        let service = TagService::new(storage.clone());
        let tag = service.create("rust").await.unwrap().tag;
        let post = storage
            .posts_insert(PostInsert {
                title: "Ownership".to_owned(),
                content: "borrowck".to_owned(),
                tag_ids: vec![tag.id],
            })
            .await
            .unwrap();

        let found = service.get(tag.id).await.unwrap();
        assert_eq!(found.posts, vec![post]);
    }

    #[tokio::test]
    async fn test_get_missing_tag_is_not_found() {
        let service = TagService::new(MockSqlStorage::new());
        let err = service.get(404).await.unwrap_err();
        assert_eq!(err, ServiceError::tag_not_found(404));
    }

    #[tokio::test]
    async fn test_rename_to_taken_label_conflicts() {
        let service = TagService::new(MockSqlStorage::new());
        service.create("a").await.unwrap();
        let b = service.create("b").await.unwrap().tag;

        let err = service.update(b.id, "a").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let renamed = service.update(b.id, "c").await.unwrap();
        assert_eq!(renamed.tag.label, "c");
    }

    #[tokio::test]
    async fn test_update_missing_tag_is_not_found() {
        let service = TagService::new(MockSqlStorage::new());
        let err = service.update(3, "x").await.unwrap_err();
        assert_eq!(err, ServiceError::tag_not_found(3));
    }

    #[tokio::test]
    async fn test_delete_clears_links_and_reports_missing() {
        let storage = MockSqlStorage::new();
        let service = TagService::new(storage.clone());
        let tag = service.create("rust").await.unwrap().tag;
        storage
            .posts_insert(PostInsert {
                title: "t".to_owned(),
                content: "c".to_owned(),
                tag_ids: vec![tag.id],
            })
            .await
            .unwrap();

        service.delete(tag.id).await.unwrap();
        assert_eq!(storage.link_count(), 0);
        assert_eq!(storage.post_count(), 1);

        let err = service.delete(tag.id).await.unwrap_err();
        assert_eq!(err, ServiceError::tag_not_found(tag.id));
    }
}
