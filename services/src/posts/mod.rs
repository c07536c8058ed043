//! Post service.
//!
//! Reads go straight to storage; every write that touches tag links goes
//! through [`AssociationReconciler`].

pub mod reconciler;

pub use reconciler::AssociationReconciler;

use crate::database::{PostRow, SqlStorage, TagRow};
use crate::error::ServiceError;
use crate::pagination::Page;
use std::collections::HashMap;

/// A post together with the tags linked to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithTags {
    pub post: PostRow,
    pub tags: Vec<TagRow>,
}

/// Input for creating or updating a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    /// On update, `None` keeps the current links.
    pub tags: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct PostService<S> {
    storage: S,
    reconciler: AssociationReconciler<S>,
}

impl<S: SqlStorage> PostService<S> {
    pub fn new(storage: S) -> Self {
        Self {
            reconciler: AssociationReconciler::new(storage.clone()),
            storage,
        }
    }

    pub async fn create(&self, draft: PostDraft) -> Result<PostWithTags, ServiceError> {
        let labels = draft.tags.unwrap_or_default();
        self.reconciler
            .create(draft.title, draft.content, &labels)
            .await
    }

    pub async fn get(&self, id: i32) -> Result<PostWithTags, ServiceError> {
        let post = self
            .storage
            .posts_get(id)
            .await?
            .ok_or_else(|| ServiceError::post_not_found(id))?;

        let mut posts = self.with_tags(vec![post]).await?;
        posts.pop().ok_or_else(|| ServiceError::post_not_found(id))
    }

    pub async fn list(&self, page: &Page) -> Result<Vec<PostWithTags>, ServiceError> {
        let posts = self.storage.posts_list(page.to_list_params()).await?;
        self.with_tags(posts).await
    }

    pub async fn update(&self, id: i32, draft: PostDraft) -> Result<PostWithTags, ServiceError> {
        self.reconciler
            .update(id, draft.title, draft.content, draft.tags.as_deref())
            .await
    }

    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.reconciler.delete(id).await
    }

    /// Loads the tags of every post with one query.
    async fn with_tags(&self, posts: Vec<PostRow>) -> Result<Vec<PostWithTags>, ServiceError> {
        let ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
        let mut tags_by_post: HashMap<i32, Vec<TagRow>> = HashMap::new();
        for row in self.storage.post_tags_tags_for_posts(&ids).await? {
            tags_by_post.entry(row.post_id).or_default().push(TagRow {
                id: row.tag_id,
                label: row.label,
            });
        }

        Ok(posts
            .into_iter()
            .map(|post| PostWithTags {
                tags: tags_by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MockSqlStorage;

    fn draft(title: &str, tags: Option<&[&str]>) -> PostDraft {
        PostDraft {
            title: title.to_owned(),
            content: format!("content of {title}"),
            tags: tags.map(|t| t.iter().map(|l| (*l).to_owned()).collect()),
        }
    }

    #[tokio::test]
    async fn test_list_second_page_in_stored_order() {
        let service = PostService::new(MockSqlStorage::new());
        for i in 1..=25 {
            service
                .create(draft(&format!("post {i}"), None))
                .await
                .unwrap();
        }

        let page = service.list(&Page::new(2, 10)).await.unwrap();
        let ids: Vec<i32> = page.iter().map(|p| p.post.id).collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_list_filters_by_title() {
        let service = PostService::new(MockSqlStorage::new());
        service.create(draft("Rust ownership", None)).await.unwrap();
        service.create(draft("Go channels", None)).await.unwrap();
        service.create(draft("rust lowercase", None)).await.unwrap();

        let found = service
            .list(&Page::default().with_search("Rust"))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].post.title, "Rust ownership");
    }

    #[tokio::test]
    async fn test_get_loads_tags() {
        let service = PostService::new(MockSqlStorage::new());
        let created = service
            .create(draft("tagged", Some(&["a", "b"])))
            .await
            .unwrap();

        let found = service.get(created.post.id).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_get_missing_post_is_not_found() {
        let service = PostService::new(MockSqlStorage::new());
        assert_eq!(
            service.get(1).await.unwrap_err(),
            ServiceError::post_not_found(1)
        );
    }

    #[tokio::test]
    async fn test_update_missing_post_is_not_found() {
        let service = PostService::new(MockSqlStorage::new());
        let err = service.update(5, draft("t", Some(&[]))).await.unwrap_err();
        assert_eq!(err, ServiceError::post_not_found(5));
    }
}
