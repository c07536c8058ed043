//! In-memory `SqlStorage` for testing.

use super::traits::SqlStorage;
use super::types::{
    ListParams, PostInsert, PostRow, PostTagLabelRow, PostTagRow, PostUpdate, SqlStorageError,
    TagPostRow, TagRow,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// In-memory mock implementation of `SqlStorage`.
///
/// Enforces the same constraints as the Postgres schema (unique labels,
/// foreign keys, composite primary key on links) so the domain services can be
/// exercised without a database.
#[derive(Clone, Default)]
pub struct MockSqlStorage {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    disconnected: bool,
    failure: Option<String>,
    next_post_id: i32,
    next_tag_id: i32,
    posts: BTreeMap<i32, PostRow>,
    tags: BTreeMap<i32, TagRow>,
    links: BTreeSet<PostTagRow>,
    // label -> remaining lookups that behave as if another request deleted the row
    vanishing_labels: HashMap<String, u32>,
    // drop referenced tags right before post writes, as a concurrent delete would
    tags_deleted_before_write: bool,
}

impl Tables {
    fn check(&self) -> Result<(), SqlStorageError> {
        match &self.failure {
            Some(message) => Err(SqlStorageError::Db(message.clone())),
            None => Ok(()),
        }
    }

    fn insert_tag(&mut self, label: &str) -> TagRow {
        self.next_tag_id += 1;
        let tag = TagRow {
            id: self.next_tag_id,
            label: label.to_owned(),
        };
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    fn label_taken(&self, label: &str) -> bool {
        self.tags.values().any(|t| t.label == label)
    }

    fn drop_tags_if_racing(&mut self, tag_ids: &[i32]) {
        if !self.tags_deleted_before_write {
            return;
        }
        for tag_id in tag_ids {
            self.tags.remove(tag_id);
        }
        self.links.retain(|link| !tag_ids.contains(&link.tag_id));
    }

    fn link_all(&mut self, post_id: i32, tag_ids: &[i32]) -> Result<(), SqlStorageError> {
        if let Some(missing) = tag_ids.iter().find(|id| !self.tags.contains_key(*id)) {
            return Err(SqlStorageError::ForeignKeyViolation(format!(
                "tag {missing} does not exist"
            )));
        }
        for &tag_id in tag_ids {
            self.links.insert(PostTagRow { post_id, tag_id });
        }
        Ok(())
    }
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, params: &ListParams) -> Vec<T> {
    let offset = usize::try_from(params.offset).unwrap_or(0);
    let limit = usize::try_from(params.limit).unwrap_or(0);
    rows.skip(offset).take(limit).collect()
}

fn matches_search(haystack: &str, params: &ListParams) -> bool {
    params
        .search
        .as_deref()
        .is_none_or(|needle| haystack.contains(needle))
}

impl MockSqlStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage whose `is_connected` reports `false`.
    pub fn disconnected() -> Self {
        let storage = Self::default();
        storage.tables.write().expect("lock poisoned").disconnected = true;
        storage
    }

    /// Creates a storage where every operation fails with `SqlStorageError::Db`.
    pub fn failing(message: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.tables.write().expect("lock poisoned").failure = Some(message.into());
        storage
    }

    /// Makes the next `times` insert-if-absent/lookup pairs for `label` behave
    /// as if a concurrent request deleted the tag in between.
    pub fn with_vanishing_label(self, label: impl Into<String>, times: u32) -> Self {
        self.tables
            .write()
            .expect("lock poisoned")
            .vanishing_labels
            .insert(label.into(), times);
        self
    }

    /// Deletes every tag a post write refers to just before the write runs,
    /// so the write hits a foreign-key violation.
    pub fn with_tags_deleted_before_write(self) -> Self {
        self.tables
            .write()
            .expect("lock poisoned")
            .tags_deleted_before_write = true;
        self
    }

    pub fn post_count(&self) -> usize {
        self.tables.read().expect("lock poisoned").posts.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tables.read().expect("lock poisoned").tags.len()
    }

    pub fn link_count(&self) -> usize {
        self.tables.read().expect("lock poisoned").links.len()
    }
}

impl SqlStorage for MockSqlStorage {
    async fn is_connected(&self) -> bool {
        !self.tables.read().expect("lock poisoned").disconnected
    }

    async fn tags_insert(&self, label: &str) -> Result<TagRow, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        if tables.label_taken(label) {
            return Err(SqlStorageError::UniqueViolation(format!(
                "tag label {label:?} already exists"
            )));
        }
        Ok(tables.insert_tag(label))
    }

    async fn tags_insert_if_absent(&self, label: &str) -> Result<Option<TagRow>, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        if tables.vanishing_labels.get(label).is_some_and(|n| *n > 0) {
            return Ok(None);
        }
        if tables.label_taken(label) {
            return Ok(None);
        }
        Ok(Some(tables.insert_tag(label)))
    }

    async fn tags_get(&self, id: i32) -> Result<Option<TagRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;
        Ok(tables.tags.get(&id).cloned())
    }

    async fn tags_get_by_label(&self, label: &str) -> Result<Option<TagRow>, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        if let Some(remaining) = tables.vanishing_labels.get_mut(label) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(tables.tags.values().find(|t| t.label == label).cloned())
    }

    async fn tags_list(&self, params: ListParams) -> Result<Vec<TagRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;
        Ok(page(
            tables
                .tags
                .values()
                .filter(|t| matches_search(&t.label, &params))
                .cloned(),
            &params,
        ))
    }

    async fn tags_update_label(
        &self,
        id: i32,
        label: &str,
    ) -> Result<Option<TagRow>, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        if !tables.tags.contains_key(&id) {
            return Ok(None);
        }
        if tables.tags.values().any(|t| t.label == label && t.id != id) {
            return Err(SqlStorageError::UniqueViolation(format!(
                "tag label {label:?} already exists"
            )));
        }
        let tag = tables.tags.get_mut(&id).map(|tag| {
            tag.label = label.to_owned();
            tag.clone()
        });
        Ok(tag)
    }

    async fn tags_delete(&self, id: i32) -> Result<bool, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        tables.links.retain(|link| link.tag_id != id);
        Ok(tables.tags.remove(&id).is_some())
    }

    async fn posts_insert(&self, input: PostInsert) -> Result<PostRow, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;
        tables.drop_tags_if_racing(&input.tag_ids);

        // Validate links before touching anything so a failure leaves no trace
        if let Some(missing) = input.tag_ids.iter().find(|id| !tables.tags.contains_key(*id)) {
            return Err(SqlStorageError::ForeignKeyViolation(format!(
                "tag {missing} does not exist"
            )));
        }

        tables.next_post_id += 1;
        let post = PostRow {
            id: tables.next_post_id,
            title: input.title,
            content: input.content,
        };
        tables.posts.insert(post.id, post.clone());
        tables.link_all(post.id, &input.tag_ids)?;
        Ok(post)
    }

    async fn posts_get(&self, id: i32) -> Result<Option<PostRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn posts_list(&self, params: ListParams) -> Result<Vec<PostRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;
        Ok(page(
            tables
                .posts
                .values()
                .filter(|p| matches_search(&p.title, &params))
                .cloned(),
            &params,
        ))
    }

    async fn posts_update(
        &self,
        id: i32,
        changes: PostUpdate,
    ) -> Result<Option<PostRow>, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        if !tables.posts.contains_key(&id) {
            return Ok(None);
        }

        if let Some(tag_ids) = &changes.tag_ids {
            tables.drop_tags_if_racing(tag_ids);
            if let Some(missing) = tag_ids.iter().find(|t| !tables.tags.contains_key(*t)) {
                return Err(SqlStorageError::ForeignKeyViolation(format!(
                    "tag {missing} does not exist"
                )));
            }
            tables
                .links
                .retain(|link| link.post_id != id || tag_ids.contains(&link.tag_id));
            tables.link_all(id, tag_ids)?;
        }

        let post = tables.posts.get_mut(&id).map(|post| {
            post.title = changes.title;
            post.content = changes.content;
            post.clone()
        });
        Ok(post)
    }

    async fn posts_delete(&self, id: i32) -> Result<bool, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        tables.links.retain(|link| link.post_id != id);
        Ok(tables.posts.remove(&id).is_some())
    }

    async fn post_tags_list(&self, params: ListParams) -> Result<Vec<PostTagRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;

        let rows = tables.links.iter().copied().filter(|link| {
            let label = tables.tags.get(&link.tag_id).map(|t| t.label.as_str());
            let title = tables.posts.get(&link.post_id).map(|p| p.title.as_str());
            label.is_some_and(|l| matches_search(l, &params)) || title.is_some_and(|t| matches_search(t, &params))
        });
        Ok(page(rows, &params))
    }

    async fn post_tags_list_for_post(
        &self,
        post_id: i32,
    ) -> Result<Vec<PostTagRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;
        Ok(tables
            .links
            .iter()
            .filter(|link| link.post_id == post_id)
            .copied()
            .collect())
    }

    async fn post_tags_list_for_tag(&self, tag_id: i32) -> Result<Vec<PostTagRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;
        Ok(tables
            .links
            .iter()
            .filter(|link| link.tag_id == tag_id)
            .copied()
            .collect())
    }

    async fn post_tags_tags_for_posts(
        &self,
        post_ids: &[i32],
    ) -> Result<Vec<PostTagLabelRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;
        Ok(tables
            .links
            .iter()
            .filter(|link| post_ids.contains(&link.post_id))
            .filter_map(|link| {
                tables.tags.get(&link.tag_id).map(|tag| PostTagLabelRow {
                    post_id: link.post_id,
                    tag_id: tag.id,
                    label: tag.label.clone(),
                })
            })
            .collect())
    }

    async fn post_tags_posts_for_tags(
        &self,
        tag_ids: &[i32],
    ) -> Result<Vec<TagPostRow>, SqlStorageError> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.check()?;

        let mut rows: Vec<TagPostRow> = tables
            .links
            .iter()
            .filter(|link| tag_ids.contains(&link.tag_id))
            .filter_map(|link| {
                tables.posts.get(&link.post_id).map(|post| TagPostRow {
                    tag_id: link.tag_id,
                    post_id: post.id,
                    title: post.title.clone(),
                    content: post.content.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|row| (row.tag_id, row.post_id));
        Ok(rows)
    }

    async fn post_tags_delete_for_post(&self, post_id: i32) -> Result<u64, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        let before = tables.links.len();
        tables.links.retain(|link| link.post_id != post_id);
        Ok((before - tables.links.len()) as u64)
    }

    async fn post_tags_delete_for_tag(&self, tag_id: i32) -> Result<u64, SqlStorageError> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check()?;

        let before = tables.links.len();
        tables.links.retain(|link| link.tag_id != tag_id);
        Ok((before - tables.links.len()) as u64)
    }
}
