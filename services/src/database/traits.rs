//! SQL storage trait.

use super::types::{
    ListParams, PostInsert, PostRow, PostTagLabelRow, PostTagRow, PostUpdate, SqlStorageError,
    TagPostRow, TagRow,
};
use std::future::Future;

/// Persistence for posts, tags and the `post_tags` join table.
///
/// Every multi-statement mutation (`posts_insert`, `posts_update`,
/// `posts_delete`, `tags_delete`) is applied atomically by the implementation.
/// Lists are ordered by ascending id.
///
/// See [module documentation](super) for the available implementations.
pub trait SqlStorage: Clone + Send + Sync + 'static {
    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    // Tags

    /// Inserts a tag. A duplicate label fails with `UniqueViolation`.
    fn tags_insert(
        &self,
        label: &str,
    ) -> impl Future<Output = Result<TagRow, SqlStorageError>> + Send;

    /// Inserts a tag unless one with the same label exists.
    ///
    /// Returns `None` when the label was already taken; never fails on the
    /// uniqueness constraint.
    fn tags_insert_if_absent(
        &self,
        label: &str,
    ) -> impl Future<Output = Result<Option<TagRow>, SqlStorageError>> + Send;

    fn tags_get(
        &self,
        id: i32,
    ) -> impl Future<Output = Result<Option<TagRow>, SqlStorageError>> + Send;

    fn tags_get_by_label(
        &self,
        label: &str,
    ) -> impl Future<Output = Result<Option<TagRow>, SqlStorageError>> + Send;

    /// Lists tags, filtering on `label` when a search term is given.
    fn tags_list(
        &self,
        params: ListParams,
    ) -> impl Future<Output = Result<Vec<TagRow>, SqlStorageError>> + Send;

    fn tags_update_label(
        &self,
        id: i32,
        label: &str,
    ) -> impl Future<Output = Result<Option<TagRow>, SqlStorageError>> + Send;

    /// Removes the tag's links, then the tag. Returns `false` if it did not exist.
    fn tags_delete(&self, id: i32) -> impl Future<Output = Result<bool, SqlStorageError>> + Send;

    // Posts

    /// Inserts a post and links it to `tag_ids` in a single transaction.
    fn posts_insert(
        &self,
        input: PostInsert,
    ) -> impl Future<Output = Result<PostRow, SqlStorageError>> + Send;

    fn posts_get(
        &self,
        id: i32,
    ) -> impl Future<Output = Result<Option<PostRow>, SqlStorageError>> + Send;

    /// Lists posts, filtering on `title` when a search term is given.
    fn posts_list(
        &self,
        params: ListParams,
    ) -> impl Future<Output = Result<Vec<PostRow>, SqlStorageError>> + Send;

    /// Updates a post and, when `changes.tag_ids` is set, replaces its links.
    /// Returns `None` if the post does not exist.
    fn posts_update(
        &self,
        id: i32,
        changes: PostUpdate,
    ) -> impl Future<Output = Result<Option<PostRow>, SqlStorageError>> + Send;

    /// Removes the post's links, then the post. Returns `false` if it did not exist.
    fn posts_delete(&self, id: i32)
    -> impl Future<Output = Result<bool, SqlStorageError>> + Send;

    // Post-tag links

    /// Lists links, filtering on tag label or post title when a search term is given.
    fn post_tags_list(
        &self,
        params: ListParams,
    ) -> impl Future<Output = Result<Vec<PostTagRow>, SqlStorageError>> + Send;

    fn post_tags_list_for_post(
        &self,
        post_id: i32,
    ) -> impl Future<Output = Result<Vec<PostTagRow>, SqlStorageError>> + Send;

    fn post_tags_list_for_tag(
        &self,
        tag_id: i32,
    ) -> impl Future<Output = Result<Vec<PostTagRow>, SqlStorageError>> + Send;

    /// Tags linked to any of `post_ids`, ordered by post id then tag id.
    fn post_tags_tags_for_posts(
        &self,
        post_ids: &[i32],
    ) -> impl Future<Output = Result<Vec<PostTagLabelRow>, SqlStorageError>> + Send;

    /// Posts linked to any of `tag_ids`, ordered by tag id then post id.
    fn post_tags_posts_for_tags(
        &self,
        tag_ids: &[i32],
    ) -> impl Future<Output = Result<Vec<TagPostRow>, SqlStorageError>> + Send;

    /// Returns the number of removed links.
    fn post_tags_delete_for_post(
        &self,
        post_id: i32,
    ) -> impl Future<Output = Result<u64, SqlStorageError>> + Send;

    /// Returns the number of removed links.
    fn post_tags_delete_for_tag(
        &self,
        tag_id: i32,
    ) -> impl Future<Output = Result<u64, SqlStorageError>> + Send;
}
