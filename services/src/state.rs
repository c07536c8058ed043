//! Shared application state handed to every handler.

use crate::database::SqlStorage;
use crate::post_tags::PostTagService;
use crate::posts::PostService;
use crate::tags::TagService;

/// Application state with one handle per service.
///
/// All services share the same storage; cloning is cheap when the storage is
/// (a pool handle or an `Arc`).
#[derive(Clone)]
pub struct AppState<S> {
    pub sql_storage: S,
    pub posts: PostService<S>,
    pub tags: TagService<S>,
    pub post_tags: PostTagService<S>,
}

impl<S: SqlStorage> AppState<S> {
    /// Creates a new `AppState` backed by the given storage.
    pub fn new(sql_storage: S) -> Self {
        Self {
            posts: PostService::new(sql_storage.clone()),
            tags: TagService::new(sql_storage.clone()),
            post_tags: PostTagService::new(sql_storage.clone()),
            sql_storage,
        }
    }
}
