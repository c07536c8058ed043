//! PostgreSQL implementation of `SqlStorage`.

use super::traits::SqlStorage;
use super::types::{
    ListParams, PostInsert, PostRow, PostTagLabelRow, PostTagRow, PostUpdate, SqlStorageError,
    TagPostRow, TagRow,
};
use sqlx::PgPool;

/// `SqlStorage` backed by a sqlx Postgres pool.
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds a `LIKE` pattern matching `term` as a literal substring.
///
/// The pattern is used with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl SqlStorage for PgStorage {
    async fn is_connected(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn tags_insert(&self, label: &str) -> Result<TagRow, SqlStorageError> {
        let tag = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (label)
            VALUES ($1)
            RETURNING id, label
            "#,
        )
        .bind(label)
        .fetch_one(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn tags_insert_if_absent(&self, label: &str) -> Result<Option<TagRow>, SqlStorageError> {
        let tag = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (label)
            VALUES ($1)
            ON CONFLICT (label) DO NOTHING
            RETURNING id, label
            "#,
        )
        .bind(label)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn tags_get(&self, id: i32) -> Result<Option<TagRow>, SqlStorageError> {
        let tag = sqlx::query_as::<_, TagRow>("SELECT id, label FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    async fn tags_get_by_label(&self, label: &str) -> Result<Option<TagRow>, SqlStorageError> {
        let tag = sqlx::query_as::<_, TagRow>("SELECT id, label FROM tags WHERE label = $1")
            .bind(label)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    async fn tags_list(&self, params: ListParams) -> Result<Vec<TagRow>, SqlStorageError> {
        let pattern = params.search.as_deref().map(like_pattern);
        let tags = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, label
            FROM tags
            WHERE ($1::text IS NULL OR label LIKE $1 ESCAPE '\')
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn tags_update_label(
        &self,
        id: i32,
        label: &str,
    ) -> Result<Option<TagRow>, SqlStorageError> {
        let tag = sqlx::query_as::<_, TagRow>(
            r#"
            UPDATE tags
            SET label = $2
            WHERE id = $1
            RETURNING id, label
            "#,
        )
        .bind(id)
        .bind(label)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn tags_delete(&self, id: i32) -> Result<bool, SqlStorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM post_tags WHERE tag_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn posts_insert(&self, input: PostInsert) -> Result<PostRow, SqlStorageError> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (title, content)
            VALUES ($1, $2)
            RETURNING id, title, content
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .fetch_one(&mut *tx)
        .await?;

        if !input.tag_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO post_tags (post_id, tag_id)
                SELECT $1::int4, UNNEST($2::int4[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(post.id)
            .bind(&input.tag_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(post)
    }

    async fn posts_get(&self, id: i32) -> Result<Option<PostRow>, SqlStorageError> {
        let post =
            sqlx::query_as::<_, PostRow>("SELECT id, title, content FROM posts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(post)
    }

    async fn posts_list(&self, params: ListParams) -> Result<Vec<PostRow>, SqlStorageError> {
        let pattern = params.search.as_deref().map(like_pattern);
        let posts = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content
            FROM posts
            WHERE ($1::text IS NULL OR title LIKE $1 ESCAPE '\')
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn posts_update(
        &self,
        id: i32,
        changes: PostUpdate,
    ) -> Result<Option<PostRow>, SqlStorageError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET title = $2, content = $3
            WHERE id = $1
            RETURNING id, title, content
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.content)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(post) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(tag_ids) = &changes.tag_ids {
            // Drop links outside the target set, then add the missing ones
            sqlx::query(
                r#"
                DELETE FROM post_tags
                WHERE post_id = $1 AND NOT (tag_id = ANY($2::int4[]))
                "#,
            )
            .bind(post.id)
            .bind(tag_ids)
            .execute(&mut *tx)
            .await?;

            if !tag_ids.is_empty() {
                sqlx::query(
                    r#"
                    INSERT INTO post_tags (post_id, tag_id)
                    SELECT $1::int4, UNNEST($2::int4[])
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(post.id)
                .bind(tag_ids)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(Some(post))
    }

    async fn posts_delete(&self, id: i32) -> Result<bool, SqlStorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn post_tags_list(&self, params: ListParams) -> Result<Vec<PostTagRow>, SqlStorageError> {
        let pattern = params.search.as_deref().map(like_pattern);
        let rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT pt.post_id, pt.tag_id
            FROM post_tags pt
            INNER JOIN posts p ON p.id = pt.post_id
            INNER JOIN tags t ON t.id = pt.tag_id
            WHERE ($1::text IS NULL
                OR t.label LIKE $1 ESCAPE '\'
                OR p.title LIKE $1 ESCAPE '\')
            ORDER BY pt.post_id ASC, pt.tag_id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn post_tags_list_for_post(
        &self,
        post_id: i32,
    ) -> Result<Vec<PostTagRow>, SqlStorageError> {
        let rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT post_id, tag_id
            FROM post_tags
            WHERE post_id = $1
            ORDER BY tag_id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn post_tags_list_for_tag(&self, tag_id: i32) -> Result<Vec<PostTagRow>, SqlStorageError> {
        let rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT post_id, tag_id
            FROM post_tags
            WHERE tag_id = $1
            ORDER BY post_id ASC
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn post_tags_tags_for_posts(
        &self,
        post_ids: &[i32],
    ) -> Result<Vec<PostTagLabelRow>, SqlStorageError> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query_as::<_, PostTagLabelRow>(
            r#"
            SELECT pt.post_id, t.id AS tag_id, t.label
            FROM post_tags pt
            INNER JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1::int4[])
            ORDER BY pt.post_id ASC, t.id ASC
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn post_tags_posts_for_tags(
        &self,
        tag_ids: &[i32],
    ) -> Result<Vec<TagPostRow>, SqlStorageError> {
        if tag_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query_as::<_, TagPostRow>(
            r#"
            SELECT pt.tag_id, p.id AS post_id, p.title, p.content
            FROM post_tags pt
            INNER JOIN posts p ON p.id = pt.post_id
            WHERE pt.tag_id = ANY($1::int4[])
            ORDER BY pt.tag_id ASC, p.id ASC
            "#,
        )
        .bind(tag_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn post_tags_delete_for_post(&self, post_id: i32) -> Result<u64, SqlStorageError> {
        let result = sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn post_tags_delete_for_tag(&self, tag_id: i32) -> Result<u64, SqlStorageError> {
        let result = sqlx::query("DELETE FROM post_tags WHERE tag_id = $1")
            .bind(tag_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::run_migrations;
    use crate::pagination::Page;
    use crate::posts::{PostDraft, PostService, PostWithTags};
    use crate::tags::TagResolver;
    use sqlx::postgres::PgPoolOptions;
    use std::env;
    use tokio::sync::{Mutex, MutexGuard};

    // The database tests share one schema, so they take turns
    static DB_LOCK: Mutex<()> = Mutex::const_new(());

    struct TestSetup {
        storage: PgStorage,
        _guard: MutexGuard<'static, ()>,
    }

    /// Connects to `DATABASE_URL`, migrates, and empties every table.
    /// Returns `None` when no database is configured.
    async fn setup() -> Option<TestSetup> {
        let Ok(database_url) = env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres test");
            return None;
        };
        let guard = DB_LOCK.lock().await;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to create pool.");
        run_migrations(&pool).await.unwrap();

        sqlx::query("TRUNCATE post_tags, posts, tags RESTART IDENTITY")
            .execute(&pool)
            .await
            .unwrap();

        Some(TestSetup {
            storage: PgStorage::new(pool),
            _guard: guard,
        })
    }

    fn draft(title: &str, tags: Option<&[&str]>) -> PostDraft {
        PostDraft {
            title: title.to_owned(),
            content: "content".to_owned(),
            tags: tags.map(|t| t.iter().map(|l| (*l).to_owned()).collect()),
        }
    }

    fn label_set(post: &PostWithTags) -> Vec<&str> {
        let mut out: Vec<&str> = post.tags.iter().map(|t| t.label.as_str()).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn like_pattern_wraps_term() {
        assert_eq!(like_pattern("rust"), "%rust%");
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%"), r"%100\%%");
        assert_eq!(like_pattern("snake_case"), r"%snake\_case%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[tokio::test]
    async fn test_create_with_repeated_labels() {
        let Some(ts) = setup().await else { return };
        let posts = PostService::new(ts.storage.clone());

        let post = posts
            .create(draft("dupes", Some(&["a", "a", "b"])))
            .await
            .unwrap();
        assert_eq!(label_set(&post), vec!["a", "b"]);

        let fetched = posts.get(post.post.id).await.unwrap();
        assert_eq!(label_set(&fetched), vec!["a", "b"]);
        let tags = ts.storage.tags_list(ListParams::new(100, 0)).await.unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_and_clears_links() {
        let Some(ts) = setup().await else { return };
        let posts = PostService::new(ts.storage.clone());
        let id = posts
            .create(draft("swap", Some(&["a", "b"])))
            .await
            .unwrap()
            .post
            .id;

        let updated = posts.update(id, draft("swap", Some(&["b", "c"]))).await.unwrap();
        assert_eq!(label_set(&updated), vec!["b", "c"]);
        assert_eq!(label_set(&posts.get(id).await.unwrap()), vec!["b", "c"]);

        // Omitted tags keep the links
        let renamed = posts.update(id, draft("renamed", None)).await.unwrap();
        assert_eq!(renamed.post.title, "renamed");
        assert_eq!(label_set(&posts.get(id).await.unwrap()), vec!["b", "c"]);

        let cleared = posts.update(id, draft("cleared", Some(&[]))).await.unwrap();
        assert!(cleared.tags.is_empty());
        assert!(posts.get(id).await.unwrap().tags.is_empty());
        let links = ts.storage.post_tags_list_for_post(id).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_delete_keeps_tags() {
        let Some(ts) = setup().await else { return };
        let posts = PostService::new(ts.storage.clone());
        let id = posts
            .create(draft("bye", Some(&["a", "b"])))
            .await
            .unwrap()
            .post
            .id;

        posts.delete(id).await.unwrap();

        assert!(ts.storage.posts_get(id).await.unwrap().is_none());
        let tags = ts.storage.tags_list(ListParams::new(100, 0)).await.unwrap();
        assert_eq!(tags.len(), 2);
        let links = ts
            .storage
            .post_tags_list(ListParams::new(100, 0))
            .await
            .unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_resolve_creates_one_tag() {
        let Some(ts) = setup().await else { return };
        let resolver = TagResolver::new(ts.storage.clone());

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve("race").await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let tags = ts.storage.tags_list(ListParams::new(100, 0)).await.unwrap();
        assert_eq!(tags.len(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let Some(ts) = setup().await else { return };
        let posts = PostService::new(ts.storage.clone());
        for title in ["100% real", "1000 words", "plain"] {
            posts.create(draft(title, None)).await.unwrap();
        }

        let found = posts
            .list(&Page::new(1, 10).with_search("100%"))
            .await
            .unwrap();
        let titles: Vec<&str> = found.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, vec!["100% real"]);
    }

    #[tokio::test]
    async fn test_second_page_in_id_order() {
        let Some(ts) = setup().await else { return };
        let posts = PostService::new(ts.storage.clone());
        for i in 1..=25 {
            posts
                .create(draft(&format!("post {i}"), None))
                .await
                .unwrap();
        }

        let page = posts.list(&Page::new(2, 10)).await.unwrap();
        let ids: Vec<i32> = page.iter().map(|p| p.post.id).collect();
        assert_eq!(ids, (11..=20).collect::<Vec<i32>>());
    }
}
