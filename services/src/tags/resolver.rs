//! Find-or-create of tags by label.

use crate::database::{SqlStorage, TagRow};
use crate::error::ServiceError;
use crate::validation::validate_label;
use std::collections::HashSet;

/// Upsert-then-fetch attempts before giving up on a label.
const MAX_ATTEMPTS: usize = 2;

/// Maps labels to tags, creating the ones that do not exist yet.
///
/// Never creates two tags with the same label: the insert relies on the
/// unique constraint (`ON CONFLICT DO NOTHING`) and falls back to a lookup,
/// so concurrent resolvers of the same label converge on one row.
#[derive(Clone)]
pub struct TagResolver<S> {
    storage: S,
}

impl<S: SqlStorage> TagResolver<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the tag labelled `label`, creating it if absent.
    pub async fn resolve(&self, label: &str) -> Result<TagRow, ServiceError> {
        validate_label(label)?;
        self.resolve_validated(label).await
    }

    /// Resolves every label in order and drops duplicates, keeping the first
    /// occurrence. All labels are validated before anything is created.
    pub async fn resolve_all(&self, labels: &[String]) -> Result<Vec<TagRow>, ServiceError> {
        for label in labels {
            validate_label(label)?;
        }

        let mut seen_labels = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut tags = Vec::with_capacity(labels.len());
        for label in labels {
            if !seen_labels.insert(label.as_str()) {
                continue;
            }
            let tag = self.resolve_validated(label).await?;
            if seen_ids.insert(tag.id) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    async fn resolve_validated(&self, label: &str) -> Result<TagRow, ServiceError> {
        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(tag) = self.storage.tags_insert_if_absent(label).await? {
                tracing::info!(tag_id = tag.id, label, "Created tag");
                return Ok(tag);
            }
            if let Some(tag) = self.storage.tags_get_by_label(label).await? {
                return Ok(tag);
            }
            // The label existed at insert time but was gone by the lookup
            tracing::warn!(label, attempt, "Tag deleted while resolving");
        }

        Err(ServiceError::Conflict(format!(
            "tag with label {label:?} was modified concurrently"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MockSqlStorage;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[tokio::test]
    async fn test_resolve_creates_once() {
        let storage = MockSqlStorage::new();
        let resolver = TagResolver::new(storage.clone());

        let first = resolver.resolve("rust").await.unwrap();
        let second = resolver.resolve("rust").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.tag_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_finds_existing_tag() {
        let storage = MockSqlStorage::new();
        let existing = storage.tags_insert("go").await.unwrap();

        let resolved = TagResolver::new(storage.clone()).resolve("go").await.unwrap();
        assert_eq!(resolved.id, existing.id);
    }

    #[tokio::test]
    async fn test_resolve_is_case_sensitive() {
        let storage = MockSqlStorage::new();
        let resolver = TagResolver::new(storage.clone());

        let lower = resolver.resolve("rust").await.unwrap();
        let upper = resolver.resolve("Rust").await.unwrap();
        assert_ne!(lower.id, upper.id);
    }

    #[tokio::test]
    async fn test_resolve_all_dedupes_in_order() {
        let storage = MockSqlStorage::new();
        let resolver = TagResolver::new(storage.clone());

        let tags = resolver
            .resolve_all(&labels(&["a", "a", "b"]))
            .await
            .unwrap();

        let resolved: Vec<&str> = tags.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(resolved, vec!["a", "b"]);
        assert_eq!(storage.tag_count(), 2);
    }

    #[tokio::test]
    async fn test_resolve_all_validates_before_creating() {
        let storage = MockSqlStorage::new();
        let resolver = TagResolver::new(storage.clone());

        let err = resolver
            .resolve_all(&labels(&["ok", "  "]))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(storage.tag_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_retries_after_concurrent_delete() {
        let storage = MockSqlStorage::new().with_vanishing_label("flaky", 1);
        let resolver = TagResolver::new(storage.clone());

        let tag = resolver.resolve("flaky").await.unwrap();
        assert_eq!(tag.label, "flaky");
        assert_eq!(storage.tag_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_gives_up_with_conflict() {
        let storage = MockSqlStorage::new().with_vanishing_label("gone", 2);
        let resolver = TagResolver::new(storage.clone());

        let err = resolver.resolve("gone").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(storage.tag_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_propagates_storage_errors() {
        let resolver = TagResolver::new(MockSqlStorage::failing("connection reset"));

        let err = resolver.resolve("rust").await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
