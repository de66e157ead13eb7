//! Catalog store abstraction
//!
//! The query service only ever issues one kind of read: predicate, projection
//! and limit. [`MemoryCatalogStore`] evaluates that read in process for dev
//! mode and tests; the MongoDB implementation lives in `db::catalog`.

use bson::Document;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::query::pagination::ResultLimit;
use crate::query::predicate::Predicate;
use crate::query::projection::Projection;
use crate::types::Result;

/// A read-only document store holding catalog entries
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Return up to `limit` projected rows matching `predicate`, in store order
    async fn find(
        &self,
        predicate: &Predicate,
        projection: Projection,
        limit: ResultLimit,
    ) -> Result<Vec<Document>>;

    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;
}

/// In-memory catalog, insertion order is store order
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    entries: Arc<RwLock<Vec<Document>>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<Document>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Append entries to the catalog
    pub async fn extend(&self, entries: impl IntoIterator<Item = Document>) {
        self.entries.write().await.extend(entries);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find(
        &self,
        predicate: &Predicate,
        projection: Projection,
        limit: ResultLimit,
    ) -> Result<Vec<Document>> {
        let matcher = predicate.matcher()?;
        let entries = self.entries.read().await;

        Ok(entries
            .iter()
            .filter(|entry| matcher.matches(entry))
            .take(limit.as_usize())
            .map(|entry| projection.apply(entry))
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::Condition;
    use bson::doc;

    fn catalog() -> MemoryCatalogStore {
        MemoryCatalogStore::with_entries(vec![
            doc! { "appName": "A", "Rating": "4.5", "Category": "Tools", "Price": "0" },
            doc! { "appName": "B", "Rating": "3.9", "Category": "Tools" },
            doc! { "appName": "C", "Rating": "4.1", "Category": "Games" },
            doc! { "appName": "D", "Rating": "4.9", "Category": "Tools" },
        ])
    }

    #[tokio::test]
    async fn test_find_filters_projects_and_limits() {
        let store = catalog();
        let predicate = Predicate::new()
            .and(Condition::greater_than("Rating", "4.0"))
            .and(Condition::text("Category", "Tools"));

        let rows = store
            .find(&predicate, Projection::Summary, ResultLimit::fixed(10))
            .await
            .unwrap();
        assert_eq!(rows, vec![doc! { "appName": "A" }, doc! { "appName": "D" }]);

        let rows = store
            .find(&predicate, Projection::Summary, ResultLimit::fixed(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_extend() {
        let store = MemoryCatalogStore::new();
        assert!(store.is_empty().await);
        store.extend(vec![doc! { "appName": "X" }]).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.backend(), "memory");
    }
}
