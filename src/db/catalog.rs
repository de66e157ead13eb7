//! MongoDB-backed catalog store

use bson::Document;
use futures_util::TryStreamExt;
use mongodb::Collection;
use tracing::debug;

use crate::db::mongo::MongoClient;
use crate::query::{CatalogStore, Predicate, Projection, ResultLimit};
use crate::types::{AppshelfError, Result};

/// Reads catalog entries from one MongoDB collection
#[derive(Clone)]
pub struct MongoCatalogStore {
    collection: Collection<Document>,
}

impl MongoCatalogStore {
    pub fn new(client: &MongoClient, collection: &str) -> Self {
        Self {
            collection: client.documents(collection),
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for MongoCatalogStore {
    async fn find(
        &self,
        predicate: &Predicate,
        projection: Projection,
        limit: ResultLimit,
    ) -> Result<Vec<Document>> {
        let filter = predicate.to_document();
        debug!(collection = %self.collection.name(), %filter, %limit, "find");

        let cursor = self
            .collection
            .find(filter)
            .projection(projection.to_document())
            .limit(limit.as_i64())
            .await
            .map_err(|e| AppshelfError::QueryFailed(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppshelfError::QueryFailed(e.to_string()))
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
