//! Database layer
//!
//! - `mongo`: client handle, typed collections, index application
//! - `catalog`: the MongoDB [`CatalogStore`](crate::query::CatalogStore)
//! - `schemas`: typed documents

pub mod catalog;
pub mod mongo;
pub mod schemas;

pub use catalog::MongoCatalogStore;
pub use mongo::{is_duplicate_key, IntoIndexes, MongoClient, MongoCollection};
pub use schemas::{CredentialDoc, CREDENTIAL_COLLECTION};
