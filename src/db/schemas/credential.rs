//! Credential document schema
//!
//! One record per registered user, keyed by the external numeric id (`eid`).

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Default collection name for credentials
pub const CREDENTIAL_COLLECTION: &str = "users";

/// Credential document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CredentialDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Display name given at registration
    pub name: String,

    /// External identifier used to log in
    pub eid: i64,

    /// Argon2 password hash (PHC string)
    pub password_hash: String,

    pub created_at: DateTime,
}

impl CredentialDoc {
    pub fn new(name: impl Into<String>, eid: i64, password_hash: String) -> Self {
        Self {
            _id: None,
            name: name.into(),
            eid,
            password_hash,
            created_at: DateTime::now(),
        }
    }
}

impl IntoIndexes for CredentialDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "eid": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("eid_unique".to_string())
                    .build(),
            ),
        )]
    }
}
