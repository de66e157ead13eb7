//! Credential storage and the register/login flows
//!
//! Registration reports an already-used `eid` as [`RegisterOutcome::Exists`]
//! rather than an error. Login distinguishes an unknown `eid` from a wrong
//! password, which is what the web client displays.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::password::{hash_password, verify_password};
use crate::db::mongo::{is_duplicate_key, MongoClient, MongoCollection};
use crate::db::schemas::CredentialDoc;
use crate::types::{AppshelfError, Result};
use bson::doc;

/// Persistence for credential records
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a new record; an existing `eid` yields `DuplicateCredential`
    async fn insert(&self, credential: CredentialDoc) -> Result<()>;

    async fn find_by_eid(&self, eid: i64) -> Result<Option<CredentialDoc>>;
}

/// In-process credential store for dev mode and tests
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    by_eid: Arc<DashMap<i64, CredentialDoc>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_eid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_eid.is_empty()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, credential: CredentialDoc) -> Result<()> {
        match self.by_eid.entry(credential.eid) {
            Entry::Occupied(_) => Err(AppshelfError::DuplicateCredential(credential.eid)),
            Entry::Vacant(slot) => {
                slot.insert(credential);
                Ok(())
            }
        }
    }

    async fn find_by_eid(&self, eid: i64) -> Result<Option<CredentialDoc>> {
        Ok(self.by_eid.get(&eid).map(|entry| entry.value().clone()))
    }
}

/// Credentials in a MongoDB collection with a unique `eid` index
#[derive(Clone)]
pub struct MongoCredentialStore {
    collection: MongoCollection<CredentialDoc>,
}

impl MongoCredentialStore {
    /// Open the collection, creating the unique index if needed
    pub async fn open(client: &MongoClient, collection: &str) -> Result<Self> {
        Ok(Self {
            collection: client.collection(collection).await?,
        })
    }
}

#[async_trait::async_trait]
impl CredentialStore for MongoCredentialStore {
    async fn insert(&self, credential: CredentialDoc) -> Result<()> {
        let eid = credential.eid;
        self.collection
            .insert_one(&credential)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppshelfError::DuplicateCredential(eid)
                } else {
                    AppshelfError::Database(format!("Insert failed: {}", e))
                }
            })
    }

    async fn find_by_eid(&self, eid: i64) -> Result<Option<CredentialDoc>> {
        self.collection.find_one(doc! { "eid": eid }).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created,
    Exists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    UnknownEid,
    WrongPassword,
}

/// Register and login on top of a [`CredentialStore`]
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, name: &str, eid: i64, password: &str) -> Result<RegisterOutcome> {
        // Cheap pre-check; the store's uniqueness guarantee still decides races
        if self.store.find_by_eid(eid).await?.is_some() {
            debug!(eid, "Registration for existing eid");
            return Ok(RegisterOutcome::Exists);
        }

        let credential = CredentialDoc::new(name, eid, hash_password(password)?);
        match self.store.insert(credential).await {
            Ok(()) => {
                info!(eid, "Registered user");
                Ok(RegisterOutcome::Created)
            }
            Err(AppshelfError::DuplicateCredential(_)) => Ok(RegisterOutcome::Exists),
            Err(e) => Err(e),
        }
    }

    pub async fn login(&self, eid: i64, password: &str) -> Result<LoginOutcome> {
        let Some(credential) = self.store.find_by_eid(eid).await? else {
            debug!(eid, "Login for unknown eid");
            return Ok(LoginOutcome::UnknownEid);
        };

        if verify_password(password, &credential.password_hash)? {
            Ok(LoginOutcome::Authenticated)
        } else {
            debug!(eid, "Login with wrong password");
            Ok(LoginOutcome::WrongPassword)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (CredentialService, MemoryCredentialStore) {
        let store = MemoryCredentialStore::new();
        (CredentialService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_memory_store_rejects_duplicate_eid() {
        let store = MemoryCredentialStore::new();
        store
            .insert(CredentialDoc::new("a", 7, "h".into()))
            .await
            .unwrap();
        let err = store
            .insert(CredentialDoc::new("b", 7, "h".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppshelfError::DuplicateCredential(7)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_register_then_exists() {
        let (service, store) = service();
        assert_eq!(
            service.register("ana", 1001, "pw").await.unwrap(),
            RegisterOutcome::Created
        );
        assert_eq!(
            service.register("someone else", 1001, "other").await.unwrap(),
            RegisterOutcome::Exists
        );

        let stored = store.find_by_eid(1001).await.unwrap().unwrap();
        assert_eq!(stored.name, "ana");
        assert_ne!(stored.password_hash, "pw");
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let (service, _) = service();
        service.register("ana", 1001, "pw").await.unwrap();

        assert_eq!(
            service.login(1001, "pw").await.unwrap(),
            LoginOutcome::Authenticated
        );
        assert_eq!(
            service.login(1001, "nope").await.unwrap(),
            LoginOutcome::WrongPassword
        );
        assert_eq!(
            service.login(2002, "pw").await.unwrap(),
            LoginOutcome::UnknownEid
        );
    }
}
