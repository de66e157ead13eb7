//! User credentials for Appshelf
//!
//! Provides:
//! - Password hashing with Argon2
//! - Credential stores (MongoDB and in-memory)
//! - The register and login flows

pub mod credentials;
pub mod password;

pub use credentials::{
    CredentialService, CredentialStore, LoginOutcome, MemoryCredentialStore, MongoCredentialStore,
    RegisterOutcome,
};
pub use password::{hash_password, verify_password};
