//! Database schemas for Appshelf
//!
//! Catalog entries are read as untyped documents; only credentials are typed.

mod credential;

pub use credential::{CredentialDoc, CREDENTIAL_COLLECTION};
