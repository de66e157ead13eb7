//! Appshelf - app-store catalog gateway
//!
//! Translates loosely-typed HTTP filter parameters into typed, bounded
//! catalog lookups against MongoDB, plus a small credential service.
//!
//! ## Modules
//!
//! - **query**: value parsers, predicate builder, pagination, query service
//! - **db**: MongoDB client, catalog store, credential schema
//! - **auth**: password hashing and register/login
//! - **routes** / **server**: the hyper HTTP surface
//! - **logging**: structured per-query events

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod query;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AppshelfError, Result};
