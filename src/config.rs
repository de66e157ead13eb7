//! Configuration for Appshelf
//!
//! CLI arguments and environment variable handling using clap.

use bson::Document;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

use crate::query::{PaginationResolver, UnknownFieldPolicy};
use crate::types::{AppshelfError, Result as AppshelfResult};

/// Appshelf - app-store catalog gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "appshelf")]
#[command(about = "Filtered, bounded lookups over an app-store catalog")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "appDB")]
    pub mongodb_db: String,

    /// Collection holding catalog entries
    #[arg(long, env = "APPS_COLLECTION", default_value = "apps")]
    pub apps_collection: String,

    /// Collection holding registered credentials
    #[arg(long, env = "USERS_COLLECTION", default_value = crate::db::CREDENTIAL_COLLECTION)]
    pub users_collection: String,

    /// Enable development mode (in-memory stores when MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Result count used when the client sends none (or garbage)
    #[arg(long, env = "DEFAULT_LIMIT", default_value = "10")]
    pub default_limit: u32,

    /// Hard ceiling on client-requested result counts
    #[arg(long, env = "MAX_LIMIT", default_value = "1000")]
    pub max_limit: u32,

    /// What to do with filter parameters that are not on the allow-list
    #[arg(long, env = "UNKNOWN_FIELDS", value_enum, default_value_t = UnknownFields::Reject)]
    pub unknown_fields: UnknownFields,

    /// Append query events as JSONL to this file
    #[arg(long, env = "QUERY_LOG")]
    pub query_log: Option<PathBuf>,

    /// Maximum accepted JSON/form body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "10240")]
    pub max_body_bytes: usize,

    /// JSON array of catalog entries loaded into the in-memory store (dev mode)
    #[arg(long, env = "SEED_CATALOG")]
    pub seed_catalog: Option<PathBuf>,
}

/// CLI-facing mirror of [`UnknownFieldPolicy`]
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFields {
    Reject,
    Ignore,
}

impl From<UnknownFields> for UnknownFieldPolicy {
    fn from(value: UnknownFields) -> Self {
        match value {
            UnknownFields::Reject => UnknownFieldPolicy::Reject,
            UnknownFields::Ignore => UnknownFieldPolicy::Ignore,
        }
    }
}

impl Args {
    /// Build the pagination resolver for the configured default and ceiling
    pub fn pagination(&self) -> PaginationResolver {
        PaginationResolver::new(self.default_limit, self.max_limit)
    }

    /// Catalog entries from `--seed-catalog`, empty when unset
    ///
    /// The file must hold a JSON array of objects.
    pub fn seed_documents(&self) -> AppshelfResult<Vec<Document>> {
        let Some(path) = &self.seed_catalog else {
            return Ok(Vec::new());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppshelfError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(|e| {
            AppshelfError::Config(format!("{} is not a JSON array: {}", path.display(), e))
        })?;

        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                bson::to_document(entry).map_err(|e| {
                    AppshelfError::Config(format!("{} entry {}: {}", path.display(), i, e))
                })
            })
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_limit == 0 {
            return Err("DEFAULT_LIMIT must be at least 1".to_string());
        }

        if self.max_limit == 0 {
            return Err("MAX_LIMIT must be at least 1".to_string());
        }

        if self.default_limit > self.max_limit {
            return Err("DEFAULT_LIMIT must be less than or equal to MAX_LIMIT".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be at least 1".to_string());
        }

        Ok(())
    }
}
