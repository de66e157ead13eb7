//! Appshelf - app-store catalog gateway
//!
//! Usage:
//!   appshelf --listen 0.0.0.0:3000 --mongodb-uri mongodb://localhost:27017
//!
//! Environment variables:
//!   LISTEN, MONGODB_URI, MONGODB_DB, APPS_COLLECTION, USERS_COLLECTION,
//!   DEV_MODE, LOG_LEVEL, DEFAULT_LIMIT, MAX_LIMIT, UNKNOWN_FIELDS, QUERY_LOG

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appshelf::{
    auth::{CredentialService, CredentialStore, MemoryCredentialStore, MongoCredentialStore},
    config::Args,
    db::{MongoCatalogStore, MongoClient},
    logging::QueryLogger,
    query::{CatalogQueryService, CatalogStore, MemoryCatalogStore, PredicateBuilder},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("appshelf={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Appshelf - app catalog gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db {})", args.mongodb_uri, args.mongodb_db);
    info!(
        "Limits: default {}, max {}",
        args.default_limit, args.max_limit
    );
    info!("Unknown filter fields: {:?}", args.unknown_fields);
    info!("======================================");

    let mongo = match MongoClient::connect(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory stores): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let catalog_store: Arc<dyn CatalogStore>;
    let credential_store: Arc<dyn CredentialStore>;
    match &mongo {
        Some(client) => {
            if let Some(path) = &args.seed_catalog {
                warn!("Ignoring seed catalog {} (MongoDB connected)", path.display());
            }
            catalog_store = Arc::new(MongoCatalogStore::new(client, &args.apps_collection));
            credential_store =
                Arc::new(MongoCredentialStore::open(client, &args.users_collection).await?);
        }
        None => {
            let seed = args.seed_documents()?;
            info!("Seeded in-memory catalog with {} entries", seed.len());
            catalog_store = Arc::new(MemoryCatalogStore::with_entries(seed));
            credential_store = Arc::new(MemoryCredentialStore::new());
        }
    }

    let logger = QueryLogger::new(args.node_id.to_string());
    if let Some(path) = &args.query_log {
        if let Err(e) = logger.init_file(path.clone()).await {
            warn!("Query log disabled, cannot open {}: {}", path.display(), e);
        }
    }

    let catalog = CatalogQueryService::new(
        catalog_store,
        PredicateBuilder::new(args.unknown_fields.into()),
        args.pagination(),
        logger,
    );
    let credentials = CredentialService::new(credential_store);

    let state = Arc::new(AppState::new(args, mongo, catalog, credentials));
    server::run(state).await?;

    Ok(())
}
