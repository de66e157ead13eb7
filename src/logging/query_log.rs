//! Query event logging
//!
//! Every catalog lookup produces one [`QueryEvent`]. Events always go to
//! `tracing`; when a log path is configured they are also appended as JSONL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::types::AppshelfError;

/// How a query ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    Ok,
    InvalidFilter,
    QueryFailed,
}

/// One catalog lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEvent {
    pub timestamp: DateTime<Utc>,
    /// Instance that served the query
    pub node_id: String,
    /// Named query shape (featured, scroll, search, recommend, analysis)
    pub query: String,
    /// Stored fields referenced by the predicate
    #[serde(default)]
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub rows: Option<usize>,
    pub duration_ms: u64,
    pub outcome: QueryOutcome,
    /// Offending parameter when the filter was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_field: Option<String>,
}

impl QueryEvent {
    pub fn new(node_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id: node_id.into(),
            query: query.into(),
            fields: Vec::new(),
            limit: None,
            rows: None,
            duration_ms: 0,
            outcome: QueryOutcome::Ok,
            error_field: None,
        }
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Record a failure, classifying it from the error
    pub fn with_error(mut self, err: &AppshelfError) -> Self {
        self.outcome = match err {
            AppshelfError::InvalidFilterValue { .. } => QueryOutcome::InvalidFilter,
            _ => QueryOutcome::QueryFailed,
        };
        self.error_field = err.field().map(str::to_string);
        self
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Sink for query events
#[derive(Clone)]
pub struct QueryLogger {
    inner: Arc<Mutex<QueryLoggerInner>>,
    node_id: String,
}

struct QueryLoggerInner {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl QueryLogger {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueryLoggerInner {
                writer: None,
                path: None,
            })),
            node_id: node_id.into(),
        }
    }

    /// Also append events to the JSONL file at `path`
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut inner = self.inner.lock().await;
        inner.writer = Some(BufWriter::new(file));
        inner.path = Some(path.clone());

        info!("Query logging initialized to {}", path.display());
        Ok(())
    }

    /// Start an event stamped with this logger's node id
    pub fn event(&self, query: &str) -> QueryEvent {
        QueryEvent::new(self.node_id.clone(), query)
    }

    pub async fn log(&self, event: QueryEvent) {
        debug!(
            query = %event.query,
            fields = ?event.fields,
            limit = ?event.limit,
            rows = ?event.rows,
            duration_ms = event.duration_ms,
            outcome = ?event.outcome,
            "Catalog query"
        );

        let mut inner = self.inner.lock().await;
        let Some(writer) = inner.writer.as_mut() else {
            return;
        };

        let jsonl = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize query event: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(writer, "{}", jsonl) {
            error!("Failed to write query event: {}", e);
        }
        if let Err(e) = writer.flush() {
            error!("Failed to flush query log: {}", e);
        }
    }

    /// Path of the JSONL file, if file logging is on
    pub async fn path(&self) -> Option<PathBuf> {
        self.inner.lock().await.path.clone()
    }
}
