//! Error types for Appshelf

use hyper::StatusCode;

/// Main error type for Appshelf operations
#[derive(Debug, thiserror::Error)]
pub enum AppshelfError {
    /// A filter parameter was malformed or is not on the allow-list
    #[error("Invalid value for filter '{field}': {raw:?}")]
    InvalidFilterValue { field: String, raw: String },

    /// The catalog store was unavailable or rejected the lookup
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Registration with an external identifier that is already taken
    #[error("Credential already exists for eid {0}")]
    DuplicateCredential(i64),

    /// Request body exceeded the configured cap (bytes)
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl AppshelfError {
    /// Shorthand for a rejected filter parameter
    pub fn invalid_filter(field: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::InvalidFilterValue {
            field: field.into(),
            raw: raw.into(),
        }
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidFilterValue { .. } => StatusCode::BAD_REQUEST,
            Self::QueryFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DuplicateCredential(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code for JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::DuplicateCredential(_) => "DUPLICATE_CREDENTIAL",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DB_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Http(_) => "HTTP_ERROR",
        }
    }

    /// The offending filter field, when the error is a filter rejection
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidFilterValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppshelfError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppshelfError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for AppshelfError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for AppshelfError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for Appshelf operations
pub type Result<T> = std::result::Result<T, AppshelfError>;
