//! HTTP route handlers
//!
//! Handlers return `Response<Full<Bytes>>`; routing lives in `server::http`.

pub mod auth_routes;
pub mod catalog;
pub mod health;

pub use auth_routes::{login, register};
pub use catalog::{analysis, load_data, load_scroll, recommend_data, search_apps};
pub use health::{health_check, version_info};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::types::AppshelfError;

/// JSON response with permissive CORS
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_vec(body).unwrap_or_else(|e| {
        error!("Failed to serialize response body: {}", e);
        b"{}".to_vec()
    });

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// `{ "error", "code", "field"? }` with the error's status
pub fn error_response(err: &AppshelfError) -> Response<Full<Bytes>> {
    let mut body = serde_json::json!({
        "error": err.to_string(),
        "code": err.code(),
    });
    if let Some(field) = err.field() {
        body["field"] = serde_json::Value::from(field);
    }
    json_response(err.status_code(), &body)
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

pub fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found", "path": path }),
    )
}

pub fn method_not_allowed_response(method: &Method, path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({
            "error": "Method Not Allowed",
            "method": method.as_str(),
            "path": path,
        }),
    )
}
