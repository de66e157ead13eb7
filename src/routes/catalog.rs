//! Catalog endpoints
//!
//! - `GET /load_data`: featured listing
//! - `GET /recommend_data?<field>=<value>...`: three similar entries
//! - `GET /load_scroll?currentCount=N`: well-rated entries
//! - `GET /analysis?Rating=..&Installs=..&...&currentCount=N`: filtered lookup
//! - `GET /search_apps?appName=..&currentCount=N`: name search
//!
//! Successful responses are `{ "data": [...] }`.

use bson::Document;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::query::{row_to_json, CatalogQueryService, FilterRequest};
use crate::routes::{error_response, json_response};
use crate::types::Result;

#[derive(Serialize)]
struct DataResponse {
    data: Vec<serde_json::Value>,
}

fn respond(result: Result<Vec<Document>>) -> Response<Full<Bytes>> {
    match result {
        Ok(rows) => json_response(
            StatusCode::OK,
            &DataResponse {
                data: rows.into_iter().map(row_to_json).collect(),
            },
        ),
        Err(e) => error_response(&e),
    }
}

fn parse_query(query: Option<&str>) -> Result<FilterRequest> {
    FilterRequest::from_query(query.unwrap_or(""))
}

pub async fn load_data(
    service: &CatalogQueryService,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let request = match parse_query(query) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    respond(service.featured_request(&request).await)
}

pub async fn recommend_data(
    service: &CatalogQueryService,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let request = match parse_query(query) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    respond(service.recommend(&request).await)
}

pub async fn load_scroll(
    service: &CatalogQueryService,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let request = match parse_query(query) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    respond(service.scroll_request(&request).await)
}

pub async fn analysis(
    service: &CatalogQueryService,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let request = match parse_query(query) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    respond(service.analysis(&request).await)
}

pub async fn search_apps(
    service: &CatalogQueryService,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let request = match parse_query(query) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    respond(service.search_request(&request).await)
}
