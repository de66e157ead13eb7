//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Ctrl-C stops the accept
//! loop and then closes the MongoDB handle.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::CredentialService;
use crate::config::Args;
use crate::db::MongoClient;
use crate::query::CatalogQueryService;
use crate::routes;
use crate::types::{AppshelfError, Result};

/// Paths served by this gateway, used to tell 405 from 404
const KNOWN_PATHS: &[&str] = &[
    "/health",
    "/version",
    "/register",
    "/login",
    "/load_data",
    "/recommend_data",
    "/load_scroll",
    "/analysis",
    "/search_apps",
];

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Present unless running on in-memory stores
    pub mongo: Option<MongoClient>,
    pub catalog: CatalogQueryService,
    pub credentials: CredentialService,
}

impl AppState {
    pub fn new(
        args: Args,
        mongo: Option<MongoClient>,
        catalog: CatalogQueryService,
        credentials: CredentialService,
    ) -> Self {
        Self {
            args,
            mongo,
            catalog,
            credentials,
        }
    }
}

/// Serve until Ctrl-C, then release the store handle
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Appshelf listening on {} as node {} (catalog: {})",
        state.args.listen,
        state.args.node_id,
        state.catalog.store().backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - in-memory stores allowed");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    if let Some(mongo) = &state.mongo {
        mongo.close().await;
    }
    info!("Appshelf stopped");
    Ok(())
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    info!("[{}] {} {}", addr, parts.method, path);

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = if parts.method == Method::POST {
        match read_body(body, state.args.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(routes::error_response(&e)),
        }
    } else {
        Bytes::new()
    };

    Ok(dispatch(
        &state,
        &parts.method,
        &path,
        parts.uri.query(),
        content_type.as_deref(),
        body,
    )
    .await)
}

/// Collect a request body, refusing more than `limit` bytes
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                AppshelfError::PayloadTooLarge(limit)
            } else {
                AppshelfError::Http(format!("Failed to read body: {}", e))
            }
        })
}

/// Route a request whose body has already been read
pub async fn dispatch(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    content_type: Option<&str>,
    body: Bytes,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::OPTIONS, _) => routes::preflight_response(),

        (&Method::GET, "/health") => routes::health_check(state),
        (&Method::GET, "/version") => routes::version_info(),

        (&Method::POST, "/register") => {
            routes::register(&state.credentials, content_type, &body).await
        }
        (&Method::POST, "/login") => routes::login(&state.credentials, content_type, &body).await,

        (&Method::GET, "/load_data") => routes::load_data(&state.catalog, query).await,
        (&Method::GET, "/recommend_data") => routes::recommend_data(&state.catalog, query).await,
        (&Method::GET, "/load_scroll") => routes::load_scroll(&state.catalog, query).await,
        (&Method::GET, "/analysis") => routes::analysis(&state.catalog, query).await,
        (&Method::GET, "/search_apps") => routes::search_apps(&state.catalog, query).await,

        (_, p) if KNOWN_PATHS.contains(&p) => routes::method_not_allowed_response(method, p),
        _ => routes::not_found_response(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;

    #[tokio::test]
    async fn test_body_within_limit() {
        let body = Full::new(Bytes::from_static(b"{\"eid\":1}"));
        let bytes = read_body(body, 64).await.unwrap();
        assert_eq!(&bytes[..], b"{\"eid\":1}");
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let body = Full::new(Bytes::from(vec![b'x'; 100]));
        let err = read_body(body, 10).await.unwrap_err();

        assert!(matches!(err, AppshelfError::PayloadTooLarge(10)));
        let response = routes::error_response(&err);
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
