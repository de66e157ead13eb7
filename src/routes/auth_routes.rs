//! Registration and login endpoints
//!
//! - `POST /register` with `name`, `eid`, `password`
//! - `POST /login` with `eid`, `password`
//!
//! Bodies may be JSON or `application/x-www-form-urlencoded`; `eid` may be a
//! number or a numeric string.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{CredentialService, LoginOutcome, RegisterOutcome};
use crate::routes::{error_response, json_response};
use crate::types::{AppshelfError, Result};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EidValue {
    Number(i64),
    Text(String),
}

impl EidValue {
    fn into_eid(self) -> Result<i64> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| AppshelfError::BadRequest(format!("eid must be an integer, got {s:?}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    eid: EidValue,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    eid: EidValue,
    password: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    msg: &'static str,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    auth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<&'static str>,
}

// =============================================================================
// Helpers
// =============================================================================

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn parse_body<T: for<'de> Deserialize<'de>>(content_type: Option<&str>, body: &[u8]) -> Result<T> {
    if is_form(content_type) {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| AppshelfError::BadRequest(format!("Invalid form body: {}", e)))
    } else {
        serde_json::from_slice(body)
            .map_err(|e| AppshelfError::BadRequest(format!("Invalid JSON: {}", e)))
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

pub async fn register(
    service: &CredentialService,
    content_type: Option<&str>,
    body: &Bytes,
) -> Response<Full<Bytes>> {
    let outcome = async {
        let req: RegisterRequest = parse_body(content_type, body)?;
        let eid = req.eid.into_eid()?;
        service.register(&req.name, eid, &req.password).await
    }
    .await;

    match outcome {
        Ok(RegisterOutcome::Created) => {
            json_response(StatusCode::OK, &RegisterResponse { msg: "created" })
        }
        Ok(RegisterOutcome::Exists) => {
            json_response(StatusCode::OK, &RegisterResponse { msg: "exists" })
        }
        Err(e) => {
            warn!("Registration failed: {}", e);
            error_response(&e)
        }
    }
}

pub async fn login(
    service: &CredentialService,
    content_type: Option<&str>,
    body: &Bytes,
) -> Response<Full<Bytes>> {
    let outcome = async {
        let req: LoginRequest = parse_body(content_type, body)?;
        let eid = req.eid.into_eid()?;
        service.login(eid, &req.password).await
    }
    .await;

    let response = match outcome {
        Ok(LoginOutcome::Authenticated) => LoginResponse {
            auth: true,
            msg: None,
        },
        Ok(LoginOutcome::UnknownEid) => LoginResponse {
            auth: false,
            msg: Some("incorrect eid"),
        },
        Ok(LoginOutcome::WrongPassword) => LoginResponse {
            auth: false,
            msg: Some("incorrect password"),
        },
        Err(e) => {
            warn!("Login failed: {}", e);
            return error_response(&e);
        }
    };

    json_response(StatusCode::OK, &response)
}
