//! Response construction.
//!
//! # Responsibilities
//! - JSON bodies for handler results and handler errors
//! - Routing failures carrying method, path, and headers
//!
//! # Design Decisions
//! - A lookup miss is an ordinary 404, never a 5xx
//! - A method mismatch is 405 with an `Allow` header

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::http::request::header_map;

/// Error returned by an endpoint handler.
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Body of a routing failure.
#[derive(Debug, Serialize)]
pub struct RoutingFailure {
    pub error: &'static str,
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
}

/// 404 for a path no route serves.
pub fn not_found(method: &Method, path: &str, headers: &HeaderMap) -> Response {
    let body = RoutingFailure {
        error: "not found",
        method: method.to_string(),
        path: path.to_string(),
        headers: header_map(headers),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// 405 for a route that does not accept `method`.
pub fn method_not_allowed(method: &Method, path: &str, headers: &HeaderMap, allowed: &[Method]) -> Response {
    let body = RoutingFailure {
        error: "method not allowed",
        method: method.to_string(),
        path: path.to_string(),
        headers: header_map(headers),
    };
    let mut response = (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response();

    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = method_not_allowed(&Method::POST, "/x", &HeaderMap::new(), &[Method::GET, Method::HEAD]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError::bad_request("missing name").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
