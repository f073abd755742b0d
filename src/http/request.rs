//! Request handling.
//!
//! # Responsibilities
//! - Read the request ID assigned by the request-id layer (or mint one)
//! - Collect what handlers and hooks see about a request
//!
//! # Design Decisions
//! - Request ID is assigned as early as possible (outermost layer)
//! - Bodies are read fully and parsed as JSON when possible; hooks
//!   receive the same value the handler saw

use std::collections::BTreeMap;

use axum::body::{self, Body};
use axum::http::{HeaderMap, HeaderName, Request};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Request ID header.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Bodies above this size are refused.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The request ID set by the request-id layer, if any.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(&X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Header map as printable name → value pairs.
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}

/// What an endpoint handler receives.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestContext {
    pub request_id: String,
    pub method: String,
    pub path: String,
    /// Route pattern the request resolved to.
    pub route: String,
    pub query: BTreeMap<String, String>,
    pub body: Value,
}

impl RequestContext {
    /// Consume `request`, reading its body.
    pub async fn from_request(request: Request<Body>, route: &str) -> Result<Self, axum::Error> {
        let (parts, body) = request.into_parts();
        let bytes = body::to_bytes(body, MAX_BODY_BYTES).await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(Self {
            request_id: request_id(&parts.headers)
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            route: route.to_string(),
            query: parse_query(parts.uri.query()),
            body,
        })
    }

    /// Value passed to hooks as their arguments.
    pub fn to_arguments(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
