//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use multiversion_router::config::CoexistConfig;
use multiversion_router::hooks::{HookDispatcher, HookRegistry};
use multiversion_router::http::{Endpoint, EndpointDefinition, HttpServer, VersionedRouter};
use multiversion_router::resilience::{AsyncRetryExecutor, RetryPolicy};
use multiversion_router::routing::{PathMatcher, RouteMapping};
use multiversion_router::versioning::{FileAllowList, RouteMetadata};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Config with admin routes on and a known key.
pub fn test_config() -> CoexistConfig {
    let mut config = CoexistConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

/// GET endpoint answering with its own name and version.
pub fn versioned_get(path: &str, declaring: &str, version: &str, name: &'static str) -> EndpointDefinition {
    let version_owned = version.to_string();
    EndpointDefinition::new(
        RouteMapping::new(PathMatcher::exact(path)).with_methods([Method::GET]),
        RouteMetadata::new(declaring).version(version),
        Endpoint::new(name, move |ctx| {
            Ok(json!({ "endpoint": name, "version": version_owned, "path": ctx.path }))
        }),
    )
}

/// Hello endpoints under v1 and v2, an unversioned health check, and the
/// error page.
pub fn hello_definitions() -> Vec<EndpointDefinition> {
    vec![
        versioned_get("/api/hello", "HelloV1", "v1", "hello-v1"),
        versioned_get("/api/hello", "HelloV2", "v2", "hello-v2"),
        EndpointDefinition::new(
            RouteMapping::new(PathMatcher::exact("/health")).with_methods([Method::GET]),
            RouteMetadata::new("Health"),
            Endpoint::new("health", |_| Ok(json!({ "status": "ok" }))),
        ),
        EndpointDefinition::new(
            RouteMapping::new(PathMatcher::exact("/error")),
            RouteMetadata::new("Error"),
            Endpoint::new("error", |_| Ok(json!({ "endpoint": "error" }))),
        ),
    ]
}

pub fn fast_retry_policy(max_retry: u32) -> RetryPolicy {
    RetryPolicy {
        max_retry,
        retry_interval: Duration::from_millis(5),
        timeout: Duration::from_millis(500),
    }
}

/// Build a server around `definitions`. Must run inside a Tokio runtime.
pub fn build_server(
    config: CoexistConfig,
    definitions: Vec<EndpointDefinition>,
    hooks: HookRegistry,
    allow_list: Option<Arc<FileAllowList>>,
) -> HttpServer {
    let router = Arc::new(VersionedRouter::new(definitions, &config, allow_list).unwrap());
    let executor = AsyncRetryExecutor::new(2, fast_retry_policy(2));
    let dispatcher = HookDispatcher::new(Arc::new(hooks), executor);
    HttpServer::new(config, router, dispatcher)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub body: Value,
}

/// Send one request through the router in-process.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, bearer: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = bearer {
        builder = builder.header("authorization", format!("Bearer {key}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        request_id,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None, None).await
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
