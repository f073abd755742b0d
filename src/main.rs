//! Multi-version router demo host.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ───────────────▶ axum server ──▶ fallback dispatcher
//!                    (request id,         │
//!                     timeout, trace)     ▼
//!                                 ┌──────────────────┐
//!                                 │ RoutingSnapshot  │◀── registration pass
//!                                 │  LookupEngine    │    (startup + reload)
//!                                 │  VersionIndex    │
//!                                 │  RouteTable      │
//!                                 └────────┬─────────┘
//!                                          ▼
//!                          hooks ◀── endpoint handler ──▶ JSON response
//!                            │
//!                            ▼
//!                  AsyncRetryExecutor
//! ```
//!
//! Usage: `multiversion-router [config.toml]`. Without a path the defaults
//! are used and nothing is watched.

use std::path::PathBuf;

use axum::http::Method;
use serde_json::json;

use multiversion_router::config::{load_config, CoexistConfig};
use multiversion_router::hooks::{HookBinding, HookRegistry};
use multiversion_router::http::{ApiError, Endpoint, EndpointDefinition};
use multiversion_router::lifecycle::Application;
use multiversion_router::observability::{logging, metrics};
use multiversion_router::routing::{PathMatcher, PatternError, RouteMapping};
use multiversion_router::versioning::RouteMetadata;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => CoexistConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "multiversion-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        versioning = config.versioning.enabled,
        sorting_method = %config.versioning.sorting_method,
        file_control = config.file_control.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut app = Application::build(config, demo_endpoints()?, demo_hooks())?;
    if let Some(path) = config_path {
        app = app.watch_config(path);
    }
    app.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_endpoints() -> Result<Vec<EndpointDefinition>, PatternError> {
    let get = |matcher: PathMatcher| RouteMapping::new(matcher).with_methods([Method::GET]);
    let hello = PathMatcher::exact("/api/hello");

    Ok(vec![
        EndpointDefinition::new(
            get(hello.clone()),
            RouteMetadata::new("HelloController").class_version("v1").source("src/main.rs"),
            Endpoint::new("hello-v1", |_| Ok(json!({ "message": "hello", "version": "v1" }))),
        ),
        EndpointDefinition::new(
            get(hello.clone()),
            RouteMetadata::new("HelloPatch").version("v1").priority(5).source("src/main.rs"),
            Endpoint::new("hello-v1-patched", |_| {
                Ok(json!({ "message": "hello again", "version": "v1", "patched": true }))
            }),
        ),
        EndpointDefinition::new(
            get(hello),
            RouteMetadata::new("HelloController").class_version("v2").source("src/main.rs"),
            Endpoint::new("hello-v2", |ctx| {
                let name = ctx.query.get("name").map(String::as_str).unwrap_or("world");
                Ok(json!({ "message": format!("hello, {name}"), "version": "v2" }))
            }),
        ),
        EndpointDefinition::new(
            get(PathMatcher::tree("/api/users/{id}")?),
            RouteMetadata::new("UserController").version("v1"),
            Endpoint::new("user-v1", |ctx| Ok(json!({ "path": ctx.path, "version": "v1" }))),
        ),
        EndpointDefinition::new(
            RouteMapping::new(PathMatcher::exact("/api/echo")).with_methods([Method::POST]),
            RouteMetadata::new("EchoController").version("v2"),
            Endpoint::new("echo-v2", |ctx| {
                if ctx.body.is_null() {
                    return Err(ApiError::bad_request("empty body"));
                }
                Ok(json!({ "echo": ctx.body }))
            })
            .with_hook(HookBinding::sync("audit", 1))
            .with_hook(HookBinding::asynchronous("notify", 2)),
        ),
        EndpointDefinition::new(
            get(PathMatcher::glob("/static/**")?),
            RouteMetadata::new("StaticFiles").version("v1").exempt(),
            Endpoint::new("static", |ctx| Ok(json!({ "file": ctx.path }))),
        ),
        EndpointDefinition::new(
            get(PathMatcher::exact("/health")),
            RouteMetadata::new("Health"),
            Endpoint::new("health", |_| Ok(json!({ "status": "ok" }))),
        ),
        EndpointDefinition::new(
            RouteMapping::new(PathMatcher::exact("/error")),
            RouteMetadata::new("ErrorController"),
            Endpoint::new("error", |_| Err(ApiError::internal("error page"))),
        ),
    ])
}

fn demo_hooks() -> HookRegistry {
    let mut hooks = HookRegistry::new();
    hooks
        .register("audit", |ctx| {
            tracing::info!(arguments = %ctx.arguments, failure = ?ctx.failure, "Audit hook");
            Ok(())
        })
        .register("notify", |ctx| {
            tracing::info!(result = ?ctx.result, "Notify hook");
            Ok(())
        });
    hooks
}
