//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: admin routes plus a fallback dispatcher
//! - Wire up middleware (timeout, request ID, tracing)
//! - Resolve every request through the versioned router
//! - Run endpoint hooks around the handler on the blocking pool
//! - Apply reloaded configuration to the routing snapshot
//! - Serve until shutdown is signalled

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::CoexistConfig;
use crate::hooks::HookDispatcher;
use crate::http::request::{request_id, RequestContext};
use crate::http::response::{self, ApiError};
use crate::http::router::{Endpoint, VersionedRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<VersionedRouter>,
    pub hooks: Arc<HookDispatcher>,
    pub config: Arc<ArcSwap<CoexistConfig>>,
    pub started_at: Instant,
}

/// HTTP host for versioned endpoints.
pub struct HttpServer {
    app: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: CoexistConfig, router: Arc<VersionedRouter>, hooks: HookDispatcher) -> Self {
        let state = AppState {
            router,
            hooks: Arc::new(hooks),
            config: Arc::new(ArcSwap::from_pointee(config)),
            started_at: Instant::now(),
        };
        let app = Self::build_router(state.clone());
        Self { app, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let (timeout, admin_enabled) = {
            let config = state.config.load();
            (
                Duration::from_secs(config.listener.request_timeout_secs),
                config.admin.enabled,
            )
        };

        let mut app = Router::new();
        if admin_enabled {
            app = app.merge(admin::setup_admin_router(state.clone()));
        }

        app.fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process testing.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply configs arriving on `updates` until shutdown.
    pub fn spawn_reload_task(
        &self,
        mut updates: mpsc::UnboundedReceiver<CoexistConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let state = self.state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = updates.recv() => {
                        let Some(config) = update else { break };
                        apply_config(&state, config);
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Config reload task received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_config(state: &AppState, config: CoexistConfig) {
    match state.router.reload(&config) {
        Ok(()) => {
            state.config.store(Arc::new(config));
            tracing::info!("Configuration reloaded");
        }
        Err(e) => tracing::error!(error = %e, "Rejected reloaded configuration, keeping current routes"),
    }
}

/// Resolve, check the method, run hooks and the handler.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id(request.headers()).unwrap_or("unknown").to_string();

    let snapshot = state.router.snapshot();
    let route = match snapshot.resolve(&path) {
        Ok(route) => route,
        Err(e) => {
            tracing::debug!(request_id = %request_id, method = %method, error = %e, "No route matched");
            return response::not_found(&method, &path, request.headers());
        }
    };

    if !route.mapping.allows(&method) {
        return response::method_not_allowed(&method, &path, request.headers(), &route.mapping.methods);
    }

    let endpoint = Arc::clone(&route.handler);
    let pattern = route.pattern().to_string();
    drop(snapshot);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        route = %pattern,
        endpoint = %endpoint.name,
        "Dispatching request"
    );

    let ctx = match RequestContext::from_request(request, &pattern).await {
        Ok(ctx) => ctx,
        Err(e) => return ApiError::bad_request(format!("unreadable body: {e}")).into_response(),
    };

    // Handlers and sync hooks are plain closures and may block.
    let hooks = Arc::clone(&state.hooks);
    let worker = Arc::clone(&endpoint);
    let result = match tokio::task::spawn_blocking(move || invoke(&hooks, &worker, &ctx)).await {
        Ok(result) => result,
        Err(e) => Err(ApiError::internal(format!("handler aborted: {e}"))),
    };

    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::warn!(request_id = %request_id, endpoint = %endpoint.name, error = %e, "Handler failed");
            e.into_response()
        }
    }
}

/// Run `endpoint` with its hooks: before hooks ahead of the handler, or
/// after hooks with the handler's outcome.
fn invoke(hooks: &HookDispatcher, endpoint: &Endpoint, ctx: &RequestContext) -> Result<Value, ApiError> {
    let arguments = ctx.to_arguments();

    if endpoint.before_hooks {
        hooks.run_before(&endpoint.hooks, arguments);
        return endpoint.call(ctx);
    }

    let result = endpoint.call(ctx);
    let outcome = result.as_ref().map_err(|e| e.message.as_str());
    hooks.run_after(&endpoint.hooks, arguments, outcome);
    result
}
