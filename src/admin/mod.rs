pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// Admin routes, merged into the main router when enabled.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/versions", get(get_versions))
        .route("/admin/routes", get(get_routes))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
