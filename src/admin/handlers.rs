use std::collections::BTreeSet;
use std::time::UNIX_EPOCH;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::VersionMeta;
use crate::hooks::HookBinding;
use crate::http::server::AppState;
use crate::routing::{HostRouteTable, MatcherKind};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub versioning_enabled: bool,
    pub sorting_method: String,
    pub routes: usize,
    pub registered: usize,
    pub replaced: usize,
    pub rejected: usize,
    pub passthrough: usize,
    /// Unix seconds at which the live snapshot was built.
    pub snapshot_built_at: u64,
}

#[derive(Serialize)]
pub struct VersionPaths {
    pub version: String,
    pub paths: Vec<String>,
}

#[derive(Serialize)]
pub struct VersionsReport {
    pub catalog: Vec<VersionMeta>,
    /// In registration order, which is also lookup order.
    pub registered: Vec<VersionPaths>,
    pub active: BTreeSet<String>,
    pub unactivated: Vec<String>,
    /// `None` when file control is off.
    pub allow_list: Option<BTreeSet<String>>,
}

#[derive(Serialize)]
pub struct RouteInfo {
    pub pattern: String,
    pub matcher: MatcherKind,
    pub methods: Vec<String>,
    pub endpoint: String,
    pub priority: Option<i32>,
    pub hooks: Vec<HookBinding>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let config = state.config.load();
    let snapshot = state.router.snapshot();
    let built_at = snapshot
        .built_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        versioning_enabled: config.versioning.enabled,
        sorting_method: config.versioning.sorting_method.clone(),
        routes: snapshot.table.len(),
        registered: snapshot.summary.registered,
        replaced: snapshot.summary.replaced,
        rejected: snapshot.summary.rejected,
        passthrough: snapshot.summary.passthrough,
        snapshot_built_at: built_at,
    })
}

pub async fn get_versions(State(state): State<AppState>) -> Json<VersionsReport> {
    let snapshot = state.router.snapshot();
    let index = &snapshot.state.index;

    let registered = index
        .versions()
        .map(|version| VersionPaths {
            version: version.to_string(),
            paths: index.paths_of(version).to_vec(),
        })
        .collect();

    let allow_list = snapshot
        .lookup
        .allow_list()
        .map(|list| list.currently_allowed().iter().cloned().collect());

    Json(VersionsReport {
        catalog: snapshot.catalog.entries().to_vec(),
        registered,
        active: snapshot.active_versions().clone(),
        unactivated: snapshot
            .state
            .activation
            .unactivated()
            .map(str::to_string)
            .collect(),
        allow_list,
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteInfo>> {
    let snapshot = state.router.snapshot();

    let routes = snapshot
        .table
        .all_routes()
        .iter()
        .map(|route| RouteInfo {
            pattern: route.pattern().to_string(),
            matcher: route.kind(),
            methods: route.mapping.methods.iter().map(|m| m.to_string()).collect(),
            endpoint: route.handler.name.clone(),
            priority: snapshot.state.index.priority_of(route.pattern()),
            hooks: route.handler.hooks.clone(),
        })
        .collect();

    Json(routes)
}
