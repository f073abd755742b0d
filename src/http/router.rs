//! Versioned endpoint router.
//!
//! # Responsibilities
//! - Hold the endpoint definitions declared by the application
//! - Run a full registration pass into a routing snapshot
//! - Swap in a fresh snapshot when the configuration is reloaded
//! - Resolve request paths against the current snapshot
//!
//! # Design Decisions
//! - Snapshots are immutable once published (copy-on-write via `ArcSwap`),
//!   so a request never sees a half-built index
//! - A failed rebuild keeps the running snapshot
//! - The file allow-list is opened once and shared across snapshots

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwap;
use serde_json::Value;
use thiserror::Error;

use crate::config::CoexistConfig;
use crate::hooks::HookBinding;
use crate::http::request::RequestContext;
use crate::http::response::ApiError;
use crate::routing::{RouteEntry, RouteMapping, RouteTable};
use crate::versioning::{
    DefaultRegistrationHelper, EnvironmentPolicy, FileAllowList, LookupEngine, LookupError,
    RegistrationCandidate, RegistrationEngine, RegistrationError, RegistrationHelper,
    RegistrationOutcome, RegistrationSettings, RegistrationState, RouteMetadata,
    SortingMethodError, VersionCatalog,
};

/// Endpoint handler.
pub type HandlerFn = Arc<dyn Fn(&RequestContext) -> Result<Value, ApiError> + Send + Sync>;

/// A handler plus the hooks wrapped around it.
#[derive(Clone)]
pub struct Endpoint {
    pub name: String,
    pub handler: HandlerFn,
    pub hooks: Vec<HookBinding>,
    /// Run hooks before the handler instead of after it.
    pub before_hooks: bool,
}

impl Endpoint {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
            hooks: Vec::new(),
            before_hooks: false,
        }
    }

    pub fn with_hook(mut self, binding: HookBinding) -> Self {
        self.hooks.push(binding);
        self
    }

    pub fn call(&self, ctx: &RequestContext) -> Result<Value, ApiError> {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("hooks", &self.hooks)
            .field("before_hooks", &self.before_hooks)
            .finish()
    }
}

/// An endpoint as declared, before versioning is applied.
#[derive(Debug, Clone)]
pub struct EndpointDefinition {
    pub mapping: RouteMapping,
    pub metadata: RouteMetadata,
    pub endpoint: Arc<Endpoint>,
}

impl EndpointDefinition {
    pub fn new(mapping: RouteMapping, metadata: RouteMetadata, endpoint: Endpoint) -> Self {
        let endpoint = Endpoint {
            before_hooks: metadata.before_hooks,
            ..endpoint
        };
        Self {
            mapping,
            metadata,
            endpoint: Arc::new(endpoint),
        }
    }
}

/// Errors that abort a registration pass.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Sorting(#[from] SortingMethodError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Outcome counts of one registration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub registered: usize,
    pub replaced: usize,
    pub rejected: usize,
    pub passthrough: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: &RegistrationOutcome) {
        match outcome {
            RegistrationOutcome::Registered { .. } => self.registered += 1,
            RegistrationOutcome::Replaced { .. } => self.replaced += 1,
            RegistrationOutcome::Rejected(_) => self.rejected += 1,
            RegistrationOutcome::Passthrough => self.passthrough += 1,
        }
    }
}

/// Everything a lookup needs, built by one registration pass.
#[derive(Debug)]
pub struct RoutingSnapshot {
    pub state: RegistrationState,
    pub table: RouteTable<Arc<Endpoint>>,
    pub lookup: LookupEngine,
    pub catalog: VersionCatalog,
    pub summary: PassSummary,
    pub built_at: SystemTime,
}

impl RoutingSnapshot {
    pub fn resolve(&self, path: &str) -> Result<&RouteEntry<Arc<Endpoint>>, LookupError> {
        self.lookup.resolve(path, &self.state.index, &self.table)
    }

    pub fn active_versions(&self) -> &BTreeSet<String> {
        self.state.activation.active()
    }
}

/// Owns endpoint definitions and the live routing snapshot.
pub struct VersionedRouter {
    definitions: Vec<EndpointDefinition>,
    helper: Arc<dyn RegistrationHelper>,
    allow_list: Option<Arc<FileAllowList>>,
    snapshot: ArcSwap<RoutingSnapshot>,
}

impl VersionedRouter {
    /// Register every definition under `config`.
    pub fn new(
        definitions: Vec<EndpointDefinition>,
        config: &CoexistConfig,
        allow_list: Option<Arc<FileAllowList>>,
    ) -> Result<Self, RouterError> {
        Self::with_helper(definitions, config, allow_list, Arc::new(DefaultRegistrationHelper))
    }

    pub fn with_helper(
        definitions: Vec<EndpointDefinition>,
        config: &CoexistConfig,
        allow_list: Option<Arc<FileAllowList>>,
        helper: Arc<dyn RegistrationHelper>,
    ) -> Result<Self, RouterError> {
        let snapshot = build_snapshot(&definitions, config, allow_list.as_ref(), &helper)?;
        Ok(Self {
            definitions,
            helper,
            allow_list,
            snapshot: ArcSwap::from_pointee(snapshot),
        })
    }

    /// Rebuild under `config` and publish the result. On error the
    /// running snapshot stays in place.
    pub fn reload(&self, config: &CoexistConfig) -> Result<(), RouterError> {
        let snapshot = build_snapshot(&self.definitions, config, self.allow_list.as_ref(), &self.helper)?;
        tracing::info!(
            routes = snapshot.table.len(),
            versions = snapshot.state.index.version_count(),
            "Routing snapshot replaced"
        );
        self.snapshot.store(Arc::new(snapshot));
        Ok(())
    }

    /// The current snapshot. Held for the duration of one request.
    pub fn snapshot(&self) -> Arc<RoutingSnapshot> {
        self.snapshot.load_full()
    }

    pub fn allow_list(&self) -> Option<&Arc<FileAllowList>> {
        self.allow_list.as_ref()
    }

    pub fn definitions(&self) -> &[EndpointDefinition] {
        &self.definitions
    }
}

impl fmt::Debug for VersionedRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedRouter")
            .field("definitions", &self.definitions.len())
            .field("allow_list", &self.allow_list)
            .finish()
    }
}

fn build_snapshot(
    definitions: &[EndpointDefinition],
    config: &CoexistConfig,
    allow_list: Option<&Arc<FileAllowList>>,
    helper: &Arc<dyn RegistrationHelper>,
) -> Result<RoutingSnapshot, RouterError> {
    let settings = RegistrationSettings::from_config(&config.versioning)?;
    let catalog = VersionCatalog::new(config.versions_info.versions.clone());
    if config.versions_info.display {
        catalog.display();
    }
    let policy = EnvironmentPolicy::from_config(&config.versioning);

    let engine = RegistrationEngine::new(settings, catalog.clone(), Arc::new(policy.clone()))
        .with_helper(Arc::clone(helper));

    let mut state = RegistrationState::default();
    let mut table = RouteTable::new();
    let mut summary = PassSummary::default();

    for definition in definitions {
        let candidate = RegistrationCandidate::new(
            Arc::clone(&definition.endpoint),
            definition.metadata.clone(),
            definition.mapping.clone(),
        );
        let outcome = engine.on_registration_candidate(&mut state, &mut table, candidate)?;
        summary.record(&outcome);
    }

    state.activation.finish_pass(&policy, state.index.versions());

    let mut lookup = LookupEngine::new(config.versioning.error_path.clone());
    if config.file_control.enabled {
        match allow_list {
            Some(list) => lookup = lookup.with_allow_list(Arc::clone(list)),
            None => tracing::warn!("File control enabled but no allow-list is open, versions are not filtered"),
        }
    }

    tracing::info!(
        registered = summary.registered,
        replaced = summary.replaced,
        rejected = summary.rejected,
        passthrough = summary.passthrough,
        "Registration pass complete"
    );

    Ok(RoutingSnapshot {
        state,
        table,
        lookup,
        catalog,
        summary,
        built_at: SystemTime::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PathMatcher;
    use axum::http::Method;
    use serde_json::json;

    fn hello(version: &'static str) -> Endpoint {
        Endpoint::new(format!("hello-{version}"), move |_| Ok(json!({ "version": version })))
    }

    fn definitions() -> Vec<EndpointDefinition> {
        let mapping = RouteMapping::new(PathMatcher::exact("/api/hello")).with_methods([Method::GET]);
        vec![
            EndpointDefinition::new(mapping.clone(), RouteMetadata::new("HelloV1").version("v1"), hello("v1")),
            EndpointDefinition::new(mapping, RouteMetadata::new("HelloV2").version("v2"), hello("v2")),
        ]
    }

    #[test]
    fn test_initial_pass_registers_versions() {
        let router = VersionedRouter::new(definitions(), &CoexistConfig::default(), None).unwrap();
        let snapshot = router.snapshot();

        assert_eq!(snapshot.summary.registered, 2);
        assert_eq!(snapshot.table.len(), 2);
        assert_eq!(snapshot.resolve("/api/hello").unwrap().handler.name, "hello-v1");
        assert_eq!(snapshot.active_versions().len(), 2);
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let router = VersionedRouter::new(definitions(), &CoexistConfig::default(), None).unwrap();
        let before = router.snapshot();

        let mut config = CoexistConfig::default();
        config.versioning.exclude = vec!["v1".into()];
        router.reload(&config).unwrap();

        let after = router.snapshot();
        assert_eq!(after.resolve("/api/hello").unwrap().handler.name, "hello-v2");
        // Snapshots held by in-flight requests are untouched.
        assert_eq!(before.resolve("/api/hello").unwrap().handler.name, "hello-v1");
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let router = VersionedRouter::new(definitions(), &CoexistConfig::default(), None).unwrap();

        let mut config = CoexistConfig::default();
        config.versioning.sorting_method = "AVERAGE".into();
        assert!(matches!(router.reload(&config), Err(RouterError::Sorting(_))));
        assert_eq!(router.snapshot().table.len(), 2);
    }

    #[test]
    fn test_before_flag_copied_to_endpoint() {
        let def = EndpointDefinition::new(
            RouteMapping::new(PathMatcher::exact("/x")),
            RouteMetadata::new("X").before_hooks(),
            hello("v1"),
        );
        assert!(def.endpoint.before_hooks);
    }
}
