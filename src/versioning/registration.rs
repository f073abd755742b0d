//! Version-aware route registration.
//!
//! # Responsibilities
//! - Rewrite a versioned endpoint to `/{version}{path}`
//! - Filter inactive, disallowed, and over-limit versions
//! - Resolve priority conflicts on the same final path
//! - Keep the version index and priority table in step with the host table
//!
//! # State Machine
//! ```text
//! candidate
//!   ├─ versioning off / exempt / no version ─→ PASSTHROUGH (register as is)
//!   ├─ version inactive ───────────────────→ REJECTED
//!   ├─ policy refuses (version, path) ─────→ REJECTED
//!   ├─ version count at the limit ─────────→ REJECTED (warn)
//!   └─ final path = /version + path
//!        ├─ unclaimed ──────────────────────→ REGISTERED
//!        ├─ candidate outranks live winner ─→ REPLACED (unregister, then register)
//!        ├─ equal priority ─────────────────→ REJECTED (conflict diagnostic)
//!        └─ live winner outranks candidate ─→ REJECTED
//! ```
//!
//! # Design Decisions
//! - Missing priority means 0, so two unprioritized endpoints collide
//! - The old route is fully removed before its replacement is inserted
//! - A duplicate fault from the host is reported as a conflict, not raised
//! - Only uninterpretable metadata escapes as an error

use std::sync::Arc;

use crate::config::{RejectionLog, VersioningConfig};
use crate::observability::metrics;
use crate::routing::{HostRouteTable, RouteMapping};
use crate::versioning::activation::{ActivationFilter, ActivationState, VersionCatalog, VersionPolicy};
use crate::versioning::helper::{
    ConflictReport, DefaultRegistrationHelper, RegistrationError, RegistrationHelper,
};
use crate::versioning::index::VersionIndex;
use crate::versioning::metadata::RegistrationCandidate;
use crate::versioning::ordering::{SortingMethod, SortingMethodError};

/// Why a candidate was not exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Version disabled by metadata or refused by the include/exclude policy.
    Inactive { version: String },
    /// Policy refused this (version, path) pair.
    NotAllowed { version: String, path: String },
    /// A new version would exceed the configured maximum.
    VersionLimit { version: String, limit: usize },
    /// Same final path and same priority as the live winner.
    EqualPriority(ConflictReport),
    /// The live winner outranks the candidate.
    Outranked {
        final_path: String,
        priority: i32,
        existing: i32,
    },
    /// The host refused the pattern as a duplicate.
    Duplicate(ConflictReport),
}

impl Rejection {
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::Inactive { .. } => "inactive",
            Rejection::NotAllowed { .. } => "not_allowed",
            Rejection::VersionLimit { .. } => "version_limit",
            Rejection::EqualPriority(_) => "equal_priority",
            Rejection::Outranked { .. } => "outranked",
            Rejection::Duplicate(_) => "duplicate",
        }
    }

    pub fn conflict(&self) -> Option<&ConflictReport> {
        match self {
            Rejection::EqualPriority(c) | Rejection::Duplicate(c) => Some(c),
            _ => None,
        }
    }
}

/// Result of one registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered {
        version: String,
        final_path: String,
        priority: i32,
    },
    Replaced {
        version: String,
        final_path: String,
        priority: i32,
        previous: i32,
    },
    Rejected(Rejection),
    Passthrough,
}

impl RegistrationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationOutcome::Registered { .. } => "registered",
            RegistrationOutcome::Replaced { .. } => "replaced",
            RegistrationOutcome::Rejected(_) => "rejected",
            RegistrationOutcome::Passthrough => "passthrough",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self,
            RegistrationOutcome::Registered { .. }
                | RegistrationOutcome::Replaced { .. }
                | RegistrationOutcome::Passthrough
        )
    }
}

/// Settings read once per engine.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationSettings {
    pub enabled: bool,
    pub sorting: SortingMethod,
    pub rejection_log: RejectionLog,
    /// Exempt already registered versions from the version limit.
    pub limit_new_versions_only: bool,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sorting: SortingMethod::Max,
            rejection_log: RejectionLog::Info,
            limit_new_versions_only: false,
        }
    }
}

impl RegistrationSettings {
    /// Fails on an unrecognized sorting mode.
    pub fn from_config(config: &VersioningConfig) -> Result<Self, SortingMethodError> {
        Ok(Self {
            enabled: config.enabled,
            sorting: config.sorting_method.parse()?,
            rejection_log: config.rejection_log,
            limit_new_versions_only: config.limit_new_versions_only,
        })
    }
}

/// Mutable registration state, owned by one routing snapshot.
#[derive(Debug, Clone, Default)]
pub struct RegistrationState {
    pub index: VersionIndex,
    pub activation: ActivationState,
}

/// Applies versioning rules to registration candidates.
pub struct RegistrationEngine {
    settings: RegistrationSettings,
    catalog: VersionCatalog,
    policy: Arc<dyn VersionPolicy>,
    helper: Arc<dyn RegistrationHelper>,
}

impl RegistrationEngine {
    pub fn new(
        settings: RegistrationSettings,
        catalog: VersionCatalog,
        policy: Arc<dyn VersionPolicy>,
    ) -> Self {
        Self {
            settings,
            catalog,
            policy,
            helper: Arc::new(DefaultRegistrationHelper),
        }
    }

    /// Substitute the registration helper.
    pub fn with_helper(mut self, helper: Arc<dyn RegistrationHelper>) -> Self {
        self.helper = helper;
        self
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    /// Process one candidate against `state` and the host `table`.
    pub fn on_registration_candidate<H, T>(
        &self,
        state: &mut RegistrationState,
        table: &mut T,
        candidate: RegistrationCandidate<H>,
    ) -> Result<RegistrationOutcome, RegistrationError>
    where
        T: HostRouteTable<H>,
    {
        let outcome = self.process(state, table, candidate)?;
        metrics::record_registration(outcome.label());
        metrics::record_registered_versions(state.index.version_count());
        Ok(outcome)
    }

    fn process<H, T>(
        &self,
        state: &mut RegistrationState,
        table: &mut T,
        candidate: RegistrationCandidate<H>,
    ) -> Result<RegistrationOutcome, RegistrationError>
    where
        T: HostRouteTable<H>,
    {
        let RegistrationCandidate {
            handler,
            metadata,
            mapping,
        } = candidate;

        let version = match metadata.resolved_version() {
            Some(v) if self.settings.enabled && !metadata.version_exempt => v.to_string(),
            _ => {
                return Ok(self.register_passthrough(table, mapping, handler, &metadata.declaring_type, metadata.source_location.clone()));
            }
        };

        let path = self.helper.extract_path(&mapping, &metadata.declaring_type)?;

        let filter = ActivationFilter::new(&self.catalog, self.policy.as_ref());
        if !filter.is_active(&version, &mut state.activation) {
            return Ok(self.reject(Rejection::Inactive { version }));
        }

        if !self.policy.is_version_allowed(&version, &path) {
            return Ok(self.reject(Rejection::NotAllowed { version, path }));
        }

        let limit = self.policy.max_registered_versions();
        let exempt = self.settings.limit_new_versions_only && state.index.has_version(&version);
        if !exempt && state.index.version_count() >= limit {
            tracing::warn!(version = %version, limit, "Maximum number of versions reached, version refused");
            return Ok(RegistrationOutcome::Rejected(Rejection::VersionLimit { version, limit }));
        }

        let final_path = format!("/{version}{path}");
        let priority = metadata.priority.unwrap_or(0);
        let conflict = ConflictReport {
            declaring_type: metadata.declaring_type.clone(),
            source_location: metadata.source_location.clone(),
            path: path.clone(),
            version: Some(version.clone()),
        };

        let previous = match state.index.priority_of(&final_path) {
            None => None,
            Some(existing) if self.helper.outranks(self.settings.sorting, priority, existing) => {
                // Must be gone before the replacement is inserted.
                table.unregister_route(&final_path);
                Some(existing)
            }
            Some(existing) if existing == priority => {
                self.report_conflict(&conflict);
                return Ok(RegistrationOutcome::Rejected(Rejection::EqualPriority(conflict)));
            }
            Some(existing) => {
                return Ok(self.reject(Rejection::Outranked {
                    final_path,
                    priority,
                    existing,
                }));
            }
        };

        let versioned = self.helper.inject_path(&mapping, &final_path)?;
        if table.register_route(versioned, handler).is_err() {
            if previous.is_some() {
                state.index.remove_priority(&final_path);
            }
            self.report_conflict(&conflict);
            return Ok(RegistrationOutcome::Rejected(Rejection::Duplicate(conflict)));
        }

        state.index.set_priority(final_path.clone(), priority);
        if !state.index.contains_path(&version, &final_path) {
            state.index.record_path(&version, final_path.clone());
        }

        Ok(match previous {
            None => {
                tracing::debug!(version = %version, path = %final_path, priority, "Registered versioned endpoint");
                RegistrationOutcome::Registered {
                    version,
                    final_path,
                    priority,
                }
            }
            Some(previous) => {
                tracing::info!(version = %version, path = %final_path, priority, previous, "Replaced lower-priority endpoint");
                RegistrationOutcome::Replaced {
                    version,
                    final_path,
                    priority,
                    previous,
                }
            }
        })
    }

    fn register_passthrough<H, T>(
        &self,
        table: &mut T,
        mapping: RouteMapping,
        handler: H,
        declaring_type: &str,
        source_location: Option<String>,
    ) -> RegistrationOutcome
    where
        T: HostRouteTable<H>,
    {
        let path = mapping.pattern().to_string();
        match table.register_route(mapping, handler) {
            Ok(()) => RegistrationOutcome::Passthrough,
            Err(_) => {
                let conflict = ConflictReport {
                    declaring_type: declaring_type.to_string(),
                    source_location,
                    path,
                    version: None,
                };
                self.report_conflict(&conflict);
                RegistrationOutcome::Rejected(Rejection::Duplicate(conflict))
            }
        }
    }

    fn report_conflict(&self, conflict: &ConflictReport) {
        metrics::record_conflict();
        self.helper.report_conflict(conflict);
    }

    fn reject(&self, rejection: Rejection) -> RegistrationOutcome {
        match self.settings.rejection_log {
            RejectionLog::Silent => {}
            RejectionLog::Info => tracing::info!(reason = rejection.label(), detail = ?rejection, "Registration skipped"),
            RejectionLog::Warn => tracing::warn!(reason = rejection.label(), detail = ?rejection, "Registration skipped"),
        }
        RegistrationOutcome::Rejected(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VersionMeta;
    use crate::routing::{PathMatcher, RouteTable};
    use crate::versioning::activation::EnvironmentPolicy;
    use crate::versioning::metadata::RouteMetadata;
    use axum::http::Method;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingHelper {
        conflicts: Mutex<Vec<ConflictReport>>,
    }

    impl RegistrationHelper for RecordingHelper {
        fn report_conflict(&self, conflict: &ConflictReport) {
            self.conflicts.lock().push(conflict.clone());
        }

        fn inject_path(
            &self,
            mapping: &RouteMapping,
            final_path: &str,
        ) -> Result<RouteMapping, RegistrationError> {
            DefaultRegistrationHelper.inject_path(mapping, final_path)
        }

        fn extract_path(
            &self,
            mapping: &RouteMapping,
            declaring_type: &str,
        ) -> Result<String, RegistrationError> {
            DefaultRegistrationHelper.extract_path(mapping, declaring_type)
        }
    }

    fn engine_with(sorting: SortingMethod, policy: EnvironmentPolicy, catalog: Vec<VersionMeta>) -> RegistrationEngine {
        let settings = RegistrationSettings {
            sorting,
            ..RegistrationSettings::default()
        };
        RegistrationEngine::new(settings, VersionCatalog::new(catalog), Arc::new(policy))
    }

    fn engine(sorting: SortingMethod) -> RegistrationEngine {
        engine_with(sorting, EnvironmentPolicy::new(vec![], vec![], 10), vec![])
    }

    fn candidate(handler: &'static str, path: &str, meta: RouteMetadata) -> RegistrationCandidate<&'static str> {
        let mapping = RouteMapping::new(PathMatcher::exact(path)).with_methods([Method::GET]);
        RegistrationCandidate::new(handler, meta, mapping)
    }

    #[test]
    fn test_versioned_path_is_prefixed() {
        let engine = engine(SortingMethod::Max);
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        let outcome = engine
            .on_registration_candidate(&mut state, &mut table, candidate("a", "/api/hello", RouteMetadata::new("A").version("v1")))
            .unwrap();

        assert_eq!(
            outcome,
            RegistrationOutcome::Registered {
                version: "v1".into(),
                final_path: "/v1/api/hello".into(),
                priority: 0,
            }
        );
        assert_eq!(table.get("/v1/api/hello").unwrap().handler, "a");
        assert_eq!(state.index.paths_of("v1"), &["/v1/api/hello"]);
        assert_eq!(state.index.priority_of("/v1/api/hello"), Some(0));
    }

    #[test]
    fn test_passthrough_cases() {
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();
        let engine = engine(SortingMethod::Max);

        let unversioned = engine
            .on_registration_candidate(&mut state, &mut table, candidate("h", "/health", RouteMetadata::new("Health")))
            .unwrap();
        assert_eq!(unversioned, RegistrationOutcome::Passthrough);

        let exempt = engine
            .on_registration_candidate(&mut state, &mut table, candidate("x", "/raw", RouteMetadata::new("Raw").version("v1").exempt()))
            .unwrap();
        assert_eq!(exempt, RegistrationOutcome::Passthrough);
        assert!(table.get("/raw").is_some());
        assert_eq!(state.index.version_count(), 0);

        let disabled = RegistrationEngine::new(
            RegistrationSettings {
                enabled: false,
                ..RegistrationSettings::default()
            },
            VersionCatalog::default(),
            Arc::new(EnvironmentPolicy::new(vec![], vec![], 10)),
        );
        let off = disabled
            .on_registration_candidate(&mut state, &mut table, candidate("o", "/api/off", RouteMetadata::new("Off").version("v1")))
            .unwrap();
        assert_eq!(off, RegistrationOutcome::Passthrough);
        assert!(table.get("/api/off").is_some());
    }

    #[test]
    fn test_priority_monotonicity_max_and_min() {
        for (sorting, winner) in [(SortingMethod::Max, "b"), (SortingMethod::Min, "a")] {
            let engine = engine(sorting);
            let mut state = RegistrationState::default();
            let mut table = RouteTable::new();

            let a = candidate("a", "/api/x", RouteMetadata::new("A").version("v1").priority(1));
            let b = candidate("b", "/api/x", RouteMetadata::new("B").version("v1").priority(2));
            engine.on_registration_candidate(&mut state, &mut table, a).unwrap();
            let second = engine.on_registration_candidate(&mut state, &mut table, b).unwrap();

            assert_eq!(table.count_pattern("/v1/api/x"), 1);
            assert_eq!(table.get("/v1/api/x").unwrap().handler, winner);
            match sorting {
                SortingMethod::Max => assert!(matches!(second, RegistrationOutcome::Replaced { previous: 1, priority: 2, .. })),
                SortingMethod::Min => assert!(matches!(second, RegistrationOutcome::Rejected(Rejection::Outranked { .. }))),
            }
        }
    }

    #[test]
    fn test_equal_priority_reports_conflict_once() {
        let helper = Arc::new(RecordingHelper::default());
        let engine = engine(SortingMethod::Max).with_helper(helper.clone());
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        let first = candidate("first", "/api/x", RouteMetadata::new("First").version("v1").priority(3));
        let second = candidate("second", "/api/x", RouteMetadata::new("Second").version("v1").priority(3).source("src/second.rs"));
        engine.on_registration_candidate(&mut state, &mut table, first).unwrap();
        let outcome = engine.on_registration_candidate(&mut state, &mut table, second).unwrap();

        assert!(matches!(outcome, RegistrationOutcome::Rejected(Rejection::EqualPriority(_))));
        assert_eq!(table.get("/v1/api/x").unwrap().handler, "first");

        let conflicts = helper.conflicts.lock();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].declaring_type, "Second");
        assert_eq!(conflicts[0].source_location.as_deref(), Some("src/second.rs"));
        assert_eq!(conflicts[0].path, "/api/x");
        assert_eq!(conflicts[0].version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_unprioritized_endpoints_collide() {
        let helper = Arc::new(RecordingHelper::default());
        let engine = engine(SortingMethod::Max).with_helper(helper.clone());
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        engine
            .on_registration_candidate(&mut state, &mut table, candidate("a", "/api/x", RouteMetadata::new("A").version("v1")))
            .unwrap();
        let outcome = engine
            .on_registration_candidate(&mut state, &mut table, candidate("b", "/api/x", RouteMetadata::new("B").version("v1")))
            .unwrap();

        assert!(matches!(outcome, RegistrationOutcome::Rejected(Rejection::EqualPriority(_))));
        assert_eq!(helper.conflicts.lock().len(), 1);
    }

    #[test]
    fn test_unactivated_version_never_registers() {
        let catalog = vec![VersionMeta {
            name: "v0".into(),
            enabled: false,
            ..VersionMeta::default()
        }];
        let engine = engine_with(SortingMethod::Max, EnvironmentPolicy::new(vec![], vec![], 10), catalog);
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        for priority in [0, 100, i32::MAX] {
            let outcome = engine
                .on_registration_candidate(&mut state, &mut table, candidate("old", "/api/x", RouteMetadata::new("Old").version("v0").priority(priority)))
                .unwrap();
            assert_eq!(outcome, RegistrationOutcome::Rejected(Rejection::Inactive { version: "v0".into() }));
        }
        assert!(table.is_empty());
        assert!(state.activation.is_unactivated("v0"));
    }

    #[test]
    fn test_excluded_version_is_inactive() {
        let engine = engine_with(SortingMethod::Max, EnvironmentPolicy::new(vec![], vec!["v2".into()], 10), vec![]);
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        let outcome = engine
            .on_registration_candidate(&mut state, &mut table, candidate("b", "/api/x", RouteMetadata::new("B").version("v2")))
            .unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Rejected(Rejection::Inactive { .. })));
    }

    #[test]
    fn test_version_limit() {
        for (new_only, more_v1_live) in [(false, false), (true, true)] {
            let settings = RegistrationSettings {
                limit_new_versions_only: new_only,
                ..RegistrationSettings::default()
            };
            let engine = RegistrationEngine::new(
                settings,
                VersionCatalog::default(),
                Arc::new(EnvironmentPolicy::new(vec![], vec![], 1)),
            );
            let mut state = RegistrationState::default();
            let mut table = RouteTable::new();

            engine
                .on_registration_candidate(&mut state, &mut table, candidate("a", "/api/a", RouteMetadata::new("A").version("v1")))
                .unwrap();
            let more_v1 = engine
                .on_registration_candidate(&mut state, &mut table, candidate("b", "/api/b", RouteMetadata::new("A").version("v1")))
                .unwrap();
            let v2 = engine
                .on_registration_candidate(&mut state, &mut table, candidate("c", "/api/a", RouteMetadata::new("C").version("v2")))
                .unwrap();

            assert_eq!(more_v1.is_live(), more_v1_live);
            if !more_v1_live {
                assert_eq!(more_v1, RegistrationOutcome::Rejected(Rejection::VersionLimit { version: "v1".into(), limit: 1 }));
                assert!(table.get("/v1/api/b").is_none());
            }
            assert_eq!(v2, RegistrationOutcome::Rejected(Rejection::VersionLimit { version: "v2".into(), limit: 1 }));
            assert_eq!(state.index.version_count(), 1);
        }
    }

    #[test]
    fn test_min_replaces_with_lower_priority() {
        let engine = engine(SortingMethod::Min);
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        let a = candidate("a", "/api/x", RouteMetadata::new("A").version("v1").priority(2));
        let b = candidate("b", "/api/x", RouteMetadata::new("B").version("v1").priority(1));
        engine.on_registration_candidate(&mut state, &mut table, a).unwrap();
        let second = engine.on_registration_candidate(&mut state, &mut table, b).unwrap();

        assert_eq!(
            second,
            RegistrationOutcome::Replaced {
                version: "v1".into(),
                final_path: "/v1/api/x".into(),
                priority: 1,
                previous: 2,
            }
        );
        assert_eq!(table.count_pattern("/v1/api/x"), 1);
        assert_eq!(table.get("/v1/api/x").unwrap().handler, "b");
        assert_eq!(state.index.priority_of("/v1/api/x"), Some(1));
        assert_eq!(state.index.paths_of("v1"), &["/v1/api/x"]);
    }

    /// Records the level of every "Registration skipped" event.
    #[derive(Clone, Default)]
    struct SkipLevels(Arc<Mutex<Vec<tracing::Level>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SkipLevels {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            struct Message(String);
            impl tracing::field::Visit for Message {
                fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                    if field.name() == "message" {
                        self.0 = format!("{value:?}");
                    }
                }
            }

            let mut message = Message(String::new());
            event.record(&mut message);
            if message.0 == "Registration skipped" {
                self.0.lock().push(*event.metadata().level());
            }
        }
    }

    #[test]
    fn test_rejection_log_levels() {
        use tracing_subscriber::layer::SubscriberExt;

        let cases = [
            (RejectionLog::Silent, vec![]),
            (RejectionLog::Info, vec![tracing::Level::INFO]),
            (RejectionLog::Warn, vec![tracing::Level::WARN]),
        ];
        for (policy, expected) in cases {
            let levels = SkipLevels::default();
            let subscriber = tracing_subscriber::registry().with(levels.clone());

            tracing::subscriber::with_default(subscriber, || {
                let engine = RegistrationEngine::new(
                    RegistrationSettings {
                        rejection_log: policy,
                        ..RegistrationSettings::default()
                    },
                    VersionCatalog::default(),
                    Arc::new(EnvironmentPolicy::new(vec![], vec!["v9".into()], 10)),
                );
                let mut state = RegistrationState::default();
                let mut table = RouteTable::new();
                let outcome = engine
                    .on_registration_candidate(&mut state, &mut table, candidate("a", "/api/a", RouteMetadata::new("A").version("v9")))
                    .unwrap();
                assert_eq!(outcome, RegistrationOutcome::Rejected(Rejection::Inactive { version: "v9".into() }));
            });

            assert_eq!(*levels.0.lock(), expected, "policy {policy:?}");
        }
    }

    #[test]
    fn test_host_duplicate_is_reported_not_raised() {
        let helper = Arc::new(RecordingHelper::default());
        let engine = engine(SortingMethod::Max).with_helper(helper.clone());
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        // Route registered behind the engine's back.
        table
            .register_route(RouteMapping::new(PathMatcher::exact("/v1/api/x")), "stray")
            .unwrap();

        let outcome = engine
            .on_registration_candidate(&mut state, &mut table, candidate("a", "/api/x", RouteMetadata::new("A").version("v1")))
            .unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Rejected(Rejection::Duplicate(_))));
        assert_eq!(helper.conflicts.lock().len(), 1);
        assert_eq!(state.index.priority_of("/v1/api/x"), None);
        assert_eq!(table.count_pattern("/v1/api/x"), 1);
    }

    #[test]
    fn test_uniqueness_across_many_candidates() {
        let engine = engine(SortingMethod::Max);
        let mut state = RegistrationState::default();
        let mut table = RouteTable::new();

        let priorities = [0, 4, 2, 4, 7, 1, 7, 9];
        for (i, p) in priorities.iter().enumerate() {
            let handler: &'static str = Box::leak(format!("h{i}").into_boxed_str());
            engine
                .on_registration_candidate(&mut state, &mut table, candidate(handler, "/api/x", RouteMetadata::new("T").version("v1").priority(*p)))
                .unwrap();
            assert_eq!(table.count_pattern("/v1/api/x"), 1);
        }
        assert_eq!(table.get("/v1/api/x").unwrap().handler, "h7");
        assert_eq!(state.index.priority_of("/v1/api/x"), Some(9));
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let engine = engine(SortingMethod::Max);
        let mut state = RegistrationState::default();
        let mut table: RouteTable<&'static str> = RouteTable::new();

        let result = engine.on_registration_candidate(&mut state, &mut table, candidate("a", "", RouteMetadata::new("Broken").version("v1")));
        assert!(matches!(result, Err(RegistrationError::MissingPath { .. })));
    }
}
