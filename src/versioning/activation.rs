//! Version activation.
//!
//! # Responsibilities
//! - Decide whether a version may register at all
//! - Remember versions refused because their metadata disables them
//! - Apply the include/exclude policy and the version-count limit
//! - Recompute the globally active version set at the end of a pass
//!
//! # Design Decisions
//! - Consulted once per registration attempt, never cached per request
//! - Unknown versions (absent from the catalog) are enabled
//! - An empty include list admits every version that is not excluded

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexSet;

use crate::config::{VersionMeta, VersioningConfig};

/// Whether a version is marked enabled in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    Unknown,
    Enabled,
    Disabled,
}

/// Descriptive version metadata with per-version enable flags.
#[derive(Debug, Clone, Default)]
pub struct VersionCatalog {
    versions: Vec<VersionMeta>,
    flags: HashMap<String, bool>,
}

impl VersionCatalog {
    pub fn new(versions: Vec<VersionMeta>) -> Self {
        let flags = versions
            .iter()
            .map(|v| (v.name.clone(), v.enabled))
            .collect();
        Self { versions, flags }
    }

    pub fn status(&self, version: &str) -> VersionStatus {
        match self.flags.get(version) {
            None => VersionStatus::Unknown,
            Some(true) => VersionStatus::Enabled,
            Some(false) => VersionStatus::Disabled,
        }
    }

    pub fn enabled_versions(&self) -> Vec<&str> {
        self.versions
            .iter()
            .filter(|v| v.enabled)
            .map(|v| v.name.as_str())
            .collect()
    }

    pub fn disabled_versions(&self) -> Vec<&str> {
        self.versions
            .iter()
            .filter(|v| !v.enabled)
            .map(|v| v.name.as_str())
            .collect()
    }

    pub fn entries(&self) -> &[VersionMeta] {
        &self.versions
    }

    /// Log every catalog entry.
    pub fn display(&self) {
        for meta in &self.versions {
            tracing::info!(
                version = %meta.name,
                author = %meta.author,
                desc = %meta.desc,
                enabled = meta.enabled,
                created = %meta.created,
                extra = ?meta.extra,
                "Version info"
            );
        }
    }
}

/// Whitelist/blacklist source.
pub trait VersionPolicy: Send + Sync {
    /// Version-level check used by the activation filter.
    fn admits(&self, version: &str) -> bool;

    /// Path-aware check made for each registration.
    fn is_version_allowed(&self, version: &str, path: &str) -> bool {
        let _ = path;
        self.admits(version)
    }

    /// Maximum number of distinct versions that may register.
    fn max_registered_versions(&self) -> usize;
}

/// Policy built from the `include`/`exclude` configuration.
#[derive(Debug, Clone)]
pub struct EnvironmentPolicy {
    include: Vec<String>,
    exclude: Vec<String>,
    max_versions: usize,
}

impl EnvironmentPolicy {
    pub fn new(include: Vec<String>, exclude: Vec<String>, max_versions: usize) -> Self {
        Self {
            include,
            exclude,
            max_versions,
        }
    }

    pub fn from_config(config: &VersioningConfig) -> Self {
        Self::new(
            config.include.clone(),
            config.exclude.clone(),
            config.max_versions,
        )
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }
}

impl VersionPolicy for EnvironmentPolicy {
    fn admits(&self, version: &str) -> bool {
        if self.exclude.iter().any(|v| v == version) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|v| v == version)
    }

    fn is_version_allowed(&self, version: &str, path: &str) -> bool {
        let allowed = self.admits(version);
        if !allowed {
            tracing::debug!(version = %version, path = %path, "Version filtered by include/exclude policy");
        }
        allowed
    }

    fn max_registered_versions(&self) -> usize {
        self.max_versions
    }
}

/// Activation bookkeeping for one registration pass.
#[derive(Debug, Clone, Default)]
pub struct ActivationState {
    unactivated: IndexSet<String>,
    active: BTreeSet<String>,
}

impl ActivationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unactivated(&self, version: &str) -> bool {
        self.unactivated.contains(version)
    }

    pub fn mark_unactivated(&mut self, version: &str) {
        self.unactivated.insert(version.to_string());
    }

    pub fn unactivated(&self) -> impl Iterator<Item = &str> {
        self.unactivated.iter().map(String::as_str)
    }

    /// Globally active versions computed by the last `finish_pass`.
    pub fn active(&self) -> &BTreeSet<String> {
        &self.active
    }

    /// Recompute the active set: the included versions (or every
    /// registered version when nothing is included), minus excluded and
    /// unactivated versions.
    pub fn finish_pass<'a>(
        &mut self,
        policy: &EnvironmentPolicy,
        registered: impl Iterator<Item = &'a str>,
    ) -> &BTreeSet<String> {
        let mut active: BTreeSet<String> = if policy.include().is_empty() {
            registered.map(str::to_string).collect()
        } else {
            policy.include().iter().cloned().collect()
        };
        for version in policy.exclude() {
            active.remove(version);
        }

        tracing::info!(
            include = ?policy.include(),
            exclude = ?policy.exclude(),
            "Computing active versions"
        );
        if !self.unactivated.is_empty() {
            tracing::info!(versions = ?self.unactivated, "Excluding versions disabled by metadata");
            for version in &self.unactivated {
                active.remove(version);
            }
        }
        tracing::info!(active = ?active, "Active versions");

        self.active = active;
        &self.active
    }
}

/// Answers whether a version may currently register.
pub struct ActivationFilter<'a> {
    catalog: &'a VersionCatalog,
    policy: &'a dyn VersionPolicy,
}

impl<'a> ActivationFilter<'a> {
    pub fn new(catalog: &'a VersionCatalog, policy: &'a dyn VersionPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Checks, in order: already unactivated, disabled by metadata
    /// (recorded as unactivated), include/exclude policy.
    pub fn is_active(&self, version: &str, state: &mut ActivationState) -> bool {
        if state.is_unactivated(version) {
            return false;
        }
        if self.catalog.status(version) == VersionStatus::Disabled {
            state.mark_unactivated(version);
            return false;
        }
        self.policy.admits(version)
    }
}
