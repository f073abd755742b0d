//! Version and priority bookkeeping.
//!
//! # Responsibilities
//! - Map each version tag to the paths registered under it
//! - Map each final path to the priority of its current winner
//!
//! # Design Decisions
//! - Versions iterate in first-registration order (`IndexMap`); lookup
//!   relies on this to make "first version wins" well defined
//! - Duplicate paths under a version are kept; lookup is unaffected
//! - Owned by one routing snapshot; mutation needs `&mut`

use std::collections::HashMap;

use indexmap::IndexMap;

/// Version → paths and final path → priority indexes.
#[derive(Debug, Clone, Default)]
pub struct VersionIndex {
    version_paths: IndexMap<String, Vec<String>>,
    path_priority: HashMap<String, i32>,
}

impl VersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` is exposed under `version`.
    pub fn record_path(&mut self, version: &str, path: impl Into<String>) {
        self.version_paths
            .entry(version.to_string())
            .or_default()
            .push(path.into());
    }

    /// Paths recorded for `version`, empty if none.
    pub fn paths_of(&self, version: &str) -> &[String] {
        self.version_paths
            .get(version)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_path(&self, version: &str, path: &str) -> bool {
        self.paths_of(version).iter().any(|p| p == path)
    }

    pub fn set_priority(&mut self, final_path: impl Into<String>, value: i32) {
        self.path_priority.insert(final_path.into(), value);
    }

    pub fn priority_of(&self, final_path: &str) -> Option<i32> {
        self.path_priority.get(final_path).copied()
    }

    /// Forget the winner of `final_path`, returning its priority.
    pub fn remove_priority(&mut self, final_path: &str) -> Option<i32> {
        self.path_priority.remove(final_path)
    }

    /// Known versions in registration order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.version_paths.keys().map(String::as_str)
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.version_paths.contains_key(version)
    }

    pub fn version_count(&self) -> usize {
        self.version_paths.len()
    }
}
