//! Request path resolution.
//!
//! # Responsibilities
//! - Send the reserved error path straight to the host table
//! - Try each version prefix in registration order
//! - Refuse direct access to a recorded versioned path
//! - Fall back to matching the raw path against every route
//!
//! # Design Decisions
//! - Prefixed candidates compare by string equality with the pattern, never
//!   through the matcher
//! - The fallback dispatches on the matcher tag of each route; the first
//!   match in table order wins
//! - Lookups read a snapshot only; they never mutate registration state

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::observability::metrics;
use crate::routing::{HostRouteTable, Matcher, PathMatcher, RouteEntry};
use crate::versioning::allow_list::FileAllowList;
use crate::versioning::index::VersionIndex;

/// Lookup failures. Surfaced to clients as an ordinary 404.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no route for path '{path}'")]
    NotFound { path: String },
}

/// Resolves request paths against a registration snapshot.
#[derive(Debug, Clone)]
pub struct LookupEngine {
    error_path: String,
    allow_list: Option<Arc<FileAllowList>>,
}

impl LookupEngine {
    pub fn new(error_path: impl Into<String>) -> Self {
        Self {
            error_path: error_path.into(),
            allow_list: None,
        }
    }

    /// Restrict version prefixes to those present in `allow_list`.
    pub fn with_allow_list(mut self, allow_list: Arc<FileAllowList>) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    pub fn error_path(&self) -> &str {
        &self.error_path
    }

    pub fn allow_list(&self) -> Option<&Arc<FileAllowList>> {
        self.allow_list.as_ref()
    }

    /// Find the route serving `path`.
    pub fn resolve<'t, H, T>(
        &self,
        path: &str,
        index: &VersionIndex,
        table: &'t T,
    ) -> Result<&'t RouteEntry<H>, LookupError>
    where
        T: HostRouteTable<H>,
    {
        let start = Instant::now();
        let result = self.resolve_inner(path, index, table);
        let label = match &result {
            Ok(_) => "found",
            Err(_) => "not_found",
        };
        metrics::record_lookup(label, start);
        result
    }

    fn resolve_inner<'t, H, T>(
        &self,
        path: &str,
        index: &VersionIndex,
        table: &'t T,
    ) -> Result<&'t RouteEntry<H>, LookupError>
    where
        T: HostRouteTable<H>,
    {
        if path == self.error_path {
            return fallback_scan(path, table.all_routes()).ok_or_else(|| not_found(path));
        }

        let allowed = self.allow_list.as_ref().map(|list| list.currently_allowed());

        for version in index.versions() {
            if let Some(allowed) = &allowed {
                if !allowed.contains(version) {
                    tracing::trace!(version = %version, "Version not in allow-list, skipped");
                    continue;
                }
            }

            if index.contains_path(version, path) {
                tracing::debug!(version = %version, path = %path, "Direct request for a versioned path refused");
                return Err(not_found(path));
            }

            let candidate = format!("/{version}{path}");
            if let Some(route) = table
                .all_routes()
                .iter()
                .find(|r| r.mapping.matcher.pattern_equals(&candidate))
            {
                tracing::trace!(version = %version, route = %route.pattern(), "Resolved versioned route");
                return Ok(route);
            }
        }

        fallback_scan(path, table.all_routes()).ok_or_else(|| not_found(path))
    }
}

fn fallback_scan<'t, H>(path: &str, routes: &'t [RouteEntry<H>]) -> Option<&'t RouteEntry<H>> {
    routes.iter().find(|route| match &route.mapping.matcher {
        PathMatcher::Tree(pattern) => pattern.matches(path),
        PathMatcher::Glob(pattern) => pattern.matches(path),
        PathMatcher::Exact(pattern) => pattern == path,
    })
}

fn not_found(path: &str) -> LookupError {
    LookupError::NotFound {
        path: path.to_string(),
    }
}
