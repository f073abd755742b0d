//! Pluggable registration behavior.
//!
//! The registration engine delegates four decisions to a
//! [`RegistrationHelper`]: how conflicts are reported, how a mapping is
//! moved to its version-prefixed path, how priorities compare, and how the
//! declared path is read from a mapping. [`DefaultRegistrationHelper`] is
//! used unless another implementation is injected.

use std::fmt;

use thiserror::Error;

use crate::routing::{PatternError, RouteMapping};
use crate::versioning::ordering::SortingMethod;

/// Metadata that the engine cannot interpret. These propagate to the host.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("endpoint declared by '{declaring_type}' has no path pattern")]
    MissingPath { declaring_type: String },

    #[error("failed to build versioned pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// Structured diagnostic for two endpoints claiming the same final path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub declaring_type: String,
    pub source_location: Option<String>,
    /// Path as declared, before version prefixing.
    pub path: String,
    pub version: Option<String>,
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "endpoint {} conflicts with an identical path (declared by {}, source {}, version {})",
            self.path,
            self.declaring_type,
            self.source_location.as_deref().unwrap_or("unknown"),
            self.version.as_deref().unwrap_or("none"),
        )
    }
}

/// Registration decisions that callers may substitute.
pub trait RegistrationHelper: Send + Sync {
    /// Emit a conflict diagnostic. Called once per conflicting candidate.
    fn report_conflict(&self, conflict: &ConflictReport);

    /// Build the mapping registered under `final_path`, keeping methods
    /// and matcher strategy.
    fn inject_path(
        &self,
        mapping: &RouteMapping,
        final_path: &str,
    ) -> Result<RouteMapping, RegistrationError>;

    /// Does `candidate` beat `existing`?
    fn outranks(&self, sorting: SortingMethod, candidate: i32, existing: i32) -> bool {
        sorting.outranks(candidate, existing)
    }

    /// The path the endpoint author declared.
    fn extract_path(
        &self,
        mapping: &RouteMapping,
        declaring_type: &str,
    ) -> Result<String, RegistrationError>;
}

/// Built-in helper: conflicts go to the error log.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRegistrationHelper;

impl RegistrationHelper for DefaultRegistrationHelper {
    fn report_conflict(&self, conflict: &ConflictReport) {
        tracing::error!(
            path = %conflict.path,
            declaring_type = %conflict.declaring_type,
            source_location = conflict.source_location.as_deref().unwrap_or("unknown"),
            version = conflict.version.as_deref().unwrap_or("none"),
            "Duplicate endpoint path, registration stopped"
        );
    }

    fn inject_path(
        &self,
        mapping: &RouteMapping,
        final_path: &str,
    ) -> Result<RouteMapping, RegistrationError> {
        Ok(RouteMapping {
            matcher: mapping.matcher.with_pattern(final_path)?,
            methods: mapping.methods.clone(),
        })
    }

    fn extract_path(
        &self,
        mapping: &RouteMapping,
        declaring_type: &str,
    ) -> Result<String, RegistrationError> {
        let path = mapping.pattern();
        if path.is_empty() {
            return Err(RegistrationError::MissingPath {
                declaring_type: declaring_type.to_string(),
            });
        }
        Ok(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{MatcherKind, PathMatcher};
    use axum::http::Method;

    #[test]
    fn test_inject_path_keeps_methods_and_kind() {
        let mapping = RouteMapping::new(PathMatcher::tree("/api/{id}").unwrap())
            .with_methods([Method::GET, Method::HEAD]);

        let injected = DefaultRegistrationHelper
            .inject_path(&mapping, "/v2/api/{id}")
            .unwrap();
        assert_eq!(injected.pattern(), "/v2/api/{id}");
        assert_eq!(injected.matcher.kind(), MatcherKind::Tree);
        assert_eq!(injected.methods, vec![Method::GET, Method::HEAD]);
    }

    #[test]
    fn test_extract_path_requires_pattern() {
        let empty = RouteMapping::new(PathMatcher::exact(""));
        let err = DefaultRegistrationHelper
            .extract_path(&empty, "Broken")
            .unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_conflict_report_display() {
        let report = ConflictReport {
            declaring_type: "HelloV1".into(),
            source_location: None,
            path: "/api/hello".into(),
            version: Some("v1".into()),
        };
        let text = report.to_string();
        assert!(text.contains("/api/hello"));
        assert!(text.contains("unknown"));
        assert!(text.contains("v1"));
    }
}
