//! Endpoint metadata consumed by registration.

use crate::routing::RouteMapping;

/// Version, priority, and flags declared for one endpoint.
#[derive(Debug, Clone, Default)]
pub struct RouteMetadata {
    /// Version declared on the endpoint itself.
    pub method_version: Option<String>,
    /// Version declared on the enclosing group (controller, module).
    pub class_version: Option<String>,
    /// Explicit priority; `None` registers at priority 0.
    pub priority: Option<i32>,
    /// Skip all version logic and register the mapping unchanged.
    pub version_exempt: bool,
    /// Run hooks before the handler instead of after it.
    pub before_hooks: bool,
    /// Name of the type/group that declares the endpoint.
    pub declaring_type: String,
    /// Source file or module, when known.
    pub source_location: Option<String>,
}

impl RouteMetadata {
    pub fn new(declaring_type: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            ..Self::default()
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.method_version = Some(version.into());
        self
    }

    pub fn class_version(mut self, version: impl Into<String>) -> Self {
        self.class_version = Some(version.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn exempt(mut self) -> Self {
        self.version_exempt = true;
        self
    }

    pub fn before_hooks(mut self) -> Self {
        self.before_hooks = true;
        self
    }

    pub fn source(mut self, location: impl Into<String>) -> Self {
        self.source_location = Some(location.into());
        self
    }

    /// Endpoint-level version overrides the group-level one. Blank tags
    /// count as absent.
    pub fn resolved_version(&self) -> Option<&str> {
        fn pick(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }
        pick(&self.method_version).or_else(|| pick(&self.class_version))
    }
}

/// One registration event emitted by the host.
#[derive(Debug, Clone)]
pub struct RegistrationCandidate<H> {
    pub handler: H,
    pub metadata: RouteMetadata,
    pub mapping: RouteMapping,
}

impl<H> RegistrationCandidate<H> {
    pub fn new(handler: H, metadata: RouteMetadata, mapping: RouteMapping) -> Self {
        Self {
            handler,
            metadata,
            mapping,
        }
    }
}
