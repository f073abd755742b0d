//! In-process host route table.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Refuse a second route with an identical pattern
//! - Unregister a route by pattern
//! - Expose all routes for the lookup scan
//!
//! # Design Decisions
//! - Generic over the handler reference; the table never invokes handlers
//! - Registration order is preserved so "first match wins" is deterministic
//! - O(n) pattern scans (acceptable for typical route counts)

use axum::http::Method;
use thiserror::Error;

use crate::routing::matcher::{MatcherKind, PathMatcher};

/// Errors raised by the host route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    /// A live route already uses this exact pattern.
    #[error("duplicate route pattern '{0}'")]
    DuplicatePattern(String),
}

/// Pattern and methods of a route, before a handler is attached.
#[derive(Debug, Clone)]
pub struct RouteMapping {
    pub matcher: PathMatcher,
    /// Allowed methods; empty means any method.
    pub methods: Vec<Method>,
}

impl RouteMapping {
    pub fn new(matcher: PathMatcher) -> Self {
        Self {
            matcher,
            methods: Vec::new(),
        }
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// A live route in the host table.
#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    pub mapping: RouteMapping,
    pub handler: H,
}

impl<H> RouteEntry<H> {
    pub fn pattern(&self) -> &str {
        self.mapping.pattern()
    }

    pub fn kind(&self) -> MatcherKind {
        self.mapping.matcher.kind()
    }
}

/// The host framework's route table contract.
pub trait HostRouteTable<H> {
    /// Insert a route. Fails if a live route has the same pattern.
    fn register_route(&mut self, mapping: RouteMapping, handler: H) -> Result<(), RouteTableError>;

    /// Remove the route with this pattern, returning it if it existed.
    fn unregister_route(&mut self, pattern: &str) -> Option<RouteEntry<H>>;

    /// All live routes in registration order.
    fn all_routes(&self) -> &[RouteEntry<H>];
}

/// Default in-memory route table.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<RouteEntry<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Number of live routes declaring exactly this pattern.
    pub fn count_pattern(&self, pattern: &str) -> usize {
        self.routes.iter().filter(|r| r.pattern() == pattern).count()
    }

    pub fn get(&self, pattern: &str) -> Option<&RouteEntry<H>> {
        self.routes.iter().find(|r| r.pattern() == pattern)
    }
}

impl<H> HostRouteTable<H> for RouteTable<H> {
    fn register_route(&mut self, mapping: RouteMapping, handler: H) -> Result<(), RouteTableError> {
        if self.count_pattern(mapping.pattern()) > 0 {
            return Err(RouteTableError::DuplicatePattern(mapping.pattern().to_string()));
        }
        self.routes.push(RouteEntry { mapping, handler });
        Ok(())
    }

    fn unregister_route(&mut self, pattern: &str) -> Option<RouteEntry<H>> {
        let index = self.routes.iter().position(|r| r.pattern() == pattern)?;
        Some(self.routes.remove(index))
    }

    fn all_routes(&self) -> &[RouteEntry<H>] {
        &self.routes
    }
}
