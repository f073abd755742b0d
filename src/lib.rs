//! Version-aware routing for HTTP services.
//!
//! Several versions of one endpoint coexist in a single process: each
//! versioned endpoint is exposed under `/{version}{path}`, conflicting
//! registrations are settled by priority, and requests are resolved
//! through version prefixes before falling back to plain pattern matching.

// Core
pub mod routing;
pub mod versioning;

// Host integration
pub mod admin;
pub mod hooks;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::CoexistConfig;
pub use http::{Endpoint, EndpointDefinition, HttpServer, VersionedRouter};
pub use lifecycle::{Application, Shutdown};
pub use versioning::{LookupEngine, RegistrationEngine};
