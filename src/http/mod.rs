//! HTTP host integration.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace)
//!     → admin routes (if enabled) or fallback dispatcher
//!     → router.rs (current RoutingSnapshot → LookupEngine)
//!     → method check
//!     → request.rs (RequestContext: query, body, request ID)
//!     → hooks (before or after the handler)
//!     → endpoint handler
//!     → response.rs (JSON body, 404 / 405 routing failures)
//! ```

pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID};
pub use response::ApiError;
pub use router::{Endpoint, EndpointDefinition, HandlerFn, RouterError, RoutingSnapshot, VersionedRouter};
pub use server::{AppState, HttpServer};
