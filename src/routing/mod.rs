//! Host routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (driven by versioning::registration):
//!     RouteMapping + handler
//!     → table.rs (register / unregister by pattern)
//!
//! Lookup (driven by versioning::lookup):
//!     table.rs (all routes, registration order)
//!     → matcher.rs (exact / tree / glob strategy per route)
//!     → handler reference or NotFound
//! ```
//!
//! # Design Decisions
//! - One pattern per live route; duplicates are refused by the table
//! - Matcher strategy is chosen per route by whoever registers it
//! - Deterministic: registration order decides "first match"

pub mod matcher;
pub mod table;

pub use matcher::{Matcher, MatcherKind, PathMatcher, PatternError};
pub use table::{HostRouteTable, RouteEntry, RouteMapping, RouteTable, RouteTableError};
