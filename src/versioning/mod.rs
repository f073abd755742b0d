//! Version-aware registration and lookup.
//!
//! # Data Flow
//! ```text
//! Registration (startup, and every config reload into a fresh snapshot):
//!     RegistrationCandidate (handler + metadata + mapping)
//!     → registration.rs
//!         → activation.rs (catalog flags, include/exclude, limit)
//!         → ordering.rs (MAX / MIN tie-break)
//!         → helper.rs (path extraction, prefix injection, conflict report)
//!     → routing::RouteTable (register / unregister)
//!     → index.rs (version → paths, final path → priority)
//!
//! Lookup (per request, read-only):
//!     request path
//!     → lookup.rs
//!         → allow_list.rs (file-controlled versions)
//!         → index.rs (versions in registration order)
//!     → routing::RouteTable scan
//!     → route entry or NotFound
//! ```
//!
//! # Design Decisions
//! - All registration state is owned by one snapshot and passed by `&mut`
//! - Lookup never mutates; concurrent requests share the snapshot via `Arc`
//! - Behavior hooks (conflict reporting, path rewriting) are injected
//!   through the `RegistrationHelper` trait

pub mod activation;
pub mod allow_list;
pub mod helper;
pub mod index;
pub mod lookup;
pub mod metadata;
pub mod ordering;
pub mod registration;

pub use activation::{
    ActivationFilter, ActivationState, EnvironmentPolicy, VersionCatalog, VersionPolicy,
    VersionStatus,
};
pub use allow_list::{AllowListError, FileAllowList};
pub use helper::{ConflictReport, DefaultRegistrationHelper, RegistrationError, RegistrationHelper};
pub use index::VersionIndex;
pub use lookup::{LookupEngine, LookupError};
pub use metadata::{RegistrationCandidate, RouteMetadata};
pub use ordering::{SortingMethod, SortingMethodError};
pub use registration::{
    Rejection, RegistrationEngine, RegistrationOutcome, RegistrationSettings, RegistrationState,
};
