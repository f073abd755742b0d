//! Endpoint hooks.
//!
//! # Data Flow
//! ```text
//! startup:
//!     named closures → registry.rs (HookRegistry)
//!
//! per request (http::server):
//!     endpoint bindings (+ before flag)
//!     → dispatcher.rs (sort by order)
//!         → sync: inline, failures logged
//!         → async: resilience::AsyncRetryExecutor
//! ```
//!
//! # Design Decisions
//! - Hooks are resolved by name from a table built at startup
//! - One signature for every hook: arguments, result, failure cause
//! - Hook failures never reach the client

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{ExecutionMode, HookBinding, HookDispatcher};
pub use registry::{HookContext, HookError, HookFn, HookRegistry};
