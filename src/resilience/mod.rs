//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Async hook submission:
//!     → retries.rs (acquire worker permit)
//!     → attempt on the blocking pool, bounded by timeout
//!     → on failure: fixed-delay sleep, retry until max_retry
//!     → on_success / on_failure (exactly one, exactly once)
//! ```
//!
//! # Design Decisions
//! - The submitting request never waits on the executor
//! - Retry delay is fixed, not exponential
//! - Every attempt has a deadline

pub mod retries;

pub use retries::{AsyncRetryExecutor, RetryPolicy, RetryTask};
