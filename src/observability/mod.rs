//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registration, lookup, hooks produce:
//!     → logging.rs (structured log events: conflicts, rejections, reloads)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`version`, `path`, `declaring_type`) on every event
//! - Request ID flows through the HTTP trace span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
