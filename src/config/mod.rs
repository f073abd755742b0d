//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, sorting mode)
//!     → CoexistConfig (validated, immutable)
//!     → registration pass builds a routing snapshot from it
//!
//! On reload:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new registration pass into a fresh snapshot
//!     → atomic swap; lookups observe the new snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, CoexistConfig, FileControlConfig, HookConfig, ListenerConfig,
    ObservabilityConfig, RejectionLog, VersionMeta, VersioningConfig, VersionsInfoConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
