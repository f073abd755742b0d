//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CoexistConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Version prefixing, filtering, and priority policy.
    pub versioning: VersioningConfig,

    /// Descriptive version catalog; also carries per-version enable flags.
    pub versions_info: VersionsInfoConfig,

    /// File-based allow-list of versions reachable at lookup time.
    pub file_control: FileControlConfig,

    /// Hook execution settings.
    pub hooks: HookConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// How non-conflicting rejections are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RejectionLog {
    Silent,
    #[default]
    Info,
    Warn,
}

/// Versioning policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Master switch; when off every endpoint registers unchanged.
    pub enabled: bool,

    /// Whitelist of versions. Empty admits every version not excluded.
    pub include: Vec<String>,

    /// Blacklist of versions.
    pub exclude: Vec<String>,

    /// Maximum number of distinct versions that may register. Once reached,
    /// every versioned candidate is refused.
    pub max_versions: usize,

    /// Apply `max_versions` only to versions not yet registered, so known
    /// versions keep registering endpoints after the limit is reached.
    pub limit_new_versions_only: bool,

    /// Priority tie-break mode: "MAX" or "MIN".
    pub sorting_method: String,

    /// Logging of rejected (non-conflicting) registrations.
    pub rejection_log: RejectionLog,

    /// Reserved path that bypasses version lookup.
    pub error_path: String,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include: Vec::new(),
            exclude: Vec::new(),
            max_versions: 10,
            limit_new_versions_only: false,
            sorting_method: "MAX".to_string(),
            rejection_log: RejectionLog::Info,
            error_path: "/error".to_string(),
        }
    }
}

/// Descriptive information about one version.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersionMeta {
    pub name: String,
    pub author: String,
    pub desc: String,
    /// Disabled versions never register.
    pub enabled: bool,
    pub created: String,
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for VersionMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            author: String::new(),
            desc: String::new(),
            enabled: true,
            created: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Version catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VersionsInfoConfig {
    /// Log the catalog at startup.
    pub display: bool,

    pub versions: Vec<VersionMeta>,
}

/// File-based version allow-list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileControlConfig {
    pub enabled: bool,

    /// File path; `VersionConfig.txt` is appended unless it ends in `.txt`.
    pub path: String,

    /// Reload interval in milliseconds; 0 disables periodic reload.
    pub refresh_ms: u64,
}

impl Default for FileControlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: String::new(),
            refresh_ms: 5000,
        }
    }
}

/// Hook execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HookConfig {
    /// Size of the async hook worker pool.
    pub workers: usize,

    /// Retries after the first failed attempt.
    pub max_retry: u32,

    /// Fixed delay between attempts in milliseconds.
    pub retry_interval_ms: u64,

    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_retry: 3,
            retry_interval_ms: 1000,
            timeout_ms: 5000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
