//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject an unrecognized priority sorting mode before anything registers
//! - Validate value ranges (limits > 0, timeouts > 0)
//! - Detect versions that are both included and excluded
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CoexistConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::CoexistConfig;
use crate::versioning::ordering::{SortingMethod, SortingMethodError};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    SortingMethod(#[from] SortingMethodError),

    #[error("versioning.max_versions must be greater than zero")]
    ZeroMaxVersions,

    #[error("hooks.workers must be greater than zero")]
    ZeroHookWorkers,

    #[error("hooks.timeout_ms must be greater than zero")]
    ZeroHookTimeout,

    #[error("file_control.path must be set when file_control is enabled")]
    MissingAllowListPath,

    #[error("version '{0}' is both included and excluded")]
    IncludedAndExcluded(String),

    #[error("invalid listener.bind_address '{0}'")]
    InvalidBindAddress(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &CoexistConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.versioning.sorting_method.parse::<SortingMethod>() {
        errors.push(ValidationError::SortingMethod(e));
    }

    if config.versioning.max_versions == 0 {
        errors.push(ValidationError::ZeroMaxVersions);
    }

    if config.hooks.workers == 0 {
        errors.push(ValidationError::ZeroHookWorkers);
    }

    if config.hooks.timeout_ms == 0 {
        errors.push(ValidationError::ZeroHookTimeout);
    }

    if config.file_control.enabled && config.file_control.path.trim().is_empty() {
        errors.push(ValidationError::MissingAllowListPath);
    }

    for version in &config.versioning.include {
        if config.versioning.exclude.contains(version) {
            errors.push(ValidationError::IncludedAndExcluded(version.clone()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
