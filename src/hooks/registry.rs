//! Named hook table.
//!
//! Hooks are registered by symbolic name at startup and looked up by the
//! dispatcher when an endpoint's bindings fire. Every hook has the same
//! signature: it receives the call arguments, the handler result (if any),
//! and the failure cause (if any).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Failure of one hook attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("hook failed: {0}")]
    Failed(String),

    #[error("hook timed out after {0:?}")]
    Timeout(Duration),

    #[error("hook panicked: {0}")]
    Panicked(String),
}

impl HookError {
    pub fn failed(reason: impl Into<String>) -> Self {
        HookError::Failed(reason.into())
    }
}

/// What a hook sees: arguments, result, failure cause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookContext {
    pub arguments: Value,
    pub result: Option<Value>,
    pub failure: Option<String>,
}

impl HookContext {
    /// Context for hooks running before the handler.
    pub fn before(arguments: Value) -> Self {
        Self {
            arguments,
            result: None,
            failure: None,
        }
    }

    /// Context for hooks running after the handler.
    pub fn after(arguments: Value, outcome: Result<&Value, &str>) -> Self {
        match outcome {
            Ok(result) => Self {
                arguments,
                result: Some(result.clone()),
                failure: None,
            },
            Err(cause) => Self {
                arguments,
                result: None,
                failure: Some(cause.to_string()),
            },
        }
    }
}

pub type HookFn = Arc<dyn Fn(&HookContext) -> Result<(), HookError> + Send + Sync>;

/// Name → hook function table, built once at startup.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<String, HookFn>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` under `name`, replacing any previous hook.
    pub fn register<F>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(&HookContext) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.hooks.insert(name.clone(), Arc::new(hook)).is_some() {
            tracing::warn!(hook = %name, "Hook registered twice, previous one replaced");
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<HookFn> {
        self.hooks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Registered hook names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}
