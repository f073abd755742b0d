//! Hook dispatch around endpoint handlers.
//!
//! # Responsibilities
//! - Order an endpoint's bindings by `order`
//! - Run sync hooks inline, isolating their failures from the request
//! - Hand async hooks to the retry executor
//!
//! # Design Decisions
//! - Unknown hook names are skipped with a warning
//! - A panicking sync hook is caught and logged
//! - Equal `order` values keep declaration order

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::hooks::registry::{HookContext, HookError, HookRegistry};
use crate::observability::metrics;
use crate::resilience::{AsyncRetryExecutor, RetryTask};

/// Whether a hook runs inline or on the retry executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sync,
    Async,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sync => "sync",
            ExecutionMode::Async => "async",
        }
    }
}

/// One hook attached to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookBinding {
    pub name: String,
    pub order: i32,
    pub mode: ExecutionMode,
}

impl HookBinding {
    pub fn sync(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
            mode: ExecutionMode::Sync,
        }
    }

    pub fn asynchronous(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
            mode: ExecutionMode::Async,
        }
    }
}

/// Runs hook bindings against the registry.
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
    executor: AsyncRetryExecutor,
}

impl HookDispatcher {
    pub fn new(registry: Arc<HookRegistry>, executor: AsyncRetryExecutor) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &AsyncRetryExecutor {
        &self.executor
    }

    /// Hooks declared to run before the handler.
    pub fn run_before(&self, bindings: &[HookBinding], arguments: Value) {
        self.dispatch("before", bindings, HookContext::before(arguments));
    }

    /// Hooks running after the handler, with its result or failure.
    pub fn run_after(&self, bindings: &[HookBinding], arguments: Value, outcome: Result<&Value, &str>) {
        self.dispatch("after", bindings, HookContext::after(arguments, outcome));
    }

    fn dispatch(&self, phase: &'static str, bindings: &[HookBinding], ctx: HookContext) {
        if bindings.is_empty() {
            return;
        }

        let mut ordered: Vec<&HookBinding> = bindings.iter().collect();
        ordered.sort_by_key(|b| b.order);
        let ctx = Arc::new(ctx);

        for binding in ordered {
            let Some(hook) = self.registry.get(&binding.name) else {
                tracing::warn!(hook = %binding.name, phase, "Hook not registered, skipped");
                metrics::record_hook_run(binding.mode.as_str(), "missing");
                continue;
            };

            match binding.mode {
                ExecutionMode::Sync => {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| hook(ctx.as_ref())))
                        .unwrap_or_else(|_| Err(HookError::Panicked(binding.name.clone())));
                    match result {
                        Ok(()) => metrics::record_hook_run("sync", "ok"),
                        Err(e) => {
                            tracing::error!(hook = %binding.name, phase, error = %e, "Sync hook failed");
                            metrics::record_hook_run("sync", "error");
                        }
                    }
                }
                ExecutionMode::Async => {
                    let task_ctx = Arc::clone(&ctx);
                    let task: RetryTask = Arc::new(move || hook(task_ctx.as_ref()));
                    let failed_name = binding.name.clone();
                    let ok_name = binding.name.clone();
                    self.executor.submit_with_retry(
                        task,
                        move |e| {
                            tracing::warn!(hook = %failed_name, phase, error = %e, "Async hook failed after retries");
                            metrics::record_hook_run("async", "error");
                        },
                        move || {
                            tracing::debug!(hook = %ok_name, phase, "Async hook completed");
                            metrics::record_hook_run("async", "ok");
                        },
                    );
                }
            }
        }
    }
}
