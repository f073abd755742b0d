//! Asynchronous retry executor.
//!
//! # Responsibilities
//! - Run a task off the caller's control flow on a bounded worker pool
//! - Bound every attempt with a wall-clock timeout
//! - Retry failed attempts on a fixed delay
//! - Report the final outcome exactly once
//!
//! # Design Decisions
//! - Pool size is a `Semaphore`; a submission holds its permit for the
//!   whole retry sequence, sleeps included
//! - Attempts run on the blocking pool since hooks are plain closures
//! - A timed-out attempt is reported as failed at the deadline, but its
//!   worker stays taken until the closure returns; the next retry never
//!   overlaps it
//! - A panicking attempt counts as a failure

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::HookConfig;
use crate::hooks::HookError;
use crate::observability::metrics;

/// Retry limits for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retry: u32,
    /// Fixed delay between attempts.
    pub retry_interval: Duration,
    /// Wall-clock bound per attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry: 3,
            retry_interval: Duration::from_millis(1000),
            timeout: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &HookConfig) -> Self {
        Self {
            max_retry: config.max_retry,
            retry_interval: Duration::from_millis(config.retry_interval_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Initial attempt plus retries.
    pub fn max_attempts(&self) -> u32 {
        self.max_retry.saturating_add(1)
    }
}

/// A retryable unit of work.
pub type RetryTask = Arc<dyn Fn() -> Result<(), HookError> + Send + Sync>;

/// Fixed-size pool running tasks with per-attempt timeout and fixed-delay retry.
#[derive(Debug, Clone)]
pub struct AsyncRetryExecutor {
    handle: Handle,
    permits: Arc<Semaphore>,
    workers: usize,
    policy: RetryPolicy,
}

impl AsyncRetryExecutor {
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(workers: usize, policy: RetryPolicy) -> Self {
        Self::with_handle(Handle::current(), workers, policy)
    }

    pub fn with_handle(handle: Handle, workers: usize, policy: RetryPolicy) -> Self {
        let workers = workers.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            policy,
        }
    }

    pub fn from_config(config: &HookConfig) -> Self {
        Self::new(config.workers, RetryPolicy::from_config(config))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Workers not currently running a submission.
    pub fn idle_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `task` in the background. Returns immediately.
    ///
    /// `on_success` runs after the first successful attempt; `on_failure`
    /// runs with the last error once every attempt has failed. Exactly one
    /// of them runs.
    pub fn submit_with_retry<F, S>(&self, task: RetryTask, on_failure: F, on_success: S) -> JoinHandle<()>
    where
        F: FnOnce(HookError) + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let policy = self.policy;

        self.handle.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    on_failure(HookError::failed("executor shut down"));
                    return;
                }
            };

            let mut attempts: u32 = 0;
            loop {
                attempts += 1;
                metrics::record_hook_attempt();

                match run_attempt(&task, policy.timeout).await {
                    Ok(()) => {
                        tracing::debug!(attempts, "Task succeeded");
                        on_success();
                        return;
                    }
                    Err(e) if attempts > policy.max_retry => {
                        tracing::warn!(attempts, error = %e, "Task failed, retries exhausted");
                        on_failure(e);
                        return;
                    }
                    Err(e) => {
                        tracing::debug!(
                            attempt = attempts,
                            max_attempts = policy.max_attempts(),
                            error = %e,
                            "Task attempt failed, retrying"
                        );
                        tokio::time::sleep(policy.retry_interval).await;
                    }
                }
            }
        })
    }

    /// Stop accepting work; pending submissions fail immediately.
    pub fn close(&self) {
        self.permits.close();
    }
}

async fn run_attempt(task: &RetryTask, timeout: Duration) -> Result<(), HookError> {
    let task = Arc::clone(task);
    let mut attempt = tokio::task::spawn_blocking(move || task());

    let joined = match tokio::time::timeout(timeout, &mut attempt).await {
        Ok(joined) => joined,
        Err(_) => {
            tracing::debug!(timeout_ms = timeout.as_millis() as u64, "Attempt timed out, waiting for it to return");
            // Blocking closures cannot be cancelled; hold the worker until it exits.
            let _ = attempt.await;
            return Err(HookError::Timeout(timeout));
        }
    };

    match joined {
        Ok(result) => result,
        Err(join_error) if join_error.is_panic() => {
            Err(HookError::Panicked(panic_message(join_error.into_panic())))
        }
        Err(join_error) => Err(HookError::failed(join_error.to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use parking_lot::Mutex;

    fn fast_policy(max_retry: u32) -> RetryPolicy {
        RetryPolicy {
            max_retry,
            retry_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(500),
        }
    }

    struct Counters {
        attempts: Arc<AtomicU32>,
        failures: Arc<AtomicU32>,
        successes: Arc<AtomicU32>,
        last_error: Arc<Mutex<Option<HookError>>>,
    }

    impl Counters {
        fn new() -> Self {
            Self {
                attempts: Arc::new(AtomicU32::new(0)),
                failures: Arc::new(AtomicU32::new(0)),
                successes: Arc::new(AtomicU32::new(0)),
                last_error: Arc::new(Mutex::new(None)),
            }
        }

        fn submit(&self, executor: &AsyncRetryExecutor, fail_first: u32) -> JoinHandle<()> {
            let attempts = Arc::clone(&self.attempts);
            let task: RetryTask = Arc::new(move || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= fail_first {
                    Err(HookError::failed(format!("attempt {n}")))
                } else {
                    Ok(())
                }
            });
            let failures = Arc::clone(&self.failures);
            let last_error = Arc::clone(&self.last_error);
            let successes = Arc::clone(&self.successes);
            executor.submit_with_retry(
                task,
                move |e| {
                    failures.fetch_add(1, Ordering::SeqCst);
                    *last_error.lock() = Some(e);
                },
                move || {
                    successes.fetch_add(1, Ordering::SeqCst);
                },
            )
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_always_failing_task_stops_after_max_retry() {
        let executor = AsyncRetryExecutor::new(2, fast_policy(2));
        let counters = Counters::new();

        counters.submit(&executor, u32::MAX).await.unwrap();

        assert_eq!(counters.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(counters.failures.load(Ordering::SeqCst), 1);
        assert_eq!(counters.successes.load(Ordering::SeqCst), 0);
        assert_eq!(
            *counters.last_error.lock(),
            Some(HookError::Failed("attempt 3".into()))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_success_short_circuits() {
        let executor = AsyncRetryExecutor::new(2, fast_policy(5));
        let counters = Counters::new();

        counters.submit(&executor, 1).await.unwrap();

        assert_eq!(counters.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(counters.successes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.failures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_attempt_times_out() {
        let policy = RetryPolicy {
            max_retry: 0,
            retry_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(20),
        };
        let executor = AsyncRetryExecutor::new(1, policy);
        let (tx, rx) = tokio::sync::oneshot::channel();

        let task: RetryTask = Arc::new(|| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        });
        executor
            .submit_with_retry(task, move |e| { let _ = tx.send(e); }, || {})
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap(), HookError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_attempts_never_exceed_workers() {
        let policy = RetryPolicy {
            max_retry: 2,
            retry_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(10),
        };
        let executor = AsyncRetryExecutor::new(1, policy);
        let running = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));
        let calls = Arc::new(AtomicU32::new(0));

        let task: RetryTask = {
            let (running, peak, calls) = (Arc::clone(&running), Arc::clone(&peak), Arc::clone(&calls));
            Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(60));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
        };

        let first = executor.submit_with_retry(Arc::clone(&task), |_| {}, || {});
        let second = executor.submit_with_retry(task, |_| {}, || {});
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(running.load(Ordering::SeqCst), 0);
        assert_eq!(executor.idle_workers(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_counts_as_failure() {
        let executor = AsyncRetryExecutor::new(1, fast_policy(1));
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();

        let seen = Arc::clone(&calls);
        let task: RetryTask = Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            panic!("hook exploded");
        });
        executor
            .submit_with_retry(task, move |e| { let _ = tx.send(e); }, || {})
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(rx.await.unwrap(), HookError::Panicked("hook exploded".into()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_submit_does_not_block_caller() {
        let executor = AsyncRetryExecutor::new(1, fast_policy(0));
        let task: RetryTask = Arc::new(|| {
            std::thread::sleep(Duration::from_millis(100));
            Ok(())
        });

        let started = std::time::Instant::now();
        let handle = executor.submit_with_retry(task, |_| {}, || {});
        assert!(started.elapsed() < Duration::from_millis(50));

        handle.await.unwrap();
        assert_eq!(executor.idle_workers(), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from_config(&HookConfig::default());
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.max_attempts(), 4);
    }
}
