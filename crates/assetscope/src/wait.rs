//! Wait Policy
//!
//! Condition-based synchronization: pause until the application is ready,
//! never for a fixed number of milliseconds.
//!
//! Contracts:
//! - a condition that already holds returns without sleeping;
//! - between checks the waiter sleeps `min(poll_interval, remaining)`, so it
//!   never busy-loops and never oversleeps the deadline by more than one poll;
//! - the condition is re-checked after the final sleep before a timeout is
//!   reported.

use crate::result::{SuiteError, SuiteResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Floor for the polling interval; a zero interval would spin.
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration (never below [`MIN_POLL_INTERVAL_MS`])
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

/// Trait for wait conditions
pub trait WaitCondition {
    /// Check if the condition is satisfied
    fn check(&self) -> bool;

    /// Get description for error messages
    fn description(&self) -> String;
}

/// A function-based wait condition
pub struct FnCondition<F: Fn() -> bool> {
    func: F,
    description: String,
}

impl<F: Fn() -> bool> std::fmt::Debug for FnCondition<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F: Fn() -> bool> FnCondition<F> {
    /// Create a new function condition
    pub fn new(func: F, description: impl Into<String>) -> Self {
        Self {
            func,
            description: description.into(),
        }
    }
}

impl<F: Fn() -> bool> WaitCondition for FnCondition<F> {
    fn check(&self) -> bool {
        (self.func)()
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was evaluated
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

/// Waiter for synchronization operations
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom default options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Default options used by the `*_default` helpers
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Wait for a condition.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if the condition never held.
    pub fn wait_for<C: WaitCondition + ?Sized>(
        &self,
        condition: &C,
        options: &WaitOptions,
    ) -> SuiteResult<WaitResult> {
        let description = condition.description();
        poll_loop(|| condition.check().then_some(()), options, &description)
            .map(|((), result)| result)
    }

    /// Wait for a closure to return true, using the waiter's default options.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if the closure never returned true.
    pub fn until<F>(&self, description: &str, predicate: F) -> SuiteResult<WaitResult>
    where
        F: FnMut() -> bool,
    {
        self.until_with(description, &self.options, predicate)
    }

    /// Wait for a closure to return true with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if the closure never returned true.
    pub fn until_with<F>(
        &self,
        description: &str,
        options: &WaitOptions,
        mut predicate: F,
    ) -> SuiteResult<WaitResult>
    where
        F: FnMut() -> bool,
    {
        poll_loop(|| predicate().then_some(()), options, description).map(|((), result)| result)
    }

    /// Poll until the probe produces a value, using default options.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if the probe never produced one.
    pub fn poll_for<T, F>(&self, description: &str, probe: F) -> SuiteResult<T>
    where
        F: FnMut() -> Option<T>,
    {
        poll_loop(probe, &self.options, description).map(|(value, _)| value)
    }

    /// Poll until the probe produces a value with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::TimeoutExceeded`] if the probe never produced one.
    pub fn poll_for_with<T, F>(
        &self,
        description: &str,
        options: &WaitOptions,
        probe: F,
    ) -> SuiteResult<T>
    where
        F: FnMut() -> Option<T>,
    {
        poll_loop(probe, options, description).map(|(value, _)| value)
    }
}

fn poll_loop<T, F>(
    mut probe: F,
    options: &WaitOptions,
    description: &str,
) -> SuiteResult<(T, WaitResult)>
where
    F: FnMut() -> Option<T>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let poll_interval = options.poll_interval();
    let mut polls: u32 = 1;

    if let Some(value) = probe() {
        return Ok((value, finished(start, polls, description)));
    }

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(poll_interval.min(deadline - now));
        polls += 1;
        if let Some(value) = probe() {
            return Ok((value, finished(start, polls, description)));
        }
    }

    debug!(waited_for = description, polls, "wait timed out");
    Err(SuiteError::TimeoutExceeded {
        ms: options.timeout_ms,
        waited_for: description.to_string(),
    })
}

fn finished(start: Instant, polls: u32, description: &str) -> WaitResult {
    let result = WaitResult {
        elapsed: start.elapsed(),
        polls,
        waited_for: description.to_string(),
    };
    if polls > 1 {
        debug!(
            waited_for = description,
            polls,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "condition met"
        );
    }
    result
}

/// Lets callers decide that a timeout means "absent" rather than "failed".
pub trait TimeoutExt<T> {
    /// Turn [`SuiteError::TimeoutExceeded`] into `Ok(None)`
    ///
    /// # Errors
    ///
    /// Any error other than a timeout is passed through.
    fn timeout_as_none(self) -> SuiteResult<Option<T>>;
}

impl<T> TimeoutExt<T> for SuiteResult<T> {
    fn timeout_as_none(self) -> SuiteResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_chained() {
            let opts = WaitOptions::new().with_timeout(500).with_poll_interval(20);
            assert_eq!(opts.timeout(), Duration::from_millis(500));
            assert_eq!(opts.poll_interval(), Duration::from_millis(20));
        }

        #[test]
        fn test_zero_poll_interval_is_floored() {
            let opts = WaitOptions::new().with_poll_interval(0);
            assert_eq!(opts.poll_interval(), Duration::from_millis(MIN_POLL_INTERVAL_MS));
        }
    }

    mod waiter_tests {
        use super::*;

        #[test]
        fn test_already_true_returns_without_sleeping() {
            let checks = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(5_000).with_poll_interval(1_000);
            let result = Waiter::new()
                .until_with("ready", &opts, || {
                    checks.set(checks.get() + 1);
                    true
                })
                .unwrap();
            assert_eq!(checks.get(), 1);
            assert_eq!(result.polls, 1);
            assert!(result.elapsed < Duration::from_millis(500));
        }

        #[test]
        fn test_becomes_true_after_some_polls() {
            let checks = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(2_000).with_poll_interval(5);
            let result = Waiter::new()
                .until_with("third time", &opts, || {
                    checks.set(checks.get() + 1);
                    checks.get() >= 3
                })
                .unwrap();
            assert_eq!(result.polls, 3);
            assert_eq!(result.waited_for, "third time");
        }

        #[test]
        fn test_timeout_is_close_to_configured() {
            let opts = WaitOptions::new().with_timeout(120).with_poll_interval(20);
            let start = Instant::now();
            let err = Waiter::new()
                .until_with("never", &opts, || false)
                .unwrap_err();
            let elapsed = start.elapsed();

            assert!(matches!(
                err,
                SuiteError::TimeoutExceeded { ms: 120, ref waited_for } if waited_for == "never"
            ));
            assert!(elapsed >= Duration::from_millis(120), "returned early: {elapsed:?}");
            // one poll interval plus scheduler slack
            assert!(elapsed < Duration::from_millis(120 + 20 + 250), "overslept: {elapsed:?}");
        }

        #[test]
        fn test_rechecks_after_final_sleep() {
            let start = Instant::now();
            let opts = WaitOptions::new().with_timeout(60).with_poll_interval(25);
            let result = Waiter::new().until_with("deadline reached", &opts, || {
                start.elapsed() >= Duration::from_millis(60)
            });
            assert!(result.is_ok(), "condition true at the deadline must succeed");
        }

        #[test]
        fn test_poll_for_returns_value() {
            let n = Cell::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let value = Waiter::new()
                .poll_for_with("value", &opts, || {
                    n.set(n.get() + 1);
                    (n.get() == 2).then(|| "found".to_string())
                })
                .unwrap();
            assert_eq!(value, "found");
        }

        #[test]
        fn test_wait_for_condition_object() {
            let cond = FnCondition::new(|| true, "always");
            let result = Waiter::new().wait_for(&cond, &WaitOptions::new()).unwrap();
            assert_eq!(result.waited_for, "always");
            assert!(format!("{cond:?}").contains("always"));
        }
    }

    mod timeout_ext_tests {
        use super::*;

        #[test]
        fn test_timeout_becomes_none() {
            let r: SuiteResult<u8> = Err(SuiteError::TimeoutExceeded {
                ms: 1,
                waited_for: "x".into(),
            });
            assert!(r.timeout_as_none().unwrap().is_none());
        }

        #[test]
        fn test_other_errors_pass_through() {
            let r: SuiteResult<u8> = Err(SuiteError::assertion("boom"));
            assert!(r.timeout_as_none().is_err());
            let ok: SuiteResult<u8> = Ok(7);
            assert_eq!(ok.timeout_as_none().unwrap(), Some(7));
        }
    }
}
