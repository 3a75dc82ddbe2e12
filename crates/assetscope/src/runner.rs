//! Test Case Runner
//!
//! # Architecture
//!
//! ```text
//! run_scenario
//!   ├─ sink.create_test(meta)
//!   ├─ reset per policy ─► sign in if the login form shows
//!   ├─ fixtures.provision_all
//!   ├─ body(&mut TestContext)          panics caught, errors kept
//!   ├─ on failure: screenshot + step
//!   ├─ cleanup                         exactly once, every exit path
//!   ├─ fixtures.release_all
//!   └─ StepLog::finalize ─► TestOutcome ─► sink.finish
//! ```
//!
//! The runner is the only layer that turns a [`SuiteError`] into a recorded
//! outcome. Scenarios of a [`TestClass`] may opt out of the default reset
//! policy; the override is held by a [`ResetPolicyGuard`] and undone when the
//! class finishes.

use crate::config::{Credentials, SuiteConfig};
use crate::driver::Session;
use crate::fixture::{unique_name, Fixture, FixtureSet};
use crate::report::{ReportSink, StepLog, TestOutcome, TestStatus};
use crate::result::{SuiteError, SuiteResult};
use crate::screen::{Screen, ScreenObject};
use crate::screens::{AssetListScreen, LoginScreen};
use crate::wait::{TimeoutExt, WaitOptions};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How application state is prepared before each scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// Relaunch the app to its initial state before every scenario
    #[default]
    FreshPerTest,
    /// Keep the running app; scenarios start from the asset list
    NoReset,
}

impl std::fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FreshPerTest => f.write_str("fresh-per-test"),
            Self::NoReset => f.write_str("no-reset"),
        }
    }
}

impl std::str::FromStr for ResetPolicy {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fresh-per-test" | "fresh" => Ok(Self::FreshPerTest),
            "no-reset" | "noreset" => Ok(Self::NoReset),
            other => Err(SuiteError::Config {
                message: format!(
                    "unknown reset policy {other:?} (expected fresh-per-test or no-reset)"
                ),
            }),
        }
    }
}

/// Identity of a scenario as reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TestMeta {
    /// Screen module, e.g. `edit_asset`
    pub module: &'static str,
    /// Feature, e.g. `subtype_round_trip`
    pub feature: &'static str,
    /// What the scenario checks
    pub description: &'static str,
}

impl TestMeta {
    /// Create scenario metadata
    #[must_use]
    pub const fn new(
        module: &'static str,
        feature: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            module,
            feature,
            description,
        }
    }

    /// `module::feature`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}::{}", self.module, self.feature)
    }
}

type Body = Box<dyn Fn(&mut TestContext<'_>) -> SuiteResult<()>>;
type Cleanup = Box<dyn Fn(Screen<'_>) -> SuiteResult<()>>;
type FixtureFactory = Box<dyn Fn() -> Box<dyn Fixture>>;

/// One test scenario: a body of screen object calls ending in a
/// post-condition, an optional custom cleanup and declared fixtures.
pub struct Scenario {
    /// Reported identity
    pub meta: TestMeta,
    body: Body,
    cleanup: Option<Cleanup>,
    fixtures: Vec<FixtureFactory>,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("meta", &self.meta)
            .field("custom_cleanup", &self.cleanup.is_some())
            .field("fixtures", &self.fixtures.len())
            .finish()
    }
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub fn new<F>(meta: TestMeta, body: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> SuiteResult<()> + 'static,
    {
        Self {
            meta,
            body: Box::new(body),
            cleanup: None,
            fixtures: Vec::new(),
        }
    }

    /// Replace the default cleanup ([`AssetListScreen::return_home`])
    #[must_use]
    pub fn with_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: Fn(Screen<'_>) -> SuiteResult<()> + 'static,
    {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    /// Declare a fixture; `factory` builds a fresh one for every run
    #[must_use]
    pub fn with_fixture<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Fixture> + 'static,
    {
        self.fixtures.push(Box::new(factory));
        self
    }

    /// Case-insensitive match on id or description
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.to_lowercase();
        self.meta.id().to_lowercase().contains(&filter)
            || self.meta.description.to_lowercase().contains(&filter)
    }

    fn fixture_set(&self) -> FixtureSet {
        let mut set = FixtureSet::new();
        for factory in &self.fixtures {
            set.add(factory());
        }
        set
    }
}

/// Related scenarios sharing a reset policy.
#[derive(Debug)]
pub struct TestClass {
    name: &'static str,
    reset_override: Option<ResetPolicy>,
    scenarios: Vec<Scenario>,
}

impl TestClass {
    /// Create an empty class
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            reset_override: None,
            scenarios: Vec::new(),
        }
    }

    /// Run this class under `policy` instead of the runner's default
    #[must_use]
    pub const fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_override = Some(policy);
        self
    }

    /// Add a scenario
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Class name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Reset policy override, if any
    #[must_use]
    pub const fn reset_override(&self) -> Option<ResetPolicy> {
        self.reset_override
    }

    /// Scenarios in run order
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the class has no scenarios
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// What a scenario body sees while it runs.
pub struct TestContext<'a> {
    test_id: String,
    screen: Screen<'a>,
    credentials: &'a Credentials,
    fixtures: &'a FixtureSet,
    steps: &'a mut StepLog,
    screenshots: &'a mut Vec<String>,
    sink: &'a mut dyn ReportSink,
    checkpoint_screenshots: bool,
}

impl std::fmt::Debug for TestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("test_id", &self.test_id)
            .field("steps", &self.steps.len())
            .field("fixtures", &self.fixtures)
            .finish_non_exhaustive()
    }
}

impl<'a> TestContext<'a> {
    /// Interaction core for building screen objects
    #[must_use]
    pub const fn screen(&self) -> Screen<'a> {
        self.screen
    }

    /// The asset list; every scenario starts there
    #[must_use]
    pub const fn home(&self) -> AssetListScreen<'a> {
        AssetListScreen::new(self.screen)
    }

    /// Credentials the run signed in with
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        self.credentials
    }

    /// Value of a provisioned fixture.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Fixture`] if the scenario did not declare it.
    pub fn fixture(&self, name: &str) -> SuiteResult<String> {
        self.fixtures
            .value(name)
            .map(str::to_string)
            .ok_or_else(|| SuiteError::Fixture {
                message: format!("fixture '{name}' is not provisioned for {}", self.test_id),
            })
    }

    /// A name no existing data collides with
    #[must_use]
    pub fn unique_name(&self, prefix: &str) -> String {
        unique_name(prefix)
    }

    /// Record a step
    pub fn step(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(test = %self.test_id, %message, "step");
        if let Err(e) = self.sink.log_step(&message) {
            warn!(error = %e, "report sink rejected step");
        }
        self.steps.record(message);
    }

    /// Record a step with a screenshot when checkpoint screenshots are on.
    ///
    /// # Errors
    ///
    /// Propagates session errors from taking the screenshot.
    pub fn checkpoint(&mut self, message: impl Into<String>) -> SuiteResult<()> {
        if !self.checkpoint_screenshots {
            self.step(message);
            return Ok(());
        }
        let message = message.into();
        let shot = self.screen.session().screenshot()?;
        let reference = self.sink.log_step_with_screenshot(&message, &shot)?;
        self.steps.record_with_screenshot(message, reference.clone());
        self.screenshots.push(reference);
        Ok(())
    }
}

/// Restores the reset policy it replaced when dropped.
#[derive(Debug)]
#[must_use = "the override ends when the guard is dropped"]
pub struct ResetPolicyGuard<'r> {
    slot: &'r Cell<ResetPolicy>,
    previous: ResetPolicy,
}

impl Drop for ResetPolicyGuard<'_> {
    fn drop(&mut self) {
        debug!(restored = %self.previous, "reset policy override ended");
        self.slot.set(self.previous);
    }
}

/// Results from running one or more test classes
#[derive(Debug, Clone)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual outcomes
    pub outcomes: Vec<TestOutcome>,
    /// Total duration
    pub duration: Duration,
    /// Why the run stopped early, if it did
    pub aborted: Option<String>,
}

impl SuiteResults {
    fn empty(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            outcomes: Vec::new(),
            duration: Duration::ZERO,
            aborted: None,
        }
    }

    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_passed())
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_passed()).count()
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failed()).count()
    }

    /// Count skipped tests
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == TestStatus::Skipped)
            .count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Get pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.outcomes.len() as f64
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_failed())
            .collect()
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed, {} failed, {} skipped ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total(),
            self.failed_count(),
            self.skipped_count(),
            self.pass_rate() * 100.0
        )
    }
}

/// Runs scenarios against one session.
pub struct SuiteRunner<'s> {
    session: &'s dyn Session,
    wait: WaitOptions,
    max_scroll_attempts: u32,
    credentials: Credentials,
    reset_policy: Cell<ResetPolicy>,
    checkpoint_screenshots: bool,
    fail_fast: bool,
    filter: Option<String>,
}

impl std::fmt::Debug for SuiteRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("session", &self.session.session_id())
            .field("wait", &self.wait)
            .field("reset_policy", &self.reset_policy.get())
            .field("fail_fast", &self.fail_fast)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl<'s> SuiteRunner<'s> {
    /// Create a runner over `session` using `config`'s wait, reset and
    /// credential settings
    #[must_use]
    pub fn new(session: &'s dyn Session, config: &SuiteConfig) -> Self {
        Self {
            session,
            wait: config.wait,
            max_scroll_attempts: config.max_scroll_attempts,
            credentials: config.credentials.clone(),
            reset_policy: Cell::new(config.reset_policy),
            checkpoint_screenshots: config.screenshot_checkpoints,
            fail_fast: false,
            filter: None,
        }
    }

    /// Stop at the first failure; later scenarios are reported skipped
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Only run scenarios matching `filter`
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// The reset policy currently in force
    #[must_use]
    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy.get()
    }

    /// Use `policy` until the returned guard is dropped
    pub fn override_reset_policy(&self, policy: ResetPolicy) -> ResetPolicyGuard<'_> {
        let previous = self.reset_policy.replace(policy);
        debug!(%previous, override_with = %policy, "reset policy overridden");
        ResetPolicyGuard {
            slot: &self.reset_policy,
            previous,
        }
    }

    /// Interaction core over the runner's session
    #[must_use]
    pub fn screen(&self) -> Screen<'s> {
        Screen::new(self.session, self.wait).with_max_scroll_attempts(self.max_scroll_attempts)
    }

    fn selects(&self, scenario: &Scenario) -> bool {
        self.filter.as_deref().map_or(true, |f| scenario.matches(f))
    }

    /// Run one scenario and report its outcome.
    pub fn run_scenario(&self, scenario: &Scenario, sink: &mut dyn ReportSink) -> TestOutcome {
        self.execute(scenario, sink).0
    }

    /// Run one class's scenarios under its reset policy.
    pub fn run_class(&self, class: &TestClass, sink: &mut dyn ReportSink) -> SuiteResults {
        let mut results = SuiteResults::empty(class.name());
        let start = Instant::now();
        self.run_class_into(class, sink, &mut results);
        results.duration = start.elapsed();
        results
    }

    /// Run several classes in order as one suite.
    pub fn run_all(&self, classes: &[TestClass], sink: &mut dyn ReportSink) -> SuiteResults {
        let mut results = SuiteResults::empty("assetscope");
        let start = Instant::now();
        for class in classes {
            self.run_class_into(class, sink, &mut results);
        }
        results.duration = start.elapsed();
        info!(summary = %results.summary(), "suite finished");
        results
    }

    fn run_class_into(&self, class: &TestClass, sink: &mut dyn ReportSink, results: &mut SuiteResults) {
        let _guard = class.reset_override().map(|p| self.override_reset_policy(p));
        info!(class = class.name(), policy = %self.reset_policy(), "running class");

        for scenario in class.scenarios().iter().filter(|s| self.selects(s)) {
            if let Some(reason) = &results.aborted {
                let outcome = TestOutcome::skipped(&scenario.meta, reason.clone());
                if let Err(e) = sink.finish(&outcome) {
                    warn!(error = %e, "report sink rejected outcome");
                }
                results.outcomes.push(outcome);
                continue;
            }

            let (outcome, fatal) = self.execute(scenario, sink);
            if outcome.status.is_failed() && (fatal || self.fail_fast) {
                let reason = format!("run stopped after {} failed", outcome.name);
                warn!(%reason, fatal, "aborting run");
                results.aborted = Some(reason);
            }
            results.outcomes.push(outcome);
        }
    }

    fn execute(&self, scenario: &Scenario, sink: &mut dyn ReportSink) -> (TestOutcome, bool) {
        let meta = scenario.meta;
        let test_id = meta.id();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(test = %test_id, "scenario started");

        if let Err(e) = sink.create_test(&meta) {
            warn!(error = %e, "report sink rejected test registration");
        }

        let screen = self.screen();
        let mut steps = StepLog::new();
        let mut screenshots = Vec::new();
        let mut fixtures = scenario.fixture_set();

        let result = catch(|| {
            self.prepare(screen, &mut steps)?;
            if !fixtures.is_empty() {
                fixtures.provision_all(screen)?;
                steps.record(format!("fixtures provisioned: {}", fixtures.names().join(", ")));
            }
            let mut ctx = TestContext {
                test_id: test_id.clone(),
                screen,
                credentials: &self.credentials,
                fixtures: &fixtures,
                steps: &mut steps,
                screenshots: &mut screenshots,
                sink: &mut *sink,
                checkpoint_screenshots: self.checkpoint_screenshots,
            };
            (scenario.body)(&mut ctx)
        });

        if let Err(e) = &result {
            warn!(test = %test_id, error = %e, "scenario failed");
            self.capture_failure(&e.to_string(), sink, &mut steps, &mut screenshots);
        }

        let cleanup = catch(|| match &scenario.cleanup {
            Some(cleanup) => cleanup(screen),
            None => AssetListScreen::return_home(screen).map(|_| ()),
        });
        match &cleanup {
            Ok(()) => steps.record("cleanup: returned to a known state"),
            Err(e) => {
                warn!(test = %test_id, error = %e, "cleanup failed");
                steps.record(format!("cleanup failed: {e}"));
            }
        }

        let release = catch(|| fixtures.release_all(screen));
        if let Err(e) = &release {
            steps.record(format!("fixture release failed: {e}"));
        }

        let fatal = [&result, &cleanup, &release]
            .iter()
            .any(|r| matches!(r, Err(e) if e.is_fatal()));
        let failure = result
            .err()
            .or_else(|| cleanup.err())
            .or_else(|| release.err())
            .map(|e| e.to_string());

        let outcome = TestOutcome {
            name: test_id,
            module: meta.module.to_string(),
            feature: meta.feature.to_string(),
            description: meta.description.to_string(),
            status: if failure.is_some() {
                TestStatus::Failed
            } else {
                TestStatus::Passed
            },
            failure,
            started_at,
            duration: start.elapsed(),
            screenshots,
            steps: steps.finalize(),
        };
        info!(
            test = %outcome.name,
            status = %outcome.status,
            duration_ms = outcome.duration.as_millis() as u64,
            "scenario finished"
        );
        if let Err(e) = sink.finish(&outcome) {
            warn!(error = %e, "report sink rejected outcome");
        }
        (outcome, fatal)
    }

    /// Reset per policy and bring the app to the signed-in asset list.
    fn prepare(&self, screen: Screen<'s>, steps: &mut StepLog) -> SuiteResult<()> {
        if self.reset_policy() == ResetPolicy::FreshPerTest {
            self.session.reset_app()?;
            steps.record("app reset to launch state");
        }

        let login = LoginScreen::new(screen);
        let home = AssetListScreen::new(screen);
        match screen
            .wait_for_any(&[&login.signature(), &home.signature()])
            .timeout_as_none()?
        {
            Some(0) => {
                let _ = login.sign_in_to_site(&self.credentials)?;
                steps.record(format!("signed in as {}", self.credentials.username));
            }
            Some(_) => {}
            None => {
                let _ = AssetListScreen::return_home(screen)?;
                steps.record("recovered to the asset list");
            }
        }
        Ok(())
    }

    fn capture_failure(
        &self,
        message: &str,
        sink: &mut dyn ReportSink,
        steps: &mut StepLog,
        screenshots: &mut Vec<String>,
    ) {
        let message = format!("FAILED: {message}");
        let stored = self
            .session
            .screenshot()
            .and_then(|shot| sink.log_step_with_screenshot(&message, &shot));
        match stored {
            Ok(reference) => {
                steps.record_with_screenshot(message, reference.clone());
                screenshots.push(reference);
            }
            Err(e) => {
                warn!(error = %e, "failure screenshot unavailable");
                steps.record(format!("{message} (no screenshot: {e})"));
            }
        }
    }
}

/// Run `f`, turning a panic into an assertion failure.
fn catch<T>(f: impl FnOnce() -> SuiteResult<T>) -> SuiteResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(SuiteError::assertion(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
