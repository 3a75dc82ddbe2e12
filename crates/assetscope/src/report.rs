//! Step logs, test outcomes and report sinks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  create_test / log_step / finish  ┌──────────────────────┐
//! │ SuiteRunner  │ ─────────────────────────────────►│ ReportSink (trait)   │
//! │  StepLog     │                                    │  ├─ MemoryReporter   │
//! │  (per test)  │── finalize ─► FinalizedStepLog ──► │  └─ JsonReporter     │
//! └──────────────┘               in TestOutcome       │       + PNG files    │
//!                                                     └──────────────────────┘
//! ```
//!
//! The step log is append-only while a test runs and is consumed into an
//! immutable [`FinalizedStepLog`] when the test ends.

use crate::driver::Screenshot;
use crate::result::SuiteResult;
use crate::runner::TestMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    /// When the step was recorded
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub message: String,
    /// Reference to a screenshot taken at this step
    pub screenshot: Option<String>,
}

/// Append-only log of one running test
#[derive(Debug, Default)]
pub struct StepLog {
    entries: Vec<StepEntry>,
}

impl StepLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn record(&mut self, message: impl Into<String>) {
        self.push(message.into(), None);
    }

    /// Append a step that has a screenshot
    pub fn record_with_screenshot(&mut self, message: impl Into<String>, reference: impl Into<String>) {
        self.push(message.into(), Some(reference.into()));
    }

    fn push(&mut self, message: String, screenshot: Option<String>) {
        self.entries.push(StepEntry {
            timestamp: Utc::now(),
            message,
            screenshot,
        });
    }

    /// Steps so far
    #[must_use]
    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close the log; it cannot be appended to afterwards.
    #[must_use]
    pub fn finalize(self) -> FinalizedStepLog {
        FinalizedStepLog {
            entries: self.entries,
        }
    }
}

/// Read-only step log of a finished test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinalizedStepLog {
    entries: Vec<StepEntry>,
}

impl FinalizedStepLog {
    /// Recorded steps in order
    #[must_use]
    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the test recorded nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages only
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }
}

/// Status of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Every step and the final post-condition held
    Passed,
    /// A step or assertion failed, or the body panicked
    Failed,
    /// Not run because the run was aborted
    Skipped,
}

impl TestStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => f.write_str("PASS"),
            Self::Failed => f.write_str("FAIL"),
            Self::Skipped => f.write_str("SKIP"),
        }
    }
}

/// Result of one scenario invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// `module::feature`
    pub name: String,
    /// Screen module the scenario belongs to
    pub module: String,
    /// Feature under test
    pub feature: String,
    /// What the scenario checks
    pub description: String,
    /// Outcome
    pub status: TestStatus,
    /// Failure message if failed
    pub failure: Option<String>,
    /// When the scenario started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Screenshot references, in capture order
    pub screenshots: Vec<String>,
    /// Steps recorded while running
    pub steps: FinalizedStepLog,
}

impl TestOutcome {
    /// Outcome for a scenario that was never started
    #[must_use]
    pub fn skipped(meta: &TestMeta, reason: impl Into<String>) -> Self {
        Self {
            name: meta.id(),
            module: meta.module.to_string(),
            feature: meta.feature.to_string(),
            description: meta.description.to_string(),
            status: TestStatus::Skipped,
            failure: Some(reason.into()),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            screenshots: Vec::new(),
            steps: FinalizedStepLog::default(),
        }
    }

    /// One line for consoles: `PASS module::feature (12ms)`
    #[must_use]
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} {} ({}ms)",
            self.status,
            self.name,
            self.duration.as_millis()
        );
        if let (TestStatus::Failed, Some(failure)) = (self.status, &self.failure) {
            line.push_str(": ");
            line.push_str(failure);
        }
        line
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Consumer of test registration, steps and outcomes.
pub trait ReportSink {
    /// A test is starting.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the runner logs and continues.
    fn create_test(&mut self, meta: &TestMeta) -> SuiteResult<()>;

    /// A step happened in the current test.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the runner logs and continues.
    fn log_step(&mut self, message: &str) -> SuiteResult<()>;

    /// A step with a screenshot happened; returns the stored reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the screenshot could not be stored.
    fn log_step_with_screenshot(&mut self, message: &str, screenshot: &Screenshot)
        -> SuiteResult<String>;

    /// The current test finished (or was skipped).
    ///
    /// # Errors
    ///
    /// Implementation-defined; the runner logs and continues.
    fn finish(&mut self, outcome: &TestOutcome) -> SuiteResult<()>;
}

/// Assigns stable file names to screenshots and keeps or writes them.
///
/// References look like `asset_list__search_no_matches-002.png`: the test
/// id with path-hostile characters replaced, then a per-test sequence.
#[derive(Debug, Default)]
pub struct ScreenshotStore {
    dir: Option<PathBuf>,
    sequence: HashMap<String, u32>,
    kept: BTreeMap<String, Screenshot>,
}

impl ScreenshotStore {
    /// Keep screenshots in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Write screenshots as PNG files into `dir`
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Directory screenshots are written to, if file-backed
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Store a screenshot for `test_id` and return its reference.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file-backed store cannot write.
    pub fn store(&mut self, test_id: &str, screenshot: &Screenshot) -> SuiteResult<String> {
        let key = file_stem(test_id);
        let seq = self.sequence.entry(key.clone()).or_insert(0);
        *seq += 1;
        let reference = format!("{key}-{seq:03}.png");

        match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                std::fs::write(dir.join(&reference), &screenshot.data)?;
                debug!(%reference, bytes = screenshot.size_bytes(), "screenshot written");
            }
            None => {
                let _ = self.kept.insert(reference.clone(), screenshot.clone());
            }
        }
        Ok(reference)
    }

    /// An in-memory screenshot by reference
    #[must_use]
    pub fn get(&self, reference: &str) -> Option<&Screenshot> {
        self.kept.get(reference)
    }

    /// Total screenshots stored
    #[must_use]
    pub fn count(&self) -> usize {
        self.sequence.values().map(|n| *n as usize).sum()
    }
}

fn file_stem(test_id: &str) -> String {
    test_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// In-process sink, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    current: Option<String>,
    created: Vec<String>,
    steps: Vec<(String, String)>,
    outcomes: Vec<TestOutcome>,
    store: ScreenshotStore,
}

impl MemoryReporter {
    /// Create an empty reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every registered test, in order
    #[must_use]
    pub fn created_tests(&self) -> &[String] {
        &self.created
    }

    /// Steps streamed for one test
    #[must_use]
    pub fn steps_for(&self, test_id: &str) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|(id, _)| id == test_id)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    /// Finished outcomes, in order
    #[must_use]
    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    /// The outcome of one test
    #[must_use]
    pub fn outcome(&self, test_id: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name == test_id)
    }

    /// Stored screenshots
    #[must_use]
    pub const fn screenshots(&self) -> &ScreenshotStore {
        &self.store
    }

    /// Get pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 1.0;
        }
        let passed = self.outcomes.iter().filter(|o| o.status.is_passed()).count();
        passed as f64 / self.outcomes.len() as f64
    }
}

impl ReportSink for MemoryReporter {
    fn create_test(&mut self, meta: &TestMeta) -> SuiteResult<()> {
        let id = meta.id();
        self.created.push(id.clone());
        self.current = Some(id);
        Ok(())
    }

    fn log_step(&mut self, message: &str) -> SuiteResult<()> {
        let id = self.current.clone().unwrap_or_default();
        self.steps.push((id, message.to_string()));
        Ok(())
    }

    fn log_step_with_screenshot(
        &mut self,
        message: &str,
        screenshot: &Screenshot,
    ) -> SuiteResult<String> {
        let id = self.current.clone().unwrap_or_default();
        let reference = self.store.store(&id, screenshot)?;
        self.steps.push((id, format!("{message} [{reference}]")));
        Ok(reference)
    }

    fn finish(&mut self, outcome: &TestOutcome) -> SuiteResult<()> {
        self.outcomes.push(outcome.clone());
        self.current = None;
        Ok(())
    }
}

/// The document [`JsonReporter`] writes for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of the run
    pub run_id: String,
    /// When the reporter was created
    pub started_at: DateTime<Utc>,
    /// When the document was written
    pub finished_at: DateTime<Utc>,
    /// Number of outcomes
    pub total: usize,
    /// Passed outcomes
    pub passed: usize,
    /// Failed outcomes
    pub failed: usize,
    /// Skipped outcomes
    pub skipped: usize,
    /// Every outcome, in run order
    pub outcomes: Vec<TestOutcome>,
}

/// Writes one JSON document per run plus a `screenshots/` directory of PNG
/// files into the output directory.
#[derive(Debug)]
pub struct JsonReporter {
    output_dir: PathBuf,
    run_id: uuid::Uuid,
    started_at: DateTime<Utc>,
    current: Option<String>,
    outcomes: Vec<TestOutcome>,
    store: ScreenshotStore,
}

impl JsonReporter {
    /// Create a reporter writing under `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new(output_dir: impl Into<PathBuf>) -> SuiteResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            store: ScreenshotStore::in_dir(output_dir.join("screenshots")),
            output_dir,
            run_id: uuid::Uuid::new_v4(),
            started_at: Utc::now(),
            current: None,
            outcomes: Vec::new(),
        })
    }

    /// Unique id of this run
    #[must_use]
    pub fn run_id(&self) -> String {
        self.run_id.to_string()
    }

    /// Where the run document will be written
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("assetscope-{}.json", self.run_id))
    }

    /// Outcomes received so far
    #[must_use]
    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    /// Build the run document
    #[must_use]
    pub fn report(&self) -> RunReport {
        let count = |status: TestStatus| self.outcomes.iter().filter(|o| o.status == status).count();
        RunReport {
            run_id: self.run_id(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            total: self.outcomes.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Skipped),
            outcomes: self.outcomes.clone(),
        }
    }

    /// Write the run document and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write(&self) -> SuiteResult<PathBuf> {
        let path = self.report_path();
        let json = serde_json::to_string_pretty(&self.report())?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), outcomes = self.outcomes.len(), "report written");
        Ok(path)
    }
}

impl ReportSink for JsonReporter {
    fn create_test(&mut self, meta: &TestMeta) -> SuiteResult<()> {
        self.current = Some(meta.id());
        Ok(())
    }

    fn log_step(&mut self, message: &str) -> SuiteResult<()> {
        debug!(test = self.current.as_deref().unwrap_or(""), message, "step");
        Ok(())
    }

    fn log_step_with_screenshot(
        &mut self,
        message: &str,
        screenshot: &Screenshot,
    ) -> SuiteResult<String> {
        let id = self.current.clone().unwrap_or_default();
        let reference = self.store.store(&id, screenshot)?;
        debug!(test = %id, message, %reference, "step with screenshot");
        Ok(reference)
    }

    fn finish(&mut self, outcome: &TestOutcome) -> SuiteResult<()> {
        self.outcomes.push(outcome.clone());
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const META: TestMeta = TestMeta::new("asset_list", "search_no_matches", "unique term lists nothing");

    fn png() -> Screenshot {
        Screenshot::from_png(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    fn outcome(status: TestStatus) -> TestOutcome {
        let mut log = StepLog::new();
        log.record("searched");
        TestOutcome {
            status,
            failure: status.is_failed().then(|| "count was 3".to_string()),
            duration: Duration::from_millis(42),
            steps: log.finalize(),
            ..TestOutcome::skipped(&META, "")
        }
    }

    mod step_log_tests {
        use super::*;

        #[test]
        fn test_entries_keep_order() {
            let mut log = StepLog::new();
            log.record("open asset");
            log.record_with_screenshot("subtype chosen", "a-001.png");
            assert_eq!(log.len(), 2);

            let done = log.finalize();
            assert_eq!(done.messages(), vec!["open asset", "subtype chosen"]);
            assert_eq!(done.entries()[1].screenshot.as_deref(), Some("a-001.png"));
            assert!(done.entries()[0].timestamp <= done.entries()[1].timestamp);
        }

        #[test]
        fn test_finalized_log_serializes_as_list() {
            let mut log = StepLog::new();
            log.record("only step");
            let json = serde_json::to_value(log.finalize()).unwrap();
            assert!(json.is_array());
            assert_eq!(json[0]["message"], "only step");
        }
    }

    mod outcome_tests {
        use super::*;

        #[test]
        fn test_summary_line() {
            assert_eq!(
                outcome(TestStatus::Passed).summary_line(),
                "PASS asset_list::search_no_matches (42ms)"
            );
            assert!(outcome(TestStatus::Failed)
                .summary_line()
                .ends_with(": count was 3"));
        }

        #[test]
        fn test_duration_serialized_in_millis() {
            let json = serde_json::to_value(outcome(TestStatus::Passed)).unwrap();
            assert_eq!(json["duration"], 42);
            assert_eq!(json["status"], "passed");
            let back: TestOutcome = serde_json::from_value(json).unwrap();
            assert_eq!(back.duration, Duration::from_millis(42));
        }
    }

    mod screenshot_store_tests {
        use super::*;

        #[test]
        fn test_references_are_sequenced_per_test() {
            let mut store = ScreenshotStore::in_memory();
            let a = store.store("edit_asset::subtype round-trip", &png()).unwrap();
            let b = store.store("edit_asset::subtype round-trip", &png()).unwrap();
            let c = store.store("tasks::gate", &png()).unwrap();
            assert_eq!(a, "edit_asset__subtype_round-trip-001.png");
            assert_eq!(b, "edit_asset__subtype_round-trip-002.png");
            assert_eq!(c, "tasks__gate-001.png");
            assert_eq!(store.count(), 3);
            assert!(store.get(&a).is_some());
        }

        #[test]
        fn test_file_backed_store_writes_png() {
            let dir = tempfile::tempdir().unwrap();
            let mut store = ScreenshotStore::in_dir(dir.path().join("shots"));
            let reference = store.store("tasks::gate", &png()).unwrap();
            let written = std::fs::read(dir.path().join("shots").join(&reference)).unwrap();
            assert_eq!(written, png().data);
            assert!(store.get(&reference).is_none());
        }
    }

    mod memory_reporter_tests {
        use super::*;

        #[test]
        fn test_steps_attributed_to_current_test() {
            let mut reporter = MemoryReporter::new();
            reporter.create_test(&META).unwrap();
            reporter.log_step("typed term").unwrap();
            let reference = reporter.log_step_with_screenshot("failed", &png()).unwrap();
            reporter.finish(&outcome(TestStatus::Failed)).unwrap();

            let id = META.id();
            assert_eq!(reporter.created_tests(), &[id.clone()]);
            assert_eq!(reporter.steps_for(&id).len(), 2);
            assert!(reporter.screenshots().get(&reference).is_some());
            assert_eq!(reporter.outcome(&id).unwrap().status, TestStatus::Failed);
            assert!((reporter.pass_rate() - 0.0).abs() < f64::EPSILON);
        }
    }

    mod json_reporter_tests {
        use super::*;

        #[test]
        fn test_writes_run_document_and_screenshots() {
            let dir = tempfile::tempdir().unwrap();
            let mut reporter = JsonReporter::new(dir.path()).unwrap();
            reporter.create_test(&META).unwrap();
            let reference = reporter.log_step_with_screenshot("checkpoint", &png()).unwrap();
            reporter.finish(&outcome(TestStatus::Passed)).unwrap();

            let path = reporter.write().unwrap();
            assert!(path.starts_with(dir.path()));
            let report: RunReport =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(report.run_id, reporter.run_id());
            assert_eq!(report.total, 1);
            assert_eq!(report.passed, 1);
            assert_eq!(report.failed, 0);
            assert!(dir.path().join("screenshots").join(reference).exists());
        }
    }
}
