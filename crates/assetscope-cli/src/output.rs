//! Output formatting and progress reporting

use assetscope::{
    JsonReporter, ReportSink, Screenshot, SuiteResult, TestMeta, TestOutcome, TestStatus,
};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for scenario execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar for `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() && !pb.is_hidden() => pb.println(line),
            _ => {
                let _ = self.term.write_line(line);
            }
        }
    }

    fn prefixed(&self, colored: String, plain: &str, message: &str) {
        let prefix = if self.use_color {
            colored
        } else {
            plain.to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed(style("✓").green().bold().to_string(), "PASS", message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        self.prefixed(style("✗").red().bold().to_string(), "FAIL", message);
    }

    /// Print a skip message
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed(style("○").yellow().to_string(), "SKIP", message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed(style("⚠").yellow().bold().to_string(), "WARN", message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed(style("ℹ").blue().bold().to_string(), "INFO", message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Print one finished scenario
    pub fn outcome(&self, outcome: &TestOutcome) {
        let timing = format!("{} ({}ms)", outcome.name, outcome.duration.as_millis());
        match outcome.status {
            TestStatus::Passed => self.success(&timing),
            TestStatus::Failed => {
                let reason = outcome.failure.as_deref().unwrap_or("failed");
                self.failure(&format!("{timing}: {reason}"));
            }
            TestStatus::Skipped => {
                let reason = outcome.failure.as_deref().unwrap_or("skipped");
                self.skipped(&format!("{}: {reason}", outcome.name));
            }
        }
    }

    /// Print run summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        self.line("");

        let total = passed + failed + skipped;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            self.line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            self.line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}

/// Report sink for interactive runs: every event is forwarded to a
/// [`JsonReporter`] and finished scenarios are echoed to the terminal.
#[derive(Debug)]
pub struct ConsoleSink {
    json: JsonReporter,
    progress: ProgressReporter,
}

impl ConsoleSink {
    /// Wrap `json`, printing through `progress`
    #[must_use]
    pub const fn new(json: JsonReporter, progress: ProgressReporter) -> Self {
        Self { json, progress }
    }

    /// Start the progress bar
    pub fn start(&mut self, total: usize) {
        self.progress
            .start_progress(total as u64, "running");
    }

    /// Stop the progress bar and hand back both halves
    #[must_use]
    pub fn into_parts(self) -> (JsonReporter, ProgressReporter) {
        self.progress.finish();
        (self.json, self.progress)
    }
}

impl ReportSink for ConsoleSink {
    fn create_test(&mut self, meta: &TestMeta) -> SuiteResult<()> {
        self.progress.set_message(&meta.id());
        self.json.create_test(meta)
    }

    fn log_step(&mut self, message: &str) -> SuiteResult<()> {
        self.json.log_step(message)
    }

    fn log_step_with_screenshot(
        &mut self,
        message: &str,
        screenshot: &Screenshot,
    ) -> SuiteResult<String> {
        self.json.log_step_with_screenshot(message, screenshot)
    }

    fn finish(&mut self, outcome: &TestOutcome) -> SuiteResult<()> {
        self.progress.outcome(outcome);
        self.progress.increment(1);
        self.json.finish(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(true, false);
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_default_reporter() {
            let reporter = ProgressReporter::default();
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_messages_do_not_panic() {
            let reporter = ProgressReporter::new(false, false);
            reporter.success("passed");
            reporter.failure("failed");
            reporter.skipped("skipped");
            reporter.warning("warning");
            reporter.info("info");
            reporter.header("Header");
            reporter.summary(10, 0, 2, Duration::from_secs(5));
            reporter.summary(8, 2, 0, Duration::from_secs(3));
        }

        #[test]
        fn test_progress_bar() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(10, "Running scenarios");
            reporter.increment(1);
            reporter.set_message("asset_list::displayed");
            reporter.success("printed above the bar");
            reporter.finish();
        }

        #[test]
        fn test_quiet_mode_has_no_progress_bar() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(10, "Running scenarios");
            assert!(reporter.progress_bar.is_none());
            reporter.failure("shown");
        }
    }

    mod console_sink_tests {
        use super::*;

        #[test]
        fn test_outcomes_reach_json_reporter() {
            let dir = tempfile::tempdir().unwrap();
            let json = JsonReporter::new(dir.path()).unwrap();
            let mut sink = ConsoleSink::new(json, ProgressReporter::new(false, true));
            sink.start(1);

            let meta = TestMeta::new("asset_list", "displayed", "list shows");
            sink.create_test(&meta).unwrap();
            sink.log_step("open list").unwrap();
            sink.finish(&TestOutcome::skipped(&meta, "not run")).unwrap();

            let (json, _) = sink.into_parts();
            assert_eq!(json.outcomes().len(), 1);
            assert_eq!(json.outcomes()[0].name, "asset_list::displayed");
        }
    }
}
