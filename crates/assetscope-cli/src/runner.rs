//! Command implementations: run, list and config

use crate::commands::{ConfigArgs, ListArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{ConsoleSink, ProgressReporter};
use assetscope::sim::{demo_credentials, SimulatedProvider};
use assetscope::{
    suites, JsonReporter, Scenario, SessionProvider, SuiteConfig, SuiteRunner, TestClass,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// The simulated app settles immediately, so polling can be tight
const SIMULATED_POLL_INTERVAL_MS: u64 = 10;

fn matching<'c>(
    classes: &'c [TestClass],
    filter: Option<&'c str>,
) -> impl Iterator<Item = &'c Scenario> + 'c {
    let filter = filter.filter(|f| !f.is_empty());
    classes
        .iter()
        .flat_map(TestClass::scenarios)
        .filter(move |s| filter.map_or(true, |f| s.matches(f)))
}

/// Scenario ids selected by `filter`, in run order
#[must_use]
pub fn selected_scenarios(classes: &[TestClass], filter: Option<&str>) -> Vec<String> {
    matching(classes, filter).map(|s| s.meta.id()).collect()
}

/// One line per selected scenario: `module::feature  description`
#[must_use]
pub fn list_lines(args: &ListArgs) -> Vec<String> {
    let classes = suites::catalogue();
    matching(&classes, args.filter.as_deref())
        .map(|s| format!("{:<40} {}", s.meta.id(), s.meta.description))
        .collect()
}

/// Resolved configuration as YAML; the password is only ever reported as set
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or rendered.
pub fn config_yaml(args: &ConfigArgs) -> CliResult<String> {
    let config = SuiteConfig::load(args.config.as_deref())?;
    let mut yaml = config.to_yaml()?;
    if !config.credentials.password.is_empty() {
        yaml.push_str("# credentials.password is set (hidden)\n");
    }
    Ok(yaml)
}

fn load_run_config(args: &RunArgs) -> CliResult<SuiteConfig> {
    let mut config = SuiteConfig::load(args.config.as_deref())?;
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }
    if args.simulate {
        config.credentials = demo_credentials();
        config.wait = config.wait.with_poll_interval(SIMULATED_POLL_INTERVAL_MS);
    } else {
        config.validate_for_device()?;
    }
    Ok(config)
}

fn provider(args: &RunArgs) -> CliResult<Box<dyn SessionProvider>> {
    if args.simulate {
        return Ok(Box::new(SimulatedProvider::new(demo_credentials())));
    }
    device_provider()
}

#[cfg(feature = "appium")]
fn device_provider() -> CliResult<Box<dyn SessionProvider>> {
    Ok(Box::new(assetscope::AppiumProvider))
}

#[cfg(not(feature = "appium"))]
fn device_provider() -> CliResult<Box<dyn SessionProvider>> {
    Err(CliError::config(
        "device runs need Appium support; rebuild with --features appium or pass --simulate",
    ))
}

/// Scenario runner driven by CLI arguments
#[derive(Debug)]
pub struct TestRunner {
    config: CliConfig,
    args: RunArgs,
}

impl TestRunner {
    /// Create a runner for one invocation of `run`
    #[must_use]
    pub const fn new(config: CliConfig, args: RunArgs) -> Self {
        Self { config, args }
    }

    /// Run the selected scenarios and write the JSON report.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ScenariosFailed`] when any scenario did not pass,
    /// or the configuration, session or report error that stopped the run.
    pub fn run(&self) -> CliResult<PathBuf> {
        let suite_config = load_run_config(&self.args)?;
        let classes = suites::catalogue();
        let selected = selected_scenarios(&classes, self.args.filter.as_deref());
        if selected.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "no scenario matches filter {:?}",
                self.args.filter.as_deref().unwrap_or_default()
            )));
        }

        let quiet = self.config.verbosity.is_quiet();
        let progress = ProgressReporter::new(self.config.color.should_color(), quiet);
        progress.header(if self.args.simulate {
            "Assetscope (simulated app)"
        } else {
            "Assetscope"
        });

        let provider = provider(&self.args)?;
        let session = provider.acquire(&suite_config.session)?;
        info!(session = session.session_id(), scenarios = selected.len(), "session ready");

        let json = JsonReporter::new(suite_config.output_dir.clone())?;
        let mut sink = ConsoleSink::new(json, progress);
        sink.start(selected.len());

        let results = SuiteRunner::new(session.as_ref(), &suite_config)
            .with_fail_fast(self.args.fail_fast)
            .with_filter(self.args.filter.clone())
            .run_all(&classes, &mut sink);

        let (json, progress) = sink.into_parts();
        if let Err(e) = provider.release(session) {
            warn!(error = %e, "session release failed");
        }

        let path = json.write()?;
        if let Some(ref reason) = results.aborted {
            progress.warning(&format!("run stopped early: {reason}"));
        }
        progress.summary(
            results.passed_count(),
            results.failed_count(),
            results.skipped_count(),
            results.duration,
        );
        progress.info(&format!("report written to {}", path.display()));

        if results.all_passed() {
            Ok(path)
        } else {
            Err(CliError::ScenariosFailed {
                failed: results.total() - results.passed_count(),
                total: results.total(),
            })
        }
    }
}
