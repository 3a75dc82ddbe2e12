//! Scenario suites, one [`TestClass`] per screen under test.
//!
//! Every scenario is a named function that drives screen objects and ends in
//! a post-condition check. Data a scenario depends on comes from fixtures it
//! declares, never from whatever the site happens to contain.

mod asset_list;
mod child_asset;
mod connections;
mod edit_asset;
mod issues;
mod link_node;
mod tasks;

use crate::fixture::{AssetFixture, Fixture};
use crate::runner::TestClass;

/// Every suite in run order
#[must_use]
pub fn catalogue() -> Vec<TestClass> {
    vec![
        asset_list::class(),
        edit_asset::class(),
        tasks::class(),
        issues::class(),
        connections::class(),
        link_node::class(),
        child_asset::class(),
    ]
}

/// Factory for an [`AssetFixture`] named `key`
fn asset(key: &'static str, class: &'static str) -> impl Fn() -> Box<dyn Fixture> {
    move || -> Box<dyn Fixture> { Box::new(AssetFixture::new(key, class)) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::report::MemoryReporter;
    use crate::runner::SuiteRunner;
    use crate::screens::test_support::fast;
    use crate::sim::{demo_credentials, SimulatedApp};
    use std::collections::HashSet;

    fn config() -> SuiteConfig {
        SuiteConfig::default()
            .with_wait(fast())
            .with_credentials(demo_credentials())
    }

    #[test]
    fn test_scenario_ids_are_unique() {
        let classes = catalogue();
        let ids: Vec<String> = classes
            .iter()
            .flat_map(|c| c.scenarios().iter().map(|s| s.meta.id()))
            .collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len());
        assert!(classes.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_catalogue_passes_against_simulated_app() {
        let app = SimulatedApp::new();
        let runner = SuiteRunner::new(&app, &config());
        let mut sink = MemoryReporter::new();

        let results = runner.run_all(&catalogue(), &mut sink);

        let failures: Vec<String> = results
            .failures()
            .iter()
            .map(|o| format!("{}: {:?}", o.name, o.failure))
            .collect();
        assert!(results.all_passed(), "{failures:#?}");
        assert_eq!(results.skipped_count(), 0);
        assert!(results.aborted.is_none());
        assert_eq!(sink.outcomes().len(), results.total());
    }

    #[test]
    fn test_fixture_assets_do_not_outlive_run() {
        let app = SimulatedApp::new();
        let before = app.asset_names();
        let runner = SuiteRunner::new(&app, &config());

        let results = runner.run_all(&catalogue(), &mut MemoryReporter::new());

        assert!(results.all_passed(), "{}", results.summary());
        assert!(!app.asset_names().iter().any(|n| n.starts_with("AT ")));
        assert_eq!(app.asset_names(), before);
    }
}
