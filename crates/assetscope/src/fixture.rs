//! Per-scenario fixtures
//!
//! A scenario that needs pre-existing application data declares it as a
//! fixture instead of relying on an earlier scenario having created it.
//! Fixtures are provisioned through the UI before the body runs and released
//! after cleanup, on every exit path.

use crate::result::{ensure, SuiteError, SuiteResult};
use crate::screen::Screen;
use crate::screens::AssetListScreen;
use tracing::{debug, info, warn};

/// Application state a scenario needs before its body runs.
pub trait Fixture {
    /// Create the state.
    ///
    /// # Errors
    ///
    /// Returns an error if provisioning fails.
    fn provision(&mut self, screen: Screen<'_>) -> SuiteResult<()>;

    /// Remove what [`Fixture::provision`] created.
    ///
    /// # Errors
    ///
    /// Returns an error if release fails.
    fn release(&mut self, screen: Screen<'_>) -> SuiteResult<()>;

    /// Key the scenario uses to look the fixture up
    fn name(&self) -> &str;

    /// Get fixture priority (higher = provisioned first, released last).
    fn priority(&self) -> i32 {
        0
    }

    /// Value produced by provisioning, e.g. the created asset's name
    fn value(&self) -> Option<&str> {
        None
    }
}

/// State of a fixture in a [`FixtureSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Declared but not provisioned.
    Declared,
    /// Provisioned successfully.
    Provisioned,
    /// Released after use.
    Released,
    /// Provisioning or release failed.
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
}

/// The fixtures of one scenario run.
#[derive(Default)]
pub struct FixtureSet {
    entries: Vec<FixtureEntry>,
    provision_order: Vec<usize>,
}

impl std::fmt::Debug for FixtureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureSet")
            .field("fixtures", &self.names())
            .field("provisioned", &self.provision_order.len())
            .finish()
    }
}

impl FixtureSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a fixture
    pub fn add(&mut self, fixture: Box<dyn Fixture>) {
        self.entries.push(FixtureEntry {
            fixture,
            state: FixtureState::Declared,
        });
    }

    /// Number of declared fixtures
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fixtures are declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in declaration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.fixture.name()).collect()
    }

    /// State of a fixture by name
    #[must_use]
    pub fn state(&self, name: &str) -> Option<FixtureState> {
        self.entry(name).map(|e| e.state)
    }

    /// Value of a provisioned fixture by name
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.entry(name)
            .filter(|e| e.state == FixtureState::Provisioned)
            .and_then(|e| e.fixture.value())
    }

    fn entry(&self, name: &str) -> Option<&FixtureEntry> {
        self.entries.iter().find(|e| e.fixture.name() == name)
    }

    /// Provision every fixture, highest priority first; ties keep
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Fixture`] for the first failure. Fixtures
    /// already provisioned are released before returning.
    pub fn provision_all(&mut self, screen: Screen<'_>) -> SuiteResult<()> {
        let mut ordered: Vec<usize> = (0..self.entries.len()).collect();
        ordered.sort_by_key(|i| std::cmp::Reverse(self.entries[*i].fixture.priority()));

        self.provision_order.clear();

        let mut failure = None;
        for index in ordered {
            let entry = &mut self.entries[index];
            if entry.state == FixtureState::Provisioned {
                continue;
            }
            debug!(fixture = entry.fixture.name(), "provisioning");
            if let Err(e) = entry.fixture.provision(screen) {
                entry.state = FixtureState::Failed;
                failure = Some(format!(
                    "Fixture '{}' provisioning failed: {e}",
                    entry.fixture.name()
                ));
                break;
            }
            entry.state = FixtureState::Provisioned;
            self.provision_order.push(index);
        }

        if let Some(message) = failure {
            if let Err(e) = self.release_all(screen) {
                warn!(error = %e, "rollback after failed provisioning also failed");
            }
            return Err(SuiteError::Fixture { message });
        }
        Ok(())
    }

    /// Release provisioned fixtures in reverse provisioning order.
    ///
    /// # Errors
    ///
    /// Every fixture is attempted; the first failure is returned.
    pub fn release_all(&mut self, screen: Screen<'_>) -> SuiteResult<()> {
        let mut first_error: Option<SuiteError> = None;

        for index in self.provision_order.iter().rev() {
            let entry = &mut self.entries[*index];
            if entry.state != FixtureState::Provisioned {
                continue;
            }
            match entry.fixture.release(screen) {
                Ok(()) => entry.state = FixtureState::Released,
                Err(e) => {
                    warn!(fixture = entry.fixture.name(), error = %e, "release failed");
                    if first_error.is_none() {
                        first_error = Some(SuiteError::Fixture {
                            message: format!("Fixture '{}' release failed: {e}", entry.fixture.name()),
                        });
                    }
                    entry.state = FixtureState::Failed;
                }
            }
        }

        self.provision_order.clear();
        first_error.map_or(Ok(()), Err)
    }
}

type Step = Box<dyn FnMut(Screen<'_>) -> SuiteResult<Option<String>>>;
type Undo = Box<dyn FnMut(Screen<'_>) -> SuiteResult<()>>;

/// A fixture built from closures.
///
/// The provisioning closure may return a value, which becomes
/// [`Fixture::value`].
pub struct SimpleFixture {
    name: String,
    priority: i32,
    provision_fn: Option<Step>,
    release_fn: Option<Undo>,
    value: Option<String>,
}

impl std::fmt::Debug for SimpleFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleFixture")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("value", &self.value)
            .finish()
    }
}

impl SimpleFixture {
    /// Create a new simple fixture with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            provision_fn: None,
            release_fn: None,
            value: None,
        }
    }

    /// Set the provisioning function.
    #[must_use]
    pub fn with_provision<F>(mut self, f: F) -> Self
    where
        F: FnMut(Screen<'_>) -> SuiteResult<Option<String>> + 'static,
    {
        self.provision_fn = Some(Box::new(f));
        self
    }

    /// Set the release function.
    #[must_use]
    pub fn with_release<F>(mut self, f: F) -> Self
    where
        F: FnMut(Screen<'_>) -> SuiteResult<()> + 'static,
    {
        self.release_fn = Some(Box::new(f));
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Fixture for SimpleFixture {
    fn provision(&mut self, screen: Screen<'_>) -> SuiteResult<()> {
        if let Some(f) = &mut self.provision_fn {
            self.value = f(screen)?;
        }
        Ok(())
    }

    fn release(&mut self, screen: Screen<'_>) -> SuiteResult<()> {
        if let Some(f) = &mut self.release_fn {
            f(screen)?;
        }
        self.value = None;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// A name no existing asset or search term will collide with:
/// `{prefix} {yyyymmddHHMMSS}-{8 hex}`.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix} {stamp}-{}", &suffix[..8])
}

/// Creates a uniquely named asset through the New Asset form and deletes it
/// again on release.
#[derive(Debug, Clone)]
pub struct AssetFixture {
    key: String,
    prefix: String,
    class: String,
    priority: i32,
    created: Option<String>,
}

impl AssetFixture {
    /// Fixture `key` creating an asset of `class`
    #[must_use]
    pub fn new(key: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            prefix: "AT Asset".to_string(),
            class: class.into(),
            priority: 0,
            created: None,
        }
    }

    /// Start generated names with `prefix`
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Name of the created asset while provisioned
    #[must_use]
    pub fn created(&self) -> Option<&str> {
        self.created.as_deref()
    }
}

impl Fixture for AssetFixture {
    fn provision(&mut self, screen: Screen<'_>) -> SuiteResult<()> {
        let name = unique_name(&self.prefix);
        info!(fixture = %self.key, asset = %name, class = %self.class, "creating fixture asset");

        let form = AssetListScreen::return_home(screen)?.add_asset()?;
        form.enter_name(&name)?;
        form.select_class(&self.class)?;
        let home = form.create()?.close()?;

        home.search(&name)?;
        let listed = home.has_asset(&name);
        home.clear_search()?;
        ensure(listed, format!("fixture asset '{name}' not listed after creation"))?;

        self.created = Some(name);
        Ok(())
    }

    fn release(&mut self, screen: Screen<'_>) -> SuiteResult<()> {
        let Some(name) = self.created.take() else {
            return Ok(());
        };
        info!(fixture = %self.key, asset = %name, "deleting fixture asset");
        let home = AssetListScreen::return_home(screen)?
            .open_asset(&name)?
            .delete_asset()?;
        ensure(
            !home.has_asset(&name),
            format!("fixture asset '{name}' still listed after delete"),
        )
    }

    fn name(&self) -> &str {
        &self.key
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn value(&self) -> Option<&str> {
        self.created.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::screens::test_support::screen;
    use crate::sim::SimulatedApp;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    fn recording(name: &str, priority: i32, journal: &Journal) -> Box<dyn Fixture> {
        let (up, down) = (Rc::clone(journal), Rc::clone(journal));
        let (n1, n2) = (name.to_string(), name.to_string());
        Box::new(
            SimpleFixture::new(name)
                .with_priority(priority)
                .with_provision(move |_| {
                    up.borrow_mut().push(format!("+{n1}"));
                    Ok(Some(format!("{n1}-value")))
                })
                .with_release(move |_| {
                    down.borrow_mut().push(format!("-{n2}"));
                    Ok(())
                }),
        )
    }

    fn failing(name: &str) -> Box<dyn Fixture> {
        Box::new(
            SimpleFixture::new(name)
                .with_provision(|_| Err(SuiteError::assertion("backend refused"))),
        )
    }

    mod fixture_set_tests {
        use super::*;

        #[test]
        fn test_priority_order_and_reverse_release() {
            let app = SimulatedApp::signed_in();
            let journal = Journal::default();
            let mut set = FixtureSet::new();
            set.add(recording("low", 0, &journal));
            set.add(recording("high", 10, &journal));
            set.add(recording("mid", 5, &journal));

            set.provision_all(screen(&app)).unwrap();
            assert_eq!(set.value("mid"), Some("mid-value"));
            assert_eq!(set.state("high"), Some(FixtureState::Provisioned));

            set.release_all(screen(&app)).unwrap();
            assert_eq!(
                *journal.borrow(),
                vec!["+high", "+mid", "+low", "-low", "-mid", "-high"]
            );
            assert_eq!(set.state("low"), Some(FixtureState::Released));
            assert_eq!(set.value("low"), None);
        }

        #[test]
        fn test_partial_failure_rolls_back() {
            let app = SimulatedApp::signed_in();
            let journal = Journal::default();
            let mut set = FixtureSet::new();
            set.add(recording("first", 2, &journal));
            set.add(failing("second"));
            set.add(recording("never", -1, &journal));

            let err = set.provision_all(screen(&app)).unwrap_err();
            assert!(matches!(err, SuiteError::Fixture { .. }));
            assert!(err.to_string().contains("'second'"));
            assert_eq!(*journal.borrow(), vec!["+first", "-first"]);
            assert_eq!(set.state("second"), Some(FixtureState::Failed));
            assert_eq!(set.state("never"), Some(FixtureState::Declared));
        }

        #[test]
        fn test_release_keeps_first_error_and_continues() {
            let app = SimulatedApp::signed_in();
            let journal = Journal::default();
            let mut set = FixtureSet::new();
            set.add(recording("a", 1, &journal));
            set.add(Box::new(
                SimpleFixture::new("b").with_release(|_| Err(SuiteError::assertion("stuck"))),
            ));

            set.provision_all(screen(&app)).unwrap();
            let err = set.release_all(screen(&app)).unwrap_err();
            assert!(err.to_string().contains("'b' release failed"));
            assert_eq!(*journal.borrow(), vec!["+a", "-a"]);
        }
    }

    mod asset_fixture_tests {
        use super::*;

        #[test]
        fn test_unique_names_differ() {
            let a = unique_name("Zz");
            let b = unique_name("Zz");
            assert!(a.starts_with("Zz "));
            assert_ne!(a, b);
        }

        #[test]
        fn test_creates_and_deletes_asset() {
            let app = SimulatedApp::signed_in();
            let before = app.asset_names().len();
            let mut fixture = AssetFixture::new("source", "Transformer").with_prefix("AT Source");

            fixture.provision(screen(&app)).unwrap();
            let name = fixture.value().unwrap().to_string();
            assert!(name.starts_with("AT Source "));
            assert_eq!(
                app.stored_classification(&name),
                Some(("Transformer".to_string(), None))
            );
            assert_eq!(app.current_screen(), "Asset List");

            fixture.release(screen(&app)).unwrap();
            assert_eq!(app.asset_names().len(), before);
            assert!(fixture.created().is_none());
        }

        #[test]
        fn test_release_without_provision_is_noop() {
            let app = SimulatedApp::signed_in();
            let mut fixture = AssetFixture::new("unused", "Motor");
            fixture.release(screen(&app)).unwrap();
            assert_eq!(app.query_count(), 0);
        }
    }
}
