//! New Task form.

use super::{ids, EditAssetScreen};
use crate::locator::LocatorSpec;
use crate::result::SuiteResult;
use crate::screen::{EntryMode, Screen, ScreenObject};

/// Form for adding a maintenance task to the open asset. Create stays
/// disabled until both title and description are filled in.
#[derive(Debug, Clone, Copy)]
pub struct NewTaskScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> NewTaskScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Type the task title
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn enter_title(&self, title: &str) -> SuiteResult<()> {
        self.screen
            .enter(&LocatorSpec::id(ids::NEW_TASK_TITLE), title, EntryMode::Replace)
    }

    /// Type the task description
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn enter_description(&self, description: &str) -> SuiteResult<()> {
        self.screen.enter(
            &LocatorSpec::id(ids::NEW_TASK_DESCRIPTION),
            description,
            EntryMode::Replace,
        )
    }

    /// Whether Create Task is enabled
    #[must_use]
    pub fn is_create_enabled(&self) -> bool {
        self.screen
            .is_enabled(&LocatorSpec::id(ids::NEW_TASK_CREATE))
    }

    /// Create the task and return to the asset
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::ElementNotInteractable`] while Create is
    /// disabled.
    pub fn create(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::NEW_TASK_CREATE),
            EditAssetScreen::new(self.screen),
        )
    }

    /// Discard the form
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if Edit Asset never
    /// reappears.
    pub fn cancel(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::NEW_TASK_CANCEL),
            EditAssetScreen::new(self.screen),
        )
    }
}

impl<'s> ScreenObject<'s> for NewTaskScreen<'s> {
    fn name(&self) -> &'static str {
        "New Task"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::NEW_TASK_HEADER)
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::result::SuiteError;
    use crate::screens::test_support::screen;
    use crate::screens::AssetListScreen;
    use crate::sim::SimulatedApp;

    #[test]
    fn test_create_requires_title_and_description() {
        let app = SimulatedApp::signed_in();
        let form = AssetListScreen::new(screen(&app))
            .open_asset("Panel LP-1")
            .unwrap()
            .open_new_task()
            .unwrap();
        assert!(!form.is_create_enabled());
        form.enter_title("Torque check").unwrap();
        assert!(!form.is_create_enabled());
        let err = form.create().unwrap_err();
        assert!(matches!(err, SuiteError::ElementNotInteractable { .. }));

        form.enter_description("Re-torque lugs to spec").unwrap();
        assert!(form.is_create_enabled());
        let edit = form.create().unwrap();
        assert_eq!(edit.task_titles().unwrap(), vec!["Torque check"]);
    }

    #[test]
    fn test_cancel_adds_nothing() {
        let app = SimulatedApp::signed_in();
        let edit = AssetListScreen::new(screen(&app))
            .open_asset("Panel LP-1")
            .unwrap();
        let form = edit.open_new_task().unwrap();
        form.enter_title("Never saved").unwrap();
        let edit = form.cancel().unwrap();
        assert!(edit.task_titles().unwrap().is_empty());
    }
}
