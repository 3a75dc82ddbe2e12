//! New Issue form.

use super::{ids, EditAssetScreen};
use crate::locator::LocatorSpec;
use crate::result::SuiteResult;
use crate::screen::{EntryMode, Picker, Screen, ScreenObject};

/// Form for reporting an issue against the open asset. Issue type and
/// title are mandatory; priority is optional.
#[derive(Debug, Clone, Copy)]
pub struct NewIssueScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> NewIssueScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Choose the issue type
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::OptionNotFound`] for an unknown type.
    pub fn select_issue_type(&self, issue_type: &str) -> SuiteResult<()> {
        let picker = Picker {
            name: "Issue Type",
            control: LocatorSpec::id(ids::NEW_ISSUE_TYPE),
            list: LocatorSpec::id(ids::ISSUE_TYPE_LIST),
            options: LocatorSpec::id(ids::ISSUE_TYPE_OPTION),
            dismiss: LocatorSpec::id(ids::ISSUE_TYPE_DISMISS),
        };
        self.screen.select(&picker, issue_type)
    }

    /// Type the issue title
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn enter_title(&self, title: &str) -> SuiteResult<()> {
        self.screen
            .enter(&LocatorSpec::id(ids::NEW_ISSUE_TITLE), title, EntryMode::Replace)
    }

    /// Choose a priority
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::OptionNotFound`] for an unknown priority.
    pub fn select_priority(&self, priority: &str) -> SuiteResult<()> {
        let picker = Picker {
            name: "Priority",
            control: LocatorSpec::id(ids::NEW_ISSUE_PRIORITY),
            list: LocatorSpec::id(ids::PRIORITY_LIST),
            options: LocatorSpec::id(ids::PRIORITY_OPTION),
            dismiss: LocatorSpec::id(ids::PRIORITY_DISMISS),
        };
        self.screen.select(&picker, priority)
    }

    /// Whether Create Issue is enabled
    #[must_use]
    pub fn is_create_enabled(&self) -> bool {
        self.screen
            .is_enabled(&LocatorSpec::id(ids::NEW_ISSUE_CREATE))
    }

    /// Create the issue and return to the asset
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::ElementNotInteractable`] while Create is
    /// disabled.
    pub fn create(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::NEW_ISSUE_CREATE),
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
            &LocatorSpec::id(ids::NEW_ISSUE_CANCEL),
            EditAssetScreen::new(self.screen),
        )
    }
}

impl<'s> ScreenObject<'s> for NewIssueScreen<'s> {
    fn name(&self) -> &'static str {
        "New Issue"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::NEW_ISSUE_HEADER)
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::screens::test_support::screen;
    use crate::screens::AssetListScreen;
    use crate::sim::SimulatedApp;

    #[test]
    fn test_issue_with_priority_is_recorded() {
        let app = SimulatedApp::signed_in();
        let form = AssetListScreen::new(screen(&app))
            .open_asset("Transformer T-1")
            .unwrap()
            .open_new_issue()
            .unwrap();
        assert!(!form.is_create_enabled());
        form.select_issue_type("Thermal Anomaly").unwrap();
        form.enter_title("Hot spot on X2 bushing").unwrap();
        form.select_priority("High").unwrap();
        let edit = form.create().unwrap();

        assert_eq!(edit.issue_titles().unwrap(), vec!["Hot spot on X2 bushing"]);
        let stored = app.issues_of("Transformer T-1");
        assert_eq!(stored[0].0, "Thermal Anomaly");
        assert_eq!(stored[0].2.as_deref(), Some("High"));
    }

    #[test]
    fn test_type_alone_does_not_enable_create() {
        let app = SimulatedApp::signed_in();
        let form = AssetListScreen::new(screen(&app))
            .open_asset("Transformer T-1")
            .unwrap()
            .open_new_issue()
            .unwrap();
        form.select_issue_type("Repair Needed").unwrap();
        assert!(!form.is_create_enabled());
    }
}
