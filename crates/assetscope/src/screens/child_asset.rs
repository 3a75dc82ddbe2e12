//! Create Child Asset form.

use super::{class_picker, ids, EditAssetScreen};
use crate::locator::LocatorSpec;
use crate::result::SuiteResult;
use crate::screen::{EntryMode, Screen, ScreenObject};

/// Form for creating a new asset directly under the open one.
#[derive(Debug, Clone, Copy)]
pub struct ChildAssetScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> ChildAssetScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Type the child's name
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn enter_name(&self, name: &str) -> SuiteResult<()> {
        self.screen
            .enter(&LocatorSpec::id(ids::CHILD_NAME), name, EntryMode::Replace)
    }

    /// Choose the child's class
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::OptionNotFound`] for an unknown class.
    pub fn select_class(&self, class: &str) -> SuiteResult<()> {
        self.screen.select(&class_picker(ids::CHILD_CLASS), class)
    }

    /// Whether Create is enabled
    #[must_use]
    pub fn is_create_enabled(&self) -> bool {
        self.screen.is_enabled(&LocatorSpec::id(ids::CHILD_CREATE))
    }

    /// Create the child and return to the parent
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::ElementNotInteractable`] while Create is
    /// disabled.
    pub fn create(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::CHILD_CREATE),
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
            &LocatorSpec::id(ids::CHILD_CANCEL),
            EditAssetScreen::new(self.screen),
        )
    }
}

impl<'s> ScreenObject<'s> for ChildAssetScreen<'s> {
    fn name(&self) -> &'static str {
        "Create Child Asset"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::CHILD_HEADER)
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}
