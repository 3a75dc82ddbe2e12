//! New Asset form.

use super::{class_picker, ids, AssetListScreen, EditAssetScreen};
use crate::locator::LocatorSpec;
use crate::result::SuiteResult;
use crate::screen::{EntryMode, Screen, ScreenObject};

/// Form for registering a new asset.
#[derive(Debug, Clone, Copy)]
pub struct NewAssetScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> NewAssetScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Type the asset name
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn enter_name(&self, name: &str) -> SuiteResult<()> {
        self.screen
            .enter(&LocatorSpec::id(ids::NEW_ASSET_NAME), name, EntryMode::Replace)
    }

    /// Choose the asset class
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::OptionNotFound`] for an unknown class.
    pub fn select_class(&self, class: &str) -> SuiteResult<()> {
        self.screen
            .select(&class_picker(ids::NEW_ASSET_CLASS), class)
    }

    /// Whether Create is enabled (name and class are set)
    #[must_use]
    pub fn is_create_enabled(&self) -> bool {
        self.screen
            .is_enabled(&LocatorSpec::id(ids::NEW_ASSET_CREATE))
    }

    /// Create the asset; the app opens it for editing
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::ElementNotInteractable`] while Create is
    /// disabled.
    pub fn create(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::NEW_ASSET_CREATE),
            EditAssetScreen::new(self.screen),
        )
    }

    /// Discard the form
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if the list never
    /// reappears.
    pub fn cancel(&self) -> SuiteResult<AssetListScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::NEW_ASSET_CANCEL),
            AssetListScreen::new(self.screen),
        )
    }
}

impl<'s> ScreenObject<'s> for NewAssetScreen<'s> {
    fn name(&self) -> &'static str {
        "New Asset"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::NEW_ASSET_HEADER)
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}
