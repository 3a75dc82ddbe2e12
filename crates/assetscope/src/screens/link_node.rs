//! Link Existing Node: attach an existing asset as a child.

use super::{ids, EditAssetScreen};
use crate::driver::Role;
use crate::locator::{escape_predicate_literal, LocatorSpec};
use crate::result::{SuiteError, SuiteResult};
use crate::screen::{EntryMode, Screen, ScreenObject};

/// Searchable list of assets that can become children of the open asset.
#[derive(Debug, Clone, Copy)]
pub struct LinkNodeScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> LinkNodeScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Filter candidates by name
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn search(&self, term: &str) -> SuiteResult<()> {
        self.screen
            .enter(&LocatorSpec::id(ids::LINK_SEARCH), term, EntryMode::Replace)
    }

    /// Candidate names currently listed
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn node_names(&self) -> SuiteResult<Vec<String>> {
        self.screen.texts_of(&LocatorSpec::id(ids::LINK_ROW))
    }

    /// Mark a candidate for linking.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::OptionNotFound`] if it is not listed.
    pub fn select_node(&self, name: &str) -> SuiteResult<()> {
        let available = self.node_names()?;
        if !available.iter().any(|n| n == name) {
            return Err(SuiteError::OptionNotFound {
                control: "Link Existing Node".to_string(),
                option: name.to_string(),
                available,
            });
        }
        self.screen.click(&LocatorSpec::role_text(Role::Cell, name))
    }

    /// The candidate marked for linking
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn selected_node(&self) -> SuiteResult<Option<String>> {
        let spec = LocatorSpec::predicate(format!(
            "name == '{}' AND value == '{}'",
            ids::LINK_ROW,
            escape_predicate_literal("selected")
        ));
        Ok(self.screen.texts_of(&spec)?.into_iter().next())
    }

    /// Link the selected node and return to the asset
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::ElementNotInteractable`] when nothing is
    /// selected.
    pub fn link(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::LINK_CONFIRM),
            EditAssetScreen::new(self.screen),
        )
    }

    /// Leave without linking
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] if Edit Asset never
    /// reappears.
    pub fn cancel(&self) -> SuiteResult<EditAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::LINK_CANCEL),
            EditAssetScreen::new(self.screen),
        )
    }
}

impl<'s> ScreenObject<'s> for LinkNodeScreen<'s> {
    fn name(&self) -> &'static str {
        "Link Existing Node"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::LINK_HEADER)
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
    fn test_link_existing_node_as_child() {
        let app = SimulatedApp::signed_in();
        let picker = AssetListScreen::new(screen(&app))
            .open_asset("Main Switchboard MSB-1")
            .unwrap()
            .open_link_existing_node()
            .unwrap();
        assert!(!picker
            .node_names()
            .unwrap()
            .contains(&"Main Switchboard MSB-1".to_string()));

        picker.search("LP-2").unwrap();
        assert_eq!(picker.node_names().unwrap(), vec!["Panel LP-2"]);
        picker.select_node("Panel LP-2").unwrap();
        assert_eq!(picker.selected_node().unwrap().as_deref(), Some("Panel LP-2"));

        let edit = picker.link().unwrap();
        assert_eq!(edit.child_names().unwrap(), vec!["Panel LP-2"]);
        assert_eq!(
            app.parent_of("Panel LP-2").as_deref(),
            Some("Main Switchboard MSB-1")
        );
    }

    #[test]
    fn test_link_without_selection_is_blocked() {
        let app = SimulatedApp::signed_in();
        let picker = AssetListScreen::new(screen(&app))
            .open_asset("Main Switchboard MSB-1")
            .unwrap()
            .open_link_existing_node()
            .unwrap();
        let err = picker.link().unwrap_err();
        assert!(matches!(err, SuiteError::ElementNotInteractable { .. }));
        assert!(picker.cancel().unwrap().child_names().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_node_is_option_not_found() {
        let app = SimulatedApp::signed_in();
        let picker = AssetListScreen::new(screen(&app))
            .open_asset("Panel LP-1")
            .unwrap()
            .open_link_existing_node()
            .unwrap();
        let err = picker.select_node("Nowhere").unwrap_err();
        assert!(matches!(err, SuiteError::OptionNotFound { .. }));
        assert_eq!(picker.selected_node().unwrap(), None);
    }
}
