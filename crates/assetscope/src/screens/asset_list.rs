//! The asset list: home screen after sign-in.

use super::ids;
use super::{EditAssetScreen, NewAssetScreen};
use crate::locator::{escape_predicate_literal, LocatorSpec};
use crate::result::{SuiteError, SuiteResult};
use crate::screen::{confirm_arrival, EntryMode, Picker, Screen, ScreenObject};
use tracing::{debug, info};

/// Grouping modes offered by the Group By control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Flat list
    None,
    /// One section per asset class
    AssetClass,
    /// One section per subtype
    Subtype,
}

impl Grouping {
    /// Option label as shown in the app
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::AssetClass => "Asset Class",
            Self::Subtype => "Subtype",
        }
    }
}

/// Controls that leave a secondary screen, most nested first.
const BACK_CONTROLS: &[&str] = &[
    ids::GROUP_BY_DISMISS,
    ids::CLASS_DISMISS,
    ids::SUBTYPE_DISMISS,
    ids::ISSUE_TYPE_DISMISS,
    ids::PRIORITY_DISMISS,
    ids::NODE_DISMISS,
    ids::CONN_TYPE_DISMISS,
    ids::DELETE_CANCEL,
    ids::NEW_TASK_CANCEL,
    ids::NEW_ISSUE_CANCEL,
    ids::NEW_CONNECTION_CANCEL,
    ids::LINK_CANCEL,
    ids::CHILD_CANCEL,
    ids::NEW_ASSET_CANCEL,
    ids::EDIT_CLOSE,
];

/// Upper bound on back-navigation steps in `return_home`
const MAX_BACK_STEPS: usize = 8;

/// Searchable, groupable list of the site's assets.
#[derive(Debug, Clone, Copy)]
pub struct AssetListScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> AssetListScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Navigate back to the asset list from wherever the app is, discarding
    /// open forms and pickers, and clear any search.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] if the list cannot be reached
    /// (for example, the app is signed out).
    pub fn return_home(screen: Screen<'s>) -> SuiteResult<Self> {
        let home = Self::new(screen);
        for _ in 0..MAX_BACK_STEPS {
            if home.is_displayed() {
                break;
            }
            let Some(back) = BACK_CONTROLS
                .iter()
                .map(|id| LocatorSpec::id(*id))
                .find(|spec| screen.is_present(spec))
            else {
                break;
            };
            debug!(control = %back, "backing out");
            screen.click(&back)?;
            screen.wait_for_absent(&back)?;
        }
        let home = confirm_arrival(home, "return home")?;
        if home.search_term()?.is_some_and(|t| !t.is_empty()) {
            home.clear_search()?;
        }
        Ok(home)
    }

    /// Type a search term, replacing any previous one
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn search(&self, term: &str) -> SuiteResult<()> {
        info!(term, "searching assets");
        self.screen.enter(
            &LocatorSpec::id(ids::ASSETS_SEARCH),
            term,
            EntryMode::Replace,
        )
    }

    /// Remove the search term and show every asset
    ///
    /// # Errors
    ///
    /// Propagates interaction errors.
    pub fn clear_search(&self) -> SuiteResult<()> {
        let clear = LocatorSpec::id(ids::ASSETS_SEARCH_CLEAR);
        if self.screen.is_present(&clear) {
            self.screen.click(&clear)?;
            self.screen.wait_for_absent(&clear)
        } else {
            self.search("")
        }
    }

    /// Current search term
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn search_term(&self) -> SuiteResult<Option<String>> {
        Ok(self
            .screen
            .find(&LocatorSpec::id(ids::ASSETS_SEARCH).visible_only())?
            .into_iter()
            .next()
            .and_then(|e| e.value))
    }

    /// Number of asset rows currently listed
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn asset_count(&self) -> SuiteResult<usize> {
        self.screen.count(&LocatorSpec::id(ids::ASSET_ROW))
    }

    /// The count the app reports in its summary label ("12 assets")
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::AssertionFailed`] if the label is missing or
    /// not a count.
    pub fn reported_count(&self) -> SuiteResult<usize> {
        let label = self
            .screen
            .value_of(&LocatorSpec::id(ids::ASSETS_COUNT))?
            .ok_or_else(|| SuiteError::assertion("asset count label is missing"))?;
        label
            .split_whitespace()
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| SuiteError::assertion(format!("unreadable asset count {label:?}")))
    }

    /// Names of the listed assets, in display order
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn asset_names(&self) -> SuiteResult<Vec<String>> {
        self.screen.texts_of(&LocatorSpec::id(ids::ASSET_ROW))
    }

    /// Names of listed assets starting with `prefix`
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn asset_names_starting_with(&self, prefix: &str) -> SuiteResult<Vec<String>> {
        let spec = LocatorSpec::predicate(format!(
            "name == '{}' AND label BEGINSWITH '{}'",
            ids::ASSET_ROW,
            escape_predicate_literal(prefix)
        ));
        self.screen.texts_of(&spec)
    }

    /// Whether the "no results" placeholder is showing
    #[must_use]
    pub fn is_empty_state_shown(&self) -> bool {
        self.screen.is_present(&LocatorSpec::id(ids::ASSETS_EMPTY))
    }

    /// Whether an asset with exactly this name is listed
    #[must_use]
    pub fn has_asset(&self, name: &str) -> bool {
        self.screen.is_present(&row(name))
    }

    /// Open an asset for editing.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::ElementNotInteractable`] if no such row is
    /// listed, or [`SuiteError::UnexpectedScreen`] if Edit Asset never
    /// appears.
    pub fn open_asset(&self, name: &str) -> SuiteResult<EditAssetScreen<'s>> {
        info!(asset = name, "opening asset");
        self.screen
            .navigate(&row(name), EditAssetScreen::new(self.screen))
    }

    /// Choose a grouping mode by its label.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::OptionNotFound`] for an unknown mode; the
    /// current grouping is left as it was.
    pub fn group_by(&self, option: &str) -> SuiteResult<()> {
        self.screen.select(&group_picker(), option)
    }

    /// The grouping currently applied
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn current_grouping(&self) -> SuiteResult<Option<String>> {
        self.screen
            .find(&LocatorSpec::id(ids::GROUP_BY).visible_only())
            .map(|found| found.into_iter().next().and_then(|e| e.value))
    }

    /// Section headers shown while grouped
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn group_headers(&self) -> SuiteResult<Vec<String>> {
        self.screen
            .texts_of(&LocatorSpec::id(ids::ASSET_GROUP_HEADER))
    }

    /// Open the New Asset form
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnexpectedScreen`] if the form never appears.
    pub fn add_asset(&self) -> SuiteResult<NewAssetScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::ASSETS_ADD),
            NewAssetScreen::new(self.screen),
        )
    }
}

fn row(name: &str) -> LocatorSpec {
    LocatorSpec::predicate(format!(
        "name == '{}' AND label == '{}'",
        ids::ASSET_ROW,
        escape_predicate_literal(name)
    ))
}

fn group_picker() -> Picker {
    Picker {
        name: "Group By",
        control: LocatorSpec::id(ids::GROUP_BY),
        list: LocatorSpec::id(ids::GROUP_BY_LIST),
        options: LocatorSpec::id(ids::GROUP_BY_OPTION),
        dismiss: LocatorSpec::id(ids::GROUP_BY_DISMISS),
    }
}

impl<'s> ScreenObject<'s> for AssetListScreen<'s> {
    fn name(&self) -> &'static str {
        "Asset List"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::ASSETS_TITLE)
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
    use crate::sim::SimulatedApp;

    mod search_tests {
        use super::*;

        #[test]
        fn test_search_narrows_and_clear_restores() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            let total = list.asset_count().unwrap();
            assert_eq!(list.reported_count().unwrap(), total);

            list.search("panel").unwrap();
            assert_eq!(list.asset_names().unwrap(), vec!["Panel LP-1", "Panel LP-2"]);
            assert_eq!(list.reported_count().unwrap(), 2);

            list.clear_search().unwrap();
            assert_eq!(list.asset_count().unwrap(), total);
        }

        #[test]
        fn test_search_with_no_matches_shows_empty_state() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            list.search("zzz-no-such-asset").unwrap();
            assert_eq!(list.asset_count().unwrap(), 0);
            assert!(list.is_empty_state_shown());
        }

        #[test]
        fn test_prefix_query_uses_predicate() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            assert_eq!(
                list.asset_names_starting_with("Pump").unwrap(),
                vec!["Pump Motor M-7"]
            );
        }
    }

    mod grouping_tests {
        use super::*;

        #[test]
        fn test_group_by_class_shows_headers() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            assert!(list.group_headers().unwrap().is_empty());
            list.group_by(Grouping::AssetClass.label()).unwrap();
            let headers = list.group_headers().unwrap();
            assert!(headers.contains(&"Panelboard".to_string()));
            assert_eq!(
                list.current_grouping().unwrap().as_deref(),
                Some("Asset Class")
            );
        }

        #[test]
        fn test_unknown_grouping_leaves_list_unchanged() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            let err = list.group_by("Colour").unwrap_err();
            match err {
                SuiteError::OptionNotFound { available, .. } => {
                    assert_eq!(available, vec!["None", "Asset Class", "Subtype"]);
                }
                other => panic!("unexpected {other:?}"),
            }
            assert!(!app.is_picker_open());
            assert_eq!(list.current_grouping().unwrap().as_deref(), Some("None"));
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_open_asset_confirms_edit_screen() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            let edit = list.open_asset("Transformer T-1").unwrap();
            assert!(edit.is_displayed());
        }

        #[test]
        fn test_open_missing_asset_is_not_interactable() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            let err = list.open_asset("Ghost").unwrap_err();
            assert!(matches!(err, SuiteError::ElementNotInteractable { .. }));
        }

        #[test]
        fn test_return_home_backs_out_of_nested_forms() {
            let app = SimulatedApp::signed_in();
            let list = AssetListScreen::new(screen(&app));
            list.search("Panel").unwrap();
            let edit = list.open_asset("Panel LP-1").unwrap();
            let _task = edit.open_new_task().unwrap();
            assert_eq!(app.current_screen(), "New Task");

            let home = AssetListScreen::return_home(screen(&app)).unwrap();
            assert!(home.is_displayed());
            assert_eq!(home.search_term().unwrap().as_deref(), Some(""));
        }

        #[test]
        fn test_return_home_from_login_fails() {
            let app = SimulatedApp::new();
            let err = AssetListScreen::return_home(screen(&app)).unwrap_err();
            assert!(matches!(err, SuiteError::UnexpectedScreen { .. }));
        }
    }
}
