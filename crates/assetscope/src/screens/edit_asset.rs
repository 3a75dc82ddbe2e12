//! Edit Asset: asset details plus its tasks, issues, connections and
//! children, in one scrolling form.

use super::{
    class_picker, ids, AssetListScreen, ChildAssetScreen, ConnectionKind, LinkNodeScreen,
    NewConnectionScreen, NewIssueScreen, NewTaskScreen,
};
use crate::locator::LocatorSpec;
use crate::result::SuiteResult;
use crate::screen::{confirm_arrival, Picker, Screen, ScreenObject};
use tracing::{debug, info};

/// Placeholder the subtype control shows when nothing is chosen
const NO_SUBTYPE: &str = "None";

/// Collapsible sections of the form, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Name, class and subtype
    Details,
    /// Maintenance tasks
    Tasks,
    /// Reported issues
    Issues,
    /// Lineside/loadside connections
    Connections,
    /// Child assets
    ChildAssets,
}

impl Section {
    /// Every section in display order
    pub const ALL: [Self; 5] = [
        Self::Details,
        Self::Tasks,
        Self::Issues,
        Self::Connections,
        Self::ChildAssets,
    ];

    const fn header_id(self) -> &'static str {
        match self {
            Self::Details => ids::SECTION_DETAILS,
            Self::Tasks => ids::SECTION_TASKS,
            Self::Issues => ids::SECTION_ISSUES,
            Self::Connections => ids::SECTION_CONNECTIONS,
            Self::ChildAssets => ids::SECTION_CHILDREN,
        }
    }

    /// Header text as shown in the app
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Details => "Details",
            Self::Tasks => "Tasks",
            Self::Issues => "Issues",
            Self::Connections => "Connections",
            Self::ChildAssets => "Child Assets",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Edit form for one asset.
#[derive(Debug, Clone, Copy)]
pub struct EditAssetScreen<'s> {
    screen: Screen<'s>,
}

impl<'s> EditAssetScreen<'s> {
    /// Wrap the interaction core
    #[must_use]
    pub const fn new(screen: Screen<'s>) -> Self {
        Self { screen }
    }

    /// Name shown in the Details section
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn asset_name(&self) -> SuiteResult<Option<String>> {
        self.screen.read_value(&LocatorSpec::id(ids::EDIT_NAME))
    }

    /// Asset class shown in the Details section
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn asset_class(&self) -> SuiteResult<Option<String>> {
        self.screen.read_value(&LocatorSpec::id(ids::EDIT_CLASS))
    }

    /// Change the asset class. Choosing a different class clears the
    /// subtype.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::OptionNotFound`] for an unknown class.
    pub fn select_class(&self, class: &str) -> SuiteResult<()> {
        self.reveal(ids::EDIT_CLASS)?;
        self.screen.select(&class_picker(ids::EDIT_CLASS), class)
    }

    /// Whether the subtype dropdown is on screen, scrolling it into view if
    /// the class offers one. Never fails.
    #[must_use]
    pub fn is_subtype_dropdown_visible(&self) -> bool {
        let dropdown = LocatorSpec::id(ids::EDIT_SUBTYPE);
        self.screen.scroll_to(&dropdown).unwrap_or_else(|e| {
            debug!(error = %e, "subtype dropdown check failed, treating as hidden");
            false
        })
    }

    /// Whether a subtype other than the placeholder is chosen
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn is_subtype_selected(&self) -> SuiteResult<bool> {
        Ok(self.selected_subtype()?.is_some())
    }

    /// The chosen subtype, if any
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn selected_subtype(&self) -> SuiteResult<Option<String>> {
        Ok(self
            .screen
            .read_value(&LocatorSpec::id(ids::EDIT_SUBTYPE))?
            .filter(|v| v != NO_SUBTYPE && !v.is_empty()))
    }

    /// Choose a subtype.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::OptionNotFound`] for a subtype the
    /// current class does not offer; the selection is left unchanged.
    pub fn select_subtype(&self, subtype: &str) -> SuiteResult<()> {
        self.reveal(ids::EDIT_SUBTYPE)?;
        self.screen.select(&subtype_picker(), subtype)
    }

    /// Commit edits and return to the list
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if the list never
    /// reappears.
    pub fn save_changes(&self) -> SuiteResult<AssetListScreen<'s>> {
        info!("saving asset");
        self.screen.navigate(
            &LocatorSpec::id(ids::EDIT_SAVE),
            AssetListScreen::new(self.screen),
        )
    }

    /// Discard edits and return to the list
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if the list never
    /// reappears.
    pub fn close(&self) -> SuiteResult<AssetListScreen<'s>> {
        self.screen.navigate(
            &LocatorSpec::id(ids::EDIT_CLOSE),
            AssetListScreen::new(self.screen),
        )
    }

    /// Delete the asset after confirming the alert
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if the list never
    /// reappears.
    pub fn delete_asset(&self) -> SuiteResult<AssetListScreen<'s>> {
        info!("deleting asset");
        self.screen.click(&LocatorSpec::id(ids::EDIT_DELETE))?;
        self.screen
            .wait_for_present(&LocatorSpec::id(ids::DELETE_ALERT))?;
        self.screen.click(&LocatorSpec::id(ids::DELETE_CONFIRM))?;
        confirm_arrival(AssetListScreen::new(self.screen), "confirm delete")
    }

    /// Scroll until the section header is on screen
    ///
    /// # Errors
    ///
    /// Propagates gesture errors; not reaching it is `Ok(false)`.
    pub fn scroll_to_section(&self, section: Section) -> SuiteResult<bool> {
        self.screen
            .scroll_to(&LocatorSpec::id(section.header_id()))
    }

    /// Whether the section header is currently on screen
    #[must_use]
    pub fn is_section_displayed(&self, section: Section) -> bool {
        self.screen
            .is_present(&LocatorSpec::id(section.header_id()))
    }

    /// Open the New Task form
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if it never appears.
    pub fn open_new_task(&self) -> SuiteResult<NewTaskScreen<'s>> {
        self.open(ids::TASKS_ADD, NewTaskScreen::new(self.screen))
    }

    /// Open the New Issue form
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if it never appears.
    pub fn open_new_issue(&self) -> SuiteResult<NewIssueScreen<'s>> {
        self.open(ids::ISSUES_ADD, NewIssueScreen::new(self.screen))
    }

    /// Open the New Connection form for one side
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if it never appears.
    pub fn open_new_connection(&self, kind: ConnectionKind) -> SuiteResult<NewConnectionScreen<'s>> {
        let trigger = match kind {
            ConnectionKind::Lineside => ids::CONNECTIONS_ADD_LINESIDE,
            ConnectionKind::Loadside => ids::CONNECTIONS_ADD_LOADSIDE,
        };
        self.open(trigger, NewConnectionScreen::new(self.screen, kind))
    }

    /// Open the node picker for linking an existing asset as a child
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if it never appears.
    pub fn open_link_existing_node(&self) -> SuiteResult<LinkNodeScreen<'s>> {
        self.open(ids::CHILDREN_LINK_EXISTING, LinkNodeScreen::new(self.screen))
    }

    /// Open the Create Child Asset form
    ///
    /// # Errors
    ///
    /// Returns [`crate::SuiteError::UnexpectedScreen`] if it never appears.
    pub fn open_create_child(&self) -> SuiteResult<ChildAssetScreen<'s>> {
        self.open(ids::CHILDREN_CREATE, ChildAssetScreen::new(self.screen))
    }

    /// Titles of the asset's tasks
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn task_titles(&self) -> SuiteResult<Vec<String>> {
        self.screen.texts_in_tree(&LocatorSpec::id(ids::TASK_ROW))
    }

    /// Titles of the asset's issues
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn issue_titles(&self) -> SuiteResult<Vec<String>> {
        self.screen.texts_in_tree(&LocatorSpec::id(ids::ISSUE_ROW))
    }

    /// Connection rows as labelled ("Lineside: Transformer T-1")
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn connection_labels(&self) -> SuiteResult<Vec<String>> {
        self.screen
            .texts_in_tree(&LocatorSpec::id(ids::CONNECTION_ROW))
    }

    /// Number of connections
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn connection_count(&self) -> SuiteResult<usize> {
        Ok(self.screen.find(&LocatorSpec::id(ids::CONNECTION_ROW))?.len())
    }

    /// Names of the asset's children
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn child_names(&self) -> SuiteResult<Vec<String>> {
        self.screen.texts_in_tree(&LocatorSpec::id(ids::CHILD_ROW))
    }

    /// Bring a control on screen before touching it
    fn reveal(&self, id: &str) -> SuiteResult<()> {
        let _ = self.screen.scroll_to(&LocatorSpec::id(id))?;
        Ok(())
    }

    fn open<S: ScreenObject<'s>>(&self, trigger: &str, next: S) -> SuiteResult<S> {
        self.reveal(trigger)?;
        self.screen.navigate(&LocatorSpec::id(trigger), next)
    }
}

fn subtype_picker() -> Picker {
    Picker {
        name: "Subtype",
        control: LocatorSpec::id(ids::EDIT_SUBTYPE),
        list: LocatorSpec::id(ids::SUBTYPE_LIST),
        options: LocatorSpec::id(ids::SUBTYPE_OPTION),
        dismiss: LocatorSpec::id(ids::SUBTYPE_DISMISS),
    }
}

impl<'s> ScreenObject<'s> for EditAssetScreen<'s> {
    fn name(&self) -> &'static str {
        "Edit Asset"
    }

    fn signature(&self) -> LocatorSpec {
        LocatorSpec::id(ids::EDIT_HEADER)
    }

    fn screen(&self) -> &Screen<'s> {
        &self.screen
    }
}
