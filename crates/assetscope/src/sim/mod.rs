//! Simulated Asset App
//!
//! An in-memory stand-in for the asset management app that speaks the
//! [`Session`] trait. It keeps a navigation stack of screens over a small
//! backend (assets, catalogue, tasks, issues, connections, children) and
//! renders an accessibility tree on every query, so screen objects and
//! scenarios run unchanged against it and against a real device.
//!
//! ## Example
//!
//! ```rust
//! use assetscope::sim::SimulatedApp;
//! use assetscope::screens::AssetListScreen;
//! use assetscope::{Screen, ScreenObject, WaitOptions};
//!
//! let app = SimulatedApp::signed_in();
//! let screen = Screen::new(&app, WaitOptions::new().with_timeout(500));
//! let list = AssetListScreen::new(screen);
//! assert!(list.is_displayed());
//! ```
//!
//! Transitions can be given a latency (a number of queries that see an empty
//! tree) to exercise the wait policy.

mod model;
mod predicate;

pub use model::{
    class_names, subtypes_of, CATALOGUE, CONNECTION_TYPES, GROUPINGS, ISSUE_TYPES, PRIORITIES,
    SITES,
};
pub use predicate::Predicate;

use crate::config::{Credentials, SessionConfig};
use crate::driver::{
    BoundingBox, ElementHandle, Role, Screenshot, Session, SessionProvider, SwipeDirection,
};
use crate::locator::{LocatorKind, LocatorSpec};
use crate::result::{SuiteError, SuiteResult};
use crate::screens::{ids, ConnectionKind};
use model::Backend;
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Username accepted by a default simulated app
pub const DEMO_USERNAME: &str = "inspector@example.com";

/// Password accepted by a default simulated app
pub const DEMO_PASSWORD: &str = "field-demo";

/// Credentials a default simulated app accepts, with the first site chosen
#[must_use]
pub fn demo_credentials() -> Credentials {
    Credentials::new(DEMO_USERNAME, DEMO_PASSWORD).with_site(SITES[0])
}

const VIEWPORT_ROWS: usize = 8;
const SWIPE_ROWS: usize = 4;
const ROW_HEIGHT: f32 = 44.0;
const SCREEN_WIDTH: f32 = 390.0;
const SCREEN_HEIGHT: u32 = 844;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerKind {
    GroupBy,
    Class,
    Subtype,
    IssueType,
    Priority,
    Node,
    ConnType,
}

impl PickerKind {
    /// (list, option, dismiss) identifiers
    const fn ids(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::GroupBy => (ids::GROUP_BY_LIST, ids::GROUP_BY_OPTION, ids::GROUP_BY_DISMISS),
            Self::Class => (ids::CLASS_LIST, ids::CLASS_OPTION, ids::CLASS_DISMISS),
            Self::Subtype => (ids::SUBTYPE_LIST, ids::SUBTYPE_OPTION, ids::SUBTYPE_DISMISS),
            Self::IssueType => (
                ids::ISSUE_TYPE_LIST,
                ids::ISSUE_TYPE_OPTION,
                ids::ISSUE_TYPE_DISMISS,
            ),
            Self::Priority => (ids::PRIORITY_LIST, ids::PRIORITY_OPTION, ids::PRIORITY_DISMISS),
            Self::Node => (ids::NODE_LIST, ids::NODE_OPTION, ids::NODE_DISMISS),
            Self::ConnType => (
                ids::CONN_TYPE_LIST,
                ids::CONN_TYPE_OPTION,
                ids::CONN_TYPE_DISMISS,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Login {
        username: String,
        password: String,
        error: Option<String>,
    },
    SiteSelect,
    AssetList {
        search: String,
        grouping: String,
    },
    NewAsset {
        name: String,
        class: Option<String>,
    },
    EditAsset {
        asset: u32,
        name: String,
        class: String,
        subtype: Option<String>,
        scroll: usize,
        confirming_delete: bool,
    },
    NewTask {
        asset: u32,
        title: String,
        description: String,
    },
    NewIssue {
        asset: u32,
        issue_type: Option<String>,
        title: String,
        priority: Option<String>,
    },
    NewConnection {
        asset: u32,
        kind: ConnectionKind,
        source: Option<String>,
        connection_type: Option<String>,
        error: Option<String>,
    },
    LinkNode {
        asset: u32,
        search: String,
        selected: Option<u32>,
    },
    ChildAsset {
        asset: u32,
        name: String,
        class: Option<String>,
    },
}

impl View {
    fn login() -> Self {
        Self::Login {
            username: String::new(),
            password: String::new(),
            error: None,
        }
    }

    fn asset_list() -> Self {
        Self::AssetList {
            search: String::new(),
            grouping: GROUPINGS[0].to_string(),
        }
    }

    fn edit(backend: &Backend, asset: u32) -> Option<Self> {
        backend.get(asset).map(|a| Self::EditAsset {
            asset,
            name: a.name.clone(),
            class: a.class.clone(),
            subtype: a.subtype.clone(),
            scroll: 0,
            confirming_delete: false,
        })
    }

    const fn title(&self) -> &'static str {
        match self {
            Self::Login { .. } => "Login",
            Self::SiteSelect => "Site Selection",
            Self::AssetList { .. } => "Asset List",
            Self::NewAsset { .. } => "New Asset",
            Self::EditAsset { .. } => "Edit Asset",
            Self::NewTask { .. } => "New Task",
            Self::NewIssue { .. } => "New Issue",
            Self::NewConnection { .. } => "New Connection",
            Self::LinkNode { .. } => "Link Existing Node",
            Self::ChildAsset { .. } => "Create Child Asset",
        }
    }

    /// Text buffer behind an editable element
    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match (self, name) {
            (Self::Login { username, .. }, ids::LOGIN_USERNAME) => Some(username),
            (Self::Login { password, .. }, ids::LOGIN_PASSWORD) => Some(password),
            (Self::AssetList { search, .. }, ids::ASSETS_SEARCH) => Some(search),
            (Self::NewAsset { name, .. }, ids::NEW_ASSET_NAME) => Some(name),
            (Self::EditAsset { name, .. }, ids::EDIT_NAME) => Some(name),
            (Self::NewTask { title, .. }, ids::NEW_TASK_TITLE) => Some(title),
            (Self::NewTask { description, .. }, ids::NEW_TASK_DESCRIPTION) => Some(description),
            (Self::NewIssue { title, .. }, ids::NEW_ISSUE_TITLE) => Some(title),
            (Self::LinkNode { search, .. }, ids::LINK_SEARCH) => Some(search),
            (Self::ChildAsset { name, .. }, ids::CHILD_NAME) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct State {
    backend: Backend,
    stack: Vec<View>,
    picker: Option<PickerKind>,
    accepted: Credentials,
}

impl State {
    fn top(&self) -> SuiteResult<&View> {
        self.stack
            .last()
            .ok_or_else(|| SuiteError::protocol("application has no foreground screen"))
    }

    /// Option labels for a picker in the current context
    fn picker_options(&self, kind: PickerKind) -> Vec<String> {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        }
        match (kind, self.stack.last()) {
            (PickerKind::GroupBy, _) => owned(GROUPINGS),
            (PickerKind::Class, _) => owned(&class_names()),
            (PickerKind::Subtype, Some(View::EditAsset { class, .. })) => {
                owned(subtypes_of(class))
            }
            (PickerKind::IssueType, _) => owned(ISSUE_TYPES),
            (PickerKind::Priority, _) => owned(PRIORITIES),
            (PickerKind::Node, Some(View::NewConnection { asset, .. })) => self
                .backend
                .sorted()
                .into_iter()
                .filter(|a| a.id != *asset)
                .map(|a| a.name.clone())
                .collect(),
            (PickerKind::ConnType, _) => owned(CONNECTION_TYPES),
            _ => Vec::new(),
        }
    }

    fn link_candidates(&self, asset: u32, search: &str) -> Vec<(u32, String)> {
        let needle = search.to_lowercase();
        self.backend
            .sorted()
            .into_iter()
            .filter(|a| a.parent != Some(asset))
            .filter(|a| !self.backend.is_self_or_ancestor(a.id, asset))
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .map(|a| (a.id, a.name.clone()))
            .collect()
    }
}

/// One row of the scrollable Edit Asset content
struct Row {
    role: Role,
    name: &'static str,
    label: String,
    value: Option<String>,
}

impl Row {
    fn new(role: Role, name: &'static str, label: impl Into<String>) -> Self {
        Self {
            role,
            name,
            label: label.into(),
            value: None,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

fn edit_rows(
    backend: &Backend,
    asset: u32,
    name: &str,
    class: &str,
    subtype: Option<&str>,
) -> Vec<Row> {
    let mut rows = vec![
        Row::new(Role::StaticText, ids::SECTION_DETAILS, "Details"),
        Row::new(Role::TextField, ids::EDIT_NAME, "Name").with_value(name),
        Row::new(Role::Button, ids::EDIT_CLASS, "Asset Class").with_value(class),
    ];
    if !subtypes_of(class).is_empty() {
        rows.push(
            Row::new(Role::Button, ids::EDIT_SUBTYPE, "Subtype").with_value(subtype.unwrap_or("None")),
        );
    }

    let record = backend.get(asset);
    rows.push(Row::new(Role::StaticText, ids::SECTION_TASKS, "Tasks"));
    rows.push(Row::new(Role::Button, ids::TASKS_ADD, "New Task"));
    for task in record.iter().flat_map(|a| &a.tasks) {
        rows.push(Row::new(Role::Cell, ids::TASK_ROW, &task.title).with_value(&task.description));
    }

    rows.push(Row::new(Role::StaticText, ids::SECTION_ISSUES, "Issues"));
    rows.push(Row::new(Role::Button, ids::ISSUES_ADD, "New Issue"));
    for issue in record.iter().flat_map(|a| &a.issues) {
        rows.push(Row::new(Role::Cell, ids::ISSUE_ROW, &issue.title).with_value(&issue.issue_type));
    }

    rows.push(Row::new(Role::StaticText, ids::SECTION_CONNECTIONS, "Connections"));
    rows.push(Row::new(Role::Button, ids::CONNECTIONS_ADD_LINESIDE, "Add Lineside"));
    rows.push(Row::new(Role::Button, ids::CONNECTIONS_ADD_LOADSIDE, "Add Loadside"));
    for connection in record.iter().flat_map(|a| &a.connections) {
        let row = Row::new(Role::Cell, ids::CONNECTION_ROW, connection.label());
        rows.push(match &connection.connection_type {
            Some(t) => row.with_value(t),
            None => row,
        });
    }

    rows.push(Row::new(Role::StaticText, ids::SECTION_CHILDREN, "Child Assets"));
    rows.push(Row::new(Role::Button, ids::CHILDREN_LINK_EXISTING, "Link Existing Node"));
    rows.push(Row::new(Role::Button, ids::CHILDREN_CREATE, "Create Child Asset"));
    for child in backend.children_of(asset) {
        rows.push(Row::new(Role::Cell, ids::CHILD_ROW, &child.name).with_value(&child.class));
    }
    rows
}

/// Builds the element list for one render
#[derive(Default)]
struct Tree {
    elements: Vec<ElementHandle>,
}

impl Tree {
    fn push(&mut self, role: Role, name: &str, label: &str, value: Option<&str>) -> &mut ElementHandle {
        let index = self.elements.len();
        let mut element = ElementHandle::new(format!("{name}-{index}"), role)
            .with_name(name)
            .with_label(label);
        element.value = value.map(str::to_string);
        element.rect = Some(BoundingBox::new(
            0.0,
            index as f32 * ROW_HEIGHT,
            SCREEN_WIDTH,
            ROW_HEIGHT,
        ));
        self.elements.push(element);
        let last = self.elements.len() - 1;
        &mut self.elements[last]
    }

    fn text(&mut self, name: &str, label: &str) {
        self.push(Role::StaticText, name, label, None);
    }

    fn button(&mut self, name: &str, label: &str, enabled: bool) {
        self.push(Role::Button, name, label, None).enabled = enabled;
    }

    fn input(&mut self, role: Role, name: &str, label: &str, value: &str) {
        self.push(role, name, label, Some(value));
    }

    fn choice(&mut self, name: &str, label: &str, current: Option<&str>, placeholder: &str) {
        self.push(Role::Button, name, label, Some(current.unwrap_or(placeholder)));
    }
}

fn render(state: &State) -> Vec<ElementHandle> {
    let mut tree = Tree::default();
    let Some(view) = state.stack.last() else {
        return Vec::new();
    };
    let backend = &state.backend;

    match view {
        View::Login {
            username,
            password,
            error,
        } => {
            tree.input(Role::TextField, ids::LOGIN_USERNAME, "Username", username);
            tree.input(
                Role::SecureTextField,
                ids::LOGIN_PASSWORD,
                "Password",
                &"•".repeat(password.chars().count()),
            );
            let ready = !username.is_empty() && !password.is_empty();
            tree.button(ids::LOGIN_SUBMIT, "Sign In", ready);
            if let Some(error) = error {
                tree.text(ids::LOGIN_ERROR, error);
            }
        }
        View::SiteSelect => {
            tree.push(Role::Other, ids::SITE_LIST, "Select Site", None);
            for site in SITES {
                tree.push(Role::Cell, ids::SITE_OPTION, site, None);
            }
        }
        View::AssetList { search, grouping } => {
            tree.text(ids::ASSETS_TITLE, "Assets");
            tree.input(Role::SearchField, ids::ASSETS_SEARCH, "Search assets", search);
            if !search.is_empty() {
                tree.button(ids::ASSETS_SEARCH_CLEAR, "Clear", true);
            }
            tree.choice(ids::GROUP_BY, "Group By", Some(grouping.as_str()), "None");
            tree.button(ids::ASSETS_ADD, "Add Asset", true);

            let needle = search.to_lowercase();
            let mut matches: Vec<_> = backend
                .sorted()
                .into_iter()
                .filter(|a| a.name.to_lowercase().contains(&needle))
                .collect();
            let noun = if matches.len() == 1 { "asset" } else { "assets" };
            tree.text(ids::ASSETS_COUNT, &format!("{} {noun}", matches.len()));
            if matches.is_empty() {
                tree.text(ids::ASSETS_EMPTY, "No assets found");
            }

            let group_key = |a: &model::Asset| match grouping.as_str() {
                "Asset Class" => Some(a.class.clone()),
                "Subtype" => Some(a.subtype.clone().unwrap_or_else(|| "No Subtype".to_string())),
                _ => None,
            };
            matches.sort_by(|a, b| {
                group_key(*a)
                    .cmp(&group_key(*b))
                    .then(a.name.cmp(&b.name))
            });
            let mut current_group: Option<String> = None;
            for asset in matches {
                let key = group_key(asset);
                if key.is_some() && key != current_group {
                    if let Some(header) = &key {
                        tree.text(ids::ASSET_GROUP_HEADER, header);
                    }
                    current_group = key;
                }
                tree.push(Role::Cell, ids::ASSET_ROW, &asset.name, Some(asset.class.as_str()));
            }
        }
        View::NewAsset { name, class } => {
            tree.text(ids::NEW_ASSET_HEADER, "New Asset");
            tree.input(Role::TextField, ids::NEW_ASSET_NAME, "Name", name);
            tree.choice(ids::NEW_ASSET_CLASS, "Asset Class", class.as_deref(), "Select Class");
            tree.button(
                ids::NEW_ASSET_CREATE,
                "Create",
                !name.trim().is_empty() && class.is_some(),
            );
            tree.button(ids::NEW_ASSET_CANCEL, "Cancel", true);
        }
        View::EditAsset {
            asset,
            name,
            class,
            subtype,
            scroll,
            confirming_delete,
        } => {
            tree.text(ids::EDIT_HEADER, "Edit Asset");
            tree.button(ids::EDIT_SAVE, "Save", true);
            tree.button(ids::EDIT_CLOSE, "Close", true);
            tree.button(ids::EDIT_DELETE, "Delete", true);
            for (i, row) in edit_rows(backend, *asset, name, class, subtype.as_deref())
                .into_iter()
                .enumerate()
            {
                let visible = (*scroll..*scroll + VIEWPORT_ROWS).contains(&i);
                tree.push(row.role, row.name, &row.label, row.value.as_deref())
                    .visible = visible;
            }
            if *confirming_delete {
                tree.push(Role::Other, ids::DELETE_ALERT, "Delete this asset?", None);
                tree.button(ids::DELETE_CONFIRM, "Delete", true);
                tree.button(ids::DELETE_CANCEL, "Cancel", true);
            }
        }
        View::NewTask {
            title, description, ..
        } => {
            tree.text(ids::NEW_TASK_HEADER, "New Task");
            tree.input(Role::TextField, ids::NEW_TASK_TITLE, "Title", title);
            tree.input(Role::TextView, ids::NEW_TASK_DESCRIPTION, "Description", description);
            tree.button(
                ids::NEW_TASK_CREATE,
                "Create Task",
                !title.trim().is_empty() && !description.trim().is_empty(),
            );
            tree.button(ids::NEW_TASK_CANCEL, "Cancel", true);
        }
        View::NewIssue {
            issue_type,
            title,
            priority,
            ..
        } => {
            tree.text(ids::NEW_ISSUE_HEADER, "New Issue");
            tree.choice(ids::NEW_ISSUE_TYPE, "Issue Type", issue_type.as_deref(), "Select Type");
            tree.input(Role::TextField, ids::NEW_ISSUE_TITLE, "Title", title);
            tree.choice(
                ids::NEW_ISSUE_PRIORITY,
                "Priority",
                priority.as_deref(),
                "Select Priority",
            );
            tree.button(
                ids::NEW_ISSUE_CREATE,
                "Create Issue",
                issue_type.is_some() && !title.trim().is_empty(),
            );
            tree.button(ids::NEW_ISSUE_CANCEL, "Cancel", true);
        }
        View::NewConnection {
            kind,
            source,
            connection_type,
            error,
            ..
        } => {
            tree.text(ids::NEW_CONNECTION_HEADER, &format!("New {kind} Connection"));
            tree.choice(
                ids::NEW_CONNECTION_SOURCE,
                "Source Node",
                source.as_deref(),
                "Select Source",
            );
            tree.choice(
                ids::NEW_CONNECTION_TYPE,
                "Connection Type",
                connection_type.as_deref(),
                "Select Type",
            );
            tree.button(ids::NEW_CONNECTION_CREATE, "Create", true);
            tree.button(ids::NEW_CONNECTION_CANCEL, "Cancel", true);
            if let Some(error) = error {
                tree.text(ids::NEW_CONNECTION_ERROR, error);
            }
        }
        View::LinkNode {
            asset,
            search,
            selected,
        } => {
            tree.text(ids::LINK_HEADER, "Link Existing Node");
            tree.input(Role::SearchField, ids::LINK_SEARCH, "Search nodes", search);
            for (id, name) in state.link_candidates(*asset, search) {
                let value = (*selected == Some(id)).then_some("selected");
                tree.push(Role::Cell, ids::LINK_ROW, &name, value);
            }
            tree.button(ids::LINK_CONFIRM, "Link", selected.is_some());
            tree.button(ids::LINK_CANCEL, "Cancel", true);
        }
        View::ChildAsset { name, class, .. } => {
            tree.text(ids::CHILD_HEADER, "Create Child Asset");
            tree.input(Role::TextField, ids::CHILD_NAME, "Name", name);
            tree.choice(ids::CHILD_CLASS, "Asset Class", class.as_deref(), "Select Class");
            tree.button(
                ids::CHILD_CREATE,
                "Create",
                !name.trim().is_empty() && class.is_some(),
            );
            tree.button(ids::CHILD_CANCEL, "Cancel", true);
        }
    }

    if let Some(kind) = state.picker {
        let (list, option, dismiss) = kind.ids();
        tree.push(Role::PickerWheel, list, "Options", None);
        for label in state.picker_options(kind) {
            tree.push(Role::Cell, option, &label, None);
        }
        tree.button(dismiss, "Cancel", true);
    }

    tree.elements
}

/// In-memory asset app implementing [`Session`].
#[derive(Debug)]
pub struct SimulatedApp {
    session_id: String,
    state: RefCell<State>,
    latency: u32,
    settling: Cell<u32>,
    connected: Cell<bool>,
    queries: Cell<u64>,
}

impl Default for SimulatedApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedApp {
    /// A freshly launched app on the login screen, seeded with a site's
    /// equipment and accepting [`demo_credentials`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(Backend::seeded())
    }

    /// A launched app already signed in and showing the asset list
    #[must_use]
    pub fn signed_in() -> Self {
        let app = Self::new();
        app.state.borrow_mut().stack = vec![View::asset_list()];
        app
    }

    /// A signed-in app with no assets
    #[must_use]
    pub fn empty_site() -> Self {
        let app = Self::with_backend(Backend::empty());
        app.state.borrow_mut().stack = vec![View::asset_list()];
        app
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            session_id: format!("sim-{}", uuid::Uuid::new_v4()),
            state: RefCell::new(State {
                backend,
                stack: vec![View::login()],
                picker: None,
                accepted: demo_credentials(),
            }),
            latency: 0,
            settling: Cell::new(0),
            connected: Cell::new(true),
            queries: Cell::new(0),
        }
    }

    /// Accept a different login
    #[must_use]
    pub fn with_accepted_credentials(self, credentials: Credentials) -> Self {
        self.state.borrow_mut().accepted = credentials;
        self
    }

    /// Number of queries after each transition that see an empty tree
    #[must_use]
    pub const fn with_latency(mut self, queries: u32) -> Self {
        self.latency = queries;
        self
    }

    /// Drop the connection; every later call fails with `SessionUnavailable`
    pub fn disconnect(&self) {
        self.connected.set(false);
    }

    /// Number of tree queries served so far
    #[must_use]
    pub fn query_count(&self) -> u64 {
        self.queries.get()
    }

    /// Title of the foreground screen
    #[must_use]
    pub fn current_screen(&self) -> &'static str {
        self.state.borrow().stack.last().map_or("None", View::title)
    }

    /// Whether an option list is open
    #[must_use]
    pub fn is_picker_open(&self) -> bool {
        self.state.borrow().picker.is_some()
    }

    /// Names of every stored asset, sorted
    #[must_use]
    pub fn asset_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .backend
            .sorted()
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    /// Stored (saved) class and subtype of an asset
    #[must_use]
    pub fn stored_classification(&self, name: &str) -> Option<(String, Option<String>)> {
        self.state
            .borrow()
            .backend
            .find_by_name(name)
            .map(|a| (a.class.clone(), a.subtype.clone()))
    }

    /// Name of an asset's parent
    #[must_use]
    pub fn parent_of(&self, name: &str) -> Option<String> {
        let state = self.state.borrow();
        let parent = state.backend.find_by_name(name)?.parent?;
        state.backend.get(parent).map(|p| p.name.clone())
    }

    /// Stored issues of an asset as (type, title, priority)
    #[must_use]
    pub fn issues_of(&self, name: &str) -> Vec<(String, String, Option<String>)> {
        self.state
            .borrow()
            .backend
            .find_by_name(name)
            .map(|a| {
                a.issues
                    .iter()
                    .map(|i| (i.issue_type.clone(), i.title.clone(), i.priority.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Add an asset directly to the backend
    pub fn seed_asset(&self, name: &str, class: &str) {
        self.state.borrow_mut().backend.insert(name, class, None);
    }

    fn check_connected(&self) -> SuiteResult<()> {
        if self.connected.get() {
            Ok(())
        } else {
            Err(SuiteError::SessionUnavailable {
                message: format!("simulated session {} disconnected", self.session_id),
            })
        }
    }

    /// Re-render and find the live counterpart of a handle
    fn live(&self, element: &ElementHandle) -> SuiteResult<ElementHandle> {
        render(&self.state.borrow())
            .into_iter()
            .find(|e| e.id == element.id && e.name == element.name && e.label == element.label)
            .ok_or_else(|| SuiteError::protocol(format!("stale element reference {}", element.id)))
    }

    fn transition<F>(&self, action: F) -> SuiteResult<()>
    where
        F: FnOnce(&mut State) -> SuiteResult<()>,
    {
        let mut state = self.state.borrow_mut();
        let before = (state.stack.len(), state.stack.last().map(View::title), state.picker);
        action(&mut state)?;
        let after = (state.stack.len(), state.stack.last().map(View::title), state.picker);
        if before != after {
            debug!(from = ?before.1, to = ?after.1, "simulated transition");
            self.settling.set(self.latency);
        }
        Ok(())
    }
}

fn apply_option(state: &mut State, kind: PickerKind, label: &str) {
    let label = label.to_string();
    match (kind, state.stack.last_mut()) {
        (PickerKind::GroupBy, Some(View::AssetList { grouping, .. })) => *grouping = label,
        (PickerKind::Class, Some(View::NewAsset { class, .. } | View::ChildAsset { class, .. })) => {
            *class = Some(label);
        }
        (PickerKind::Class, Some(View::EditAsset { class, subtype, .. })) => {
            if *class != label {
                *class = label;
                *subtype = None;
            }
        }
        (PickerKind::Subtype, Some(View::EditAsset { subtype, .. })) => *subtype = Some(label),
        (PickerKind::IssueType, Some(View::NewIssue { issue_type, .. })) => {
            *issue_type = Some(label);
        }
        (PickerKind::Priority, Some(View::NewIssue { priority, .. })) => *priority = Some(label),
        (PickerKind::Node, Some(View::NewConnection { source, error, .. })) => {
            *source = Some(label);
            *error = None;
        }
        (PickerKind::ConnType, Some(View::NewConnection { connection_type, .. })) => {
            *connection_type = Some(label);
        }
        _ => {}
    }
}

fn handle_tap(state: &mut State, name: &str, label: &str) -> SuiteResult<()> {
    if let Some(kind) = state.picker {
        let (_, option, _) = kind.ids();
        if name == option {
            apply_option(state, kind, label);
        }
        // any tap while a list is open closes it
        state.picker = None;
        return Ok(());
    }

    let top = state.top()?.clone();
    match (top, name) {
        (View::Login { username, password, .. }, ids::LOGIN_SUBMIT) => {
            let accepted = &state.accepted;
            if username == accepted.username && password == accepted.password {
                state.stack = vec![View::SiteSelect];
            } else if let Some(View::Login { error, .. }) = state.stack.last_mut() {
                *error = Some("Invalid username or password".to_string());
            }
        }
        (View::SiteSelect, ids::SITE_OPTION) => state.stack = vec![View::asset_list()],

        (View::AssetList { .. }, ids::ASSETS_SEARCH_CLEAR) => {
            if let Some(View::AssetList { search, .. }) = state.stack.last_mut() {
                search.clear();
            }
        }
        (View::AssetList { .. }, ids::GROUP_BY) => state.picker = Some(PickerKind::GroupBy),
        (View::AssetList { .. }, ids::ASSETS_ADD) => state.stack.push(View::NewAsset {
            name: String::new(),
            class: None,
        }),
        (View::AssetList { .. }, ids::ASSET_ROW) => {
            let view = state
                .backend
                .find_by_name(label)
                .and_then(|a| View::edit(&state.backend, a.id))
                .ok_or_else(|| SuiteError::protocol(format!("no asset named {label:?}")))?;
            state.stack.push(view);
        }

        (View::NewAsset { .. }, ids::NEW_ASSET_CLASS)
        | (View::EditAsset { .. }, ids::EDIT_CLASS)
        | (View::ChildAsset { .. }, ids::CHILD_CLASS) => state.picker = Some(PickerKind::Class),
        (View::NewAsset { name, class: Some(class) }, ids::NEW_ASSET_CREATE)
            if !name.trim().is_empty() =>
        {
            let id = state.backend.insert(name.trim(), &class, None);
            state.stack.pop();
            if let Some(view) = View::edit(&state.backend, id) {
                state.stack.push(view);
            }
        }

        (View::EditAsset { .. }, ids::EDIT_SUBTYPE) => state.picker = Some(PickerKind::Subtype),
        (
            View::EditAsset {
                asset,
                name,
                class,
                subtype,
                ..
            },
            ids::EDIT_SAVE,
        ) => {
            if let Some(record) = state.backend.get_mut(asset) {
                record.name = name.trim().to_string();
                record.class = class;
                record.subtype = subtype;
            }
            state.stack.pop();
        }
        (View::EditAsset { .. }, ids::EDIT_DELETE) => set_confirming(state, true),
        (View::EditAsset { .. }, ids::DELETE_CANCEL) => set_confirming(state, false),
        (View::EditAsset { asset, .. }, ids::DELETE_CONFIRM) => {
            state.backend.remove(asset);
            state.stack.pop();
        }
        (View::EditAsset { asset, .. }, ids::TASKS_ADD) => state.stack.push(View::NewTask {
            asset,
            title: String::new(),
            description: String::new(),
        }),
        (View::EditAsset { asset, .. }, ids::ISSUES_ADD) => state.stack.push(View::NewIssue {
            asset,
            issue_type: None,
            title: String::new(),
            priority: None,
        }),
        (View::EditAsset { asset, .. }, ids::CONNECTIONS_ADD_LINESIDE | ids::CONNECTIONS_ADD_LOADSIDE) => {
            let kind = if name == ids::CONNECTIONS_ADD_LINESIDE {
                ConnectionKind::Lineside
            } else {
                ConnectionKind::Loadside
            };
            state.stack.push(View::NewConnection {
                asset,
                kind,
                source: None,
                connection_type: None,
                error: None,
            });
        }
        (View::EditAsset { asset, .. }, ids::CHILDREN_LINK_EXISTING) => {
            state.stack.push(View::LinkNode {
                asset,
                search: String::new(),
                selected: None,
            });
        }
        (View::EditAsset { asset, .. }, ids::CHILDREN_CREATE) => state.stack.push(View::ChildAsset {
            asset,
            name: String::new(),
            class: None,
        }),

        (View::NewTask { asset, title, description }, ids::NEW_TASK_CREATE) => {
            if let Some(record) = state.backend.get_mut(asset) {
                record.tasks.push(model::Task {
                    title: title.trim().to_string(),
                    description: description.trim().to_string(),
                });
            }
            state.stack.pop();
        }

        (View::NewIssue { .. }, ids::NEW_ISSUE_TYPE) => state.picker = Some(PickerKind::IssueType),
        (View::NewIssue { .. }, ids::NEW_ISSUE_PRIORITY) => {
            state.picker = Some(PickerKind::Priority);
        }
        (
            View::NewIssue {
                asset,
                issue_type: Some(issue_type),
                title,
                priority,
            },
            ids::NEW_ISSUE_CREATE,
        ) => {
            if let Some(record) = state.backend.get_mut(asset) {
                record.issues.push(model::Issue {
                    issue_type,
                    title: title.trim().to_string(),
                    priority,
                });
            }
            state.stack.pop();
        }

        (View::NewConnection { .. }, ids::NEW_CONNECTION_SOURCE) => {
            state.picker = Some(PickerKind::Node);
        }
        (View::NewConnection { .. }, ids::NEW_CONNECTION_TYPE) => {
            state.picker = Some(PickerKind::ConnType);
        }
        (
            View::NewConnection {
                asset,
                kind,
                source,
                connection_type,
                ..
            },
            ids::NEW_CONNECTION_CREATE,
        ) => match source {
            Some(source) => {
                if let Some(record) = state.backend.get_mut(asset) {
                    record.connections.push(model::Connection {
                        kind,
                        source,
                        connection_type,
                    });
                }
                state.stack.pop();
            }
            None => {
                if let Some(View::NewConnection { error, .. }) = state.stack.last_mut() {
                    *error = Some("Source node is required".to_string());
                }
            }
        },

        (View::LinkNode { asset, search, .. }, ids::LINK_ROW) => {
            let chosen = state
                .link_candidates(asset, &search)
                .into_iter()
                .find(|(_, candidate)| candidate == label)
                .map(|(id, _)| id);
            if let Some(View::LinkNode { selected, .. }) = state.stack.last_mut() {
                *selected = chosen;
            }
        }
        (
            View::LinkNode {
                asset,
                selected: Some(child),
                ..
            },
            ids::LINK_CONFIRM,
        ) => {
            if let Some(record) = state.backend.get_mut(child) {
                record.parent = Some(asset);
            }
            state.stack.pop();
        }

        (View::ChildAsset { asset, name, class: Some(class) }, ids::CHILD_CREATE)
            if !name.trim().is_empty() =>
        {
            state.backend.insert(name.trim(), &class, Some(asset));
            state.stack.pop();
        }

        (
            View::EditAsset { .. }
            | View::NewAsset { .. }
            | View::NewTask { .. }
            | View::NewIssue { .. }
            | View::NewConnection { .. }
            | View::LinkNode { .. }
            | View::ChildAsset { .. },
            ids::EDIT_CLOSE
            | ids::NEW_ASSET_CANCEL
            | ids::NEW_TASK_CANCEL
            | ids::NEW_ISSUE_CANCEL
            | ids::NEW_CONNECTION_CANCEL
            | ids::LINK_CANCEL
            | ids::CHILD_CANCEL,
        ) => {
            state.stack.pop();
        }

        // focus taps on inputs, rows and labels
        _ => {}
    }
    Ok(())
}

fn set_confirming(state: &mut State, value: bool) {
    if let Some(View::EditAsset {
        confirming_delete, ..
    }) = state.stack.last_mut()
    {
        *confirming_delete = value;
    }
}

fn tiny_png() -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&(SCREEN_WIDTH as u32).to_be_bytes());
    data.extend_from_slice(&SCREEN_HEIGHT.to_be_bytes());
    data.extend_from_slice(&[8, 2, 0, 0, 0]);
    data.extend_from_slice(&[0, 0, 0, 0]);
    data
}

impl Session for SimulatedApp {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn find_elements(&self, spec: &LocatorSpec) -> SuiteResult<Vec<ElementHandle>> {
        self.check_connected()?;
        self.queries.set(self.queries.get() + 1);
        let settling = self.settling.get();
        if settling > 0 {
            self.settling.set(settling - 1);
            return Ok(Vec::new());
        }

        let tree = render(&self.state.borrow());
        let found = match spec.kind() {
            LocatorKind::Predicate => {
                let predicate = Predicate::parse(spec.value())?;
                tree.into_iter().filter(|e| predicate.matches(e)).collect()
            }
            _ => tree
                .into_iter()
                .filter(|e| spec.matches(e).unwrap_or(false))
                .collect(),
        };
        Ok(found)
    }

    fn tap(&self, element: &ElementHandle) -> SuiteResult<()> {
        self.check_connected()?;
        let live = self.live(element)?;
        if !live.visible {
            return Err(SuiteError::protocol(format!(
                "element {} is not hittable",
                element.id
            )));
        }
        if !live.enabled {
            debug!(element = %element.id, "tap on disabled element ignored");
            return Ok(());
        }
        let name = live.name.unwrap_or_default();
        let label = live.label.unwrap_or_default();
        self.transition(|state| handle_tap(state, &name, &label))
    }

    fn type_text(&self, element: &ElementHandle, text: &str) -> SuiteResult<()> {
        self.check_connected()?;
        let live = self.live(element)?;
        let name = live.name.unwrap_or_default();
        let mut state = self.state.borrow_mut();
        let view = state
            .stack
            .last_mut()
            .ok_or_else(|| SuiteError::protocol("application has no foreground screen"))?;
        let field = view
            .field_mut(&name)
            .ok_or_else(|| SuiteError::protocol(format!("element {name} does not accept text")))?;
        field.push_str(text);
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> SuiteResult<()> {
        self.check_connected()?;
        let live = self.live(element)?;
        let name = live.name.unwrap_or_default();
        let mut state = self.state.borrow_mut();
        if let Some(field) = state.stack.last_mut().and_then(|v| v.field_mut(&name)) {
            field.clear();
        }
        Ok(())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> SuiteResult<Option<String>> {
        self.check_connected()?;
        let live = self.live(element)?;
        Ok(match name {
            "name" => live.name,
            "label" => live.label,
            "value" => live.value,
            "enabled" => Some(live.enabled.to_string()),
            "visible" => Some(live.visible.to_string()),
            "type" => Some(live.role.xcui_type().to_string()),
            _ => None,
        })
    }

    fn bounding_box(&self, element: &ElementHandle) -> SuiteResult<BoundingBox> {
        self.check_connected()?;
        self.live(element)?
            .rect
            .ok_or_else(|| SuiteError::protocol(format!("element {} has no frame", element.id)))
    }

    fn swipe(&self, direction: SwipeDirection) -> SuiteResult<()> {
        self.check_connected()?;
        let mut state = self.state.borrow_mut();
        let State { backend, stack, .. } = &mut *state;
        if let Some(View::EditAsset {
            asset,
            name,
            class,
            subtype,
            scroll,
            ..
        }) = stack.last_mut()
        {
            let rows = edit_rows(backend, *asset, name, class, subtype.as_deref()).len();
            let max_scroll = rows.saturating_sub(VIEWPORT_ROWS);
            *scroll = match direction {
                SwipeDirection::Up => (*scroll + SWIPE_ROWS).min(max_scroll),
                SwipeDirection::Down => scroll.saturating_sub(SWIPE_ROWS),
            };
            debug!(scroll = *scroll, "simulated scroll");
        }
        Ok(())
    }

    fn hide_keyboard(&self) -> SuiteResult<()> {
        self.check_connected()
    }

    fn screenshot(&self) -> SuiteResult<Screenshot> {
        self.check_connected()?;
        Ok(Screenshot::from_png(tiny_png()))
    }

    fn reset_app(&self) -> SuiteResult<()> {
        self.check_connected()?;
        self.transition(|state| {
            state.stack = vec![View::login()];
            state.picker = None;
            Ok(())
        })
    }
}

/// Hands out simulated sessions.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    accepted: Credentials,
    latency: u32,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(demo_credentials())
    }
}

impl SimulatedProvider {
    /// Provider whose apps accept `accepted`
    #[must_use]
    pub const fn new(accepted: Credentials) -> Self {
        Self {
            accepted,
            latency: 0,
        }
    }

    /// Transition latency for every session handed out
    #[must_use]
    pub const fn with_latency(mut self, queries: u32) -> Self {
        self.latency = queries;
        self
    }
}

impl SessionProvider for SimulatedProvider {
    fn acquire(&self, config: &SessionConfig) -> SuiteResult<Box<dyn Session>> {
        let app = SimulatedApp::new()
            .with_accepted_credentials(self.accepted.clone())
            .with_latency(self.latency);
        debug!(
            session = app.session_id(),
            device = ?config.device_name,
            "simulated session acquired"
        );
        Ok(Box::new(app))
    }

    fn release(&self, session: Box<dyn Session>) -> SuiteResult<()> {
        debug!(session = session.session_id(), "simulated session released");
        Ok(())
    }
}
