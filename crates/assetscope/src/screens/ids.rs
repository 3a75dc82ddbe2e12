//! Accessibility identifiers exposed by the asset application.
//!
//! This is the contract between the app's accessibility tree and the screen
//! objects; nothing outside `screens` and `sim` should spell these out.

// Login and site selection
pub const LOGIN_USERNAME: &str = "login.username";
pub const LOGIN_PASSWORD: &str = "login.password";
pub const LOGIN_SUBMIT: &str = "login.submit";
pub const LOGIN_ERROR: &str = "login.error";
pub const SITE_LIST: &str = "site.list";
pub const SITE_OPTION: &str = "site.option";

// Asset list
pub const ASSETS_TITLE: &str = "assets.title";
pub const ASSETS_SEARCH: &str = "assets.search";
pub const ASSETS_SEARCH_CLEAR: &str = "assets.search.clear";
pub const ASSETS_COUNT: &str = "assets.count";
pub const ASSETS_ADD: &str = "assets.add";
pub const ASSET_ROW: &str = "asset.row";
pub const ASSET_GROUP_HEADER: &str = "asset.group.header";
pub const GROUP_BY: &str = "assets.groupBy";
pub const GROUP_BY_LIST: &str = "groupBy.list";
pub const GROUP_BY_OPTION: &str = "groupBy.option";
pub const GROUP_BY_DISMISS: &str = "groupBy.dismiss";

// Shared asset class picker
pub const CLASS_LIST: &str = "class.list";
pub const CLASS_OPTION: &str = "class.option";
pub const CLASS_DISMISS: &str = "class.dismiss";

// New asset form
pub const NEW_ASSET_HEADER: &str = "newAsset.header";
pub const NEW_ASSET_NAME: &str = "newAsset.name";
pub const NEW_ASSET_CLASS: &str = "newAsset.class";
pub const NEW_ASSET_CREATE: &str = "newAsset.create";
pub const NEW_ASSET_CANCEL: &str = "newAsset.cancel";

// Edit asset
pub const EDIT_HEADER: &str = "editAsset.header";
pub const EDIT_NAME: &str = "editAsset.name";
pub const EDIT_CLASS: &str = "editAsset.class";
pub const EDIT_SUBTYPE: &str = "editAsset.subtype";
pub const EDIT_SAVE: &str = "editAsset.save";
pub const EDIT_CLOSE: &str = "editAsset.close";
pub const SUBTYPE_LIST: &str = "subtype.list";
pub const SUBTYPE_OPTION: &str = "subtype.option";
pub const SUBTYPE_DISMISS: &str = "subtype.dismiss";
pub const SECTION_DETAILS: &str = "section.details";
pub const SECTION_TASKS: &str = "section.tasks";
pub const SECTION_ISSUES: &str = "section.issues";
pub const SECTION_CONNECTIONS: &str = "section.connections";
pub const SECTION_CHILDREN: &str = "section.children";
pub const TASKS_ADD: &str = "tasks.add";
pub const TASK_ROW: &str = "task.row";
pub const ISSUES_ADD: &str = "issues.add";
pub const ISSUE_ROW: &str = "issue.row";
pub const CONNECTIONS_ADD_LINESIDE: &str = "connections.addLineside";
pub const CONNECTIONS_ADD_LOADSIDE: &str = "connections.addLoadside";
pub const CONNECTION_ROW: &str = "connection.row";
pub const CHILDREN_LINK_EXISTING: &str = "children.linkExisting";
pub const CHILDREN_CREATE: &str = "children.create";
pub const CHILD_ROW: &str = "child.row";

// New task
pub const NEW_TASK_HEADER: &str = "newTask.header";
pub const NEW_TASK_TITLE: &str = "newTask.title";
pub const NEW_TASK_DESCRIPTION: &str = "newTask.description";
pub const NEW_TASK_CREATE: &str = "newTask.create";
pub const NEW_TASK_CANCEL: &str = "newTask.cancel";

// New issue
pub const NEW_ISSUE_HEADER: &str = "newIssue.header";
pub const NEW_ISSUE_TYPE: &str = "newIssue.type";
pub const NEW_ISSUE_TITLE: &str = "newIssue.title";
pub const NEW_ISSUE_PRIORITY: &str = "newIssue.priority";
pub const NEW_ISSUE_CREATE: &str = "newIssue.create";
pub const NEW_ISSUE_CANCEL: &str = "newIssue.cancel";
pub const ISSUE_TYPE_LIST: &str = "issueType.list";
pub const ISSUE_TYPE_OPTION: &str = "issueType.option";
pub const ISSUE_TYPE_DISMISS: &str = "issueType.dismiss";
pub const PRIORITY_LIST: &str = "priority.list";
pub const PRIORITY_OPTION: &str = "priority.option";
pub const PRIORITY_DISMISS: &str = "priority.dismiss";

// New connection
pub const NEW_CONNECTION_HEADER: &str = "newConnection.header";
pub const NEW_CONNECTION_SOURCE: &str = "newConnection.source";
pub const NEW_CONNECTION_TYPE: &str = "newConnection.type";
pub const NEW_CONNECTION_CREATE: &str = "newConnection.create";
pub const NEW_CONNECTION_CANCEL: &str = "newConnection.cancel";
pub const NEW_CONNECTION_ERROR: &str = "newConnection.error";
pub const NODE_LIST: &str = "node.list";
pub const NODE_OPTION: &str = "node.option";
pub const NODE_DISMISS: &str = "node.dismiss";
pub const CONN_TYPE_LIST: &str = "connType.list";
pub const CONN_TYPE_OPTION: &str = "connType.option";
pub const CONN_TYPE_DISMISS: &str = "connType.dismiss";

// Link existing node
pub const LINK_HEADER: &str = "linkNode.header";
pub const LINK_SEARCH: &str = "linkNode.search";
pub const LINK_ROW: &str = "linkNode.row";
pub const LINK_CONFIRM: &str = "linkNode.link";
pub const LINK_CANCEL: &str = "linkNode.cancel";

// Create child asset
pub const CHILD_HEADER: &str = "childAsset.header";
pub const CHILD_NAME: &str = "childAsset.name";
pub const CHILD_CLASS: &str = "childAsset.class";
pub const CHILD_CREATE: &str = "childAsset.create";
pub const CHILD_CANCEL: &str = "childAsset.cancel";

// Asset deletion
pub const EDIT_DELETE: &str = "editAsset.delete";
pub const DELETE_ALERT: &str = "alert.delete";
pub const DELETE_CONFIRM: &str = "alert.delete.confirm";
pub const DELETE_CANCEL: &str = "alert.delete.cancel";

pub const ASSETS_EMPTY: &str = "assets.empty";
