//! Screen Objects for the asset management app.
//!
//! One type per logical screen. Each borrows the session through a
//! [`Screen`](crate::screen::Screen) core, exposes the operations a tester
//! thinks in, and returns the next screen's object only once that screen's
//! signature element is showing.
//!
//! ```text
//! Login ──▶ Site list ──▶ Asset List ──┬──▶ New Asset ──▶ Edit Asset
//!                             ▲        └──▶ Edit Asset ──┬──▶ New Task
//!                             │                          ├──▶ New Issue
//!                             └── save / close / delete ─┼──▶ New Connection
//!                                                        ├──▶ Link Existing Node
//!                                                        └──▶ Create Child Asset
//! ```

#[allow(missing_docs)]
pub mod ids;

mod asset_list;
mod child_asset;
mod edit_asset;
mod link_node;
mod login;
mod new_asset;
mod new_connection;
mod new_issue;
mod new_task;

pub use asset_list::{AssetListScreen, Grouping};
pub use child_asset::ChildAssetScreen;
pub use edit_asset::{EditAssetScreen, Section};
pub use link_node::LinkNodeScreen;
pub use login::{LoginScreen, SiteListScreen};
pub use new_asset::NewAssetScreen;
pub use new_connection::{ConnectionKind, CreateOutcome, NewConnectionScreen};
pub use new_issue::NewIssueScreen;
pub use new_task::NewTaskScreen;

use crate::locator::LocatorSpec;
use crate::screen::Picker;

/// The asset class dropdown shared by New Asset, Edit Asset and Create Child
/// Asset; only the opening control differs.
pub(crate) fn class_picker(control: &str) -> Picker {
    Picker {
        name: "Asset Class",
        control: LocatorSpec::id(control),
        list: LocatorSpec::id(ids::CLASS_LIST),
        options: LocatorSpec::id(ids::CLASS_OPTION),
        dismiss: LocatorSpec::id(ids::CLASS_DISMISS),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::screen::Screen;
    use crate::sim::SimulatedApp;
    use crate::wait::WaitOptions;

    /// Short waits keep failing-path tests fast
    pub fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(300).with_poll_interval(5)
    }

    pub fn screen(app: &SimulatedApp) -> Screen<'_> {
        Screen::new(app, fast())
    }
}
