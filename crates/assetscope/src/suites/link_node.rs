//! Link Existing Node.

use super::asset;
use crate::result::{ensure, ensure_eq, SuiteError, SuiteResult};
use crate::runner::{Scenario, TestClass, TestContext, TestMeta};
use crate::screen::ScreenObject;

const MODULE: &str = "link_node";

pub fn class() -> TestClass {
    TestClass::new("Link Existing Node")
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "link_existing", "an existing asset becomes a child of the open asset"),
                link_existing,
            )
            .with_fixture(asset("parent", "Switchgear"))
            .with_fixture(asset("child", "Busway")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "selection_required", "Link is refused until a node is selected"),
                selection_required,
            )
            .with_fixture(asset("parent", "Switchgear")),
        )
}

fn link_existing(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let parent = ctx.fixture("parent")?;
    let child = ctx.fixture("child")?;
    let picker = ctx.home().open_asset(&parent)?.open_link_existing_node()?;

    picker.search(&child)?;
    ensure_eq(&picker.node_names()?, &vec![child.clone()], "candidates")?;
    picker.select_node(&child)?;
    ensure_eq(&picker.selected_node()?, &Some(child.clone()), "selected node")?;
    ctx.checkpoint(format!("'{child}' selected"))?;

    let edit = picker.link()?;
    ensure_eq(&edit.child_names()?, &vec![child], "children")
}

fn selection_required(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let parent = ctx.fixture("parent")?;
    let picker = ctx.home().open_asset(&parent)?.open_link_existing_node()?;

    match picker.link() {
        Err(SuiteError::ElementNotInteractable { element, .. }) => {
            ctx.step(format!("{element} refused without a selection"));
        }
        Err(e) => return Err(e),
        Ok(_) => return Err(SuiteError::assertion("linked with nothing selected")),
    }
    ensure(picker.is_displayed(), "link picker closed")?;

    let edit = picker.cancel()?;
    ensure(edit.child_names()?.is_empty(), "children appeared without a link")
}
