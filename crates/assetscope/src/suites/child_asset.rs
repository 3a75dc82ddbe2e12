//! Create Child Asset.

use super::asset;
use crate::result::{ensure, ensure_eq, SuiteResult};
use crate::runner::{Scenario, TestClass, TestContext, TestMeta};

const MODULE: &str = "child_asset";

pub fn class() -> TestClass {
    TestClass::new("Create Child Asset")
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "child_created", "a child created from the parent is listed under it"),
                child_created,
            )
            .with_fixture(asset("parent", "Panelboard")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "class_required", "Create stays disabled until a class is chosen"),
                class_required,
            )
            .with_fixture(asset("parent", "Panelboard")),
        )
}

fn child_created(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let parent = ctx.fixture("parent")?;
    let child = ctx.unique_name("AT Child");
    let form = ctx.home().open_asset(&parent)?.open_create_child()?;
    form.enter_name(&child)?;
    form.select_class("Busway")?;
    let edit = form.create()?;
    ctx.step(format!("created child '{child}'"));

    let children = edit.child_names()?;

    // The child is not a fixture; remove it before checking.
    let home = edit.close()?.open_asset(&child)?.delete_asset()?;
    ensure(!home.has_asset(&child), format!("child '{child}' survived delete"))?;

    ensure_eq(&children, &vec![child], "children")
}

fn class_required(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let parent = ctx.fixture("parent")?;
    let form = ctx.home().open_asset(&parent)?.open_create_child()?;
    form.enter_name("Unclassified")?;
    ensure(!form.is_create_enabled(), "Create enabled without a class")?;

    let edit = form.cancel()?;
    ensure(edit.child_names()?.is_empty(), "child created from a cancelled form")
}
