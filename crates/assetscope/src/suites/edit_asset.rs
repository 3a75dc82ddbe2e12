//! Edit Asset: subtype selection and section navigation.

use super::asset;
use crate::result::{ensure, ensure_eq, SuiteError, SuiteResult};
use crate::runner::{Scenario, TestClass, TestContext, TestMeta};
use crate::screen::ScreenObject;
use crate::screens::{EditAssetScreen, Section};

const MODULE: &str = "edit_asset";
const SWITCH: &str = "Disconnect Switch";
const BPS: &str = "Bolted-Pressure Switch (BPS)";

type Body = fn(&mut TestContext<'_>) -> SuiteResult<()>;

/// Every scenario here works on its own freshly created switch
fn scenario(feature: &'static str, description: &'static str, body: Body) -> Scenario {
    Scenario::new(TestMeta::new(MODULE, feature, description), body)
        .with_fixture(asset("switch", SWITCH))
}

pub fn class() -> TestClass {
    TestClass::new("Edit Asset")
        .with_scenario(scenario(
            "subtype_default",
            "a new switch offers a subtype dropdown with nothing chosen",
            subtype_default,
        ))
        .with_scenario(scenario(
            "subtype_saved",
            "a chosen subtype survives save and reopen",
            subtype_saved,
        ))
        .with_scenario(scenario(
            "subtype_unknown",
            "an unknown subtype is rejected without changing the selection",
            subtype_unknown,
        ))
        .with_scenario(scenario(
            "close_discards",
            "closing without saving discards the subtype",
            close_discards,
        ))
        .with_scenario(scenario(
            "class_change_clears_subtype",
            "changing class clears the subtype and follows the new class",
            class_change_clears_subtype,
        ))
        .with_scenario(scenario(
            "sections_reachable",
            "every section can be scrolled into view",
            sections_reachable,
        ))
}

fn open_switch<'a>(ctx: &mut TestContext<'a>) -> SuiteResult<EditAssetScreen<'a>> {
    let name = ctx.fixture("switch")?;
    let edit = ctx.home().open_asset(&name)?;
    ctx.step(format!("opened '{name}'"));
    Ok(edit)
}

fn subtype_default(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let edit = open_switch(ctx)?;
    ensure_eq(&edit.asset_class()?, &Some(SWITCH.to_string()), "asset class")?;
    ensure(edit.is_subtype_dropdown_visible(), "subtype dropdown missing")?;
    ensure(!edit.is_subtype_selected()?, "subtype preselected")
}

fn subtype_saved(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let name = ctx.fixture("switch")?;
    let edit = open_switch(ctx)?;
    edit.select_subtype(BPS)?;
    ctx.checkpoint(format!("selected '{BPS}'"))?;
    let home = edit.save_changes()?;

    let reopened = home.open_asset(&name)?;
    ctx.step("reopened after save");
    ensure_eq(&reopened.selected_subtype()?, &Some(BPS.to_string()), "saved subtype")
}

fn subtype_unknown(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let edit = open_switch(ctx)?;
    match edit.select_subtype("Vacuum Interrupter") {
        Err(SuiteError::OptionNotFound { available, .. }) => {
            ctx.step(format!("rejected; offered {available:?}"));
            ensure(available.iter().any(|o| o == BPS), "switch subtypes not offered")?;
        }
        Err(e) => return Err(e),
        Ok(()) => return Err(SuiteError::assertion("unknown subtype was accepted")),
    }
    ensure(edit.is_displayed(), "edit asset not displayed")?;
    ensure_eq(&edit.selected_subtype()?, &None, "subtype after rejection")
}

fn close_discards(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let name = ctx.fixture("switch")?;
    let edit = open_switch(ctx)?;
    edit.select_subtype(BPS)?;
    let home = edit.close()?;
    ctx.step("closed without saving");

    let reopened = home.open_asset(&name)?;
    ensure(!reopened.is_subtype_selected()?, "unsaved subtype was kept")
}

fn class_change_clears_subtype(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let edit = open_switch(ctx)?;
    edit.select_subtype(BPS)?;

    edit.select_class("Transformer")?;
    ctx.step("class changed to Transformer");
    ensure(!edit.is_subtype_selected()?, "subtype kept across class change")?;
    ensure(edit.is_subtype_dropdown_visible(), "transformer subtypes not offered")?;

    edit.select_class("Busway")?;
    ctx.step("class changed to Busway");
    ensure(
        !edit.is_subtype_dropdown_visible(),
        "subtype dropdown shown for a class without subtypes",
    )
}

fn sections_reachable(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let edit = open_switch(ctx)?;
    for section in Section::ALL.iter().rev().chain(Section::ALL.iter()) {
        ensure(edit.scroll_to_section(*section)?, format!("could not reach {section}"))?;
        ensure(edit.is_section_displayed(*section), format!("{section} not on screen"))?;
    }
    ctx.step("all sections reached");
    Ok(())
}
