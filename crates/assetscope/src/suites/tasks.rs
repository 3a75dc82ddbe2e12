//! New Task form. Runs without app resets; each scenario starts from the
//! asset list left by the previous one.

use super::asset;
use crate::result::{ensure, SuiteResult};
use crate::runner::{ResetPolicy, Scenario, TestClass, TestContext, TestMeta};
use crate::screens::NewTaskScreen;

const MODULE: &str = "tasks";

pub fn class() -> TestClass {
    TestClass::new("New Task")
        .with_reset_policy(ResetPolicy::NoReset)
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "mandatory_fields", "Create Task stays disabled until title and description are filled"),
                mandatory_fields,
            )
            .with_fixture(asset("panel", "Panelboard")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "task_created", "a created task is listed on its asset"),
                task_created,
            )
            .with_fixture(asset("panel", "Panelboard")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "cancel_discards", "cancelling the form adds no task"),
                cancel_discards,
            )
            .with_fixture(asset("panel", "Panelboard")),
        )
}

fn open_form<'a>(ctx: &mut TestContext<'a>) -> SuiteResult<NewTaskScreen<'a>> {
    let name = ctx.fixture("panel")?;
    let form = ctx.home().open_asset(&name)?.open_new_task()?;
    ctx.step(format!("new task form for '{name}'"));
    Ok(form)
}

fn mandatory_fields(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let form = open_form(ctx)?;
    ensure(!form.is_create_enabled(), "Create enabled on an empty form")?;

    form.enter_title("Torque check")?;
    ensure(!form.is_create_enabled(), "Create enabled without a description")?;

    form.enter_description("Retorque lugs to spec")?;
    ctx.checkpoint("title and description entered")?;
    ensure(form.is_create_enabled(), "Create still disabled with both fields")
}

fn task_created(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let title = ctx.unique_name("AT Task");
    let form = open_form(ctx)?;
    form.enter_title(&title)?;
    form.enter_description("Infrared scan of main lugs")?;
    let edit = form.create()?;
    ctx.step(format!("created task '{title}'"));

    let titles = edit.task_titles()?;
    ensure(
        titles.contains(&title),
        format!("'{title}' not among tasks {titles:?}"),
    )
}

fn cancel_discards(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let name = ctx.fixture("panel")?;
    let edit = ctx.home().open_asset(&name)?;
    let before = edit.task_titles()?;
    let form = edit.open_new_task()?;
    form.enter_title("Abandoned")?;
    form.enter_description("Never created")?;
    let edit = form.cancel()?;
    ctx.step("form cancelled");

    let after = edit.task_titles()?;
    ensure(
        after == before,
        format!("tasks changed from {before:?} to {after:?}"),
    )
}
