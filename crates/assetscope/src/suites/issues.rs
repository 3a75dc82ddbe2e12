//! New Issue form.

use super::asset;
use crate::result::{ensure, SuiteError, SuiteResult};
use crate::runner::{Scenario, TestClass, TestContext, TestMeta};
use crate::screen::ScreenObject;
use crate::screens::NewIssueScreen;

const MODULE: &str = "issues";
const ISSUE_TYPE: &str = "Thermal Anomaly";

pub fn class() -> TestClass {
    TestClass::new("New Issue")
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "mandatory_fields", "Create Issue needs a type and a title"),
                mandatory_fields,
            )
            .with_fixture(asset("transformer", "Transformer")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "issue_created", "an issue with a priority is listed on its asset"),
                issue_created,
            )
            .with_fixture(asset("transformer", "Transformer")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "priority_unknown", "an unknown priority is rejected and the form stays open"),
                priority_unknown,
            )
            .with_fixture(asset("transformer", "Transformer")),
        )
}

fn open_form<'a>(ctx: &mut TestContext<'a>) -> SuiteResult<NewIssueScreen<'a>> {
    let name = ctx.fixture("transformer")?;
    let form = ctx.home().open_asset(&name)?.open_new_issue()?;
    ctx.step(format!("new issue form for '{name}'"));
    Ok(form)
}

fn mandatory_fields(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let form = open_form(ctx)?;
    ensure(!form.is_create_enabled(), "Create enabled on an empty form")?;

    form.enter_title("Hot spot on B phase")?;
    ensure(!form.is_create_enabled(), "Create enabled without an issue type")?;

    form.select_issue_type(ISSUE_TYPE)?;
    ensure(form.is_create_enabled(), "Create disabled with type and title")
}

fn issue_created(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let title = ctx.unique_name("AT Issue");
    let form = open_form(ctx)?;
    form.select_issue_type(ISSUE_TYPE)?;
    form.enter_title(&title)?;
    form.select_priority("High")?;
    ctx.checkpoint("issue form filled")?;
    let edit = form.create()?;

    let titles = edit.issue_titles()?;
    ensure(
        titles.contains(&title),
        format!("'{title}' not among issues {titles:?}"),
    )
}

fn priority_unknown(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let form = open_form(ctx)?;
    match form.select_priority("Whenever") {
        Err(SuiteError::OptionNotFound { available, .. }) => {
            ctx.step(format!("rejected; offered {available:?}"));
        }
        Err(e) => return Err(e),
        Ok(()) => return Err(SuiteError::assertion("unknown priority was accepted")),
    }
    ensure(form.is_displayed(), "new issue form not displayed")
}
