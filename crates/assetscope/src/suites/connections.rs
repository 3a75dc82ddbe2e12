//! Lineside and loadside connections.

use super::asset;
use crate::result::{ensure, ensure_eq, SuiteError, SuiteResult};
use crate::runner::{Scenario, TestClass, TestContext, TestMeta};
use crate::screen::ScreenObject;
use crate::screens::{ConnectionKind, CreateOutcome};

const MODULE: &str = "connections";

pub fn class() -> TestClass {
    TestClass::new("Connections")
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "source_required", "a connection without a source node is rejected"),
                source_required,
            )
            .with_fixture(asset("asset", "Switchgear")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "lineside_listed", "a lineside connection from an upstream asset is listed"),
                |ctx| connection_listed(ctx, ConnectionKind::Lineside),
            )
            .with_fixture(asset("asset", "Panelboard"))
            .with_fixture(asset("source", "Transformer")),
        )
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "loadside_listed", "a loadside connection to a downstream asset is listed"),
                |ctx| connection_listed(ctx, ConnectionKind::Loadside),
            )
            .with_fixture(asset("asset", "Panelboard"))
            .with_fixture(asset("source", "Motor")),
        )
}

fn source_required(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let name = ctx.fixture("asset")?;
    let edit = ctx.home().open_asset(&name)?;
    let form = edit.open_new_connection(ConnectionKind::Lineside)?;
    form.select_connection_type("Cable")?;

    let message = match form.try_create()? {
        CreateOutcome::Rejected { message } => message,
        CreateOutcome::Created(_) => {
            return Err(SuiteError::assertion("connection created without a source node"))
        }
    };
    ctx.checkpoint(format!("rejected: {message}"))?;
    ensure(!message.is_empty(), "rejection carried no message")?;
    ensure(form.is_displayed(), "connection form closed after rejection")?;

    let edit = form.cancel()?;
    ensure_eq(&edit.connection_count()?, &0, "connections after rejection")
}

fn connection_listed(ctx: &mut TestContext<'_>, kind: ConnectionKind) -> SuiteResult<()> {
    let name = ctx.fixture("asset")?;
    let source = ctx.fixture("source")?;
    let form = ctx.home().open_asset(&name)?.open_new_connection(kind)?;
    form.select_source_node(&source)?;
    form.select_connection_type("Cable")?;
    let edit = form.create()?;
    ctx.step(format!("{kind} connection from '{source}'"));

    ensure_eq(
        &edit.connection_labels()?,
        &vec![format!("{kind}: {source}")],
        "connections",
    )
}
