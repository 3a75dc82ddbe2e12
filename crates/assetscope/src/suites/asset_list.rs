//! Asset List: display, search and grouping.

use super::asset;
use crate::locator::LocatorSpec;
use crate::result::{ensure, ensure_eq, SuiteError, SuiteResult};
use crate::runner::{Scenario, TestClass, TestContext, TestMeta};
use crate::screen::{Screen, ScreenObject};
use crate::screens::{ids, AssetListScreen, Grouping};

const MODULE: &str = "asset_list";

pub fn class() -> TestClass {
    TestClass::new("Asset List")
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "displayed", "list shows the site's assets with a matching count"),
                displayed,
            )
            .with_fixture(asset("asset", "Busway")),
        )
        .with_scenario(Scenario::new(
            TestMeta::new(MODULE, "search_no_matches", "search with no matches shows the empty state"),
            search_no_matches,
        ))
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "search_finds_asset", "search narrows the list to the named asset"),
                search_finds_asset,
            )
            .with_fixture(asset("asset", "Transformer")),
        )
        .with_scenario(Scenario::new(
            TestMeta::new(MODULE, "clear_search", "clearing the search restores the full list"),
            clear_search,
        ))
        .with_scenario(
            Scenario::new(
                TestMeta::new(MODULE, "group_by_class", "grouping by asset class adds class headers"),
                group_by_class,
            )
            .with_fixture(asset("asset", "Motor"))
            .with_cleanup(ungroup),
        )
        .with_scenario(Scenario::new(
            TestMeta::new(MODULE, "group_by_unknown", "unknown grouping is rejected and leaves the list as it was"),
            group_by_unknown,
        ))
}

fn displayed(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let name = ctx.fixture("asset")?;
    let home = ctx.home();
    ensure(home.is_displayed(), "asset list not displayed")?;

    let listed = home.asset_count()?;
    ctx.step(format!("{listed} asset rows listed"));
    ensure_eq(&home.reported_count()?, &listed, "reported asset count")?;
    ensure(home.has_asset(&name), format!("'{name}' not listed"))
}

fn search_no_matches(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let term = ctx.unique_name("No Such Asset");
    let home = ctx.home();
    home.search(&term)?;
    ctx.checkpoint(format!("searched for '{term}'"))?;

    ensure_eq(&home.asset_count()?, &0, "rows listed")?;
    ensure_eq(&home.reported_count()?, &0, "reported count")?;
    ensure(home.is_empty_state_shown(), "empty state not shown")
}

fn search_finds_asset(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let name = ctx.fixture("asset")?;
    let home = ctx.home();
    home.search(&name)?;
    ctx.step(format!("searched for '{name}'"));

    ensure_eq(&home.asset_names()?, &vec![name], "search results")?;
    ensure_eq(&home.reported_count()?, &1, "reported count")
}

fn clear_search(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let home = ctx.home();
    let everything = home.asset_names()?;
    ensure(!everything.is_empty(), "site has no assets to filter")?;

    home.search(&ctx.unique_name("Filter"))?;
    ensure_eq(&home.asset_count()?, &0, "rows while filtered")?;
    home.clear_search()?;
    ctx.step("search cleared");

    ensure(
        home.search_term()?.unwrap_or_default().is_empty(),
        "search field still holds a term",
    )?;
    ensure_eq(&home.asset_names()?, &everything, "rows after clearing")
}

fn group_by_class(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let name = ctx.fixture("asset")?;
    let home = ctx.home();
    home.group_by(Grouping::AssetClass.label())?;
    ctx.checkpoint("grouped by asset class")?;

    ensure_eq(
        &home.current_grouping()?,
        &Some(Grouping::AssetClass.label().to_string()),
        "applied grouping",
    )?;
    let headers = home.group_headers()?;
    ensure(
        headers.iter().any(|h| h == "Motor"),
        format!("no 'Motor' header among {headers:?}"),
    )?;
    ensure(home.has_asset(&name), format!("'{name}' missing once grouped"))
}

fn ungroup(screen: Screen<'_>) -> SuiteResult<()> {
    AssetListScreen::return_home(screen)?.group_by(Grouping::None.label())
}

fn group_by_unknown(ctx: &mut TestContext<'_>) -> SuiteResult<()> {
    let home = ctx.home();
    let before = home.current_grouping()?;

    match home.group_by("Manufacturer") {
        Err(SuiteError::OptionNotFound { available, .. }) => {
            ctx.step(format!("rejected; offered {available:?}"));
            ensure(
                available.iter().any(|o| o == Grouping::Subtype.label()),
                "known groupings not offered",
            )?;
        }
        Err(e) => return Err(e),
        Ok(()) => return Err(SuiteError::assertion("unknown grouping was accepted")),
    }

    let options = LocatorSpec::id(ids::GROUP_BY_LIST);
    ensure(!ctx.screen().is_present(&options), "grouping options left open")?;
    ensure(home.is_displayed(), "asset list not displayed")?;
    ensure_eq(&home.current_grouping()?, &before, "grouping after rejection")
}
