//! Assetscope: UI test automation for the mobile asset management app
//!
//! Scenarios drive the app through Screen Objects, which find elements
//! with the Locator Resolver and synchronise with the Wait Policy. The Test
//! Case Runner prepares app state, provisions fixtures, records steps and
//! guarantees cleanup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ASSETSCOPE Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Suites     │    │ Screen     │    │ Session    │            │
//! │   │ (Scenario) │───►│ Objects    │───►│ Appium or  │            │
//! │   │            │    │ + Waits    │    │ simulated  │            │
//! │   └─────┬──────┘    └────────────┘    └────────────┘            │
//! │         │                                                       │
//! │   ┌─────▼──────┐    ┌────────────┐                              │
//! │   │ SuiteRunner│───►│ ReportSink │                              │
//! │   │ + Fixtures │    │ JSON/memory│                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Automation session abstraction
pub mod driver;

/// Locator specs and resolution
pub mod locator;

/// Wait policy: bounded polling
pub mod wait;

/// Suite and session configuration
pub mod config;

/// Screen interaction core
pub mod screen;

/// Screen Objects, one per logical screen
pub mod screens;

/// Fixtures with guaranteed release
pub mod fixture;

/// Step logs, outcomes and report sinks
pub mod report;

/// Test Case Runner
pub mod runner;

/// Result and error types
pub mod result;

/// In-memory simulated app
pub mod sim;

/// Scenario suites
#[allow(missing_docs)]
pub mod suites;

/// Appium WebDriver client
#[cfg(feature = "appium")]
pub mod appium;

pub use config::{Credentials, SessionConfig, SuiteConfig};
pub use driver::{
    BoundingBox, ElementHandle, Point, Role, Screenshot, Session, SessionProvider,
    SwipeDirection,
};
pub use fixture::{unique_name, AssetFixture, Fixture, FixtureSet, FixtureState, SimpleFixture};
pub use locator::{LocatorKind, LocatorResolver, LocatorSpec};
pub use report::{
    FinalizedStepLog, JsonReporter, MemoryReporter, ReportSink, RunReport, ScreenshotStore,
    StepEntry, StepLog, TestOutcome, TestStatus,
};
pub use result::{ensure, ensure_eq, SuiteError, SuiteResult};
pub use runner::{
    ResetPolicy, ResetPolicyGuard, Scenario, SuiteResults, SuiteRunner, TestClass, TestContext,
    TestMeta,
};
pub use screen::{EntryMode, Picker, Screen, ScreenObject};
pub use wait::{TimeoutExt, WaitOptions, Waiter};

#[cfg(feature = "appium")]
pub use appium::{AppiumProvider, AppiumSession};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::screens::*;
    pub use super::*;
}
