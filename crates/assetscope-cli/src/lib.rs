//! Assetscope CLI Library
//!
//! Command-line front end for the Assetscope UI suites: run scenarios
//! against a device or the simulated app, list them, and show the resolved
//! configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ListArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{ConsoleSink, ProgressReporter};
pub use runner::{config_yaml, list_lines, selected_scenarios, TestRunner};
