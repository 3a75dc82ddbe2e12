//! Assetscope CLI: run the asset app UI suites
//!
//! ## Usage
//!
//! ```bash
//! assetscope run --simulate                 # Run every scenario against the simulated app
//! assetscope run --filter edit_asset        # Run on the configured device
//! assetscope list --filter subtype          # Show matching scenarios
//! assetscope config --config suite.yaml     # Show the resolved configuration
//! ```

use assetscope_cli::{
    config_yaml, list_lines, Cli, CliConfig, CliResult, ColorChoice, Commands, TestRunner,
    Verbosity,
};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(config.verbosity);

    match cli.command {
        Commands::Run(args) => {
            TestRunner::new(config, args).run()?;
            Ok(())
        }
        Commands::List(args) => {
            for line in list_lines(&args) {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Config(args) => {
            print!("{}", config_yaml(&args)?);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(ColorChoice::from(cli.color))
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v`/`-q` level
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
