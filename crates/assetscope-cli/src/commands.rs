//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Assetscope: UI test suites for the mobile asset management app
#[derive(Parser, Debug)]
#[command(name = "assetscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios
    Run(RunArgs),

    /// List scenarios
    List(ListArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run against the built-in simulated app instead of a device
    #[arg(long)]
    pub simulate: bool,

    /// Only run scenarios whose id or description contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "ASSETSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory for the JSON report and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Stop at the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios whose id or description contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long, env = "ASSETSCOPE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["assetscope", "run"]);
            if let Commands::Run(args) = cli.command {
                assert!(!args.simulate);
                assert!(!args.fail_fast);
                assert!(args.filter.is_none());
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_run_with_options() {
            let cli = Cli::parse_from([
                "assetscope",
                "run",
                "--simulate",
                "--filter",
                "edit_asset",
                "--output",
                "out",
                "--fail-fast",
            ]);
            if let Commands::Run(args) = cli.command {
                assert!(args.simulate);
                assert!(args.fail_fast);
                assert_eq!(args.filter.as_deref(), Some("edit_asset"));
                assert_eq!(args.output, Some(PathBuf::from("out")));
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_list_with_filter() {
            let cli = Cli::parse_from(["assetscope", "list", "-f", "subtype"]);
            if let Commands::List(args) = cli.command {
                assert_eq!(args.filter.as_deref(), Some("subtype"));
            } else {
                panic!("expected List command");
            }
        }

        #[test]
        fn test_parse_config_with_file() {
            let cli = Cli::parse_from(["assetscope", "config", "--config", "suite.yaml"]);
            if let Commands::Config(args) = cli.command {
                assert_eq!(args.config, Some(PathBuf::from("suite.yaml")));
            } else {
                panic!("expected Config command");
            }
        }
    }

    mod global_flag_tests {
        use super::*;

        #[test]
        fn test_verbose_count() {
            let cli = Cli::parse_from(["assetscope", "-vv", "list"]);
            assert_eq!(cli.verbose, 2);
            assert!(!cli.quiet);
        }

        #[test]
        fn test_quiet_after_subcommand() {
            let cli = Cli::parse_from(["assetscope", "list", "--quiet"]);
            assert!(cli.quiet);
        }

        #[test]
        fn test_color_never() {
            let cli = Cli::parse_from(["assetscope", "--color", "never", "list"]);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["assetscope"]).is_err());
        }
    }
}
