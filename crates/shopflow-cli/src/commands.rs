//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Shopflow: run browser-driven checkout scenarios against a storefront
#[derive(Parser, Debug)]
#[command(name = "shopflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the checkout scenario
    Run(RunArgs),

    /// Reset the downloads directory
    ClearDownloads(ConfigFileArgs),

    /// Print the resolved configuration as YAML
    Config(ConfigFileArgs),
}

/// Location of the YAML configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFileArgs {
    /// Configuration file (defaults to ./shopflow.yaml when present)
    #[arg(short, long, env = "SHOPFLOW_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Configuration file
    #[command(flatten)]
    pub config: ConfigFileArgs,

    /// Override the storefront base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Run against the in-memory storefront instead of Chromium
    #[arg(long)]
    pub simulate: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Skip writing JSON/HTML report files
    #[arg(long)]
    pub no_report: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "shopflow",
            "run",
            "--simulate",
            "--no-report",
            "--base-url",
            "http://localhost:8080",
            "-c",
            "ci.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert!(args.simulate);
                assert!(args.no_report);
                assert!(!args.headed);
                assert_eq!(args.base_url.as_deref(), Some("http://localhost:8080"));
                assert_eq!(args.config.config, Some(PathBuf::from("ci.yaml")));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_global_verbosity_after_subcommand() {
        let cli = Cli::try_parse_from(["shopflow", "config", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["shopflow"]).is_err());
    }
}
