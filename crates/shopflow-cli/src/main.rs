//! Shopflow CLI: run browser-driven checkout scenarios
//!
//! ## Usage
//!
//! ```bash
//! shopflow run                        # Chromium, ./shopflow.yaml if present
//! shopflow run --simulate --no-report # in-memory storefront dry run
//! shopflow clear-downloads            # reset the downloads directory
//! shopflow config -c ci.yaml          # print resolved configuration
//! ```

use clap::Parser;
use shopflow::clear_downloads;
use shopflow_cli::{
    config_source, init_tracing, resolve_config, Backend, Cli, CliResult, Commands,
    ConfigFileArgs, ConsoleReporter, RunArgs, ScenarioRunner, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    init_tracing(verbosity);
    let console = ConsoleReporter::new(verbosity.is_quiet());

    let result = match cli.command {
        Commands::Run(args) => run_scenario(&args, &console),
        Commands::ClearDownloads(args) => run_clear_downloads(&args, &console),
        Commands::Config(args) => run_config(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_scenario(args: &RunArgs, console: &ConsoleReporter) -> CliResult<()> {
    let mut config = resolve_config(&args.config)?;
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url);
    }
    if args.headed {
        config = config.with_headless(false);
    }
    let backend = if args.simulate {
        Backend::Simulated
    } else {
        Backend::Chromium
    };

    ScenarioRunner::new(config, backend)
        .with_report(!args.no_report)
        .run(console)?;
    Ok(())
}

fn run_clear_downloads(args: &ConfigFileArgs, console: &ConsoleReporter) -> CliResult<()> {
    let config = resolve_config(args)?;
    clear_downloads(&config.downloads_folder)?;
    console.info(&format!("Cleared {}", config.downloads_folder.display()));
    Ok(())
}

fn run_config(args: &ConfigFileArgs) -> CliResult<()> {
    let config = resolve_config(args)?;
    if let Some(path) = config_source(args) {
        println!("# source: {}", path.display());
    }
    print!("{}", config.to_yaml()?);
    Ok(())
}
