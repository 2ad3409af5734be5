//! Shopflow CLI Library
//!
//! Command-line front end for the shopflow checkout scenario runner.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, Commands, ConfigFileArgs, RunArgs};
pub use config::{config_source, init_tracing, resolve_config, Verbosity, DEFAULT_CONFIG_FILE};
pub use error::{CliError, CliResult};
pub use output::ConsoleReporter;
pub use runner::{Backend, ScenarioRunner};
