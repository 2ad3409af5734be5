//! CLI configuration: verbosity, logging and config-file resolution

use crate::commands::ConfigFileArgs;
use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use shopflow::FlowConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "shopflow.yaml";

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - step progress
    #[default]
    Normal,
    /// Verbose - step detail
    Verbose,
    /// Debug - every wait
    Debug,
}

impl Verbosity {
    /// Derive from `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// `tracing` filter used when `RUST_LOG` is unset
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "shopflow=info,warn",
            Self::Verbose => "shopflow=debug,info",
            Self::Debug => "debug",
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `-v`/`-q`.
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load the runner configuration.
///
/// An explicit path must exist. Without one, `./shopflow.yaml` is used when
/// present and defaults otherwise. `SHOPFLOW_BASE_URL` is applied last.
pub fn resolve_config(args: &ConfigFileArgs) -> CliResult<FlowConfig> {
    let config = match &args.config {
        Some(path) => load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => load(Path::new(DEFAULT_CONFIG_FILE))?,
        None => FlowConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn load(path: &Path) -> CliResult<FlowConfig> {
    if !path.is_file() {
        return Err(CliError::config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), "loading config");
    Ok(FlowConfig::load(path)?)
}

/// Resolved config source, for display
#[must_use]
pub fn config_source(args: &ConfigFileArgs) -> Option<PathBuf> {
    args.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    })
}
