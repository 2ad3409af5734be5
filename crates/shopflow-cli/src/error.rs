//! Error types for the CLI

use shopflow::FlowError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The scenario ran and failed
    #[error("Scenario failed at step '{step}': {message}")]
    ScenarioFailed {
        /// Failing step
        step: String,
        /// Error message
        message: String,
    },

    /// Async runtime could not start
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shopflow library error
    #[error("Shopflow error: {0}")]
    Flow(#[from] FlowError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a runtime error
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Convert a scenario error, keeping the failing step visible
    #[must_use]
    pub fn from_scenario(err: FlowError) -> Self {
        match err {
            FlowError::Step { step, source } => Self::ScenarioFailed {
                step,
                message: source.to_string(),
            },
            other => Self::Flow(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_scenario_error_names_step() {
        let err = CliError::from_scenario(
            FlowError::mismatch("URL", "https://shop.test/", "https://shop.test/login")
                .in_step("returned_home"),
        );
        assert!(matches!(err, CliError::ScenarioFailed { ref step, .. } if step == "returned_home"));
        let text = err.to_string();
        assert_eq!(text.matches("returned_home").count(), 1);
        assert!(text.starts_with("Scenario failed at step 'returned_home': "));
        assert!(text.contains("https://shop.test/login"));
    }

    #[test]
    fn test_stepless_error_stays_flow() {
        let err = CliError::from_scenario(FlowError::page("detached"));
        assert!(matches!(err, CliError::Flow(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O error"));
    }
}
