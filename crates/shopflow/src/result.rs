//! Result and error types for shopflow.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for shopflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Broad classification of a failure, used by reports and the CLI exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Something did not appear within its bound
    Timeout,
    /// A specific entry or file never materialized
    NotFound,
    /// Observed value differs from the expected literal
    AssertionMismatch,
    /// Filesystem manipulation failed
    Environment,
    /// Automation backend failure
    Browser,
    /// Fixture missing or malformed
    Fixture,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::NotFound => "not-found",
            Self::AssertionMismatch => "assertion-mismatch",
            Self::Environment => "environment",
            Self::Browser => "browser",
            Self::Fixture => "fixture",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while running a scenario
#[derive(Debug, Error)]
pub enum FlowError {
    /// A bounded wait elapsed
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// What was being waited for
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A specific element or file did not appear within its bound
    #[error("Not found after {ms}ms: {what}")]
    NotFound {
        /// Description of the missing thing
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Observed value differs from the expected one
    #[error("Assertion failed for {subject}: expected {expected:?}, observed {observed:?}")]
    AssertionMismatch {
        /// What was checked (URL, element text, file content)
        subject: String,
        /// Expected value
        expected: String,
        /// Observed value
        observed: String,
    },

    /// Filesystem manipulation failed
    #[error("Environment error at {}: {message}", path.display())]
    Environment {
        /// Path involved
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Page interaction error (script evaluation, click, typing)
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Fixture error
    #[error("Fixture error in {name}: {message}")]
    Fixture {
        /// Fixture name
        name: String,
        /// Error message
        message: String,
    },

    /// Failure inside a named scenario step
    #[error("Step '{step}' failed: {source}")]
    Step {
        /// Step name
        step: String,
        /// Underlying error
        #[source]
        source: Box<FlowError>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FlowError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create an assertion mismatch
    #[must_use]
    pub fn mismatch(
        subject: impl Into<String>,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self::AssertionMismatch {
            subject: subject.into(),
            expected: expected.into(),
            observed: observed.into(),
        }
    }

    /// Create an environment error for a path
    #[must_use]
    pub fn environment(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Environment {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Attach the failing step name
    #[must_use]
    pub fn in_step(self, step: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// Name of the failing step, if the error was raised inside one
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Classify the error, looking through step wrappers
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AssertionMismatch { .. } => ErrorKind::AssertionMismatch,
            Self::Environment { .. } | Self::Io(_) => ErrorKind::Environment,
            Self::BrowserLaunch { .. } | Self::Navigation { .. } | Self::Page { .. } => {
                ErrorKind::Browser
            }
            Self::Fixture { .. } | Self::Json(_) | Self::Yaml(_) => ErrorKind::Fixture,
            Self::Step { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_looks_through_step() {
        let err = FlowError::Timeout {
            waited_for: "text \"Logged in as\"".to_string(),
            ms: 10_000,
        }
        .in_step("logged_in");
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.step(), Some("logged_in"));
    }

    #[test]
    fn test_mismatch_message_names_both_values() {
        let err = FlowError::mismatch("URL", "https://shop.test/", "https://shop.test/login");
        let msg = err.to_string();
        assert!(msg.contains("\"https://shop.test/\""));
        assert!(msg.contains("\"https://shop.test/login\""));
    }

    #[test]
    fn test_environment_error_display() {
        let err = FlowError::environment("/tmp/downloads", "permission denied");
        assert!(err.to_string().contains("/tmp/downloads"));
        assert_eq!(err.kind(), ErrorKind::Environment);
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FlowError = io_err.into();
        assert!(err.to_string().contains("I/O"));
        assert_eq!(err.kind(), ErrorKind::Environment);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::AssertionMismatch.to_string(), "assertion-mismatch");
        assert_eq!(ErrorKind::NotFound.to_string(), "not-found");
    }
}
