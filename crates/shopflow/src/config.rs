//! Runner configuration.
//!
//! Loaded from YAML; every field has a default matching the storefront the
//! suite was written against, so an empty file is a valid configuration.

use crate::invoice::InvoiceExpectations;
use crate::result::{FlowError, FlowResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default application under test
pub const DEFAULT_BASE_URL: &str = "https://www.automationexercise.com";

/// Environment variable overriding [`FlowConfig::base_url`]
pub const BASE_URL_ENV: &str = "SHOPFLOW_BASE_URL";

/// Per-step timeouts in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Any step without a dedicated bound
    pub default_command: u64,
    /// "Logged in as" indicator after submitting credentials
    pub login: u64,
    /// Catalog entries, confirmation overlay, page headings
    pub element: u64,
    /// Order review on the checkout page
    pub review: u64,
    /// Redirect to the payment confirmation page
    pub payment_redirect: u64,
    /// "Order Placed!" banner
    pub order_placed: u64,
    /// Invoice file materialization
    pub download: u64,
    /// Polling interval shared by every wait
    pub poll_interval: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_command: DEFAULT_WAIT_TIMEOUT_MS,
            login: 10_000,
            element: 10_000,
            review: 6_000,
            payment_redirect: 20_000,
            order_placed: 15_000,
            download: 15_000,
            poll_interval: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    /// Same bound for every step (useful for fast local runs and tests)
    #[must_use]
    pub const fn uniform(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            default_command: timeout_ms,
            login: timeout_ms,
            element: timeout_ms,
            review: timeout_ms,
            payment_redirect: timeout_ms,
            order_placed: timeout_ms,
            download: timeout_ms,
            poll_interval: poll_interval_ms,
        }
    }

    /// Wait options for a bound, using the shared polling interval
    #[must_use]
    pub fn wait(&self, timeout_ms: u64) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout_ms)
            .with_poll_interval(self.poll_interval)
    }
}

/// Scenario runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Root of the application under test, without trailing slash
    pub base_url: String,
    /// Directory the browser downloads into; reset before each run
    pub downloads_folder: PathBuf,
    /// Directory holding `user.json` and `products.json`
    pub fixtures_folder: PathBuf,
    /// Directory for run reports and failure screenshots
    pub reports_folder: PathBuf,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Run the browser headless
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Chromium sandbox (disable for containers)
    pub sandbox: bool,
    /// Disable web security so cross-origin ad frames do not block clicks
    pub disable_web_security: bool,
    /// Step timeouts
    pub timeouts: Timeouts,
    /// Expected invoice content
    pub invoice: InvoiceExpectations,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            downloads_folder: PathBuf::from("downloads"),
            fixtures_folder: PathBuf::from("fixtures"),
            reports_folder: PathBuf::from("reports"),
            viewport_width: 1280,
            viewport_height: 720,
            headless: true,
            chromium_path: None,
            sandbox: true,
            disable_web_security: true,
            timeouts: Timeouts::default(),
            invoice: InvoiceExpectations::default(),
        }
    }
}

impl FlowConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> FlowResult<Self> {
        let mut config: Self = serde_yaml_ng::from_str(yaml)?;
        config.base_url = normalize_base_url(&config.base_url);
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| FlowError::environment(path, format!("cannot read config: {e}")))?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> FlowResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `SHOPFLOW_BASE_URL` if set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    fn with_base_url_override(self, url: Option<String>) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => self.with_base_url(url),
            _ => self,
        }
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(url.as_ref());
        self
    }

    /// Set downloads folder
    #[must_use]
    pub fn with_downloads_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_folder = dir.into();
        self
    }

    /// Set fixtures folder
    #[must_use]
    pub fn with_fixtures_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_folder = dir.into();
        self
    }

    /// Set reports folder
    #[must_use]
    pub fn with_reports_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_folder = dir.into();
        self
    }

    /// Set step timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Absolute URL for an application path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// The application root, `base_url + "/"`
    #[must_use]
    pub fn root_url(&self) -> String {
        self.url("/")
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
