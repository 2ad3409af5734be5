//! Scenario fixtures.
//!
//! Two concerns live here:
//!
//! - **Fixture data**: the JSON records a scenario is driven by
//!   (`user.json`, `products.json`), read fresh for every run.
//! - **Fixture lifecycle**: [`FixtureManager`] runs setup hooks in priority
//!   order before a scenario and tears them down in reverse afterwards.
//!   [`DownloadsFixture`] is the pre-run reset of the download directory.

use crate::downloads::clear_downloads;
use crate::result::{FlowError, FlowResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the customer fixture
pub const USER_FIXTURE: &str = "user.json";

/// File name of the product fixture
pub const PRODUCTS_FIXTURE: &str = "products.json";

// ============================================================================
// Fixture data
// ============================================================================

/// Login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// Card details typed into the payment form, passed through unvalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Name on card
    pub card_name: String,
    /// Card number
    pub card_number: String,
    /// Card verification code
    pub cvc: String,
    /// Expiry month
    pub expiry_month: String,
    /// Expiry year
    pub expiry_year: String,
}

/// Customer record from `user.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFixture {
    /// Login email
    pub login_email: String,
    /// Login password
    pub login_password: String,
    /// Name on card
    pub card_name: String,
    /// Card number
    pub card_number: String,
    /// Card verification code
    #[serde(rename = "cardCVC")]
    pub card_cvc: String,
    /// Expiry month
    pub card_expiry_month: String,
    /// Expiry year
    pub card_expiry_year: String,
    /// Account first name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Account last name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserFixture {
    /// Login credentials
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.login_email, &self.login_password)
    }

    /// Payment form values
    #[must_use]
    pub fn payment(&self) -> PaymentDetails {
        PaymentDetails {
            card_name: self.card_name.clone(),
            card_number: self.card_number.clone(),
            cvc: self.card_cvc.clone(),
            expiry_month: self.card_expiry_month.clone(),
            expiry_year: self.card_expiry_year.clone(),
        }
    }

    /// "First Last" when both names are present
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        }
    }
}

/// Product record from `products.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFixture {
    /// Display name of the product to buy
    #[serde(rename = "productToAddToCart")]
    pub product_to_add_to_cart: String,
}

/// Everything a checkout run reads from the fixtures directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioFixtures {
    /// Customer record
    pub user: UserFixture,
    /// Product record
    pub product: ProductFixture,
}

impl ScenarioFixtures {
    /// Read `user.json` and `products.json` from `dir`
    pub fn load(dir: impl AsRef<Path>) -> FlowResult<Self> {
        let dir = dir.as_ref();
        let fixtures = Self {
            user: read_fixture(dir, USER_FIXTURE)?,
            product: read_fixture(dir, PRODUCTS_FIXTURE)?,
        };
        tracing::debug!(
            dir = %dir.display(),
            product = %fixtures.product.product_to_add_to_cart,
            "fixtures loaded"
        );
        Ok(fixtures)
    }
}

/// Read and parse one JSON fixture file
pub fn read_fixture<T: DeserializeOwned>(dir: &Path, file: &str) -> FlowResult<T> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path).map_err(|e| FlowError::Fixture {
        name: file.to_string(),
        message: format!("cannot read {}: {e}", path.display()),
    })?;
    serde_json::from_str(&raw).map_err(|e| FlowError::Fixture {
        name: file.to_string(),
        message: format!("malformed JSON: {e}"),
    })
}

// ============================================================================
// Fixture lifecycle
// ============================================================================

/// A setup/teardown hook run around a scenario.
pub trait Fixture: Send + Sync {
    /// Prepare state before the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture cannot be prepared; the scenario must
    /// not start.
    fn setup(&mut self) -> FlowResult<()>;

    /// Release state after the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if cleanup fails.
    fn teardown(&mut self) -> FlowResult<()> {
        Ok(())
    }

    /// Name for logs and duplicate detection
    fn name(&self) -> &str;

    /// Higher runs first on setup and last on teardown
    fn priority(&self) -> i32 {
        0
    }
}

/// Lifecycle state of a registered fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered, never set up
    Registered,
    /// Set up successfully
    SetUp,
    /// Torn down
    TornDown,
    /// Setup or teardown failed
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
}

/// Runs fixtures in priority order and rolls back on failure
#[derive(Default)]
pub struct FixtureManager {
    entries: Vec<FixtureEntry>,
    setup_order: Vec<usize>,
}

impl fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixtures", &self.list())
            .field("set_up", &self.setup_order.len())
            .finish()
    }
}

impl FixtureManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture; one with the same name is replaced.
    pub fn register<F: Fixture + 'static>(&mut self, fixture: F) {
        let entry = FixtureEntry {
            fixture: Box::new(fixture),
            state: FixtureState::Registered,
        };
        match self
            .entries
            .iter()
            .position(|e| e.fixture.name() == entry.fixture.name())
        {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with_fixture<F: Fixture + 'static>(mut self, fixture: F) -> Self {
        self.register(fixture);
        self
    }

    /// Number of registered fixtures
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// State of the fixture called `name`
    #[must_use]
    pub fn state(&self, name: &str) -> Option<FixtureState> {
        self.entries
            .iter()
            .find(|e| e.fixture.name() == name)
            .map(|e| e.state)
    }

    /// Registered fixture names
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.fixture.name()).collect()
    }

    /// Set up every fixture, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns the first setup error unchanged, after tearing down the
    /// fixtures that were already set up.
    pub fn setup_all(&mut self) -> FlowResult<()> {
        let mut ordered: Vec<usize> = (0..self.entries.len()).collect();
        ordered.sort_by_key(|&i| std::cmp::Reverse(self.entries[i].fixture.priority()));

        for i in ordered {
            let entry = &mut self.entries[i];
            if entry.state == FixtureState::SetUp {
                continue;
            }
            if let Err(e) = entry.fixture.setup() {
                entry.state = FixtureState::Failed;
                tracing::error!(fixture = entry.fixture.name(), error = %e, "fixture setup failed");
                if let Err(rollback) = self.teardown_all() {
                    tracing::warn!(error = %rollback, "rollback after failed setup also failed");
                }
                return Err(e);
            }
            tracing::debug!(fixture = entry.fixture.name(), "fixture set up");
            entry.state = FixtureState::SetUp;
            self.setup_order.push(i);
        }
        Ok(())
    }

    /// Tear down set-up fixtures in reverse setup order.
    ///
    /// # Errors
    ///
    /// Every fixture is attempted; the first error is returned.
    pub fn teardown_all(&mut self) -> FlowResult<()> {
        let mut first_error = None;
        for i in std::mem::take(&mut self.setup_order).into_iter().rev() {
            let entry = &mut self.entries[i];
            if entry.state != FixtureState::SetUp {
                continue;
            }
            match entry.fixture.teardown() {
                Ok(()) => entry.state = FixtureState::TornDown,
                Err(e) => {
                    entry.state = FixtureState::Failed;
                    tracing::warn!(fixture = entry.fixture.name(), error = %e, "fixture teardown failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Resets the download directory before a run
#[derive(Debug, Clone)]
pub struct DownloadsFixture {
    dir: PathBuf,
}

impl DownloadsFixture {
    /// Fixture for `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Managed directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Fixture for DownloadsFixture {
    fn setup(&mut self) -> FlowResult<()> {
        clear_downloads(&self.dir)
    }

    fn name(&self) -> &str {
        "downloads"
    }

    fn priority(&self) -> i32 {
        100
    }
}
