//! Scenario runner: fixtures, session backend and report files

use crate::error::{CliError, CliResult};
use crate::output::ConsoleReporter;
use shopflow::scenario::CHECKOUT_SCENARIO;
use shopflow::{
    Account, BrowserSession, CheckoutScenario, CheckoutState, DownloadsFixture, FixtureManager,
    FlowConfig, FlowContext, FlowResult, ScenarioFixtures, ScenarioReport, SimulatedStore,
    UserFixture,
};

/// Which automation backend drives the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Real Chromium over CDP
    Chromium,
    /// In-memory storefront
    Simulated,
}

/// Runs the checkout scenario once
#[derive(Debug)]
pub struct ScenarioRunner {
    config: FlowConfig,
    backend: Backend,
    write_report: bool,
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(config: FlowConfig, backend: Backend) -> Self {
        Self {
            config,
            backend,
            write_report: true,
        }
    }

    /// Enable or disable report files
    #[must_use]
    pub const fn with_report(mut self, write_report: bool) -> Self {
        self.write_report = write_report;
        self
    }

    /// Reset downloads, load fixtures, run the scenario and write reports.
    ///
    /// A failed scenario still writes its report before the error is returned.
    pub fn run(&self, console: &ConsoleReporter) -> CliResult<ScenarioReport> {
        let mut fixtures = FixtureManager::new()
            .with_fixture(DownloadsFixture::new(&self.config.downloads_folder));
        fixtures.setup_all()?;

        let data = ScenarioFixtures::load(&self.config.fixtures_folder)?;
        let scenario = CheckoutScenario::from_fixtures(&data);
        let config = customer_config(&self.config, &data.user);
        console.info(&format!(
            "Running {CHECKOUT_SCENARIO} against {} ({:?}) with {:?}",
            config.base_url,
            self.backend,
            scenario.product()
        ));

        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| CliError::runtime(format!("failed to start tokio: {e}")))?;
        let mut report = ScenarioReport::new(CHECKOUT_SCENARIO, &config.base_url);
        let outcome = runtime.block_on(self.drive(&config, &scenario, &data.user, &mut report));

        if let Err(e) = fixtures.teardown_all() {
            tracing::warn!(error = %e, "fixture teardown failed");
        }

        console.print_report(&report);
        if self.write_report {
            let files = report.write_to(&config.reports_folder)?;
            console.print_files(&files);
        }

        match outcome {
            Ok(state) => {
                tracing::info!(%state, "scenario finished");
                Ok(report)
            }
            Err(e) => Err(CliError::from_scenario(e)),
        }
    }

    async fn drive(
        &self,
        config: &FlowConfig,
        scenario: &CheckoutScenario,
        user: &UserFixture,
        report: &mut ScenarioReport,
    ) -> FlowResult<CheckoutState> {
        match self.backend {
            Backend::Simulated => {
                let store = simulated_store(config, user);
                run_with(&store, config, scenario, report).await
            }
            Backend::Chromium => Self::drive_chromium(config, scenario, report).await,
        }
    }

    #[cfg(feature = "browser")]
    async fn drive_chromium(
        config: &FlowConfig,
        scenario: &CheckoutScenario,
        report: &mut ScenarioReport,
    ) -> FlowResult<CheckoutState> {
        let session = shopflow::CdpSession::launch(config).await?;
        run_with(&session, config, scenario, report).await
    }

    #[cfg(not(feature = "browser"))]
    async fn drive_chromium(
        _config: &FlowConfig,
        _scenario: &CheckoutScenario,
        _report: &mut ScenarioReport,
    ) -> FlowResult<CheckoutState> {
        Err(shopflow::FlowError::BrowserLaunch {
            message: "built without the `browser` feature; use --simulate".to_string(),
        })
    }
}

async fn run_with(
    session: &dyn BrowserSession,
    config: &FlowConfig,
    scenario: &CheckoutScenario,
    report: &mut ScenarioReport,
) -> FlowResult<CheckoutState> {
    let ctx = FlowContext::new(session, config);
    let outcome = scenario.run(&ctx, report).await;
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "session close failed");
    }
    outcome
}

/// The invoice greets the fixture customer by name when the fixture names one
fn customer_config(config: &FlowConfig, user: &UserFixture) -> FlowConfig {
    let mut config = config.clone();
    if let Some(name) = user.display_name() {
        config.invoice = config.invoice.with_customer(&name);
    }
    config
}

/// Storefront seeded with the fixture customer
fn simulated_store(config: &FlowConfig, user: &UserFixture) -> SimulatedStore {
    let mut account = Account::new(&user.login_email, &user.login_password);
    if let (Some(first), Some(last)) = (&user.first_name, &user.last_name) {
        account = account.with_name(first, last);
    }
    SimulatedStore::new(&config.base_url).with_account(account)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use shopflow::Timeouts;
    use std::path::Path;

    const USER_JSON: &str = r#"{
        "loginEmail": "qa.shopper@example.com",
        "loginPassword": "Secr3t!pass",
        "cardName": "Test User",
        "cardNumber": "4111111111111111",
        "cardCVC": "123",
        "cardExpiryMonth": "12",
        "cardExpiryYear": "2028"
    }"#;

    fn workspace(root: &Path, product: &str) -> FlowConfig {
        workspace_with_user(root, product, USER_JSON)
    }

    fn workspace_with_user(root: &Path, product: &str, user_json: &str) -> FlowConfig {
        let fixtures = root.join("fixtures");
        std::fs::create_dir_all(&fixtures).unwrap();
        std::fs::write(fixtures.join("user.json"), user_json).unwrap();
        std::fs::write(
            fixtures.join("products.json"),
            format!(r#"{{"productToAddToCart": "{product}"}}"#),
        )
        .unwrap();
        FlowConfig::new()
            .with_base_url("https://shop.test")
            .with_fixtures_folder(fixtures)
            .with_downloads_folder(root.join("downloads"))
            .with_reports_folder(root.join("reports"))
            .with_timeouts(Timeouts::uniform(300, 10))
    }

    #[test]
    fn test_simulated_run_passes_and_writes_report() {
        let root = tempfile::tempdir().unwrap();
        let config = workspace(root.path(), "Blue Top");
        let report = ScenarioRunner::new(config, Backend::Simulated)
            .run(&ConsoleReporter::new(true))
            .unwrap();

        assert!(report.all_passed());
        assert!(root.path().join("downloads").join("invoice.txt").is_file());
        assert_eq!(std::fs::read_dir(root.path().join("reports")).unwrap().count(), 2);
    }

    #[test]
    fn test_named_customer_is_greeted_on_invoice() {
        let root = tempfile::tempdir().unwrap();
        let user = USER_JSON.replace(
            r#""cardName""#,
            r#""firstName": "Ada", "lastName": "Lovelace", "cardName""#,
        );
        let config = workspace_with_user(root.path(), "Blue Top", &user);
        let report = ScenarioRunner::new(config, Backend::Simulated)
            .with_report(false)
            .run(&ConsoleReporter::new(true))
            .unwrap();

        assert!(report.all_passed());
        let invoice =
            std::fs::read_to_string(root.path().join("downloads").join("invoice.txt")).unwrap();
        assert!(invoice.starts_with("Hi Ada Lovelace"));
    }

    #[test]
    fn test_unnamed_customer_keeps_configured_greeting() {
        let root = tempfile::tempdir().unwrap();
        let base = workspace(root.path(), "Blue Top");
        let user = ScenarioFixtures::load(&base.fixtures_folder).unwrap().user;
        let config = customer_config(&base, &user);
        assert_eq!(config.invoice, base.invoice);
    }

    #[test]
    fn test_failed_run_names_step_and_still_reports() {
        let root = tempfile::tempdir().unwrap();
        let config = workspace(root.path(), "Purple Cape");
        let err = ScenarioRunner::new(config, Backend::Simulated)
            .run(&ConsoleReporter::new(true))
            .unwrap_err();

        assert!(matches!(err, CliError::ScenarioFailed { ref step, .. } if step == "logged_in"));
        assert!(root.path().join("reports").is_dir());
    }

    #[test]
    fn test_stale_invoice_is_cleared_before_run() {
        let root = tempfile::tempdir().unwrap();
        let config = workspace(root.path(), "Purple Cape");
        let downloads = root.path().join("downloads");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::write(downloads.join("invoice.txt"), "stale").unwrap();

        let _ = ScenarioRunner::new(config, Backend::Simulated)
            .with_report(false)
            .run(&ConsoleReporter::new(true));
        assert!(!downloads.join("invoice.txt").exists());
    }
}
