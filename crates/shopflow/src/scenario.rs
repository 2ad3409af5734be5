//! Checkout scenario.
//!
//! A linear state machine driven by fixture data:
//!
//! ```text
//! start → logged_in → cart_reviewed → checkout_reviewed → payment_entered
//!       → order_confirmed → invoice_verified → returned_home
//! ```
//!
//! There is no branching and no retry. The first failed check stops the run;
//! the error names the step it happened in.

use crate::actions::{add_product_to_cart, login};
use crate::context::{FlowContext, TextCheck};
use crate::downloads::read_download;
use crate::fixture::{Credentials, PaymentDetails, ScenarioFixtures};
use crate::reporter::{ScenarioReport, StepRecord};
use crate::result::{FlowError, FlowResult};
use crate::selector::Selector;
use std::fmt;
use std::path::PathBuf;
use tokio::time::Instant;

/// Scenario name used in reports
pub const CHECKOUT_SCENARIO: &str = "checkout";

/// States of the checkout run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutState {
    /// Nothing done yet
    Start,
    /// Logged in with the product in the cart
    LoggedIn,
    /// Cart page checked, checkout requested
    CartReviewed,
    /// Address and order review checked, order placed
    CheckoutReviewed,
    /// Card details typed
    PaymentEntered,
    /// Payment accepted and confirmation shown
    OrderConfirmed,
    /// Invoice downloaded and checked
    InvoiceVerified,
    /// Back on the home page
    ReturnedHome,
}

impl CheckoutState {
    /// Step name as used in errors and reports
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::LoggedIn => "logged_in",
            Self::CartReviewed => "cart_reviewed",
            Self::CheckoutReviewed => "checkout_reviewed",
            Self::PaymentEntered => "payment_entered",
            Self::OrderConfirmed => "order_confirmed",
            Self::InvoiceVerified => "invoice_verified",
            Self::ReturnedHome => "returned_home",
        }
    }

    /// The single successor, `None` at the end
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::LoggedIn),
            Self::LoggedIn => Some(Self::CartReviewed),
            Self::CartReviewed => Some(Self::CheckoutReviewed),
            Self::CheckoutReviewed => Some(Self::PaymentEntered),
            Self::PaymentEntered => Some(Self::OrderConfirmed),
            Self::OrderConfirmed => Some(Self::InvoiceVerified),
            Self::InvoiceVerified => Some(Self::ReturnedHome),
            Self::ReturnedHome => None,
        }
    }

    /// True for `returned_home`
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ReturnedHome)
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The checkout flow for one customer and one product
#[derive(Debug, Clone)]
pub struct CheckoutScenario {
    credentials: Credentials,
    product: String,
    payment: PaymentDetails,
}

impl CheckoutScenario {
    /// Create a scenario
    #[must_use]
    pub fn new(credentials: Credentials, product: impl Into<String>, payment: PaymentDetails) -> Self {
        Self {
            credentials,
            product: product.into(),
            payment,
        }
    }

    /// Create a scenario from loaded fixtures
    #[must_use]
    pub fn from_fixtures(fixtures: &ScenarioFixtures) -> Self {
        Self::new(
            fixtures.user.credentials(),
            &fixtures.product.product_to_add_to_cart,
            fixtures.user.payment(),
        )
    }

    /// Product being bought
    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Run every step in order, recording each into `report`.
    ///
    /// Returns the terminal state on success. On failure the remaining steps
    /// are recorded as skipped, a screenshot is attached when the session can
    /// take one, and the error is returned wrapped in [`FlowError::Step`].
    pub async fn run(
        &self,
        ctx: &FlowContext<'_>,
        report: &mut ScenarioReport,
    ) -> FlowResult<CheckoutState> {
        let downloads = absolute(&ctx.config().downloads_folder)
            .map_err(|e| e.in_step(CheckoutState::Start.name()))?;
        ctx.session()
            .set_download_dir(&downloads)
            .await
            .map_err(|e| e.in_step(CheckoutState::Start.name()))?;

        let mut state = CheckoutState::Start;
        while let Some(target) = state.next() {
            let started = Instant::now();
            tracing::info!(step = target.name(), product = %self.product, "step started");

            if let Err(e) = self.transition(ctx, target).await {
                let err = e.in_step(target.name());
                tracing::error!(step = target.name(), error = %err, "step failed");
                report.record(StepRecord::failed(target.name(), started.elapsed(), &err));

                let mut rest = target.next();
                while let Some(skipped) = rest {
                    report.record(StepRecord::skipped(skipped.name()));
                    rest = skipped.next();
                }
                match ctx.session().screenshot().await {
                    Ok(Some(png)) => report.attach_screenshot(png),
                    Ok(None) => {}
                    Err(shot) => tracing::warn!(error = %shot, "failure screenshot unavailable"),
                }
                report.finish(state.name());
                return Err(err);
            }

            report.record(StepRecord::passed(target.name(), started.elapsed()));
            tracing::info!(step = target.name(), "step passed");
            state = target;
        }

        report.finish(state.name());
        Ok(state)
    }

    async fn transition(&self, ctx: &FlowContext<'_>, target: CheckoutState) -> FlowResult<()> {
        match target {
            CheckoutState::Start => Ok(()),
            CheckoutState::LoggedIn => self.log_in_and_fill_cart(ctx).await,
            CheckoutState::CartReviewed => self.review_cart(ctx).await,
            CheckoutState::CheckoutReviewed => self.review_checkout(ctx).await,
            CheckoutState::PaymentEntered => self.enter_payment(ctx).await,
            CheckoutState::OrderConfirmed => Self::confirm_order(ctx).await,
            CheckoutState::InvoiceVerified => Self::verify_invoice(ctx).await,
            CheckoutState::ReturnedHome => Self::return_home(ctx).await,
        }
    }

    async fn log_in_and_fill_cart(&self, ctx: &FlowContext<'_>) -> FlowResult<()> {
        login(ctx, &self.credentials).await?;
        add_product_to_cart(ctx, &self.product).await?;
        ctx.expect_hidden(&Selector::css(".modal-content"), ctx.timeouts().default_command)
            .await
    }

    async fn review_cart(&self, ctx: &FlowContext<'_>) -> FlowResult<()> {
        let t = ctx.timeouts();
        ctx.visit("/view_cart").await?;
        ctx.expect_url_contains("/view_cart", t.default_command)
            .await?;
        ctx.expect_text(
            &Selector::css(".active"),
            TextCheck::Contains,
            "Shopping Cart",
            t.element,
        )
        .await?;
        ctx.wait_visible(
            &Selector::css_with_text("td.cart_description a", &self.product),
            t.element,
        )
        .await?;
        ctx.click_visible(
            &Selector::css_with_text("a.btn", "Proceed To Checkout"),
            t.default_command,
        )
        .await
    }

    async fn review_checkout(&self, ctx: &FlowContext<'_>) -> FlowResult<()> {
        let t = ctx.timeouts();
        ctx.expect_url_contains("/checkout", t.default_command)
            .await?;
        for heading in ["Address Details", "Review Your Order"] {
            ctx.wait_visible(&Selector::css_with_text("h2", heading), t.element)
                .await?;
        }
        ctx.expect_text(
            &Selector::css(".cart_description > h4 > a"),
            TextCheck::Contains,
            &self.product,
            t.review,
        )
        .await?;
        ctx.click_visible(
            &Selector::css_with_text("a.btn", "Place Order"),
            t.default_command,
        )
        .await
    }

    async fn enter_payment(&self, ctx: &FlowContext<'_>) -> FlowResult<()> {
        let t = ctx.timeouts();
        ctx.expect_url_contains("/payment", t.default_command)
            .await?;
        ctx.expect_text(
            &Selector::css(".active"),
            TextCheck::Contains,
            "Payment",
            t.element,
        )
        .await?;

        let fields = [
            ("name-on-card", &self.payment.card_name),
            ("card-number", &self.payment.card_number),
            ("cvc", &self.payment.cvc),
            ("expiry-month", &self.payment.expiry_month),
            ("expiry-year", &self.payment.expiry_year),
        ];
        for (qa, value) in fields {
            ctx.type_into(&Selector::css(format!(r#"input[data-qa="{qa}"]"#)), value)
                .await?;
        }
        Ok(())
    }

    async fn confirm_order(ctx: &FlowContext<'_>) -> FlowResult<()> {
        let t = ctx.timeouts();
        ctx.click_visible(
            &Selector::css(r#"button[data-qa="pay-button"]"#),
            t.default_command,
        )
        .await?;
        ctx.expect_url_contains("/payment_done", t.payment_redirect)
            .await?;
        ctx.expect_text(
            &Selector::css(r#"[data-qa="order-placed"] > b"#),
            TextCheck::Equals,
            "Order Placed!",
            t.order_placed,
        )
        .await?;
        ctx.wait_visible(
            &Selector::css_with_text("p", "Congratulations! Your order has been confirmed!"),
            t.default_command,
        )
        .await?;
        Ok(())
    }

    async fn verify_invoice(ctx: &FlowContext<'_>) -> FlowResult<()> {
        let config = ctx.config();
        let t = ctx.timeouts();
        ctx.click_visible(
            &Selector::css_with_text("a.btn", "Download Invoice"),
            t.default_command,
        )
        .await?;
        let content = read_download(
            &config.downloads_folder,
            &config.invoice.file_name,
            &t.wait(t.download),
        )
        .await?;
        config.invoice.verify(&content)
    }

    async fn return_home(ctx: &FlowContext<'_>) -> FlowResult<()> {
        let t = ctx.timeouts();
        ctx.click_visible(
            &Selector::css(r#"a[data-qa="continue-button"]"#),
            t.default_command,
        )
        .await?;
        ctx.expect_url_eq(&ctx.config().root_url(), t.default_command)
            .await?;
        Ok(())
    }
}

fn absolute(dir: &std::path::Path) -> FlowResult<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| FlowError::environment(dir, format!("cannot resolve working directory: {e}")))?;
    Ok(cwd.join(dir))
}
