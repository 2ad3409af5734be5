//! Shopflow: browser-driven checkout scenarios for an e-commerce storefront
//!
//! Composable UI-action helpers (log in, add a product to the cart) and a
//! fixture-driven checkout scenario that walks from login to a verified
//! invoice download.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    SHOPFLOW Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌──────────────────────┐  │
//! │   │ Fixtures   │    │ Checkout   │    │ BrowserSession       │  │
//! │   │ user.json  │───►│ Scenario   │───►│  CdpSession (CDP)    │  │
//! │   │ products   │    │ + helpers  │    │  SimulatedStore      │  │
//! │   └────────────┘    └─────┬──────┘    └──────────────────────┘  │
//! │                           ▼                                     │
//! │                    ┌────────────┐                               │
//! │                    │ Scenario   │  JSON + HTML + failure PNG    │
//! │                    │ Report     │                               │
//! │                    └────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every wait in the crate is a bounded poll through [`wait::wait_for`];
//! nothing retries.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Storefront interaction helpers
pub mod actions;
/// Chromium backend (feature `browser`)
#[cfg(feature = "browser")]
pub mod cdp;
/// Runner configuration
pub mod config;
/// Session plus configuration handed to helpers
pub mod context;
/// Download directory management
pub mod downloads;
/// Fixture data and lifecycle
pub mod fixture;
/// Invoice content expectations
pub mod invoice;
/// Run reports
pub mod reporter;
mod result;
/// The checkout state machine
pub mod scenario;
mod selector;
mod session;
/// In-memory storefront backend
pub mod simulated;
/// Bounded waits
pub mod wait;

pub use actions::{add_product_to_cart, login};
#[cfg(feature = "browser")]
pub use cdp::CdpSession;
pub use config::{FlowConfig, Timeouts};
pub use context::{FlowContext, TextCheck};
pub use downloads::{clear_downloads, read_download};
pub use fixture::{
    Credentials, DownloadsFixture, Fixture, FixtureManager, FixtureState, PaymentDetails,
    ProductFixture, ScenarioFixtures, UserFixture,
};
pub use invoice::InvoiceExpectations;
pub use reporter::{ReportFiles, ScenarioReport, StepRecord, StepStatus};
pub use result::{ErrorKind, FlowError, FlowResult};
pub use scenario::{CheckoutScenario, CheckoutState};
pub use selector::{ElementState, Selector};
pub use session::BrowserSession;
pub use simulated::{Account, CatalogItem, SimulatedStore};
pub use wait::{wait_for, wait_until, WaitOptions, WaitResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        add_product_to_cart, clear_downloads, login, BrowserSession, CheckoutScenario,
        CheckoutState, Credentials, ErrorKind, FlowConfig, FlowContext, FlowError, FlowResult,
        ScenarioFixtures, ScenarioReport, Selector, SimulatedStore,
    };
}
