//! BrowserSession - the automation backend seam.
//!
//! Helpers never reach for a global "current page": they receive a session
//! and talk to the storefront only through it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BrowserSession (trait)                                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐      ┌──────────────────────────┐  │
//! │  │  CdpSession          │      │  SimulatedStore          │  │
//! │  │  (feature "browser") │      │  (in-memory storefront)  │  │
//! │  │  chromiumoxide       │      │  tests and dry runs      │  │
//! │  └──────────────────────┘      └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method is a single, immediate observation or action. Waiting is the
//! caller's business (see [`crate::wait`]).

use crate::result::FlowResult;
use crate::selector::{ElementState, Selector};
use async_trait::async_trait;
use std::path::Path;

/// Abstract browser session
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> FlowResult<()>;

    /// Current page URL
    async fn current_url(&self) -> FlowResult<String>;

    /// Observe the first element matching `selector`, if any
    async fn probe(&self, selector: &Selector) -> FlowResult<Option<ElementState>>;

    /// Click the first element matching `selector`, even when obscured.
    ///
    /// Fails if nothing matches at the time of the call.
    async fn click(&self, selector: &Selector) -> FlowResult<()>;

    /// Type `text` into the first element matching `selector`
    async fn type_text(&self, selector: &Selector, text: &str) -> FlowResult<()>;

    /// Direct downloads into `dir`
    async fn set_download_dir(&self, dir: &Path) -> FlowResult<()>;

    /// PNG screenshot of the current page, when the backend can render one
    async fn screenshot(&self) -> FlowResult<Option<Vec<u8>>> {
        Ok(None)
    }

    /// Release backend resources
    async fn close(&self) -> FlowResult<()> {
        Ok(())
    }
}
