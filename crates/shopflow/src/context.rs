//! Flow context: a session plus the configuration the helpers need.
//!
//! The methods here are the vocabulary of every helper and scenario step:
//! visit a path, wait until something is visible, assert a URL or a text.
//! Each one is a bounded wait built on [`wait_for`].

use crate::config::{FlowConfig, Timeouts};
use crate::result::{FlowError, FlowResult};
use crate::selector::{ElementState, Selector};
use crate::session::BrowserSession;
use crate::wait::wait_for;
use std::fmt;
use std::sync::Mutex;

const NO_ELEMENT: &str = "<no element>";

/// How an observed string is compared against the expected one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCheck {
    /// Exact, case-sensitive equality
    Equals,
    /// Case-sensitive substring
    Contains,
}

impl TextCheck {
    /// Compare an observed value with the expected one
    #[must_use]
    pub fn matches(self, observed: &str, expected: &str) -> bool {
        match self {
            Self::Equals => observed == expected,
            Self::Contains => observed.contains(expected),
        }
    }

    /// Text a check reads: the first match for `Equals`, every match for
    /// `Contains`
    #[must_use]
    pub fn observed(self, state: &ElementState) -> &str {
        match self {
            Self::Equals => &state.text,
            Self::Contains => &state.all_text,
        }
    }
}

impl fmt::Display for TextCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => f.write_str("equal to"),
            Self::Contains => f.write_str("containing"),
        }
    }
}

/// Session and configuration handed to every helper
#[derive(Clone, Copy)]
pub struct FlowContext<'a> {
    session: &'a dyn BrowserSession,
    config: &'a FlowConfig,
}

impl fmt::Debug for FlowContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowContext")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl<'a> FlowContext<'a> {
    /// Create a context over a session
    #[must_use]
    pub fn new(session: &'a dyn BrowserSession, config: &'a FlowConfig) -> Self {
        Self { session, config }
    }

    /// The underlying session
    #[must_use]
    pub fn session(&self) -> &'a dyn BrowserSession {
        self.session
    }

    /// The runner configuration
    #[must_use]
    pub fn config(&self) -> &'a FlowConfig {
        self.config
    }

    /// Step timeouts
    #[must_use]
    pub fn timeouts(&self) -> &'a Timeouts {
        &self.config.timeouts
    }

    /// Navigate to an application path
    pub async fn visit(&self, path: &str) -> FlowResult<()> {
        let url = self.config.url(path);
        tracing::debug!(%url, "visit");
        self.session.goto(&url).await
    }

    /// Wait until the first match of `selector` is visible
    pub async fn wait_visible(
        &self,
        selector: &Selector,
        timeout_ms: u64,
    ) -> FlowResult<ElementState> {
        let session = self.session;
        let result = wait_for(
            format!("{selector} to be visible"),
            &self.timeouts().wait(timeout_ms),
            || async move {
                Ok(session
                    .probe(selector)
                    .await?
                    .filter(|state| state.visible))
            },
        )
        .await?;
        Ok(result.value)
    }

    /// Wait until `selector` matches at least one element, visible or not
    pub async fn wait_present(
        &self,
        selector: &Selector,
        timeout_ms: u64,
    ) -> FlowResult<ElementState> {
        let session = self.session;
        let result = wait_for(
            format!("{selector} to exist"),
            &self.timeouts().wait(timeout_ms),
            || async move { session.probe(selector).await },
        )
        .await?;
        Ok(result.value)
    }

    /// Wait until `selector` is absent or hidden
    pub async fn expect_hidden(&self, selector: &Selector, timeout_ms: u64) -> FlowResult<()> {
        let session = self.session;
        let outcome = wait_for(
            format!("{selector} to be hidden"),
            &self.timeouts().wait(timeout_ms),
            || async move {
                let state = session.probe(selector).await?;
                Ok(state.map_or(true, |s| !s.visible).then_some(()))
            },
        )
        .await;
        match outcome {
            Ok(_) => Ok(()),
            Err(FlowError::Timeout { .. }) => Err(FlowError::mismatch(
                selector.to_string(),
                "hidden",
                "visible",
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait until the first match of `selector` is visible and the text
    /// satisfies `check`.
    ///
    /// `Equals` compares the first match's text. `Contains` searches the
    /// joined text of every match, so `.active` passes when any active
    /// element holds the expected words. A timeout reports the last
    /// observed text.
    pub async fn expect_text(
        &self,
        selector: &Selector,
        check: TextCheck,
        expected: &str,
        timeout_ms: u64,
    ) -> FlowResult<ElementState> {
        let session = self.session;
        let last = Mutex::new(NO_ELEMENT.to_string());
        let outcome = wait_for(
            format!("{selector} with text {check} {expected:?}"),
            &self.timeouts().wait(timeout_ms),
            || {
                let last = &last;
                async move {
                    let Some(state) = session.probe(selector).await? else {
                        return Ok(None);
                    };
                    let observed = check.observed(&state);
                    record(last, observed);
                    let ok = state.visible && check.matches(observed, expected);
                    Ok(ok.then_some(state))
                }
            },
        )
        .await;
        match outcome {
            Ok(result) => Ok(result.value),
            Err(FlowError::Timeout { .. }) => Err(FlowError::mismatch(
                format!("text of {selector}"),
                format!("{check} {expected:?}"),
                take(last),
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait until the current URL contains `fragment`
    pub async fn expect_url_contains(&self, fragment: &str, timeout_ms: u64) -> FlowResult<String> {
        self.expect_url(TextCheck::Contains, fragment, timeout_ms)
            .await
    }

    /// Wait until the current URL equals `expected` exactly
    pub async fn expect_url_eq(&self, expected: &str, timeout_ms: u64) -> FlowResult<String> {
        self.expect_url(TextCheck::Equals, expected, timeout_ms)
            .await
    }

    async fn expect_url(
        &self,
        check: TextCheck,
        expected: &str,
        timeout_ms: u64,
    ) -> FlowResult<String> {
        let session = self.session;
        let last = Mutex::new(String::new());
        let outcome = wait_for(
            format!("URL {check} {expected:?}"),
            &self.timeouts().wait(timeout_ms),
            || {
                let last = &last;
                async move {
                    let url = session.current_url().await?;
                    record(last, &url);
                    Ok(check.matches(&url, expected).then_some(url))
                }
            },
        )
        .await;
        match outcome {
            Ok(result) => Ok(result.value),
            Err(FlowError::Timeout { .. }) => Err(FlowError::mismatch(
                "URL",
                format!("{check} {expected:?}"),
                take(last),
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait for `selector` to be visible, then click it
    pub async fn click_visible(&self, selector: &Selector, timeout_ms: u64) -> FlowResult<()> {
        self.wait_visible(selector, timeout_ms).await?;
        self.session.click(selector).await
    }

    /// Wait for `selector` to exist, then click it even if obscured
    pub async fn click_forced(&self, selector: &Selector, timeout_ms: u64) -> FlowResult<()> {
        self.wait_present(selector, timeout_ms).await?;
        self.session.click(selector).await
    }

    /// Wait for an input to be visible, then type into it
    pub async fn type_into(&self, selector: &Selector, text: &str) -> FlowResult<()> {
        self.wait_visible(selector, self.timeouts().default_command)
            .await?;
        self.session.type_text(selector, text).await
    }
}

fn record(slot: &Mutex<String>, value: &str) {
    if let Ok(mut guard) = slot.lock() {
        *guard = value.to_string();
    }
}

fn take(slot: Mutex<String>) -> String {
    slot.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
}
