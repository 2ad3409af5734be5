//! Chromium backend over the DevTools protocol.
//!
//! Compiled with the `browser` feature. Element queries, clicks and focus
//! run as page scripts built from [`Selector`]; typing goes through
//! `Input.insertText` into the focused element.

use crate::config::FlowConfig;
use crate::result::{FlowError, FlowResult};
use crate::selector::{ElementState, Selector};
use crate::session::BrowserSession;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::path::Path;
use tokio::sync::Mutex;

/// A Chromium instance with one page
#[derive(Debug)]
pub struct CdpSession {
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    handle: tokio::task::JoinHandle<()>,
}

impl CdpSession {
    /// Launch Chromium as configured and open a blank page
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched
    pub async fn launch(config: &FlowConfig) -> FlowResult<Self> {
        let mut builder = CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if config.disable_web_security {
            builder = builder.arg("--disable-web-security");
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| FlowError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| FlowError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FlowError::BrowserLaunch {
                message: e.to_string(),
            })?;

        tracing::info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "browser launched"
        );
        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handle,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> FlowResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| FlowError::page(e.to_string()))?
            .into_value()
            .map_err(|e| FlowError::page(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for CdpSession {
    async fn goto(&self, url: &str) -> FlowResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| FlowError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> FlowResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| FlowError::page(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn probe(&self, selector: &Selector) -> FlowResult<Option<ElementState>> {
        // stringified so a null result survives the CDP round trip
        let raw: String = self
            .eval(format!("JSON.stringify({})", selector.to_probe_script()))
            .await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn click(&self, selector: &Selector) -> FlowResult<()> {
        let clicked: bool = self.eval(selector.to_click_script()).await?;
        if clicked {
            Ok(())
        } else {
            Err(FlowError::page(format!("nothing to click for {selector}")))
        }
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> FlowResult<()> {
        let focused: bool = self.eval(selector.to_focus_script()).await?;
        if !focused {
            return Err(FlowError::page(format!("nothing to type into for {selector}")));
        }
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(|e| FlowError::page(e.to_string()))?;
        Ok(())
    }

    async fn set_download_dir(&self, dir: &Path) -> FlowResult<()> {
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(dir.to_string_lossy().into_owned())
            .build()
            .map_err(FlowError::page)?;
        self.browser
            .lock()
            .await
            .execute(params)
            .await
            .map_err(|e| FlowError::page(e.to_string()))?;
        tracing::debug!(dir = %dir.display(), "download directory set");
        Ok(())
    }

    async fn screenshot(&self) -> FlowResult<Option<Vec<u8>>> {
        use base64::Engine;

        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self
            .page
            .execute(params)
            .await
            .map_err(|e| FlowError::page(e.to_string()))?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| FlowError::page(e.to_string()))?;
        Ok(Some(png))
    }

    async fn close(&self) -> FlowResult<()> {
        self.browser
            .lock()
            .await
            .close()
            .await
            .map_err(|e| FlowError::page(e.to_string()))?;
        self.handle.abort();
        Ok(())
    }
}
