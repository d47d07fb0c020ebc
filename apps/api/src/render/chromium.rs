use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::{PdfLayout, PdfRenderer, RenderError};

/// Extra flags on top of chromiumoxide's defaults. `no_sandbox()` adds the
/// sandbox flags, which containerised deployments need.
const BROWSER_ARGS: &[&str] = &["--hide-scrollbars", "--disable-web-security"];

/// Launches a fresh headless Chromium for every render.
///
/// Each launch gets its own throwaway profile directory so concurrent
/// requests never contend for a profile lock. The browser is closed on every
/// path out of `render_pdf`.
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    load_timeout: Duration,
    layout: PdfLayout,
}

impl ChromiumRenderer {
    pub fn new(executable: Option<PathBuf>, load_timeout: Duration) -> Self {
        Self {
            executable,
            load_timeout,
            layout: PdfLayout::a4(),
        }
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile_dir)
            .args(BROWSER_ARGS.iter().copied());
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Launch)
    }

    async fn print(&self, browser: &Browser, html: &str) -> Result<Vec<u8>, RenderError> {
        let page = browser.new_page("about:blank").await?;

        tokio::time::timeout(self.load_timeout, page.set_content(html))
            .await
            .map_err(|_| RenderError::Timeout(self.load_timeout.as_secs()))??;

        let pdf = page.pdf(print_params(&self.layout)).await?;
        if pdf.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        Ok(pdf)
    }
}

fn print_params(layout: &PdfLayout) -> PrintToPdfParams {
    PrintToPdfParams {
        paper_width: Some(layout.paper_width),
        paper_height: Some(layout.paper_height),
        margin_top: Some(layout.margin_top),
        margin_right: Some(layout.margin_right),
        margin_bottom: Some(layout.margin_bottom),
        margin_left: Some(layout.margin_left),
        print_background: Some(layout.print_background),
        ..Default::default()
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let profile = tempfile::Builder::new()
            .prefix("resumegen-chrome-")
            .tempdir()?;
        let config = self.browser_config(profile.path())?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser event error: {e}");
                }
            }
        });
        debug!("headless browser launched");

        let result = self.print(&browser, html).await;

        if let Err(e) = browser.close().await {
            warn!("failed to close browser cleanly: {e}");
        }
        if let Err(e) = browser.wait().await {
            warn!("failed to reap browser process: {e}");
        }
        events.abort();

        if let Ok(pdf) = &result {
            info!("rendered PDF ({} bytes)", pdf.len());
        }
        result
    }
}
