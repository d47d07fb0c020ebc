//! HTML → PDF rendering.
//!
//! `AppState` holds an `Arc<dyn PdfRenderer>`. The default backend drives a
//! headless Chromium per request (see [`chromium`]); tests swap in a stub.

use async_trait::async_trait;
use thiserror::Error;

pub mod chromium;

pub use chromium::ChromiumRenderer;

const INCH_PER_MM: f64 = 1.0 / 25.4;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("page did not finish loading within {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser produced an empty PDF")]
    EmptyOutput,
}

/// Page geometry for the exported PDF, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfLayout {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub print_background: bool,
}

impl PdfLayout {
    /// A4 with half-inch margins on every side and backgrounds printed.
    pub fn a4() -> Self {
        Self {
            paper_width: 210.0 * INCH_PER_MM,
            paper_height: 297.0 * INCH_PER_MM,
            margin_top: 0.5,
            margin_right: 0.5,
            margin_bottom: 0.5,
            margin_left: 0.5,
            print_background: true,
        }
    }
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::a4()
    }
}

/// Converts a complete HTML document into PDF bytes.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}
