use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::render::PdfRenderer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Language model used for both extraction and HTML generation.
    pub llm: Arc<dyn ChatModel>,
    /// HTML → PDF backend. Default: headless Chromium.
    pub renderer: Arc<dyn PdfRenderer>,
    pub config: Config,
}
