// Resume pipeline: pasted text → structured record → HTML → PDF.
// All model calls go through llm_client::ChatModel; rendering through render::PdfRenderer.

pub mod decoder;
pub mod extractor;
pub mod handlers;
pub mod html;
pub mod pipeline;
pub mod prompts;
