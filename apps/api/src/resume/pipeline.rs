//! Resume pipeline — runs the steps strictly in sequence for one request.
//!
//! Flow: structure_user_info → generate_resume_html → render_pdf.
//! Nothing is kept between requests.

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::models::resume::ResumeRecord;
use crate::render::PdfRenderer;
use crate::resume::extractor::structure_user_info;
use crate::resume::html::generate_resume_html;

/// Full pipeline: pasted text to PDF bytes.
pub async fn build_resume_pdf(
    llm: &dyn ChatModel,
    renderer: &dyn PdfRenderer,
    raw_text: &str,
    custom_input: Option<&str>,
) -> Result<Vec<u8>, AppError> {
    let request_id = Uuid::new_v4();
    async {
        info!("structuring {} chars of pasted text", raw_text.len());
        let record = structure_user_info(llm, raw_text, custom_input).await?;
        render_record(llm, renderer, &record).await
    }
    .instrument(info_span!("resume_pipeline", %request_id))
    .await
}

/// Tail of the pipeline for an already-structured (possibly user-edited) record.
pub async fn render_record(
    llm: &dyn ChatModel,
    renderer: &dyn PdfRenderer,
    record: &ResumeRecord,
) -> Result<Vec<u8>, AppError> {
    let html = generate_resume_html(llm, record).await?;
    let pdf = renderer.render_pdf(&html).await?;
    info!("resume PDF ready ({} bytes)", pdf.len());
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fake::ScriptedModel;
    use crate::render::fake::StaticRenderer;

    #[tokio::test]
    async fn test_pipeline_runs_both_model_calls_then_renders() {
        let model = ScriptedModel::answering(&[
            "name: Jane Doe\nemail: jane@example.com\n",
            "<html><body><h1>Jane Doe</h1></body></html>",
        ]);
        let renderer = StaticRenderer::returning(b"%PDF-1.7 fake");

        let pdf = build_resume_pdf(&model, &renderer, "Jane Doe - jane@example.com", None)
            .await
            .unwrap();

        assert_eq!(pdf, b"%PDF-1.7 fake");
        assert_eq!(model.call_count(), 2);

        // The second call carries the decoded record, not the raw answer.
        let calls = model.calls.lock().unwrap();
        assert!(calls[1].0[0]
            .content
            .contains(r#"{"name":"Jane Doe","email":"jane@example.com"}"#));

        let rendered = renderer.rendered.lock().unwrap();
        assert_eq!(rendered[0], "<html><body><h1>Jane Doe</h1></body></html>");
    }

    #[tokio::test]
    async fn test_pipeline_stops_before_rendering_when_html_step_fails() {
        let model = ScriptedModel::answering(&["name: Jane Doe\n", "no markup here"]);
        let renderer = StaticRenderer::returning(b"%PDF");

        let err = build_resume_pdf(&model, &renderer, "Jane", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert!(renderer.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_render_record_skips_extraction() {
        let model = ScriptedModel::answering(&["<p>edited</p>"]);
        let renderer = StaticRenderer::returning(b"%PDF");
        let record = ResumeRecord {
            name: Some("Edited Name".to_string()),
            ..Default::default()
        };

        render_record(&model, &renderer, &record).await.unwrap();
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_maps_to_render_error() {
        let model = ScriptedModel::answering(&["<p>x</p>"]);
        let renderer = StaticRenderer::failing();
        let err = render_record(&model, &renderer, &ResumeRecord::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }
}
