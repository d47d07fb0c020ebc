//! Axum route handlers for the resume API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::resume::extractor::structure_user_info;
use crate::resume::pipeline::{build_resume_pdf, render_record};
use crate::state::AppState;

const PDF_FILENAME: &str = "resume.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Body shared by the pipeline and extract endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub custom_input: Option<String>,
}

impl ResumeRequest {
    /// The pasted text, or a validation error when it is missing or blank.
    fn content(&self) -> Result<&str, AppError> {
        self.content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Content is required".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub record: ResumeRecord,
}

/// A PDF served as a `resume.pdf` download.
pub struct PdfDownload(pub Vec<u8>);

impl IntoResponse for PdfDownload {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{PDF_FILENAME}\""),
                ),
            ],
            Bytes::from(self.0),
        )
            .into_response()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/resume
///
/// Pasted text in, resume PDF out: extraction → HTML → render.
pub async fn handle_create_resume(
    State(state): State<AppState>,
    payload: Result<Json<ResumeRequest>, JsonRejection>,
) -> Result<PdfDownload, AppError> {
    let Json(request) = payload?;
    let content = request.content()?;

    let pdf = build_resume_pdf(
        state.llm.as_ref(),
        state.renderer.as_ref(),
        content,
        request.custom_input.as_deref(),
    )
    .await?;

    Ok(PdfDownload(pdf))
}

/// POST /api/resume/extract
///
/// Runs only the extraction step so the form can show editable fields.
pub async fn handle_extract(
    State(state): State<AppState>,
    payload: Result<Json<ResumeRequest>, JsonRejection>,
) -> Result<Json<ResumeRecord>, AppError> {
    let Json(request) = payload?;
    let content = request.content()?;

    let record =
        structure_user_info(state.llm.as_ref(), content, request.custom_input.as_deref()).await?;
    Ok(Json(record))
}

/// POST /api/resume/render
///
/// Renders a record the user has reviewed and possibly edited.
pub async fn handle_render(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<PdfDownload, AppError> {
    let Json(request) = payload?;
    if request.record.is_empty() {
        return Err(AppError::Validation(
            "Record has no fields to render".to_string(),
        ));
    }

    let pdf = render_record(state.llm.as_ref(), state.renderer.as_ref(), &request.record).await?;
    Ok(PdfDownload(pdf))
}
