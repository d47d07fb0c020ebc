//! HTML-generation step — turns a resume record into a styled, print-ready
//! HTML document via a second model call.

use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::{strip_code_fences, ChatMessage, ChatModel, LlmError};
use crate::models::resume::ResumeRecord;
use crate::resume::prompts::{HTML_PROMPT_TEMPLATE, HTML_TEMPERATURE};

fn html_prompt(record: &ResumeRecord) -> Result<String, AppError> {
    let structured_info = serde_json::to_string(record)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize record: {e}")))?;
    Ok(HTML_PROMPT_TEMPLATE.replace("{structured_info}", &structured_info))
}

/// Cleans the model answer down to the HTML document.
fn extract_html(answer: &str) -> Result<String, LlmError> {
    let html = strip_code_fences(answer, "html");
    if !html.contains('<') || !html.contains('>') {
        return Err(LlmError::Unusable(format!(
            "expected HTML, got: {}",
            html.chars().take(80).collect::<String>()
        )));
    }
    Ok(html)
}

/// Asks the model for a complete HTML resume built from `record`.
pub async fn generate_resume_html(
    llm: &dyn ChatModel,
    record: &ResumeRecord,
) -> Result<String, AppError> {
    let messages = [ChatMessage::user(html_prompt(record)?)];
    let answer = llm
        .complete(&messages, HTML_TEMPERATURE)
        .await
        .map_err(|e| AppError::llm("HTML generation", e))?;

    let html = extract_html(&answer).map_err(|e| AppError::llm("HTML generation", e))?;
    debug!("generated HTML:\n{html}");
    info!("generated resume HTML ({} bytes)", html.len());
    Ok(html)
}
