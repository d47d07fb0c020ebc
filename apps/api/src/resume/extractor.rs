//! Extraction step — asks the model to restate pasted profile text as
//! structured `field: value` lines, then decodes that into a `ResumeRecord`.

use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::{ChatMessage, ChatModel};
use crate::models::resume::ResumeRecord;
use crate::resume::decoder;
use crate::resume::prompts::{
    ADDITIONAL_INFORMATION_PREFIX, EXTRACTION_SYSTEM, EXTRACTION_TEMPERATURE,
    EXTRACTION_USER_TEMPLATE,
};

/// Builds the two-message extraction conversation.
fn extraction_messages(raw_text: &str, custom_input: Option<&str>) -> Vec<ChatMessage> {
    let mut system = EXTRACTION_SYSTEM.to_string();
    if let Some(extra) = custom_input.map(str::trim).filter(|s| !s.is_empty()) {
        system.push_str("\n\n");
        system.push_str(ADDITIONAL_INFORMATION_PREFIX);
        system.push_str(extra);
    }

    vec![
        ChatMessage::system(system),
        ChatMessage::user(EXTRACTION_USER_TEMPLATE.replace("{raw_text}", raw_text)),
    ]
}

/// Extracts a resume record from raw pasted text plus optional user hints.
pub async fn structure_user_info(
    llm: &dyn ChatModel,
    raw_text: &str,
    custom_input: Option<&str>,
) -> Result<ResumeRecord, AppError> {
    let messages = extraction_messages(raw_text, custom_input);
    let answer = llm
        .complete(&messages, EXTRACTION_TEMPERATURE)
        .await
        .map_err(|e| AppError::llm("Extraction", e))?;
    debug!("extraction answer:\n{answer}");

    let record = decoder::decode(&answer);
    info!(
        "extracted record: name={} jobs={} schools={} certs={}",
        record.name.is_some(),
        record.work_experience.len(),
        record.education.len(),
        record.certifications.len()
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fake::ScriptedModel;
    use crate::llm_client::{LlmError, Role};

    #[test]
    fn test_messages_without_custom_input() {
        let messages = extraction_messages("Jane Doe, engineer", None);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(!messages[0].content.contains(ADDITIONAL_INFORMATION_PREFIX));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "USER INFO: Jane Doe, engineer");
    }

    #[test]
    fn test_custom_input_is_appended_to_system_prompt() {
        let messages = extraction_messages("text", Some("  Targeting fintech roles  "));
        assert!(messages[0]
            .content
            .ends_with("ADDITIONAL INFORMATION: Targeting fintech roles"));
    }

    #[test]
    fn test_blank_custom_input_is_ignored() {
        let messages = extraction_messages("text", Some("   "));
        assert!(!messages[0].content.contains(ADDITIONAL_INFORMATION_PREFIX));
    }

    #[tokio::test]
    async fn test_structure_user_info_decodes_model_answer() {
        let model = ScriptedModel::answering(&[
            "name: Jane Doe\nwork_experience:\n1. company: Acme, position: CTO\n",
        ]);
        let record = structure_user_info(&model, "pasted profile", None)
            .await
            .unwrap();

        assert_eq!(record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(record.work_experience[0].position.as_deref(), Some("CTO"));

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, EXTRACTION_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_structure_user_info_surfaces_model_failure() {
        let model = ScriptedModel::new([Err(LlmError::RateLimited { retries: 3 })]);
        let err = structure_user_info(&model, "pasted profile", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(msg) if msg.starts_with("Extraction failed")));
    }
}
