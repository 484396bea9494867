use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use super::fallback::extract_entities_fallback;
use super::parser::{entities_from_object, extract_first_json_object, is_structured, parse_analysis};
use super::prompt::{
    build_analysis_prompt, build_classification_prompt, build_entities_prompt,
    build_summary_prompt,
};
use super::types::{AnalysisOutcome, LlmClient};
use super::StructuringError;
use crate::models::ExtractedEntities;

/// Trimmed inputs shorter than this are not sent for analysis.
pub const MIN_ANALYSIS_CHARS: usize = 10;

/// Model-backed interpretation of recognized text.
///
/// No operation returns `Err`: failures become failure outcomes, the regex
/// fallback, or a default object, so one bad call never aborts its siblings.
pub struct SemanticAnalyzer {
    llm: Arc<dyn LlmClient>,
}

impl SemanticAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn analyze_text(&self, text: &str, document_type: &str) -> AnalysisOutcome {
        if text.trim().chars().count() < MIN_ANALYSIS_CHARS {
            return AnalysisOutcome::failed(StructuringError::InputTooShort.to_string());
        }

        let _span = tracing::info_span!("analyze_text", document_type, text_len = text.len()).entered();
        let start = Instant::now();

        match self.llm.generate(&build_analysis_prompt(text, document_type)) {
            Ok(reply) => {
                let analysis = parse_analysis(&reply);
                let structured = is_structured(&analysis);
                tracing::info!(
                    elapsed_ms = %start.elapsed().as_millis(),
                    structured,
                    "Analysis complete"
                );
                AnalysisOutcome::completed(analysis, reply)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Analysis call failed");
                AnalysisOutcome::failed(e.to_string())
            }
        }
    }

    /// Entity lists from the model, or from local patterns when the model
    /// fails or answers without an object.
    pub fn extract_entities(&self, text: &str) -> ExtractedEntities {
        let _span = tracing::info_span!("extract_entities", text_len = text.len()).entered();

        match self.llm.generate(&build_entities_prompt(text)) {
            Ok(reply) => match extract_first_json_object(&reply) {
                Some(map) => {
                    let entities = entities_from_object(&map);
                    tracing::info!(entity_count = entities.total(), "Entities extracted");
                    entities
                }
                None => {
                    tracing::warn!("Entity reply had no JSON object, using pattern fallback");
                    extract_entities_fallback(text)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Entity call failed, using pattern fallback");
                extract_entities_fallback(text)
            }
        }
    }

    /// Two-to-three sentence summary. Failures come back as an
    /// `"Error generating summary: ..."` string, not an error.
    pub fn summarize_document(&self, text: &str) -> String {
        match self.llm.generate(&build_summary_prompt(text)) {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Summary call failed");
                format!("Error generating summary: {e}")
            }
        }
    }

    pub fn classify_and_structure(&self, text: &str) -> Value {
        match self.llm.generate(&build_classification_prompt(text)) {
            Ok(reply) => match extract_first_json_object(&reply) {
                Some(map) => Value::Object(map),
                None => default_classification(None),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Classification call failed");
                default_classification(Some(e.to_string()))
            }
        }
    }
}

fn default_classification(error: Option<String>) -> Value {
    let mut value = json!({
        "document_type": "unknown",
        "confidence": "low",
        "key_info": {},
        "suggestions": [],
    });
    if let (Some(error), Some(map)) = (error, value.as_object_mut()) {
        map.insert("error".into(), Value::String(error));
    }
    value
}
