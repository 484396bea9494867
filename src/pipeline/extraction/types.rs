use serde::{Deserialize, Serialize};

use crate::models::enums::DocumentType;

/// Layout recovered from the document-text hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrStructure {
    pub blocks: Vec<String>,
    pub paragraphs: Vec<String>,
    pub words: Vec<String>,
}

/// Outcome of recognizing one image. Failures are values, not errors:
/// `success` is false and `error` carries the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub success: bool,
    pub raw_text: String,
    pub confidence_score: f64,
    pub document_type: DocumentType,
    pub structured_data: OcrStructure,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            raw_text: String::new(),
            confidence_score: 0.0,
            document_type: DocumentType::Unknown,
            structured_data: OcrStructure::default(),
            word_count: 0,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_empty_and_unknown() {
        let result = OcrResult::failure("boom");
        assert!(!result.success);
        assert_eq!(result.raw_text, "");
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.structured_data, OcrStructure::default());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn error_omitted_from_successful_json() {
        let result = OcrResult {
            error: None,
            success: true,
            ..OcrResult::failure("")
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["document_type"], "unknown");
    }
}
