use serde::Serialize;

use super::StructuringError;

/// Generative model abstraction (allows mocking).
pub trait LlmClient: Send + Sync {
    /// Send one prompt, return the model's text reply.
    fn generate(&self, prompt: &str) -> Result<String, StructuringError>;
}

/// Result of a tailored analysis call. A failed call is reported in
/// `error` rather than as an `Err`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisOutcome {
    pub fn completed(analysis: serde_json::Value, raw_analysis: String) -> Self {
        Self {
            success: true,
            analysis: Some(analysis),
            raw_analysis: Some(raw_analysis),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: None,
            raw_analysis: None,
            error: Some(error.into()),
        }
    }

    /// The analysis worth persisting: present only for a successful call.
    pub fn stored_analysis(&self) -> Option<serde_json::Value> {
        if self.success {
            self.analysis.clone()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_outcome_serializes_without_analysis() {
        let json = serde_json::to_value(AnalysisOutcome::failed("quota")).unwrap();
        assert_eq!(json, json!({"success": false, "error": "quota"}));
    }

    #[test]
    fn stored_analysis_only_on_success() {
        let ok = AnalysisOutcome::completed(json!({"total": "4.00"}), "{}".into());
        assert_eq!(ok.stored_analysis(), Some(json!({"total": "4.00"})));
        assert!(AnalysisOutcome::failed("x").stored_analysis().is_none());
    }
}
