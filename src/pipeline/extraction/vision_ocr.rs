//! Cloud Vision text detection over REST.
//!
//! `VisionApi` is the seam between recognition and the network:
//! `GoogleVisionClient` calls `images:annotate`, `MockVisionApi` returns
//! canned annotations for tests.

use std::time::Duration;

use base64::Engine as _;

use super::vision_types::{
    AnnotateImageRequest, AnnotateImageResponse, AnnotateRequest, AnnotateResponse,
    EntityAnnotation, Feature, FeatureKind, FullTextAnnotation, RequestImage,
};
use super::ExtractionError;

/// Text-detection service abstraction (allows mocking).
pub trait VisionApi: Send + Sync {
    /// `TEXT_DETECTION`: whole-image annotation first, then one per token.
    fn detect_text(&self, image_bytes: &[u8]) -> Result<Vec<EntityAnnotation>, ExtractionError>;

    /// `DOCUMENT_TEXT_DETECTION`: page/block/paragraph/word hierarchy.
    fn detect_document(
        &self,
        image_bytes: &[u8],
    ) -> Result<Option<FullTextAnnotation>, ExtractionError>;
}

// ──────────────────────────────────────────────
// GoogleVisionClient
// ──────────────────────────────────────────────

/// Blocking HTTP client for the Cloud Vision REST API.
pub struct GoogleVisionClient {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GoogleVisionClient {
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        })
    }

    fn annotate(
        &self,
        image_bytes: &[u8],
        kind: FeatureKind,
    ) -> Result<AnnotateImageResponse, ExtractionError> {
        let url = format!("{}/v1/images:annotate", self.endpoint);
        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: RequestImage {
                    content: base64::engine::general_purpose::STANDARD.encode(image_bytes),
                },
                features: vec![Feature { kind }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractionError::VisionConnection(self.endpoint.clone())
                } else if e.is_timeout() {
                    ExtractionError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ExtractionError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::VisionStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnnotateResponse = response
            .json()
            .map_err(|e| ExtractionError::ResponseParsing(e.to_string()))?;

        first_response(parsed)
    }
}

impl VisionApi for GoogleVisionClient {
    fn detect_text(&self, image_bytes: &[u8]) -> Result<Vec<EntityAnnotation>, ExtractionError> {
        Ok(self
            .annotate(image_bytes, FeatureKind::TextDetection)?
            .text_annotations)
    }

    fn detect_document(
        &self,
        image_bytes: &[u8],
    ) -> Result<Option<FullTextAnnotation>, ExtractionError> {
        Ok(self
            .annotate(image_bytes, FeatureKind::DocumentTextDetection)?
            .full_text_annotation)
    }
}

/// Unwrap the single per-image response, surfacing its error status.
fn first_response(parsed: AnnotateResponse) -> Result<AnnotateImageResponse, ExtractionError> {
    let response = parsed.responses.into_iter().next().unwrap_or_default();
    match &response.error {
        Some(status) if !status.message.is_empty() => {
            tracing::warn!(code = status.code, message = %status.message, "Vision API rejected the image");
            Err(ExtractionError::VisionApi(status.message.clone()))
        }
        _ => Ok(response),
    }
}

// ──────────────────────────────────────────────
// MockVisionApi
// ──────────────────────────────────────────────

/// Mock text detector for testing: returns configured annotations or a
/// fixed failure.
#[derive(Default)]
pub struct MockVisionApi {
    annotations: Vec<EntityAnnotation>,
    document: Option<FullTextAnnotation>,
    failure: Option<String>,
}

impl MockVisionApi {
    pub fn new(annotations: Vec<EntityAnnotation>) -> Self {
        Self {
            annotations,
            ..Default::default()
        }
    }

    /// Whole-image text followed by one annotation per whitespace token.
    pub fn with_text(text: &str, token_confidence: Option<f32>) -> Self {
        let mut annotations = vec![EntityAnnotation {
            description: text.to_string(),
            confidence: None,
        }];
        annotations.extend(text.split_whitespace().map(|token| EntityAnnotation {
            description: token.to_string(),
            confidence: token_confidence,
        }));
        Self::new(annotations)
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn with_document(mut self, document: FullTextAnnotation) -> Self {
        self.document = Some(document);
        self
    }
}

impl VisionApi for MockVisionApi {
    fn detect_text(&self, _image_bytes: &[u8]) -> Result<Vec<EntityAnnotation>, ExtractionError> {
        match &self.failure {
            Some(msg) => Err(ExtractionError::VisionApi(msg.clone())),
            None => Ok(self.annotations.clone()),
        }
    }

    fn detect_document(
        &self,
        _image_bytes: &[u8],
    ) -> Result<Option<FullTextAnnotation>, ExtractionError> {
        match &self.failure {
            Some(msg) => Err(ExtractionError::VisionApi(msg.clone())),
            None => Ok(self.document.clone()),
        }
    }
}
