//! Wire types for the Cloud Vision `images:annotate` REST call.
//!
//! Only the fields the recognition client reads are modeled; unknown
//! fields are ignored and missing ones default.

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Request
// ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
pub struct AnnotateImageRequest {
    pub image: RequestImage,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct RequestImage {
    /// Base64-encoded image bytes.
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    TextDetection,
    DocumentTextDetection,
}

// ──────────────────────────────────────────────
// Response
// ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub text_annotations: Vec<EntityAnnotation>,
    pub full_text_annotation: Option<FullTextAnnotation>,
    pub error: Option<ResponseStatus>,
}

/// One text-detection annotation. The first entry of a response covers
/// the whole image; the rest are individual tokens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityAnnotation {
    #[serde(default)]
    pub description: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FullTextAnnotation {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub symbols: Vec<Symbol>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Symbol {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}
