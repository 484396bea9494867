//! Recognition: image bytes → text, confidence, layout and a type label.
//!
//! Never fails: any upstream or I/O error is folded into an `OcrResult`
//! with `success: false` so callers decide how to surface it.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::types::{OcrResult, OcrStructure};
use super::vision_ocr::VisionApi;
use super::vision_types::{EntityAnnotation, FullTextAnnotation};
use super::ExtractionError;
use crate::pipeline::classify::classify_document;

/// Confidence reported when the service returned tokens but no scores.
pub const PLACEHOLDER_CONFIDENCE: f64 = 0.85;

pub struct RecognitionClient {
    api: Arc<dyn VisionApi>,
}

impl RecognitionClient {
    pub fn new(api: Arc<dyn VisionApi>) -> Self {
        Self { api }
    }

    /// Read the file at `path` and recognize it.
    pub fn process_path(&self, path: &Path) -> OcrResult {
        match std::fs::read(path) {
            Ok(bytes) => self.process_image(&bytes),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read image for recognition");
                OcrResult::failure(ExtractionError::Io(e).to_string())
            }
        }
    }

    pub fn process_image(&self, image_bytes: &[u8]) -> OcrResult {
        let _span = tracing::info_span!("recognize", image_size = image_bytes.len()).entered();
        let start = Instant::now();

        match self.try_process(image_bytes) {
            Ok(result) => {
                tracing::info!(
                    elapsed_ms = %start.elapsed().as_millis(),
                    word_count = result.word_count,
                    confidence = result.confidence_score,
                    document_type = %result.document_type,
                    "Recognition complete"
                );
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recognition failed");
                OcrResult::failure(e.to_string())
            }
        }
    }

    fn try_process(&self, image_bytes: &[u8]) -> Result<OcrResult, ExtractionError> {
        let annotations = self.api.detect_text(image_bytes)?;
        let raw_text = annotations
            .first()
            .map(|a| a.description.clone())
            .unwrap_or_default();
        let confidence_score = calculate_confidence(&annotations);

        let document = self.api.detect_document(image_bytes)?;
        let structured_data = extract_structure(document.as_ref());

        Ok(OcrResult {
            success: true,
            word_count: raw_text.split_whitespace().count(),
            document_type: classify_document(&raw_text),
            raw_text,
            confidence_score,
            structured_data,
            error: None,
        })
    }
}

/// Mean token confidence, skipping the leading whole-image annotation.
///
/// Fewer than two annotations → 0.0; tokens without any score → the
/// placeholder. Rounded to 3 decimals and kept within [0, 1].
pub fn calculate_confidence(annotations: &[EntityAnnotation]) -> f64 {
    if annotations.len() < 2 {
        return 0.0;
    }

    let scores: Vec<f64> = annotations[1..]
        .iter()
        .filter_map(|a| a.confidence)
        .map(f64::from)
        .collect();

    if scores.is_empty() {
        return PLACEHOLDER_CONFIDENCE;
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    ((mean * 1000.0).round() / 1000.0).clamp(0.0, 1.0)
}

/// Flatten the document hierarchy into block, paragraph and word lists.
pub fn extract_structure(document: Option<&FullTextAnnotation>) -> OcrStructure {
    let mut structure = OcrStructure::default();
    let Some(document) = document else {
        return structure;
    };

    for block in document.pages.iter().flat_map(|p| &p.blocks) {
        let mut block_parts = Vec::with_capacity(block.paragraphs.len());
        for paragraph in &block.paragraphs {
            let words: Vec<String> = paragraph
                .words
                .iter()
                .map(|w| w.symbols.iter().map(|s| s.text.as_str()).collect())
                .collect();
            let paragraph_text = words.join(" ").trim().to_string();

            structure.words.extend(words);
            block_parts.push(paragraph_text.clone());
            structure.paragraphs.push(paragraph_text);
        }

        let block_text = block_parts
            .iter()
            .filter(|p| !p.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        if !block_text.trim().is_empty() {
            structure.blocks.push(block_text.trim().to_string());
        }
    }

    structure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::DocumentType;
    use crate::pipeline::extraction::vision_ocr::MockVisionApi;
    use crate::pipeline::extraction::vision_types::{Block, Page, Paragraph, Symbol, Word};

    fn annotation(text: &str, confidence: Option<f32>) -> EntityAnnotation {
        EntityAnnotation {
            description: text.into(),
            confidence,
        }
    }

    fn word(text: &str) -> Word {
        Word {
            symbols: text
                .chars()
                .map(|c| Symbol { text: c.to_string() })
                .collect(),
        }
    }

    fn paragraph(words: &[&str]) -> Paragraph {
        Paragraph {
            words: words.iter().map(|w| word(w)).collect(),
        }
    }

    fn document(blocks: Vec<Vec<Paragraph>>) -> FullTextAnnotation {
        FullTextAnnotation {
            pages: vec![Page {
                blocks: blocks
                    .into_iter()
                    .map(|paragraphs| Block { paragraphs })
                    .collect(),
            }],
        }
    }

    // ── calculate_confidence ──

    #[test]
    fn confidence_zero_without_tokens() {
        assert_eq!(calculate_confidence(&[]), 0.0);
        assert_eq!(calculate_confidence(&[annotation("full", Some(0.9))]), 0.0);
    }

    #[test]
    fn confidence_placeholder_when_unscored() {
        let annotations = [annotation("a b", None), annotation("a", None), annotation("b", None)];
        assert_eq!(calculate_confidence(&annotations), PLACEHOLDER_CONFIDENCE);
    }

    #[test]
    fn confidence_mean_skips_first_and_rounds() {
        let annotations = [
            annotation("full", Some(0.1)),
            annotation("a", Some(0.9)),
            annotation("b", Some(0.8)),
            annotation("c", Some(0.75)),
        ];
        assert_eq!(calculate_confidence(&annotations), 0.817);
    }

    #[test]
    fn confidence_ignores_unscored_tokens() {
        let annotations = [
            annotation("full", None),
            annotation("a", Some(0.5)),
            annotation("b", None),
        ];
        assert_eq!(calculate_confidence(&annotations), 0.5);
    }

    #[test]
    fn confidence_clamped_to_unit_interval() {
        let annotations = [annotation("full", None), annotation("a", Some(1.7))];
        assert_eq!(calculate_confidence(&annotations), 1.0);
    }

    // ── extract_structure ──

    #[test]
    fn structure_empty_without_document() {
        assert_eq!(extract_structure(None), OcrStructure::default());
    }

    #[test]
    fn structure_joins_words_and_paragraphs_with_spaces() {
        let doc = document(vec![vec![
            paragraph(&["Dear", "Sam,"]),
            paragraph(&["Thanks", "again."]),
        ]]);
        let structure = extract_structure(Some(&doc));
        assert_eq!(structure.words, vec!["Dear", "Sam,", "Thanks", "again."]);
        assert_eq!(structure.paragraphs, vec!["Dear Sam,", "Thanks again."]);
        assert_eq!(structure.blocks, vec!["Dear Sam, Thanks again."]);
    }

    #[test]
    fn structure_drops_empty_blocks() {
        let doc = document(vec![vec![], vec![paragraph(&["TOTAL"])]]);
        let structure = extract_structure(Some(&doc));
        assert_eq!(structure.blocks, vec!["TOTAL"]);
    }

    // ── RecognitionClient ──

    #[test]
    fn process_image_success() {
        let doc = document(vec![vec![paragraph(&["TOTAL", "$4.00"])]]);
        let api = MockVisionApi::with_text("TOTAL $4.00", Some(0.95)).with_document(doc);
        let client = RecognitionClient::new(Arc::new(api));

        let result = client.process_image(b"fake");
        assert!(result.success);
        assert_eq!(result.raw_text, "TOTAL $4.00");
        assert_eq!(result.word_count, 2);
        assert_eq!(result.confidence_score, 0.95);
        assert_eq!(result.document_type, DocumentType::Receipt);
        assert_eq!(result.structured_data.blocks, vec!["TOTAL $4.00"]);
        assert!(result.error.is_none());
    }

    #[test]
    fn process_image_without_text_is_empty_note() {
        let client = RecognitionClient::new(Arc::new(MockVisionApi::new(vec![])));
        let result = client.process_image(b"blank");
        assert!(result.success);
        assert_eq!(result.raw_text, "");
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.word_count, 0);
        assert_eq!(result.document_type, DocumentType::Note);
    }

    #[test]
    fn upstream_error_becomes_failure_result() {
        let client = RecognitionClient::new(Arc::new(MockVisionApi::failing("Bad image data.")));
        let result = client.process_image(b"x");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Vision API Error: Bad image data."));
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence_score, 0.0);
    }

    #[test]
    fn missing_path_becomes_failure_result() {
        let client = RecognitionClient::new(Arc::new(MockVisionApi::new(vec![])));
        let result = client.process_path(Path::new("/nonexistent/scan.png"));
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("I/O error"));
    }
}
