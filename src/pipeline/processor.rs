//! Document processing orchestrator.
//!
//! Single entry point that drives the full pipeline for one upload:
//! save → preprocess → recognize → analyze + extract entities → store.
//!
//! Service objects are injected at construction (mock-friendly), and every
//! stage runs sequentially on the caller's thread.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::{DatabaseError, RecordStore};
use crate::models::enums::{DocumentType, ExportFormat};
use crate::models::{ExtractedEntities, NewRecord, Record, RecordStats};
use crate::pipeline::extraction::{ImagePreprocessor, OcrResult, RecognitionClient};
use crate::pipeline::structuring::{AnalysisOutcome, SemanticAnalyzer};

/// Accepted upload extensions (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

const MAX_FILENAME_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("No file selected")]
    MissingFilename,

    #[error("{}", .0.error.as_deref().unwrap_or("Recognition failed"))]
    Recognition(Box<OcrResult>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Every intermediate result of a single upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub record_id: i64,
    pub filename: String,
    pub ocr_result: OcrResult,
    pub ai_analysis: AnalysisOutcome,
    pub entities: ExtractedEntities,
}

/// One file received in a batch. `filename` is `None` when the client
/// sent a part without a name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub success: bool,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Files submitted, including skipped ones.
    pub total: usize,
    /// Result entries produced (successes and failures).
    pub processed: usize,
    pub results: Vec<BatchItem>,
}

/// Ad-hoc analysis of caller-supplied text.
#[derive(Debug, Clone, Serialize)]
pub struct TextAnalysis {
    pub analysis: AnalysisOutcome,
    pub entities: ExtractedEntities,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// DocumentProcessor
// ---------------------------------------------------------------------------

pub struct DocumentProcessor {
    preprocessor: ImagePreprocessor,
    recognizer: RecognitionClient,
    analyzer: SemanticAnalyzer,
    store: RecordStore,
    upload_dir: PathBuf,
}

impl DocumentProcessor {
    pub fn new(
        preprocessor: ImagePreprocessor,
        recognizer: RecognitionClient,
        analyzer: SemanticAnalyzer,
        store: RecordStore,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            preprocessor,
            recognizer,
            analyzer,
            store,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate, save and run one upload through the whole pipeline.
    pub fn process_upload(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadOutcome, ProcessingError> {
        if filename.is_empty() {
            return Err(ProcessingError::MissingFilename);
        }
        if !allowed_file(filename) {
            return Err(ProcessingError::InvalidFileType(filename.to_string()));
        }
        self.run_pipeline(filename, bytes)
    }

    /// Process files in order. Unnamed or disallowed files are skipped
    /// without a result entry; other failures are recorded and the batch
    /// continues. Records stored before a failure are kept.
    pub fn process_batch(&self, files: Vec<UploadedFile>) -> BatchOutcome {
        let total = files.len();
        let mut results = Vec::with_capacity(total);

        for file in files {
            let Some(name) = file.filename.filter(|n| !n.is_empty() && allowed_file(n)) else {
                tracing::debug!("Skipping batch entry without an allowed filename");
                continue;
            };

            let item = match self.run_pipeline(&name, &file.bytes) {
                Ok(outcome) => BatchItem {
                    success: true,
                    filename: outcome.filename,
                    record_id: Some(outcome.record_id),
                    document_type: Some(outcome.ocr_result.document_type),
                    confidence: Some(outcome.ocr_result.confidence_score),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(filename = %name, error = %e, "Batch item failed");
                    BatchItem {
                        success: false,
                        filename: sanitize_filename(&name),
                        record_id: None,
                        document_type: None,
                        confidence: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(item);
        }

        tracing::info!(total, processed = results.len(), "Batch complete");
        BatchOutcome {
            total,
            processed: results.len(),
            results,
        }
    }

    fn run_pipeline(&self, filename: &str, bytes: &[u8]) -> Result<UploadOutcome, ProcessingError> {
        let safe_name = sanitize_filename(filename);
        let _span = tracing::info_span!("process_upload", filename = %safe_name).entered();

        let saved = self.save_upload(&safe_name, bytes)?;
        let image_path = self.preprocessor.preprocess_image(&saved, None);

        let ocr_result = self.recognizer.process_path(&image_path);
        if !ocr_result.success {
            return Err(ProcessingError::Recognition(Box::new(ocr_result)));
        }

        let ai_analysis = self
            .analyzer
            .analyze_text(&ocr_result.raw_text, ocr_result.document_type.as_str());
        let entities = self.analyzer.extract_entities(&ocr_result.raw_text);

        let record_id = self.store.insert(&NewRecord {
            filename: safe_name.clone(),
            raw_text: ocr_result.raw_text.clone(),
            structured_data: Some(entities.clone()),
            document_type: ocr_result.document_type,
            confidence_score: Some(ocr_result.confidence_score),
            ai_analysis: ai_analysis.stored_analysis(),
        })?;

        Ok(UploadOutcome {
            record_id,
            filename: safe_name,
            ocr_result,
            ai_analysis,
            entities,
        })
    }

    /// Write the upload under a unique name so equal filenames never collide.
    fn save_upload(&self, safe_name: &str, bytes: &[u8]) -> Result<PathBuf, ProcessingError> {
        std::fs::create_dir_all(&self.upload_dir)?;
        let path = self
            .upload_dir
            .join(format!("{}_{}", Uuid::new_v4().simple(), safe_name));
        std::fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Upload saved");
        Ok(path)
    }

    // ── analysis without storage ──

    pub fn analyze(&self, text: &str, document_type: &str) -> TextAnalysis {
        TextAnalysis {
            analysis: self.analyzer.analyze_text(text, document_type),
            entities: self.analyzer.extract_entities(text),
            summary: self.analyzer.summarize_document(text),
        }
    }

    pub fn classify(&self, text: &str) -> Value {
        self.analyzer.classify_and_structure(text)
    }

    // ── record queries ──

    pub fn get_record(&self, id: i64) -> Result<Option<Record>, DatabaseError> {
        self.store.get(id)
    }

    pub fn list_records(&self, limit: u32, offset: u32) -> Result<Vec<Record>, DatabaseError> {
        self.store.list(limit, offset)
    }

    pub fn search_records(&self, query: &str) -> Result<Vec<Record>, DatabaseError> {
        self.store.search(query)
    }

    pub fn delete_record(&self, id: i64) -> Result<bool, DatabaseError> {
        self.store.delete(id)
    }

    pub fn stats(&self) -> Result<RecordStats, DatabaseError> {
        self.store.stats()
    }

    pub fn export(&self, format: ExportFormat) -> Result<String, DatabaseError> {
        self.store.export(format)
    }
}

// ---------------------------------------------------------------------------
// Filename helpers
// ---------------------------------------------------------------------------

/// True when the name has an allowed extension after its last dot.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Reduce a client-supplied name to a safe flat filename.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]`
/// becomes `_`, leading dots are stripped and the stem is shortened so the
/// extension survives truncation.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or_default();

    let sanitized: String = base
        .chars()
        .filter(|&c| c != '\0')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.').to_string();

    let sanitized = if sanitized.chars().count() > MAX_FILENAME_CHARS {
        match sanitized.rsplit_once('.') {
            Some((stem, ext)) if ext.len() < MAX_FILENAME_CHARS => {
                let keep = MAX_FILENAME_CHARS - ext.len() - 1;
                format!("{}.{}", &stem[..keep.min(stem.len())], ext)
            }
            _ => sanitized[..MAX_FILENAME_CHARS].to_string(),
        }
    } else {
        sanitized
    };

    if sanitized.is_empty() {
        "document".into()
    } else {
        sanitized
    }
}
