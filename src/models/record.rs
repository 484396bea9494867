use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::DocumentType;

/// One persisted result of a document run through the full pipeline.
///
/// Field order is the export column order: JSON keys and CSV header
/// are both derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub filename: String,
    pub upload_date: String,
    pub raw_text: String,
    pub structured_data: Option<ExtractedEntities>,
    pub document_type: DocumentType,
    pub confidence_score: Option<f64>,
    pub ai_analysis: Option<serde_json::Value>,
}

/// Column names in export order.
pub const RECORD_FIELDS: [&str; 8] = [
    "id",
    "filename",
    "upload_date",
    "raw_text",
    "structured_data",
    "document_type",
    "confidence_score",
    "ai_analysis",
];

/// Insert payload. `id` and `upload_date` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub filename: String,
    pub raw_text: String,
    pub structured_data: Option<ExtractedEntities>,
    pub document_type: DocumentType,
    pub confidence_score: Option<f64>,
    pub ai_analysis: Option<serde_json::Value>,
}

/// Categorized entity lists extracted from a document's text.
///
/// Every category is always present; an unmatched category is an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub amounts: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub other: Vec<String>,
}

impl ExtractedEntities {
    pub fn total(&self) -> usize {
        self.names.len()
            + self.dates.len()
            + self.amounts.len()
            + self.addresses.len()
            + self.phone_numbers.len()
            + self.emails.len()
            + self.other.len()
    }
}

/// Aggregate statistics over the record table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStats {
    pub total_records: i64,
    pub by_document_type: BTreeMap<String, i64>,
    pub average_confidence: f64,
}
