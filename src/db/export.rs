//! Record export as a JSON array or a flat CSV table.
//!
//! Both formats share one column order (`RECORD_FIELDS`). Blob columns
//! are written as compact JSON inside the CSV cell; absent values are
//! empty cells.

use crate::db::DatabaseError;
use crate::models::{Record, RECORD_FIELDS};

/// Upper bound on exported rows, most recent first.
pub const EXPORT_LIMIT: u32 = 10_000;

/// Pretty-printed JSON array of records.
pub fn records_to_json(records: &[Record]) -> Result<String, DatabaseError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// CSV with a header row. No records yields an empty string, not a
/// header-only file.
pub fn records_to_csv(records: &[Record]) -> Result<String, DatabaseError> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(RECORD_FIELDS)?;

    for record in records {
        let structured = match &record.structured_data {
            Some(entities) => serde_json::to_string(entities)?,
            None => String::new(),
        };
        let analysis = match &record.ai_analysis {
            Some(value) => serde_json::to_string(value)?,
            None => String::new(),
        };
        let confidence = record
            .confidence_score
            .map(|c| c.to_string())
            .unwrap_or_default();

        writer.write_record([
            record.id.to_string().as_str(),
            record.filename.as_str(),
            record.upload_date.as_str(),
            record.raw_text.as_str(),
            structured.as_str(),
            record.document_type.as_str(),
            confidence.as_str(),
            analysis.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DatabaseError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        DatabaseError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
