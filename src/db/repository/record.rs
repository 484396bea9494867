use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::DocumentType;
use crate::models::*;

const SELECT_COLUMNS: &str = "SELECT id, filename, upload_date, raw_text, structured_data,
     document_type, confidence_score, ai_analysis
     FROM records";

/// Insert a record and return its assigned id.
///
/// `upload_date` is stamped here. An entity set is always stored, even with
/// every list empty; an empty analysis object is stored as NULL.
pub fn insert_record(conn: &Connection, record: &NewRecord) -> Result<i64, DatabaseError> {
    let upload_date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let structured_data = record
        .structured_data
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let ai_analysis = match &record.ai_analysis {
        Some(value) if !is_empty_json(value) => Some(serde_json::to_string(value)?),
        _ => None,
    };

    conn.execute(
        "INSERT INTO records (filename, upload_date, raw_text, structured_data,
         document_type, confidence_score, ai_analysis)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.filename,
            upload_date,
            record.raw_text,
            structured_data,
            record.document_type.as_str(),
            record.confidence_score,
            ai_analysis,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn get_record(conn: &Connection, id: i64) -> Result<Option<Record>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;

    let result = stmt.query_row(params![id], read_row);

    match result {
        Ok(row) => Ok(Some(record_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Most recent first; `id` breaks ties between identical timestamps.
pub fn list_records(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<Record>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} ORDER BY upload_date DESC, id DESC LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = stmt.query_map(params![limit, offset], read_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

/// Case-insensitive substring search over raw text and filename.
///
/// LIKE wildcards in the query are escaped so the match is literal.
/// Result size is unbounded.
pub fn search_records(conn: &Connection, query: &str) -> Result<Vec<Record>, DatabaseError> {
    let pattern = format!("%{}%", escape_like(query));

    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS}
         WHERE raw_text LIKE ?1 ESCAPE '\\' OR filename LIKE ?1 ESCAPE '\\'
         ORDER BY upload_date DESC, id DESC"
    ))?;

    let rows = stmt.query_map(params![pattern], read_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

/// Returns `true` if a row was removed.
pub fn delete_record(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute("DELETE FROM records WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn record_stats(conn: &Connection) -> Result<RecordStats, DatabaseError> {
    let total_records: i64 =
        conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT COALESCE(document_type, 'unknown'), COUNT(*)
         FROM records GROUP BY COALESCE(document_type, 'unknown')",
    )?;
    let by_document_type: BTreeMap<String, i64> = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<_, _>>()?;

    let average: Option<f64> = conn.query_row(
        "SELECT AVG(confidence_score) FROM records WHERE confidence_score IS NOT NULL",
        [],
        |row| row.get(0),
    )?;

    Ok(RecordStats {
        total_records,
        by_document_type,
        average_confidence: average.map(round2).unwrap_or(0.0),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_empty_json(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

// Internal row type for Record mapping
struct RecordRow {
    id: i64,
    filename: String,
    upload_date: String,
    raw_text: Option<String>,
    structured_data: Option<String>,
    document_type: Option<String>,
    confidence_score: Option<f64>,
    ai_analysis: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        filename: row.get(1)?,
        upload_date: row.get(2)?,
        raw_text: row.get(3)?,
        structured_data: row.get(4)?,
        document_type: row.get(5)?,
        confidence_score: row.get(6)?,
        ai_analysis: row.get(7)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<Record, DatabaseError> {
    let structured_data = row.structured_data.as_deref().and_then(|blob| {
        serde_json::from_str::<ExtractedEntities>(blob)
            .map_err(|e| {
                tracing::warn!(record_id = row.id, error = %e, "Unreadable structured_data blob");
            })
            .ok()
    });

    // Analysis is free-form: keep the raw text if it is not valid JSON
    let ai_analysis = row.ai_analysis.map(|blob| {
        serde_json::from_str::<serde_json::Value>(&blob)
            .unwrap_or(serde_json::Value::String(blob))
    });

    let document_type = match row.document_type.as_deref() {
        Some(s) => DocumentType::from_str(s)?,
        None => DocumentType::Unknown,
    };

    Ok(Record {
        id: row.id,
        filename: row.filename,
        upload_date: row.upload_date,
        raw_text: row.raw_text.unwrap_or_default(),
        structured_data,
        document_type,
        confidence_score: row.confidence_score,
        ai_analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use serde_json::json;

    fn new_record(filename: &str, text: &str, doc_type: DocumentType, conf: Option<f64>) -> NewRecord {
        NewRecord {
            filename: filename.into(),
            raw_text: text.into(),
            structured_data: None,
            document_type: doc_type,
            confidence_score: conf,
            ai_analysis: None,
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let mut rec = new_record("receipt.png", "TOTAL $42.50", DocumentType::Receipt, Some(0.93));
        rec.structured_data = Some(ExtractedEntities {
            amounts: vec!["$42.50".into()],
            ..Default::default()
        });
        rec.ai_analysis = Some(json!({"store": "Corner Shop"}));

        let id = insert_record(&conn, &rec).unwrap();
        let fetched = get_record(&conn, id).unwrap().unwrap();

        assert_eq!(fetched.id, id);
        assert_eq!(fetched.filename, "receipt.png");
        assert_eq!(fetched.document_type, DocumentType::Receipt);
        assert_eq!(fetched.confidence_score, Some(0.93));
        assert_eq!(fetched.structured_data.unwrap().amounts, vec!["$42.50"]);
        assert_eq!(fetched.ai_analysis.unwrap()["store"], "Corner Shop");
        assert!(!fetched.upload_date.is_empty());
    }

    #[test]
    fn ids_are_monotonic() {
        let conn = open_memory_database().unwrap();
        let a = insert_record(&conn, &new_record("a.png", "", DocumentType::Note, None)).unwrap();
        let b = insert_record(&conn, &new_record("b.png", "", DocumentType::Note, None)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn empty_analysis_stored_as_null() {
        let conn = open_memory_database().unwrap();
        let mut rec = new_record("x.png", "hi", DocumentType::Note, None);
        rec.ai_analysis = Some(json!({}));
        let id = insert_record(&conn, &rec).unwrap();

        let ai: Option<String> = conn
            .query_row(
                "SELECT ai_analysis FROM records WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert!(ai.is_none());
    }

    #[test]
    fn empty_entity_lists_survive_storage() {
        let conn = open_memory_database().unwrap();
        let mut rec = new_record("milk.png", "buy milk and eggs", DocumentType::Note, Some(0.9));
        rec.structured_data = Some(ExtractedEntities::default());
        let id = insert_record(&conn, &rec).unwrap();

        let blob: Option<String> = conn
            .query_row(
                "SELECT structured_data FROM records WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        let blob: serde_json::Value = serde_json::from_str(&blob.unwrap()).unwrap();
        assert_eq!(blob.as_object().unwrap().len(), 7);
        assert_eq!(blob["phone_numbers"], json!([]));

        let fetched = get_record(&conn, id).unwrap().unwrap();
        assert_eq!(fetched.structured_data, Some(ExtractedEntities::default()));
    }

    #[test]
    fn absent_entity_set_stored_as_null() {
        let conn = open_memory_database().unwrap();
        let id = insert_record(&conn, &new_record("x.png", "hi", DocumentType::Note, None)).unwrap();
        assert!(get_record(&conn, id).unwrap().unwrap().structured_data.is_none());
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_record(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn list_is_most_recent_first_with_pagination() {
        let conn = open_memory_database().unwrap();
        for name in ["first.png", "second.png", "third.png"] {
            insert_record(&conn, &new_record(name, "", DocumentType::Note, None)).unwrap();
        }

        let all = list_records(&conn, 100, 0).unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["third.png", "second.png", "first.png"]);

        let page = list_records(&conn, 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].filename, "second.png");
    }

    #[test]
    fn search_matches_text_and_filename_case_insensitively() {
        let conn = open_memory_database().unwrap();
        insert_record(&conn, &new_record("invoice_march.png", "nothing here", DocumentType::Document, None)).unwrap();
        insert_record(&conn, &new_record("scan.png", "Grocery RECEIPT total", DocumentType::Receipt, None)).unwrap();
        insert_record(&conn, &new_record("other.png", "unrelated", DocumentType::Note, None)).unwrap();

        assert_eq!(search_records(&conn, "receipt").unwrap().len(), 1);
        assert_eq!(search_records(&conn, "INVOICE").unwrap().len(), 1);
        assert_eq!(search_records(&conn, ".png").unwrap().len(), 3);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let conn = open_memory_database().unwrap();
        insert_record(&conn, &new_record("a.png", "50% off", DocumentType::Note, None)).unwrap();
        insert_record(&conn, &new_record("b.png", "500 units", DocumentType::Note, None)).unwrap();

        let hits = search_records(&conn, "50%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "a.png");
        assert!(search_records(&conn, "_").unwrap().is_empty());
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let conn = open_memory_database().unwrap();
        let id = insert_record(&conn, &new_record("a.png", "", DocumentType::Note, None)).unwrap();

        assert!(delete_record(&conn, id).unwrap());
        assert!(get_record(&conn, id).unwrap().is_none());
        assert!(!delete_record(&conn, id).unwrap());
        assert!(!delete_record(&conn, 12345).unwrap());
    }

    #[test]
    fn stats_on_empty_table() {
        let conn = open_memory_database().unwrap();
        let stats = record_stats(&conn).unwrap();
        assert_eq!(stats.total_records, 0);
        assert!(stats.by_document_type.is_empty());
        assert_eq!(stats.average_confidence, 0.0);
    }

    #[test]
    fn stats_group_and_average() {
        let conn = open_memory_database().unwrap();
        insert_record(&conn, &new_record("a.png", "", DocumentType::Receipt, Some(0.9))).unwrap();
        insert_record(&conn, &new_record("b.png", "", DocumentType::Receipt, Some(0.8))).unwrap();
        insert_record(&conn, &new_record("c.png", "", DocumentType::Letter, Some(0.755))).unwrap();
        insert_record(&conn, &new_record("d.png", "", DocumentType::Note, None)).unwrap();

        let stats = record_stats(&conn).unwrap();
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.by_document_type["receipt"], 2);
        assert_eq!(stats.by_document_type["letter"], 1);
        assert_eq!(stats.by_document_type["note"], 1);
        // (0.9 + 0.8 + 0.755) / 3 = 0.81833…
        assert_eq!(stats.average_confidence, 0.82);
    }

    #[test]
    fn null_document_type_reads_as_unknown() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO records (filename, upload_date, raw_text) VALUES ('legacy.png', '2020-01-01T00:00:00.000Z', 'x')",
            [],
        )
        .unwrap();
        let rec = list_records(&conn, 10, 0).unwrap().remove(0);
        assert_eq!(rec.document_type, DocumentType::Unknown);
        assert!(rec.structured_data.is_none());
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
