//! Record store: owns the database location, not a connection.
//!
//! Every operation opens a short-lived connection and drops it on return.
//! Concurrent writers rely on SQLite's own locking.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::export::{records_to_csv, records_to_json, EXPORT_LIMIT};
use super::repository;
use super::sqlite::{open_connection, open_database};
use super::DatabaseError;
use crate::models::enums::ExportFormat;
use crate::models::{NewRecord, Record, RecordStats};

#[derive(Debug, Clone)]
pub struct RecordStore {
    db_path: PathBuf,
}

impl RecordStore {
    /// Create the store, creating the parent directory and schema if needed.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Schema is created once; the connection is dropped immediately
        drop(open_database(&db_path)?);
        tracing::info!(path = %db_path.display(), "Record store ready");
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DatabaseError> {
        open_connection(&self.db_path)
    }

    pub fn insert(&self, record: &NewRecord) -> Result<i64, DatabaseError> {
        let id = repository::insert_record(&self.conn()?, record)?;
        tracing::info!(
            record_id = id,
            filename = %record.filename,
            document_type = %record.document_type,
            "Record stored"
        );
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<Option<Record>, DatabaseError> {
        repository::get_record(&self.conn()?, id)
    }

    pub fn list(&self, limit: u32, offset: u32) -> Result<Vec<Record>, DatabaseError> {
        repository::list_records(&self.conn()?, limit, offset)
    }

    pub fn search(&self, query: &str) -> Result<Vec<Record>, DatabaseError> {
        repository::search_records(&self.conn()?, query)
    }

    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let deleted = repository::delete_record(&self.conn()?, id)?;
        if deleted {
            tracing::info!(record_id = id, "Record deleted");
        }
        Ok(deleted)
    }

    pub fn stats(&self) -> Result<RecordStats, DatabaseError> {
        repository::record_stats(&self.conn()?)
    }

    pub fn export(&self, format: ExportFormat) -> Result<String, DatabaseError> {
        let records = self.list(EXPORT_LIMIT, 0)?;
        match format {
            ExportFormat::Json => records_to_json(&records),
            ExportFormat::Csv => records_to_csv(&records),
        }
    }
}
