//! Upload endpoints: one image, or several in a single request.
//!
//! `POST /api/upload` reads multipart field `file`;
//! `POST /api/batch-upload` reads every `files[]` field, in order.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::processor::{BatchOutcome, UploadOutcome, UploadedFile};

const SINGLE_FIELD: &str = "file";
const BATCH_FIELD: &str = "files[]";

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: UploadOutcome,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// `POST /api/upload`: run one image through the full pipeline.
pub async fn single(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(SINGLE_FIELD) || file.is_some() {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        file = Some(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("No file provided".into()))?;
    let filename = file
        .filename
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No file selected".into()))?;

    let bytes = file.bytes;
    let outcome = ctx
        .run_blocking(move |processor| processor.process_upload(&filename, &bytes))
        .await??;

    Ok(Json(UploadResponse {
        success: true,
        outcome,
    }))
}

/// `POST /api/batch-upload`: process each file in order; per-file
/// failures are reported in `results` without failing the request.
pub async fn batch(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, ApiError> {
    let mut files = Vec::new();
    let mut field_seen = false;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(BATCH_FIELD) {
            continue;
        }
        field_seen = true;
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        files.push(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    if !field_seen {
        return Err(ApiError::BadRequest("No files provided".into()));
    }

    let outcome = ctx
        .run_blocking(move |processor| processor.process_batch(files))
        .await?;

    Ok(Json(BatchResponse {
        success: true,
        outcome,
    }))
}
