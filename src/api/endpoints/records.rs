//! Record endpoints: paginated list / search, detail, delete.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Record;

/// Default page size for `GET /api/records`.
const DEFAULT_LIMIT: u32 = 100;

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct RecordListResponse {
    pub success: bool,
    pub records: Vec<Record>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub record: Record,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `GET /api/records`: most recent first. A non-empty `search` returns
/// every match and ignores `limit`/`offset`.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let search = params.search.filter(|s| !s.is_empty());
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let records = ctx
        .run_blocking(move |processor| match search {
            Some(query) => processor.search_records(&query),
            None => processor.list_records(limit, offset),
        })
        .await??;

    Ok(Json(RecordListResponse {
        success: true,
        count: records.len(),
        records,
    }))
}

/// `GET /api/records/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<RecordResponse>, ApiError> {
    let record = ctx
        .run_blocking(move |processor| processor.get_record(id))
        .await??
        .ok_or_else(|| ApiError::NotFound("Record not found".into()))?;

    Ok(Json(RecordResponse {
        success: true,
        record,
    }))
}

/// `DELETE /api/records/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = ctx
        .run_blocking(move |processor| processor.delete_record(id))
        .await??;

    if !deleted {
        return Err(ApiError::NotFound("Record not found".into()));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: "Record deleted",
    }))
}
