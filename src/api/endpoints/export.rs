//! `GET /api/export?format=json|csv`: download every record as a file.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::enums::ExportFormat;

#[derive(Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

pub async fn export(
    State(ctx): State<ApiContext>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = params
        .format
        .as_deref()
        .unwrap_or(ExportFormat::Json.as_str())
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid format".into()))?;

    let body = ctx
        .run_blocking(move |processor| processor.export(format))
        .await??;

    tracing::info!(format = %format, bytes = body.len(), "Records exported");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", format.attachment_name()),
            ),
        ],
        body,
    )
        .into_response())
}
