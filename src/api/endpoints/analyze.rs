//! Ad-hoc analysis of caller-supplied text. Nothing is stored.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::enums::DocumentType;
use crate::pipeline::processor::TextAnalysis;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
    pub document_type: Option<String>,
}

#[derive(Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: TextAnalysis,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    pub success: bool,
    pub classification: Value,
}

/// `POST /api/analyze`: tailored analysis, entities and summary.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if payload.text.is_empty() {
        return Err(ApiError::BadRequest("No text provided".into()));
    }
    let text = payload.text;
    let document_type = payload
        .document_type
        .unwrap_or_else(|| DocumentType::Document.as_str().to_string());

    let result = ctx
        .run_blocking(move |processor| processor.analyze(&text, &document_type))
        .await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        result,
    }))
}

/// `POST /api/classify`: model-side type, confidence and key info.
pub async fn classify(
    State(ctx): State<ApiContext>,
    Json(payload): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("No text provided".into()));
    }
    let text = payload.text;

    let classification = ctx
        .run_blocking(move |processor| processor.classify(&text))
        .await?;

    Ok(Json(ClassifyResponse {
        success: true,
        classification,
    }))
}
