//! `GET /api/stats`: record counts and mean confidence.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::RecordStats;

#[derive(Serialize)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: RecordStats,
}

pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = ctx.run_blocking(|processor| processor.stats()).await??;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
