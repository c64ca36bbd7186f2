//! Record Query Routes

use axum::{
    extract::{Query, State},
    Json,
};
use pipeline::{LabelCount, SentimentRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Get the most recent records, newest first
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<SentimentRecord>>, ApiError> {
    let limit = params.limit.min(500);
    Ok(Json(state.pipeline.recent_history(limit).await?))
}

/// Get record counts per label
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Vec<LabelCount>>, ApiError> {
    Ok(Json(state.pipeline.sentiment_distribution().await?))
}

/// Response for the clear endpoint
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}

/// Delete every record
pub async fn clear(State(state): State<Arc<AppState>>) -> Result<Json<ClearResponse>, ApiError> {
    let deleted = state.pipeline.clear_all().await?;
    Ok(Json(ClearResponse { deleted }))
}
