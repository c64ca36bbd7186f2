//! Ingestion Routes

use axum::{
    extract::{Query, State},
    Json,
};
use pipeline::SentimentRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Text to analyze, from the query string or a JSON body
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub text: Option<String>,
    /// Provenance tag, defaults to "manual"
    pub source: Option<String>,
}

/// Analyze and store one text
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyzeRequest>,
    body: Option<Json<AnalyzeRequest>>,
) -> Result<Json<SentimentRecord>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let text = body
        .text
        .or(query.text)
        .ok_or_else(|| ApiError::invalid("text is required"))?;
    let source = body.source.or(query.source).unwrap_or_default();

    let record = state.pipeline.ingest_one(&text, &source).await?;
    Ok(Json(record))
}

/// Query parameters for synthetic generation
#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    /// Number of posts to generate
    #[serde(default = "default_count")]
    pub count: i64,
    /// Provenance tag, defaults to "Simulated Twitter"
    #[serde(default)]
    pub source: String,
}

fn default_count() -> i64 {
    10
}

/// Response for the generation endpoint
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub inserted: u64,
}

/// Generate, analyze, and store synthetic posts
pub async fn generate_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenerateQuery>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let count = usize::try_from(params.count)
        .map_err(|_| ApiError::invalid(format!("count must not be negative, got {}", params.count)))?;

    let inserted = state.pipeline.ingest_batch(count, &params.source).await?;
    Ok(Json(GenerateResponse { inserted }))
}
