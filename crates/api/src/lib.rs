//! Sentinel API Server
//!
//! REST API over the sentiment ingestion pipeline.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pipeline::{LogFormat, Pipeline, Settings};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;

pub use error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    /// Ingestion pipeline
    pub pipeline: Pipeline,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(pipeline: Pipeline, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            pipeline,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub record_count: Option<i64>,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub model: ComponentHealth,
    pub database: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub detail: Option<String>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/analyze", post(routes::ingest::analyze))
        .route("/api/v1/generate-data", post(routes::ingest::generate_data))
        .route("/api/v1/history", get(routes::records::history))
        .route("/api/v1/stats", get(routes::records::stats))
        .route("/api/v1/records", delete(routes::records::clear))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({ "status": "active", "system": "Sentinel v1" }))
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.pipeline.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let component = |ok: bool, detail: Option<String>| ComponentHealth {
        status: if ok { "ok" } else { "unavailable" }.to_string(),
        detail,
    };

    let response = HealthResponse {
        status: if report.is_healthy() { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            model: component(report.model_ready, Some(report.model_name.clone())),
            database: component(report.database_ok, None),
        },
        record_count: report.record_count,
    };

    (status, Json(response))
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: Settings, metrics: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_settings(&settings).await?;

    // Warm the model in the background; requests arriving first load it lazily
    let warm = pipeline.clone();
    tokio::spawn(async move {
        if let Err(e) = warm.warm_up().await {
            warn!("Model warm-up failed, will retry on first request: {}", e);
        }
    });

    let shutdown = pipeline.clone();
    let state = Arc::new(AppState::new(pipeline, metrics));
    let app = create_router(state);

    info!("Starting API server on {}", settings.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;

    shutdown.shutdown().await;
    info!("API server stopped");
    Ok(())
}
