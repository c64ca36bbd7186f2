//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pipeline::PipelineError;
use serde_json::json;
use tracing::error;

/// Pipeline error rendered as a JSON response
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self(PipelineError::InvalidInput(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Inference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Persistence(_) | PipelineError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = json!({ "error": self.0.to_string(), "kind": self.0.kind() });
        (status, Json(body)).into_response()
    }
}
