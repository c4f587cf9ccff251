//! HTTP handlers
//!
//! `/run` validates the request, then hands it to the runner. Once validation
//! passes the response is always 200; run failures travel in the result body.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::params::{RunRequest, ValidationError};
use crate::server::AppState;
use crate::types::RunResult;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl From<JsonRejection> for ValidationError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::Body {
            status: rejection.status().as_u16(),
            message: rejection.body_text(),
        }
    }
}

impl ValidationError {
    fn status(&self) -> StatusCode {
        match self {
            ValidationError::TimeoutOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ValidationError::Body { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Run a command
pub async fn run_command(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResult>, ValidationError> {
    let Json(req) = payload.inspect_err(|e| tracing::warn!("Rejected /run body: {}", e))?;
    let timeout = req.validate().inspect_err(|e| tracing::warn!("Rejected /run: {}", e))?;

    Ok(Json(state.runner.run(&req.command, timeout).await))
}
