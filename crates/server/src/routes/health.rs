//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// GET /health - Check store connectivity and return server health status
pub async fn check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                reason: None,
            }),
        ),
        Err(e) => {
            let reason = match e {
                AppError::Internal(msg) => msg,
                AppError::Rejected { outcome, .. } => {
                    outcome.diagnostics().unwrap_or("store rejected ping").to_string()
                }
                AppError::Store { status, .. } => format!("store answered {}", status),
            };
            tracing::error!(error = %reason, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    reason: Some(reason),
                }),
            )
        }
    }
}
