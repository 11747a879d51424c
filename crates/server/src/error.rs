//! Application error handling

use fhir_facade_core::{Canned, CannedResponses, FhirError, OperationOutcome, Resource};

use crate::rest::response::FhirResponse;

/// Application error type.
///
/// Errors never leave the server as a bare fault: each one becomes an
/// OperationOutcome rendered through the response assembler.
#[derive(Debug)]
pub enum AppError {
    /// Request refused before or instead of a store call
    Rejected {
        outcome: OperationOutcome,
        status: u16,
    },
    /// OperationOutcome the store answered with where a Bundle was expected
    Store { outcome: Resource, status: u16 },
    Internal(String),
}

impl AppError {
    pub fn canned(canned: &CannedResponses, kind: Canned, args: &[&str]) -> Self {
        let (outcome, status) = canned.render(kind, args);
        AppError::Rejected { outcome, status }
    }

    pub fn into_response(self, canned: &CannedResponses) -> FhirResponse {
        match self {
            AppError::Rejected { outcome, status } => FhirResponse::outcome(&outcome, status),
            AppError::Store { outcome, status } => {
                tracing::info!(status, "Store refused the request");
                FhirResponse::new(Some(outcome.into_value()), status)
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                let (outcome, status) = canned.render(Canned::StoreFailure, &[&msg]);
                FhirResponse::outcome(&outcome, status)
            }
        }
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        AppError::Internal(format!("Database pool error: {}", err))
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(err: tokio_postgres::Error) -> Self {
        AppError::Internal(format!("Database error: {}", err))
    }
}

impl From<FhirError> for AppError {
    fn from(err: FhirError) -> Self {
        AppError::Internal(format!("Unexpected store reply: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Unexpected store reply: {}", err))
    }
}
