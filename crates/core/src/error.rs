use thiserror::Error;

/// Errors raised while interpreting FHIR JSON
#[derive(Debug, Error)]
pub enum FhirError {
    /// JSON that parses but is not a usable resource
    #[error("Invalid resource: {0}")]
    Invalid(String),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
