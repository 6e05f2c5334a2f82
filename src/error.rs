use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::CommitError;
use crate::services::coordinator::AssemblyError;
use crate::services::sampler::SampleError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Image error: {0}")]
    Sample(#[from] SampleError),
}

/// Failure reading or writing the job store or the corpus index
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Update rejected: {0}")]
    Rejected(String),

    #[error("Commit rejected: {0}")]
    Commit(#[from] CommitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Read or write failures that may clear on their own
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Serialization(_))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::JobNotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Rejected(_) | StoreError::Commit(_) => StatusCode::BAD_REQUEST,
            StoreError::Io(_) | StoreError::Serialization(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Assembly(e) => match e {
                AssemblyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AssemblyError::JobNotFound(_) => StatusCode::NOT_FOUND,
                AssemblyError::NoCandidate { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AssemblyError::Store(e) => e.status_code(),
            },
            ApiError::Store(e) => e.status_code(),
            ApiError::Sample(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Sample(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
