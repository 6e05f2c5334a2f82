use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{ChunkInvocation, ChunkIterator, ChunkOutcome, IteratorStep};
use crate::services::{ChunkedAssemblyCoordinator, JobDispatcher};

/// Response from the dispatch endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchResponse {
    pub message: String,
    /// First chunk invocation for every job that was started
    pub invocations: Vec<ChunkInvocation>,
}

/// Assemble one chunk of rows
///
/// Matches every cell in rows `[index, index + step)` and commits them.
/// The response carries the iterator for the next chunk and whether the
/// scheduler should continue.
#[utoipa::path(
    post,
    path = "/api/assemble",
    request_body = ChunkInvocation,
    responses(
        (status = 200, description = "Chunk committed (or nothing left to do)", body = ChunkOutcome),
        (status = 400, description = "Malformed invocation or job"),
        (status = 404, description = "Mosaic not found"),
        (status = 422, description = "No corpus photo available for a cell"),
        (status = 503, description = "Store failure, retry the same chunk"),
    ),
    tag = "Assembly"
)]
pub async fn handle_assemble(
    State(coordinator): State<Arc<ChunkedAssemblyCoordinator>>,
    Json(invocation): Json<ChunkInvocation>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = invocation.job_id.clone();
    let outcome = coordinator.invoke(invocation).await.map_err(|e| {
        tracing::warn!(job_id = %job_id, error = %e, retryable = e.is_retryable(), "Chunk failed");
        ApiError::from(e)
    })?;
    Ok(Json(outcome))
}

/// Advance a chunk iterator
///
/// Pure scheduler step: `index += step`, `continue = index <= height`.
#[utoipa::path(
    post,
    path = "/api/iterator",
    request_body = ChunkIterator,
    responses(
        (status = 200, description = "Advanced iterator", body = IteratorStep),
    ),
    tag = "Assembly"
)]
pub async fn handle_iterator(Json(iterator): Json<ChunkIterator>) -> impl IntoResponse {
    Json(iterator.advance())
}

/// Start queued mosaics
///
/// Moves queued jobs to pending while fewer than the configured number of
/// jobs are pending, and returns their first chunk invocations.
#[utoipa::path(
    post,
    path = "/api/dispatch",
    responses(
        (status = 200, description = "Jobs started", body = DispatchResponse),
        (status = 503, description = "Store failure"),
    ),
    tag = "Assembly"
)]
pub async fn handle_dispatch(
    State(dispatcher): State<Arc<JobDispatcher>>,
) -> Result<impl IntoResponse, ApiError> {
    let invocations = dispatcher.dispatch().await?;
    let message = if invocations.is_empty() {
        "Nothing to start.".to_string()
    } else {
        format!("{} mosaics initialized.", invocations.len())
    };
    Ok(Json(DispatchResponse {
        message,
        invocations,
    }))
}
