//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::ApiError;
use crate::models::{AppConfig, ChunkInvocation};
use crate::services::{
    ChunkedAssemblyCoordinator, ColorSampler, CorpusIndex, FileJobStore, InMemoryCorpus,
    InMemoryJobStore, JobDispatcher, JobStore, MosaicCreator, NearestColorMatcher,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jobs: Arc<dyn JobStore>,
    pub corpus: Arc<dyn CorpusIndex>,
    pub coordinator: Arc<ChunkedAssemblyCoordinator>,
    pub dispatcher: Arc<JobDispatcher>,
    pub creator: Arc<MosaicCreator>,
}

impl AppState {
    /// Wire services around existing stores
    pub fn with_stores(
        config: AppConfig,
        jobs: Arc<dyn JobStore>,
        corpus: Arc<dyn CorpusIndex>,
    ) -> Self {
        let matcher = NearestColorMatcher::new(corpus.clone(), config.matcher.clone());
        let coordinator = Arc::new(ChunkedAssemblyCoordinator::new(
            jobs.clone(),
            matcher,
            config.assembly.max_concurrency,
        ));
        let dispatcher = Arc::new(JobDispatcher::new(jobs.clone(), config.assembly.clone()));
        let creator = Arc::new(MosaicCreator::new(
            jobs.clone(),
            ColorSampler::new(config.sampling.target_size),
        ));

        Self {
            config: Arc::new(config),
            jobs,
            corpus,
            coordinator,
            dispatcher,
            creator,
        }
    }
}

/// Create application state from configuration.
///
/// Jobs go to `storage.jobs_dir` when set and stay in memory otherwise.
/// The corpus is read from `storage.corpus_file`; without one it is empty.
pub fn create_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let jobs: Arc<dyn JobStore> = match &config.storage.jobs_dir {
        Some(dir) => Arc::new(
            FileJobStore::open(dir.clone())
                .map_err(|e| anyhow::anyhow!("Failed to open job store {}: {e}", dir.display()))?,
        ),
        None => {
            tracing::info!("No jobs_dir configured, keeping jobs in memory");
            Arc::new(InMemoryJobStore::new())
        }
    };

    let corpus: Arc<dyn CorpusIndex> = match &config.storage.corpus_file {
        Some(path) => Arc::new(
            InMemoryCorpus::from_json_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load corpus {}: {e}", path.display()))?,
        ),
        None => {
            tracing::warn!("No corpus_file configured, every match will fail");
            Arc::new(InMemoryCorpus::default())
        }
    };

    Ok(AppState::with_stores(config, jobs, corpus))
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/mosaics", post(handle_create))
        .route("/api/mosaics/:id", get(handle_get_mosaic))
        .route("/api/dispatch", post(handle_dispatch))
        .route("/api/iterator", post(api::handle_iterator))
        .route("/api/assemble", post(handle_assemble))
        .route("/api/photos", post(handle_photos))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_create(
    State(state): State<AppState>,
    body: Json<api::CreateMosaicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_create(State(state.creator), body).await
}

async fn handle_get_mosaic(
    State(state): State<AppState>,
    path: Path<String>,
    query: Query<api::mosaics::MosaicQuery>,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_get_mosaic(State(state.jobs), path, query).await
}

async fn handle_dispatch(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    api::handle_dispatch(State(state.dispatcher)).await
}

async fn handle_assemble(
    State(state): State<AppState>,
    body: Json<ChunkInvocation>,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_assemble(State(state.coordinator), body).await
}

async fn handle_photos(
    State(state): State<AppState>,
    body: Json<api::PhotosRequest>,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_photos(State(state.corpus), body).await
}
