use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{JobId, MosaicJob};
use crate::services::sampler::is_remote_source;
use crate::services::{JobStore, MosaicCreator, Projection};

/// Request body for mosaic creation
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMosaicRequest {
    /// Source image URL, http or https
    #[serde(rename = "inputImg")]
    pub input_img: String,
    /// Canonical page URL of the source, used to detect duplicates
    #[serde(rename = "inputURL", default)]
    pub input_url: String,
}

/// Response from mosaic creation
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateMosaicResponse {
    #[serde(rename = "_id")]
    pub id: String,
    /// False when an existing mosaic was returned
    pub created: bool,
}

/// Which part of a mosaic to return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MosaicPart {
    #[default]
    Meta,
    PixelDict,
    Mosaic,
}

#[derive(Debug, Deserialize)]
pub struct MosaicQuery {
    #[serde(default)]
    pub part: MosaicPart,
    /// First row of a MOSAIC slice
    pub from: Option<u32>,
    /// End row (exclusive) of a MOSAIC slice
    pub to: Option<u32>,
}

/// Job metadata without grid or tiles
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MosaicMeta {
    #[serde(rename = "_id")]
    pub id: String,
    pub input_img: String,
    #[serde(rename = "inputURL")]
    pub input_url: String,
    pub original_width: u32,
    pub original_height: u32,
    pub resized_width: u32,
    pub resized_height: u32,
    /// uninitiated, queued, pending or complete
    pub status: String,
    pub progress: f64,
    #[schema(value_type = Option<String>)]
    pub timestamp_created: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub timestamp_queued: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub timestamp_initialized: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub timestamp_finished: Option<DateTime<Utc>>,
}

impl From<&MosaicJob> for MosaicMeta {
    fn from(job: &MosaicJob) -> Self {
        Self {
            id: job.id.to_string(),
            input_img: job.input_img.clone(),
            input_url: job.input_url.clone(),
            original_width: job.original_width,
            original_height: job.original_height,
            resized_width: job.resized_width,
            resized_height: job.resized_height,
            status: job.status.to_string(),
            progress: job.progress,
            timestamp_created: job.timestamp_created,
            timestamp_queued: job.timestamp_queued,
            timestamp_initialized: job.timestamp_initialized,
            timestamp_finished: job.timestamp_finished,
        }
    }
}

/// Create a mosaic job
///
/// Samples the source image and queues a new job. If a job already exists
/// for the same `inputURL`, its id is returned instead.
#[utoipa::path(
    post,
    path = "/api/mosaics",
    request_body = CreateMosaicRequest,
    responses(
        (status = 200, description = "Mosaic queued or already present", body = CreateMosaicResponse),
        (status = 400, description = "Missing, non-http or undecodable image"),
        (status = 502, description = "Image could not be fetched"),
    ),
    tag = "Mosaics"
)]
pub async fn handle_create(
    State(creator): State<Arc<MosaicCreator>>,
    Json(request): Json<CreateMosaicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // local paths are only accepted from the CLI
    if !request.input_img.trim().is_empty() && !is_remote_source(&request.input_img) {
        return Err(ApiError::BadRequest(
            "inputImg must be an http or https URL".to_string(),
        ));
    }

    let created = creator
        .create(&request.input_img, &request.input_url)
        .await?;

    Ok(Json(CreateMosaicResponse {
        id: created.id.to_string(),
        created: created.created,
    }))
}

/// Read part of a mosaic
///
/// `META` returns dimensions, status, progress and timestamps.
/// `PIXEL_DICT` returns the color grid. `MOSAIC` returns committed tile rows,
/// optionally limited to rows `from..to`.
#[utoipa::path(
    get,
    path = "/api/mosaics/{id}",
    responses(
        (status = 200, description = "Requested part of the mosaic"),
        (status = 404, description = "Mosaic not found"),
    ),
    params(
        ("id" = String, Path, description = "Mosaic id"),
        ("part" = Option<String>, Query, description = "META (default), PIXEL_DICT or MOSAIC"),
        ("from" = Option<u32>, Query, description = "First tile row for MOSAIC"),
        ("to" = Option<u32>, Query, description = "End tile row (exclusive) for MOSAIC"),
    ),
    tag = "Mosaics"
)]
pub async fn handle_get_mosaic(
    State(jobs): State<Arc<dyn JobStore>>,
    Path(id): Path<String>,
    Query(query): Query<MosaicQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = JobId::new(id);
    let projection = match query.part {
        MosaicPart::Meta => Projection::meta(),
        MosaicPart::PixelDict => Projection::for_assembly(),
        MosaicPart::Mosaic => match (query.from, query.to) {
            (None, None) => Projection::tiles(None),
            (from, to) => Projection::tiles(Some(from.unwrap_or(0)..to.unwrap_or(u32::MAX))),
        },
    };

    let job = jobs
        .get_job(&id, &projection)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("mosaic {id}")))?;

    let body = match query.part {
        MosaicPart::Meta => json!(MosaicMeta::from(&job)),
        MosaicPart::PixelDict => json!({ "resizedPixelDict": job.resized_pixel_dict }),
        MosaicPart::Mosaic => json!({ "mosaicMatrix": job.mosaic_matrix }),
    };

    Ok(Json(body))
}
