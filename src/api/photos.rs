use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::CorpusPhotoEntry;
use crate::services::CorpusIndex;

/// Request body for photo lookup
#[derive(Debug, Deserialize, ToSchema)]
pub struct PhotosRequest {
    #[serde(rename = "photoIDs", default)]
    pub photo_ids: Vec<String>,
}

/// Look up corpus photos by id
///
/// Unknown ids are skipped; results follow the request order.
#[utoipa::path(
    post,
    path = "/api/photos",
    request_body = PhotosRequest,
    responses(
        (status = 200, description = "Matching corpus photos", body = Vec<CorpusPhotoEntry>),
        (status = 400, description = "No photo ids given"),
    ),
    tag = "Corpus"
)]
pub async fn handle_photos(
    State(corpus): State<Arc<dyn CorpusIndex>>,
    Json(request): Json<PhotosRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.photo_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "Request must contain array of photoIDs".to_string(),
        ));
    }
    let photos = corpus.get_by_ids(&request.photo_ids).await?;
    tracing::debug!(
        requested = request.photo_ids.len(),
        found = photos.len(),
        "Photo lookup"
    );
    Ok(Json(photos))
}
