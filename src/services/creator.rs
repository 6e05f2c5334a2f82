use std::sync::Arc;

use super::job_store::JobStore;
use super::sampler::ColorSampler;
use crate::error::ApiError;
use crate::models::{JobId, JobStatus, NewJob};

/// Result of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedJob {
    pub id: JobId,
    /// False when a job for the same input URL already existed
    pub created: bool,
}

/// Turns a source image into a queued mosaic job
pub struct MosaicCreator {
    jobs: Arc<dyn JobStore>,
    sampler: ColorSampler,
}

impl MosaicCreator {
    pub fn new(jobs: Arc<dyn JobStore>, sampler: ColorSampler) -> Self {
        Self { jobs, sampler }
    }

    /// Create and enqueue a job for `input_img`.
    ///
    /// `input_url` identifies the source for duplicate detection; when empty
    /// the image location is used instead.
    pub async fn create(&self, input_img: &str, input_url: &str) -> Result<CreatedJob, ApiError> {
        if input_img.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Request must contain inputImg".to_string(),
            ));
        }
        let input_url = if input_url.trim().is_empty() {
            input_img
        } else {
            input_url
        };

        if let Some(id) = self.jobs.find_by_input_url(input_url).await? {
            // a job left uninitiated by a failed enqueue is queued here; later states are untouched
            if self.jobs.advance_status(&id, JobStatus::Queued).await? {
                tracing::warn!(job_id = %id, input_url, "Queued mosaic left uninitiated");
            } else {
                tracing::info!(job_id = %id, input_url, "Mosaic already exists");
            }
            return Ok(CreatedJob { id, created: false });
        }

        let sampled = self.sampler.sample_source(input_img).await?;
        let job = self
            .jobs
            .create_job(NewJob {
                input_img: input_img.to_string(),
                input_url: input_url.to_string(),
                original_width: sampled.original_width,
                original_height: sampled.original_height,
                grid: sampled.grid,
            })
            .await?;
        self.jobs.advance_status(&job.id, JobStatus::Queued).await?;

        tracing::info!(
            job_id = %job.id,
            width = job.resized_width,
            height = job.resized_height,
            "Mosaic job queued"
        );

        Ok(CreatedJob {
            id: job.id,
            created: true,
        })
    }
}
