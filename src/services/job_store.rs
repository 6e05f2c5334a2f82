use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{JobId, JobStatus, MosaicJob, NewJob, RowCommit};

/// Which parts of the tile matrix a read should return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TileProjection {
    #[default]
    None,
    All,
    Rows(Range<u32>),
}

/// Field projection for [`JobStore::get_job`].
///
/// Scalar fields (dimensions, status, progress, timestamps) are always
/// returned; the color grid and the tile matrix are opt-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub color_grid: bool,
    pub tiles: TileProjection,
}

impl Projection {
    pub fn meta() -> Self {
        Self::default()
    }

    pub fn full() -> Self {
        Self {
            color_grid: true,
            tiles: TileProjection::All,
        }
    }

    /// Grid and status only; what a chunk invocation needs
    pub fn for_assembly() -> Self {
        Self {
            color_grid: true,
            tiles: TileProjection::None,
        }
    }

    pub fn tiles(range: Option<Range<u32>>) -> Self {
        Self {
            color_grid: false,
            tiles: range.map_or(TileProjection::All, TileProjection::Rows),
        }
    }

    /// Copy of `job` restricted to this projection
    pub fn apply(&self, job: &MosaicJob) -> MosaicJob {
        let mosaic_matrix = match &self.tiles {
            TileProjection::None => Default::default(),
            TileProjection::All => job.mosaic_matrix.clone(),
            TileProjection::Rows(range) => job.mosaic_matrix.slice(range.clone()),
        };
        MosaicJob {
            id: job.id.clone(),
            input_img: job.input_img.clone(),
            input_url: job.input_url.clone(),
            original_width: job.original_width,
            original_height: job.original_height,
            resized_width: job.resized_width,
            resized_height: job.resized_height,
            resized_pixel_dict: if self.color_grid {
                job.resized_pixel_dict.clone()
            } else {
                None
            },
            mosaic_matrix,
            status: job.status,
            progress: job.progress,
            timestamp_created: job.timestamp_created,
            timestamp_queued: job.timestamp_queued,
            timestamp_initialized: job.timestamp_initialized,
            timestamp_finished: job.timestamp_finished,
        }
    }
}

/// Persistence of mosaic jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Store a new job in the `uninitiated` state
    async fn create_job(&self, new_job: NewJob) -> Result<MosaicJob, StoreError>;

    /// Fetch a job restricted to `projection`
    async fn get_job(
        &self,
        id: &JobId,
        projection: &Projection,
    ) -> Result<Option<MosaicJob>, StoreError>;

    /// Atomically write one row together with status and progress
    async fn commit_row_slice(&self, id: &JobId, commit: RowCommit) -> Result<(), StoreError>;

    /// Move a job forward in its lifecycle; returns false if it was already there
    async fn advance_status(&self, id: &JobId, status: JobStatus) -> Result<bool, StoreError>;

    /// Id of the job created for `input_url`, if any
    async fn find_by_input_url(&self, input_url: &str) -> Result<Option<JobId>, StoreError>;

    async fn count_by_status(&self, status: JobStatus) -> Result<usize, StoreError>;

    /// Oldest jobs in `status` first, meta projection only
    async fn list_by_status(
        &self,
        status: JobStatus,
        limit: usize,
    ) -> Result<Vec<MosaicJob>, StoreError>;
}

/// Sort key for "oldest first" listings
pub(crate) fn creation_order(a: &MosaicJob, b: &MosaicJob) -> std::cmp::Ordering {
    a.timestamp_created
        .cmp(&b.timestamp_created)
        .then_with(|| a.id.cmp(&b.id))
}

/// In-memory job storage
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<JobId, MosaicJob>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(&self, new_job: NewJob) -> Result<MosaicJob, StoreError> {
        let job = MosaicJob::from_new(JobId::generate(), new_job, Utc::now());
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job(
        &self,
        id: &JobId,
        projection: &Projection,
    ) -> Result<Option<MosaicJob>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).map(|job| projection.apply(job)))
    }

    async fn commit_row_slice(&self, id: &JobId, commit: RowCommit) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        Ok(job.apply_row_commit(commit, Utc::now())?)
    }

    async fn advance_status(&self, id: &JobId, status: JobStatus) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        Ok(job.advance_status(status, Utc::now()))
    }

    async fn find_by_input_url(&self, input_url: &str) -> Result<Option<JobId>, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .find(|job| job.input_url == input_url)
            .map(|job| job.id.clone()))
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<usize, StoreError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.values().filter(|job| job.status == status).count())
    }

    async fn list_by_status(
        &self,
        status: JobStatus,
        limit: usize,
    ) -> Result<Vec<MosaicJob>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<&MosaicJob> =
            jobs.values().filter(|job| job.status == status).collect();
        matching.sort_by(|a, b| creation_order(a, b));
        let meta = Projection::meta();
        Ok(matching
            .into_iter()
            .take(limit)
            .map(|job| meta.apply(job))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorSampleGrid, TileAssignment};
    use hsl_color::Hsl;

    fn new_job(url: &str, height: usize) -> NewJob {
        NewJob {
            input_img: "img.jpg".into(),
            input_url: url.into(),
            original_width: 100,
            original_height: 100,
            grid: ColorSampleGrid::new(vec![vec![Hsl::new(0.5, 0.5, 0.5); 3]; height]).unwrap(),
        }
    }

    fn row_commit(row: u32, status: JobStatus, progress: f64) -> RowCommit {
        let tile = TileAssignment {
            photo_id: "p".into(),
            thumbnail_ref: "p.jpg".into(),
            preview_ref: None,
            original_url: None,
            user_name: None,
        };
        RowCommit {
            row,
            assignments: (0..3).map(|c| (c, tile.clone())).collect(),
            status,
            progress,
            finished_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_with_projection() {
        let store = InMemoryJobStore::new();
        let job = store.create_job(new_job("u1", 2)).await.unwrap();

        let meta = store
            .get_job(&job.id, &Projection::meta())
            .await
            .unwrap()
            .unwrap();
        assert!(meta.resized_pixel_dict.is_none());
        assert_eq!(meta.resized_height, 2);

        let full = store
            .get_job(&job.id, &Projection::full())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(full.color_grid().unwrap().height(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_job() {
        let store = InMemoryJobStore::new();
        let found = store
            .get_job(&JobId::new("missing"), &Projection::full())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_commit_row_slice_and_tile_projection() {
        let store = InMemoryJobStore::new();
        let job = store.create_job(new_job("u1", 3)).await.unwrap();

        store
            .commit_row_slice(&job.id, row_commit(0, JobStatus::Pending, 33.33))
            .await
            .unwrap();
        store
            .commit_row_slice(&job.id, row_commit(1, JobStatus::Pending, 66.67))
            .await
            .unwrap();

        let stored = store
            .get_job(&job.id, &Projection::tiles(Some(1..3)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert_eq!(stored.progress, 66.67);
        assert!(stored.timestamp_initialized.is_some());
        assert_eq!(stored.mosaic_matrix.row_count(), 1);
        assert!(stored.mosaic_matrix.row(1).is_some());
    }

    #[tokio::test]
    async fn test_commit_to_missing_job() {
        let store = InMemoryJobStore::new();
        let result = store
            .commit_row_slice(&JobId::new("nope"), row_commit(0, JobStatus::Pending, 1.0))
            .await;
        assert!(matches!(result, Err(StoreError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_count_and_list() {
        let store = InMemoryJobStore::new();
        let first = store.create_job(new_job("u1", 1)).await.unwrap();
        let second = store.create_job(new_job("u2", 1)).await.unwrap();
        store
            .advance_status(&first.id, JobStatus::Queued)
            .await
            .unwrap();
        store
            .advance_status(&second.id, JobStatus::Queued)
            .await
            .unwrap();

        assert_eq!(
            store.find_by_input_url("u2").await.unwrap(),
            Some(second.id.clone())
        );
        assert_eq!(store.find_by_input_url("u3").await.unwrap(), None);
        assert_eq!(store.count_by_status(JobStatus::Queued).await.unwrap(), 2);

        let listed = store.list_by_status(JobStatus::Queued, 1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].resized_pixel_dict.is_none());
    }

    #[tokio::test]
    async fn test_advance_status_is_monotonic() {
        let store = InMemoryJobStore::new();
        let job = store.create_job(new_job("u1", 1)).await.unwrap();
        assert!(store
            .advance_status(&job.id, JobStatus::Pending)
            .await
            .unwrap());
        assert!(!store
            .advance_status(&job.id, JobStatus::Queued)
            .await
            .unwrap());
    }
}
