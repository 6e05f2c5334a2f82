use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::Mutex;

use super::job_store::{creation_order, JobStore, Projection};
use crate::error::StoreError;
use crate::models::{JobId, JobStatus, MosaicJob, NewJob, RowCommit};

/// Job storage with one JSON document per job.
///
/// Every write goes to a temporary file that is renamed over the document,
/// so a reader never sees a half-written job. A store-wide lock serializes
/// read-modify-write cycles.
pub struct FileJobStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJobStore {
    /// Open (and create if needed) a job directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::info!(dir = %dir.display(), "Opened file job store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, id: &JobId) -> Option<PathBuf> {
        id.is_path_safe()
            .then(|| self.dir.join(format!("{}.json", id.as_str())))
    }

    async fn read(&self, id: &JobId) -> Result<Option<MosaicJob>, StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, job: &MosaicJob) -> Result<(), StoreError> {
        let path = self
            .path_for(&job.id)
            .ok_or_else(|| StoreError::Rejected(format!("invalid job id {}", job.id)))?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(job)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Load and modify a job under the write lock
    async fn update<T>(
        &self,
        id: &JobId,
        f: impl FnOnce(&mut MosaicJob) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut job = self
            .read(id)
            .await?
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        let result = f(&mut job)?;
        self.write(&job).await?;
        Ok(result)
    }

    async fn load_all(&self) -> Result<Vec<MosaicJob>, StoreError> {
        let mut jobs = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<MosaicJob>(&bytes) {
                Ok(job) => jobs.push(job),
                Err(e) => tracing::warn!(path = %path.display(), %e, "Skipping unreadable job document"),
            }
        }
        Ok(jobs)
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create_job(&self, new_job: NewJob) -> Result<MosaicJob, StoreError> {
        let job = MosaicJob::from_new(JobId::generate(), new_job, Utc::now());
        let _guard = self.write_lock.lock().await;
        self.write(&job).await?;
        Ok(job)
    }

    async fn get_job(
        &self,
        id: &JobId,
        projection: &Projection,
    ) -> Result<Option<MosaicJob>, StoreError> {
        Ok(self.read(id).await?.map(|job| projection.apply(&job)))
    }

    async fn commit_row_slice(&self, id: &JobId, commit: RowCommit) -> Result<(), StoreError> {
        self.update(id, |job| {
            Ok(job.apply_row_commit(commit, Utc::now())?)
        })
        .await
    }

    async fn advance_status(&self, id: &JobId, status: JobStatus) -> Result<bool, StoreError> {
        self.update(id, |job| Ok(job.advance_status(status, Utc::now())))
            .await
    }

    async fn find_by_input_url(&self, input_url: &str) -> Result<Option<JobId>, StoreError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|job| job.input_url == input_url)
            .map(|job| job.id))
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<usize, StoreError> {
        Ok(self
            .load_all()
            .await?
            .iter()
            .filter(|job| job.status == status)
            .count())
    }

    async fn list_by_status(
        &self,
        status: JobStatus,
        limit: usize,
    ) -> Result<Vec<MosaicJob>, StoreError> {
        let mut jobs: Vec<MosaicJob> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|job| job.status == status)
            .collect();
        jobs.sort_by(creation_order);
        let meta = Projection::meta();
        Ok(jobs.iter().take(limit).map(|job| meta.apply(job)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorSampleGrid, TileAssignment};
    use hsl_color::Hsl;

    fn new_job(url: &str) -> NewJob {
        NewJob {
            input_img: "img.jpg".into(),
            input_url: url.into(),
            original_width: 40,
            original_height: 20,
            grid: ColorSampleGrid::new(vec![vec![Hsl::new(0.1, 0.2, 0.3); 2]; 2]).unwrap(),
        }
    }

    fn commit(row: u32, status: JobStatus, progress: f64) -> RowCommit {
        let tile = TileAssignment {
            photo_id: "p".into(),
            thumbnail_ref: "p.jpg".into(),
            preview_ref: None,
            original_url: None,
            user_name: None,
        };
        RowCommit {
            row,
            assignments: (0..2).map(|c| (c, tile.clone())).collect(),
            status,
            progress,
            finished_at: None,
        }
    }

    #[tokio::test]
    async fn test_job_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = FileJobStore::open(dir.path()).unwrap();
            let job = store.create_job(new_job("u1")).await.unwrap();
            store
                .commit_row_slice(&job.id, commit(0, JobStatus::Pending, 50.0))
                .await
                .unwrap();
            job.id
        };

        let store = FileJobStore::open(dir.path()).unwrap();
        let job = store
            .get_job(&id, &Projection::full())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 50.0);
        assert_eq!(job.mosaic_matrix.row_count(), 1);
        assert_eq!(job.color_grid().unwrap().width(), 2);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).unwrap();
        store.create_job(new_job("u1")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_unsafe_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).unwrap();
        let found = store
            .get_job(&JobId::new("../escape"), &Projection::meta())
            .await
            .unwrap();
        assert!(found.is_none());

        let result = store
            .commit_row_slice(&JobId::new("../escape"), commit(0, JobStatus::Pending, 1.0))
            .await;
        assert!(matches!(result, Err(StoreError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_status_queries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).unwrap();
        let job = store.create_job(new_job("u1")).await.unwrap();
        store.create_job(new_job("u2")).await.unwrap();
        store
            .advance_status(&job.id, JobStatus::Queued)
            .await
            .unwrap();

        assert_eq!(store.count_by_status(JobStatus::Queued).await.unwrap(), 1);
        assert_eq!(
            store.count_by_status(JobStatus::Uninitiated).await.unwrap(),
            1
        );
        let queued = store.list_by_status(JobStatus::Queued, 10).await.unwrap();
        assert_eq!(queued[0].id, job.id);
        assert_eq!(
            store.find_by_input_url("u1").await.unwrap(),
            Some(job.id.clone())
        );
    }

    #[tokio::test]
    async fn test_rejected_commit_leaves_document_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).unwrap();
        let job = store.create_job(new_job("u1")).await.unwrap();

        let result = store
            .commit_row_slice(&job.id, commit(5, JobStatus::Pending, 10.0))
            .await;
        assert!(matches!(result, Err(StoreError::Commit(_))));

        let stored = store
            .get_job(&job.id, &Projection::full())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.mosaic_matrix.is_empty());
        assert_eq!(stored.status, JobStatus::Uninitiated);
    }
}
