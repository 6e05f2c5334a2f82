use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{ColorSampleGrid, TileMatrix, TileRow};

/// Row commit that cannot be applied to a job
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitError {
    #[error("row {row} is outside a grid of height {height}")]
    RowOutOfRange { row: u32, height: u32 },

    #[error("progress {0} is outside 0..=100")]
    ProgressOutOfRange(f64),
}

/// Opaque mosaic job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a 24 hex character id (96 bits of entropy)
    pub fn generate() -> Self {
        use rand::Rng;
        let bytes: [u8; 12] = rand::thread_rng().gen();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids that are safe to use as a file name
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a mosaic job. Ordering follows the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Uninitiated,
    Queued,
    Pending,
    Complete,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        self == JobStatus::Complete
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Uninitiated => "uninitiated",
            JobStatus::Queued => "queued",
            JobStatus::Pending => "pending",
            JobStatus::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Fields supplied when a job is created
#[derive(Debug, Clone)]
pub struct NewJob {
    pub input_img: String,
    pub input_url: String,
    pub original_width: u32,
    pub original_height: u32,
    pub grid: ColorSampleGrid,
}

/// Update for exactly one mosaic row plus the job's status fields
#[derive(Debug, Clone)]
pub struct RowCommit {
    pub row: u32,
    pub assignments: TileRow,
    pub status: JobStatus,
    pub progress: f64,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Persisted mosaic job document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicJob {
    pub id: JobId,
    pub input_img: String,
    #[serde(rename = "inputURL")]
    pub input_url: String,
    pub original_width: u32,
    pub original_height: u32,
    pub resized_width: u32,
    pub resized_height: u32,
    /// Absent when a projection left it out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resized_pixel_dict: Option<ColorSampleGrid>,
    #[serde(default)]
    pub mosaic_matrix: TileMatrix,
    pub status: JobStatus,
    pub progress: f64,
    #[serde(default)]
    pub timestamp_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timestamp_queued: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timestamp_initialized: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timestamp_finished: Option<DateTime<Utc>>,
}

impl MosaicJob {
    /// Build a fresh, uninitiated job
    pub fn from_new(id: JobId, new_job: NewJob, now: DateTime<Utc>) -> Self {
        Self {
            id,
            input_img: new_job.input_img,
            input_url: new_job.input_url,
            original_width: new_job.original_width,
            original_height: new_job.original_height,
            resized_width: new_job.grid.width(),
            resized_height: new_job.grid.height(),
            resized_pixel_dict: Some(new_job.grid),
            mosaic_matrix: TileMatrix::new(),
            status: JobStatus::Uninitiated,
            progress: 0.0,
            timestamp_created: Some(now),
            timestamp_queued: None,
            timestamp_initialized: None,
            timestamp_finished: None,
        }
    }

    pub fn color_grid(&self) -> Option<&ColorSampleGrid> {
        self.resized_pixel_dict.as_ref()
    }

    /// Move the job forward in its lifecycle.
    ///
    /// Returns `false` (and changes nothing) when `status` is not ahead of
    /// the current one. Lifecycle timestamps are only ever filled once.
    pub fn advance_status(&mut self, status: JobStatus, now: DateTime<Utc>) -> bool {
        if status <= self.status {
            return false;
        }
        self.status = status;
        match status {
            JobStatus::Uninitiated => {}
            JobStatus::Queued => {
                self.timestamp_queued.get_or_insert(now);
            }
            JobStatus::Pending => {
                self.timestamp_initialized.get_or_insert(now);
            }
            JobStatus::Complete => {
                self.timestamp_initialized.get_or_insert(now);
                self.timestamp_finished.get_or_insert(now);
            }
        }
        true
    }

    /// Apply a committed row. Status and progress never move backwards.
    pub fn apply_row_commit(&mut self, commit: RowCommit, now: DateTime<Utc>) -> Result<(), CommitError> {
        if commit.row >= self.resized_height {
            return Err(CommitError::RowOutOfRange {
                row: commit.row,
                height: self.resized_height,
            });
        }
        if !commit.progress.is_finite() || !(0.0..=100.0).contains(&commit.progress) {
            return Err(CommitError::ProgressOutOfRange(commit.progress));
        }

        self.mosaic_matrix.insert_row(commit.row, commit.assignments);
        if commit.progress > self.progress {
            self.progress = commit.progress;
        }
        if commit.status == JobStatus::Complete {
            if let Some(finished) = commit.finished_at {
                self.timestamp_finished.get_or_insert(finished);
            }
        }
        self.advance_status(commit.status, now);
        Ok(())
    }
}
