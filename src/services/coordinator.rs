use chrono::Utc;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use hsl_color::round_to;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::job_store::{JobStore, Projection};
use super::matcher::{CellMatch, MatchError, NearestColorMatcher};
use crate::error::StoreError;
use crate::models::{
    ChunkInvocation, ChunkIterator, ChunkOutcome, ColorSample, JobId, JobStatus, RowCommit,
    TileAssignment, TileRow,
};

/// Error from a chunk invocation
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("No homogeneous corpus photo near hue {hue} for cell ({row}, {column})")]
    NoCandidate { row: u32, column: u32, hue: f64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AssemblyError {
    /// Whether re-invoking the identical chunk may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssemblyError::Store(e) if e.is_transient())
    }
}

impl From<MatchError> for AssemblyError {
    fn from(e: MatchError) -> Self {
        match e {
            MatchError::NoCandidate { row, column, hue } => {
                AssemblyError::NoCandidate { row, column, hue }
            }
            MatchError::Store(e) => AssemblyError::Store(e),
        }
    }
}

/// Half-open row range `[start, end)` covered by one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: u32,
    pub end: u32,
}

impl ChunkRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// What the scheduler needs to decide on the next invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub job_id: JobId,
    pub next_range_start: u32,
    pub total_height: u32,
    pub done: bool,
}

/// Progress after `rows_done` of `height` rows, two decimals.
///
/// Only the final row yields 100.00; on very tall grids a partial value
/// that would round up is held at 99.99.
pub fn progress_percent(rows_done: u32, height: u32) -> f64 {
    if height == 0 || rows_done >= height {
        return 100.0;
    }
    round_to(rows_done as f64 / height as f64 * 100.0, 2).min(99.99)
}

/// Assembles a mosaic one bounded row range at a time.
///
/// Each call matches every cell of its rows concurrently, waits for all of
/// them, and only then commits the rows in ascending order. A failure before
/// the commit phase leaves the store untouched, and since matching is
/// deterministic, re-running the same range commits identical rows.
pub struct ChunkedAssemblyCoordinator {
    jobs: Arc<dyn JobStore>,
    matcher: NearestColorMatcher,
    max_concurrency: usize,
}

impl ChunkedAssemblyCoordinator {
    pub fn new(jobs: Arc<dyn JobStore>, matcher: NearestColorMatcher, max_concurrency: usize) -> Self {
        Self {
            jobs,
            matcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Handle a scheduler invocation `{jobId, iterator}`
    pub async fn invoke(&self, invocation: ChunkInvocation) -> Result<ChunkOutcome, AssemblyError> {
        let ChunkInvocation { job_id, iterator } = invocation;
        if iterator.step == 0 {
            return Err(AssemblyError::InvalidInput(
                "iterator step must be positive".to_string(),
            ));
        }

        let range = ChunkRange::new(iterator.index, iterator.end());
        self.run(&job_id, range, Some(iterator.height)).await?;

        let step = iterator.advance();
        Ok(ChunkOutcome {
            job_id,
            iterator: ChunkIterator {
                index: step.index,
                step: step.step,
                height: step.height,
            },
            should_continue: step.should_continue,
        })
    }

    /// Process rows `[range.start, range.end)` of a job
    pub async fn run_chunk(
        &self,
        job_id: &JobId,
        range: ChunkRange,
    ) -> Result<Continuation, AssemblyError> {
        self.run(job_id, range, None).await
    }

    async fn run(
        &self,
        job_id: &JobId,
        range: ChunkRange,
        expected_height: Option<u32>,
    ) -> Result<Continuation, AssemblyError> {
        if range.end < range.start {
            return Err(AssemblyError::InvalidInput(format!(
                "row range [{}, {}) is reversed",
                range.start, range.end
            )));
        }

        let job = self
            .jobs
            .get_job(job_id, &Projection::for_assembly())
            .await?
            .ok_or_else(|| AssemblyError::JobNotFound(job_id.clone()))?;
        let grid = job.color_grid().ok_or_else(|| {
            AssemblyError::InvalidInput(format!("job {job_id} has no color grid"))
        })?;
        let height = grid.height();

        if let Some(expected) = expected_height {
            if expected != height {
                return Err(AssemblyError::InvalidInput(format!(
                    "iterator height {expected} does not match grid height {height}"
                )));
            }
        }

        let continuation = Continuation {
            job_id: job_id.clone(),
            next_range_start: range.end,
            total_height: height,
            done: range.end >= height,
        };

        if job.status.is_terminal() {
            tracing::debug!(job_id = %job_id, start = range.start, "Job already complete, skipping chunk");
            return Ok(Continuation {
                done: true,
                ..continuation
            });
        }
        if range.start >= height {
            tracing::debug!(job_id = %job_id, start = range.start, height, "Chunk starts past the last row");
            return Ok(continuation);
        }

        let stop = range.end.min(height);
        tracing::info!(
            job_id = %job_id,
            start = range.start,
            end = stop,
            height,
            "Assembling chunk"
        );

        let samples: Vec<ColorSample> = grid.samples_in_rows(range.start..stop).collect();
        let matcher = &self.matcher;
        let matches: Vec<CellMatch> = stream::iter(samples)
            .map(|sample| async move { matcher.find_closest(&sample).await })
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        let mut rows: BTreeMap<u32, TileRow> = BTreeMap::new();
        for m in &matches {
            rows.entry(m.row)
                .or_default()
                .insert(m.column, TileAssignment::from(&m.entry));
        }

        let last_row = stop - 1;
        for (row, assignments) in rows {
            let reaches_bottom = row == last_row && range.end >= height;
            let status = if reaches_bottom {
                JobStatus::Complete
            } else {
                JobStatus::Pending
            };
            let progress = progress_percent(row + 1, height);

            self.jobs
                .commit_row_slice(
                    job_id,
                    RowCommit {
                        row,
                        assignments,
                        status,
                        progress,
                        finished_at: reaches_bottom.then(Utc::now),
                    },
                )
                .await?;

            tracing::debug!(job_id = %job_id, row, progress, %status, "Committed row");
        }

        tracing::info!(
            job_id = %job_id,
            rows = stop - range.start,
            cells = matches.len(),
            done = continuation.done,
            "Chunk committed"
        );

        Ok(continuation)
    }
}
