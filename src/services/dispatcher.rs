use std::sync::Arc;

use super::coordinator::{AssemblyError, ChunkedAssemblyCoordinator};
use super::job_store::{JobStore, Projection, TileProjection};
use crate::error::StoreError;
use crate::models::{AssemblyConfig, ChunkInvocation, ChunkIterator, ChunkOutcome, JobId, JobStatus};

/// Starts queued jobs and drives chunk invocations for local runs
pub struct JobDispatcher {
    jobs: Arc<dyn JobStore>,
    config: AssemblyConfig,
}

impl JobDispatcher {
    pub fn new(jobs: Arc<dyn JobStore>, config: AssemblyConfig) -> Self {
        Self { jobs, config }
    }

    /// Move as many queued jobs to `pending` as the pending limit allows.
    ///
    /// Returns the first chunk invocation of every job started.
    pub async fn dispatch(&self) -> Result<Vec<ChunkInvocation>, StoreError> {
        let pending = self.jobs.count_by_status(JobStatus::Pending).await?;
        let capacity = self.config.max_pending_jobs.saturating_sub(pending);
        if capacity == 0 {
            tracing::debug!(pending, "Pending limit reached, nothing dispatched");
            return Ok(Vec::new());
        }

        let queued = self
            .jobs
            .list_by_status(JobStatus::Queued, capacity)
            .await?;

        let mut invocations = Vec::with_capacity(queued.len());
        for job in queued {
            if self.jobs.advance_status(&job.id, JobStatus::Pending).await? {
                invocations.push(ChunkInvocation {
                    job_id: job.id,
                    iterator: ChunkIterator::start(self.config.row_step, job.resized_height),
                });
            }
        }

        tracing::info!(
            pending,
            started = invocations.len(),
            "Dispatched queued mosaics"
        );
        Ok(invocations)
    }

    /// Invocation that continues a job after its committed rows, or `None` when complete
    pub async fn resume(&self, id: &JobId) -> Result<Option<ChunkInvocation>, StoreError> {
        let projection = Projection {
            color_grid: false,
            tiles: TileProjection::All,
        };
        let job = self
            .jobs
            .get_job(id, &projection)
            .await?
            .ok_or_else(|| StoreError::JobNotFound(id.to_string()))?;
        if job.status.is_terminal() {
            return Ok(None);
        }

        let step = self.config.row_step.max(1);
        // restart at the chunk boundary containing the first missing row
        let index = job.mosaic_matrix.committed_prefix() / step * step;
        Ok(Some(ChunkInvocation {
            job_id: job.id,
            iterator: ChunkIterator {
                index,
                step,
                height: job.resized_height,
            },
        }))
    }

    /// Keep invoking chunks until the scheduler condition says stop
    pub async fn drive(
        &self,
        coordinator: &ChunkedAssemblyCoordinator,
        invocation: ChunkInvocation,
    ) -> Result<ChunkOutcome, AssemblyError> {
        let mut next = invocation;
        loop {
            let outcome = coordinator.invoke(next).await?;
            match outcome.next_invocation() {
                Some(invocation) => next = invocation,
                None => return Ok(outcome),
            }
        }
    }
}
