use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::JobId;

/// Row boundary cursor carried between chunk invocations by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChunkIterator {
    /// Last completed row boundary (start of the next chunk)
    pub index: u32,
    /// Rows per chunk
    pub step: u32,
    /// Total grid height
    pub height: u32,
}

impl ChunkIterator {
    pub fn start(step: u32, height: u32) -> Self {
        Self {
            index: 0,
            step,
            height,
        }
    }

    /// End of the row range this iterator covers, `index + step`
    pub fn end(&self) -> u32 {
        self.index.saturating_add(self.step)
    }

    /// Advance past the current chunk.
    ///
    /// `continue` stays true while the new index is still within `height`,
    /// so a scheduler may issue one final no-op chunk at `index == height`.
    pub fn advance(self) -> IteratorStep {
        let index = self.end();
        IteratorStep {
            index,
            step: self.step,
            height: self.height,
            should_continue: index <= self.height,
        }
    }
}

/// Result of advancing a [`ChunkIterator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IteratorStep {
    pub index: u32,
    pub step: u32,
    pub height: u32,
    #[serde(rename = "continue")]
    pub should_continue: bool,
}

/// One chunk invocation as issued by the external scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInvocation {
    #[schema(value_type = String)]
    pub job_id: JobId,
    pub iterator: ChunkIterator,
}

/// Reply to a chunk invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkOutcome {
    #[schema(value_type = String)]
    pub job_id: JobId,
    pub iterator: ChunkIterator,
    #[serde(rename = "continue")]
    pub should_continue: bool,
}

impl ChunkOutcome {
    /// The invocation to issue next, if the scheduler should continue
    pub fn next_invocation(&self) -> Option<ChunkInvocation> {
        self.should_continue.then(|| ChunkInvocation {
            job_id: self.job_id.clone(),
            iterator: self.iterator,
        })
    }
}
