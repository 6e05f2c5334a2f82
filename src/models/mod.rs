pub mod chunk;
pub mod config;
pub mod corpus;
pub mod grid;
pub mod job;
pub mod tile;

pub use chunk::{ChunkInvocation, ChunkIterator, ChunkOutcome, IteratorStep};
pub use config::{AppConfig, AssemblyConfig, HueWindow, MatcherConfig, SamplingConfig, StorageConfig};
pub use corpus::{CorpusPhotoEntry, DEFAULT_HOMOGENEITY_THRESHOLD};
pub use grid::{ColorSample, ColorSampleGrid, GridCell, GridError};
pub use job::{CommitError, JobId, JobStatus, MosaicJob, NewJob, RowCommit};
pub use tile::{TileAssignment, TileMatrix, TileRow};
