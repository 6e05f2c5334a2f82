pub mod coordinator;
pub mod corpus_index;
pub mod creator;
pub mod dispatcher;
pub mod file_store;
pub mod job_store;
pub mod matcher;
pub mod sampler;

pub use coordinator::{AssemblyError, ChunkRange, ChunkedAssemblyCoordinator, Continuation};
pub use corpus_index::{CorpusIndex, HueOrder, HuePredicate, HueQuery, InMemoryCorpus};
pub use creator::{CreatedJob, MosaicCreator};
pub use dispatcher::JobDispatcher;
pub use file_store::FileJobStore;
pub use job_store::{InMemoryJobStore, JobStore, Projection, TileProjection};
pub use matcher::{CellMatch, MatchError, NearestColorMatcher};
pub use sampler::{ColorSampler, SampleError, SampledImage};
