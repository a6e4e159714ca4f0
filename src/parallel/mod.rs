pub mod batch;
pub mod cancel;
pub mod coordinator;
pub mod pool;
pub mod progress;

pub use batch::batch_ranges;
pub use cancel::CancelToken;
pub use coordinator::{
    run_job, run_search, ExhaustiveJob, JobOutcome, PopulationJob, SearchConfig, SearchMode,
    SearchOutcome, WorkerContext, WorkerJob, WorkerOutput, WorkerReport,
};
pub use pool::WorkerPool;
pub use progress::{ProgressEvent, ProgressTracker};
