//! Pipeline components: context, walk loop, probe workers, skip bookkeeping.

pub mod context;
pub mod error_handler;
pub mod metadata;
pub mod orchestrator;
pub mod walk;

pub use context::{
    PipelineChannels, PipelineContext, PipelineHandles, create_pipeline_channels,
    create_pipeline_context,
};
pub use error_handler::{SkipLog, SkippedNode, log_skipped_summary};
pub use metadata::spawn_probe_workers;
pub use orchestrator::{run_pipeline, shutdown_pipeline_handles};
pub use walk::{
    WalkCounts, WalkOutcome, WalkSource, classify_walk_error, jwalk_iter, run_walk_loop,
    spawn_walk_thread, to_outcome_jwalk, to_outcome_walkdir, tree_walk_source, walkdir_iter,
};
