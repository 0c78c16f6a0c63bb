pub mod executor;

pub use executor::{run_pipeline, Pipeline, PipelineOutcome, RunOptions};
