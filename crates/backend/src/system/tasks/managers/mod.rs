pub mod u600_pipeline;

pub use u600_pipeline::PipelineTaskManager;
