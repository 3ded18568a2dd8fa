pub mod artifacts;
pub mod merge_pipeline;
pub mod patch_pipeline;

pub use merge_pipeline::MergePipeline;
pub use patch_pipeline::PatchPipeline;
