pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::pipelines::{MergePipeline, PatchPipeline};
pub use config::cli::LocalStorage;
pub use crate::core::engine::ReconEngine;
pub use domain::model::Document;
pub use utils::error::{ReconError, Result};
