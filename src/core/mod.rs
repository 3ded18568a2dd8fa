pub mod engine;
pub mod flatten;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod patch;
pub mod validate;

pub use crate::domain::model::{Document, ReconInputs, ReconOutcome};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
