use crate::domain::model::{Polarity, ReconInputs, ReconOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// What a reconciliation run needs to know, independent of whether it came
/// from command-line flags or a TOML job file.
pub trait ConfigProvider: Send + Sync {
    fn job_name(&self) -> &str;
    fn target_path(&self) -> &str;
    fn source_path(&self) -> Option<&str>;
    fn edits_path(&self) -> Option<&str>;
    fn polarity(&self) -> Polarity;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn bundle_enabled(&self) -> bool;
    fn bundle_name(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ReconInputs>;
    async fn transform(&self, inputs: ReconInputs) -> Result<ReconOutcome>;
    async fn load(&self, outcome: ReconOutcome) -> Result<String>;
}
