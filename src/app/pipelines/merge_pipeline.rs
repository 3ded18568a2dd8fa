use crate::app::pipelines::artifacts;
use crate::core::flatten::build_template;
use crate::core::merge::reconcile;
use crate::core::validate::invalid_entry_indices;
use crate::domain::model::{Document, ReconInputs, ReconOutcome};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;

/// Pipeline that backfills missing service blocks in the target document
/// from a matching source document.
pub struct MergePipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> MergePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MergePipeline<S, C> {
    async fn extract(&self) -> Result<ReconInputs> {
        tracing::info!("📥 Reading target document: {}", self.config.target_path());
        let data = self.storage.read_file(self.config.target_path()).await?;
        let target: Document = serde_json::from_slice(&data)?;

        let source = match self.config.source_path() {
            Some(path) => {
                tracing::info!("📥 Reading source document: {}", path);
                let data = self.storage.read_file(path).await?;
                Some(serde_json::from_slice(&data)?)
            }
            None => None,
        };

        Ok(ReconInputs {
            target,
            source,
            edits: None,
        })
    }

    async fn transform(&self, inputs: ReconInputs) -> Result<ReconOutcome> {
        let (document, merge_summary) = match &inputs.source {
            Some(source) => {
                let (document, summary) =
                    reconcile(source, &inputs.target, self.config.polarity());
                (document, Some(summary))
            }
            None => {
                tracing::warn!("💡 No source document given, target passes through unchanged");
                (inputs.target, None)
            }
        };

        let invalid_entries = invalid_entry_indices(&document);
        let template = build_template(&document, inputs.source.as_ref());

        Ok(ReconOutcome {
            document,
            merge_summary,
            patch_report: None,
            invalid_entries,
            template,
        })
    }

    async fn load(&self, outcome: ReconOutcome) -> Result<String> {
        artifacts::write_artifacts(&self.storage, &self.config, &outcome, "merge").await
    }
}
