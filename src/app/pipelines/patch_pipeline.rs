use crate::adapters::tabular;
use crate::app::pipelines::artifacts;
use crate::core::flatten::build_template;
use crate::core::patch::apply_edits;
use crate::core::validate::invalid_entry_indices;
use crate::domain::model::{Document, ReconInputs, ReconOutcome};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{ReconError, Result};

/// Pipeline that applies a filled bulk-edit CSV back onto the target
/// document, synthesizing lines from the source where needed.
pub struct PatchPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> PatchPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PatchPipeline<S, C> {
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

        let edits_path = self
            .config
            .edits_path()
            .ok_or_else(|| ReconError::MissingConfigError {
                field: "edits".to_string(),
            })?;
        tracing::info!("📥 Reading edits file: {}", edits_path);
        let data = self.storage.read_file(edits_path).await?;
        let edits = tabular::rows_from_csv(&data)?;
        tracing::info!("📊 Parsed {} edit rows", edits.len());

        Ok(ReconInputs {
            target,
            source,
            edits: Some(edits),
        })
    }

    async fn transform(&self, inputs: ReconInputs) -> Result<ReconOutcome> {
        let rows = inputs.edits.as_deref().unwrap_or_default();
        let (document, report) = apply_edits(&inputs.target, inputs.source.as_ref(), rows);

        for issue in &report.issues {
            tracing::warn!("⚠️ {}", issue);
        }

        let invalid_entries = invalid_entry_indices(&document);
        let template = build_template(&document, inputs.source.as_ref());

        Ok(ReconOutcome {
            document,
            merge_summary: None,
            patch_report: Some(report),
            invalid_entries,
            template,
        })
    }

    async fn load(&self, outcome: ReconOutcome) -> Result<String> {
        artifacts::write_artifacts(&self.storage, &self.config, &outcome, "patch").await
    }
}
