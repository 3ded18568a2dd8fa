use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through extract, transform and load, with optional
/// resource monitoring between phases.
pub struct ReconEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReconEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitoring_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitoring_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting reconciliation run");

        let inputs = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted target with {} beneficiaries",
            inputs.target.beneficiaries.len()
        );
        self.monitor.log_phase("Extract");

        let outcome = self.pipeline.transform(inputs).await?;
        if let Some(summary) = &outcome.merge_summary {
            tracing::info!(
                "📊 Merge complete: {} modified, {} already satisfied, {} unmatched",
                summary.modified,
                summary.already_satisfied,
                summary.unmatched.len()
            );
        }
        if let Some(report) = &outcome.patch_report {
            tracing::info!(
                "📊 Patch complete: {} applied, {} synthesized, {} skipped",
                report.applied,
                report.synthesized,
                report.skipped
            );
        }
        if !outcome.invalid_entries.is_empty() {
            tracing::warn!(
                "⚠️ {} beneficiaries still have no billable services",
                outcome.invalid_entries.len()
            );
        }
        self.monitor.log_phase("Transform");

        let output_path = self.pipeline.load(outcome).await?;
        tracing::info!("✅ Output saved to: {}", output_path);
        self.monitor.log_phase("Load");

        self.monitor.log_run_summary();
        Ok(output_path)
    }
}
