use crate::adapters::{markup, tabular};
use crate::core::validate::entry_overviews;
use crate::domain::model::{EntryOverview, MergeSummary, PatchReport, ReconOutcome};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const DOCUMENT_JSON: &str = "mended.json";
pub const TEMPLATE_CSV: &str = "edit_template.csv";
pub const DOCUMENT_XML: &str = "document.xml";
pub const SUMMARY_JSON: &str = "run_summary.json";
pub const METADATA_JSON: &str = "metadata.json";

/// Run report written by the `summary` format.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary<'a> {
    job: &'a str,
    mode: &'a str,
    executed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_summary: Option<&'a MergeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patch_report: Option<&'a PatchReport>,
    invalid_entries: &'a [usize],
    entries: Vec<EntryOverview>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleMetadata<'a> {
    job: &'a str,
    mode: &'a str,
    executed_at: String,
    artifacts: Vec<&'a str>,
}

/// Render the requested output formats and persist them through `storage`,
/// optionally wrapped in a single zip bundle. Returns the bundle path when
/// bundling, the output directory otherwise.
pub(crate) async fn write_artifacts<S: Storage, C: ConfigProvider>(
    storage: &S,
    config: &C,
    outcome: &ReconOutcome,
    mode: &str,
) -> Result<String> {
    let executed_at = chrono::Utc::now();

    let mut files: Vec<(&str, Vec<u8>)> = Vec::new();
    for format in config.output_formats() {
        match format.as_str() {
            "json" => {
                let mut data = serde_json::to_vec_pretty(&outcome.document)?;
                data.push(b'\n');
                files.push((DOCUMENT_JSON, data));
            }
            "template" => {
                files.push((TEMPLATE_CSV, tabular::rows_to_csv(&outcome.template)?));
            }
            "xml" => {
                files.push((DOCUMENT_XML, markup::document_to_xml(&outcome.document)?));
            }
            "summary" => {
                let summary = RunSummary {
                    job: config.job_name(),
                    mode,
                    executed_at: executed_at.to_rfc3339(),
                    merge_summary: outcome.merge_summary.as_ref(),
                    patch_report: outcome.patch_report.as_ref(),
                    invalid_entries: &outcome.invalid_entries,
                    entries: entry_overviews(&outcome.document),
                };
                let mut data = serde_json::to_vec_pretty(&summary)?;
                data.push(b'\n');
                files.push((SUMMARY_JSON, data));
            }
            other => {
                // Unknown names are rejected at config validation; a stray
                // one here is skipped rather than failing a finished run.
                tracing::warn!("⚠️ Skipping unknown output format '{}'", other);
            }
        }
    }

    if config.bundle_enabled() {
        let bundle_name = render_bundle_name(config.bundle_name(), config.job_name(), executed_at);
        let bundle_path = format!("{}/{}", config.output_path(), bundle_name);

        let metadata = BundleMetadata {
            job: config.job_name(),
            mode,
            executed_at: executed_at.to_rfc3339(),
            artifacts: files.iter().map(|(name, _)| *name).collect(),
        };

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            for (name, data) in &files {
                zip.start_file::<_, ()>(*name, FileOptions::default())?;
                zip.write_all(data)?;
            }

            zip.start_file::<_, ()>(METADATA_JSON, FileOptions::default())?;
            let metadata_json = serde_json::to_string_pretty(&metadata)?;
            zip.write_all(metadata_json.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        storage.write_file(&bundle_path, &zip_data).await?;
        tracing::info!("📦 Bundle saved: {}", bundle_path);
        return Ok(bundle_path);
    }

    for (name, data) in &files {
        let path = format!("{}/{}", config.output_path(), name);
        storage.write_file(&path, data).await?;
        tracing::info!("📄 Artifact saved: {}", path);
    }

    Ok(config.output_path().to_string())
}

/// Expand the `{job}` and `{timestamp}` placeholders in a bundle filename.
fn render_bundle_name(pattern: &str, job: &str, at: chrono::DateTime<chrono::Utc>) -> String {
    pattern
        .replace("{job}", job)
        .replace("{timestamp}", &at.format("%Y%m%d_%H%M%S").to_string())
}
