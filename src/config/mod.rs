pub mod cli;
pub mod job_config;

#[cfg(feature = "cli")]
use crate::domain::model::Polarity;
#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_file_extensions, validate_one_of, validate_path, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;

pub const POLARITY_KEYWORDS: [&str; 3] = ["keep", "positive", "negative"];
pub const OUTPUT_FORMATS: [&str; 4] = ["json", "template", "xml", "summary"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "billmend")]
#[command(about = "Reconcile hierarchical billing documents")]
pub struct CliConfig {
    /// Billing document to repair (JSON)
    #[arg(long)]
    pub target: String,

    /// Reference document to copy missing service blocks from (JSON)
    #[arg(long)]
    pub source: Option<String>,

    /// Filled bulk-edit file to apply instead of merging (CSV)
    #[arg(long)]
    pub edits: Option<String>,

    /// Sign handling for copied monetary values: keep, positive or negative
    #[arg(long, default_value = "keep")]
    pub polarity: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Artifacts to produce: json, template, xml, summary
    #[arg(long, value_delimiter = ',', default_value = "json,summary")]
    pub formats: Vec<String>,

    /// Wrap all artifacts in a single zip bundle
    #[arg(long)]
    pub bundle: bool,

    #[arg(long, default_value = "billmend_{timestamp}.zip")]
    pub bundle_name: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn job_name(&self) -> &str {
        "billmend"
    }

    fn target_path(&self) -> &str {
        &self.target
    }

    fn source_path(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn edits_path(&self) -> Option<&str> {
        self.edits.as_deref()
    }

    fn polarity(&self) -> Polarity {
        Polarity::from_keyword(&self.polarity).unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn bundle_enabled(&self) -> bool {
        self.bundle
    }

    fn bundle_name(&self) -> &str {
        &self.bundle_name
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("target", &self.target)?;
        validate_file_extensions("target", std::slice::from_ref(&self.target), &["json"])?;

        if let Some(source) = &self.source {
            validate_file_extensions("source", std::slice::from_ref(source), &["json"])?;
        }
        if let Some(edits) = &self.edits {
            validate_file_extensions("edits", std::slice::from_ref(edits), &["csv"])?;
        }

        validate_one_of("polarity", &self.polarity, &POLARITY_KEYWORDS)?;
        validate_path("output-path", &self.output_path)?;
        for format in &self.formats {
            validate_one_of("formats", format, &OUTPUT_FORMATS)?;
        }

        Ok(())
    }
}
