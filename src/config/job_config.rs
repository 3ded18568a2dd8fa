use crate::config::{OUTPUT_FORMATS, POLARITY_KEYWORDS};
use crate::domain::model::Polarity;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ReconError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_one_of, validate_path, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_BUNDLE_NAME: &str = "{job}_{timestamp}.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub job: JobSection,
    pub input: InputSection,
    pub merge: Option<MergeSection>,
    pub output: OutputSection,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSection {
    pub target: String,
    pub source: Option<String>,
    pub edits: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSection {
    pub enabled: Option<bool>,
    pub polarity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub formats: Vec<String>,
    pub compression: Option<CompressionSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionSection {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl JobConfig {
    /// 從 TOML 檔案載入任務配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReconError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析任務配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReconError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReconError::ConfigError {
            message: format!("env substitution pattern failed: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("job.name", &self.job.name)?;

        validate_path("input.target", &self.input.target)?;
        validate_file_extensions(
            "input.target",
            std::slice::from_ref(&self.input.target),
            &["json"],
        )?;
        if let Some(source) = &self.input.source {
            validate_file_extensions("input.source", std::slice::from_ref(source), &["json"])?;
        }
        if let Some(edits) = &self.input.edits {
            validate_file_extensions("input.edits", std::slice::from_ref(edits), &["csv"])?;
        }

        if let Some(merge) = &self.merge {
            if let Some(polarity) = &merge.polarity {
                validate_one_of("merge.polarity", polarity, &POLARITY_KEYWORDS)?;
            }
        }

        validate_path("output.path", &self.output.path)?;
        for format in &self.output.formats {
            validate_one_of("output.formats", format, &OUTPUT_FORMATS)?;
        }

        // 合併後再套用編輯時，補丁階段要讀合併產出的 JSON
        if self.input.edits.is_some()
            && self.merge_enabled()
            && !self.output.formats.iter().any(|f| f == "json")
        {
            return Err(ReconError::ConfigValidationError {
                field: "output.formats".to_string(),
                message: "a merge followed by edits requires the 'json' format".to_string(),
            });
        }

        Ok(())
    }

    /// 是否執行合併階段；未明說時由是否給了來源文件決定
    pub fn merge_enabled(&self) -> bool {
        self.merge
            .as_ref()
            .and_then(|m| m.enabled)
            .unwrap_or(self.input.source.is_some())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for JobConfig {
    fn job_name(&self) -> &str {
        &self.job.name
    }

    fn target_path(&self) -> &str {
        &self.input.target
    }

    fn source_path(&self) -> Option<&str> {
        self.input.source.as_deref()
    }

    fn edits_path(&self) -> Option<&str> {
        self.input.edits.as_deref()
    }

    fn polarity(&self) -> Polarity {
        self.merge
            .as_ref()
            .and_then(|m| m.polarity.as_deref())
            .and_then(Polarity::from_keyword)
            .unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn bundle_enabled(&self) -> bool {
        self.output
            .compression
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }

    fn bundle_name(&self) -> &str {
        self.output
            .compression
            .as_ref()
            .and_then(|c| c.filename.as_deref())
            .unwrap_or(DEFAULT_BUNDLE_NAME)
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
