use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Markup rendering error: {0}")]
    MarkupError(#[from] quick_xml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' - {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

/// 錯誤分類，用於日誌與報告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Io,
    Config,
    Data,
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReconError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReconError::CsvError(_) | ReconError::SerializationError(_) => ErrorCategory::Parse,
            ReconError::ZipError(_) | ReconError::IoError(_) | ReconError::MarkupError(_) => {
                ErrorCategory::Io
            }
            ReconError::ConfigError { .. }
            | ReconError::InvalidConfigValueError { .. }
            | ReconError::MissingConfigError { .. }
            | ReconError::ConfigValidationError { .. } => ErrorCategory::Config,
            ReconError::ProcessingError { .. } | ReconError::ValidationError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReconError::CsvError(_) | ReconError::SerializationError(_) => ErrorSeverity::High,
            ReconError::ZipError(_) | ReconError::MarkupError(_) => ErrorSeverity::High,
            // 找不到檔案是使用者層級的問題，其餘 IO 失敗視為系統錯誤
            ReconError::IoError(e) => match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    ErrorSeverity::High
                }
                _ => ErrorSeverity::Critical,
            },
            ReconError::ConfigError { .. }
            | ReconError::InvalidConfigValueError { .. }
            | ReconError::MissingConfigError { .. }
            | ReconError::ConfigValidationError { .. } => ErrorSeverity::Medium,
            ReconError::ProcessingError { .. } => ErrorSeverity::High,
            ReconError::ValidationError { .. } => ErrorSeverity::Medium,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReconError::ZipError(_) => "Could not build the compressed output bundle".to_string(),
            ReconError::CsvError(_) => "The edits file is not readable CSV".to_string(),
            ReconError::IoError(e) => format!("File access failed: {}", e),
            ReconError::SerializationError(_) => {
                "A billing document is not valid JSON".to_string()
            }
            ReconError::MarkupError(_) => "The XML dump could not be rendered".to_string(),
            ReconError::ConfigError { message } => format!("Configuration problem: {}", message),
            ReconError::InvalidConfigValueError { field, value, .. } => {
                format!("The value '{}' is not valid for '{}'", value, field)
            }
            ReconError::MissingConfigError { field } => {
                format!("Required setting '{}' was not provided", field)
            }
            ReconError::ConfigValidationError { field, message } => {
                format!("Setting '{}' failed validation: {}", field, message)
            }
            ReconError::ProcessingError { message } => format!("Processing failed: {}", message),
            ReconError::ValidationError { message } => {
                format!("Input validation failed: {}", message)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReconError::ZipError(_) => {
                "Check free disk space, or run again without the bundle option".to_string()
            }
            ReconError::CsvError(_) => {
                "Re-export the edits file and keep the header row intact".to_string()
            }
            ReconError::IoError(_) => {
                "Verify the path exists and the process may read and write it".to_string()
            }
            ReconError::SerializationError(_) => {
                "Run the document through a JSON validator and fix the reported location"
                    .to_string()
            }
            ReconError::MarkupError(_) => {
                "Drop 'xml' from the output formats and inspect the document fields".to_string()
            }
            ReconError::ConfigError { .. } => {
                "Review the configuration against the documented schema".to_string()
            }
            ReconError::InvalidConfigValueError { reason, .. } => reason.clone(),
            ReconError::MissingConfigError { field } => {
                format!("Add '{}' to the job file or pass it on the command line", field)
            }
            ReconError::ConfigValidationError { .. } => {
                "Fix the reported field in the TOML job file".to_string()
            }
            ReconError::ProcessingError { .. } => {
                "Run with --verbose to see which entry failed".to_string()
            }
            ReconError::ValidationError { .. } => {
                "Correct the input described above and run again".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
