use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{source_name} failed: {message}")]
    SourceError {
        source_name: String,
        message: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn source_error(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        ScanError::SourceError {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::HttpError(_) | ScanError::SourceError { .. } => ErrorCategory::Network,
            ScanError::CsvError(_) | ScanError::SerializationError(_) => ErrorCategory::Data,
            ScanError::ConfigError { .. } | ScanError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ScanError::ValidationError { .. } => ErrorCategory::Input,
            ScanError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check your network connection or wait a few minutes; the upstream source may be rate limiting"
            }
            ErrorCategory::Data => "The upstream response format may have changed; rerun with --verbose",
            ErrorCategory::Configuration => {
                "Review the TOML configuration file and the SERPAPI_KEY / USE_SERPAPI environment variables"
            }
            ErrorCategory::Input => "Provide a non-empty keyword (one per line for batch files)",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::HttpError(e) if e.is_timeout() => {
                "A request timed out while contacting an external source".to_string()
            }
            ScanError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
