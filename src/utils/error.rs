use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP request to {url} returned status {status}")]
    HttpStatusError { url: String, status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Malformed CSV row at line {line}: expected at most {expected} fields, found {found}")]
    MalformedRowError {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

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

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::CsvError(_)
            | EtlError::MalformedRowError { .. }
            | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::DatabaseError(_) => ErrorCategory::Storage,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        // 只影響輸出的摘要，資料已經寫入
        if let EtlError::SerializationError(_) = self {
            return ErrorSeverity::Low;
        }
        match self.category() {
            // 網路錯誤重跑一次通常就會好
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check network connectivity and that the source URL is reachable",
            EtlError::HttpStatusError { .. } => {
                "Verify the source URL; the server rejected the download request"
            }
            EtlError::CsvError(_) => {
                "The source is not a well-formed gzip-compressed CSV; inspect the file manually"
            }
            EtlError::MalformedRowError { .. } => {
                "A data row has more fields than the header; fix or remove that row"
            }
            EtlError::IoError(_) => {
                "Check file permissions and that the gzip stream is not truncated"
            }
            EtlError::DatabaseError(_) => {
                "Check that the database file is writable and not locked by another process"
            }
            EtlError::SerializationError(_) => "The run succeeded; only the JSON summary was skipped",
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => {
                "Fix the configuration file or command line arguments and try again"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Failed to download source data: {}", self),
            ErrorCategory::Data => format!("Source data could not be read: {}", self),
            ErrorCategory::Storage => format!("Failed to write to the database: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
