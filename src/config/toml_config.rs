use crate::core::reader::DEFAULT_NULL_VALUES;
use crate::core::ConfigProvider;
use crate::domain::model::TieBreak;
use crate::utils::error::{EtlError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SOURCE_URL: &str =
    "https://tyroo-engineering-assesments.s3.us-west-2.amazonaws.com/Tyroo-dummy-data.csv.gz";
pub const DEFAULT_DATABASE_PATH: &str = "data.db";
pub const DEFAULT_TABLE_NAME: &str = "transformed_data";
pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_LOG_FILE: &str = "data_processing.log";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub source: SourceConfig,
    pub load: LoadConfig,
    pub transform: TransformConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    /// 指定時改讀本機檔案，不走 HTTP
    pub path: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            path: None,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub database_path: String,
    pub table_name: String,
    pub batch_size: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub tie_break: TieBreak,
    pub null_values: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::default(),
            null_values: DEFAULT_NULL_VALUES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "compact".to_string(),
            file: Some(DEFAULT_LOG_FILE.to_string()),
        }
    }
}

impl EtlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_URL})，未定義的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        match &self.source.path {
            Some(path) => validation::validate_path("source.path", path)?,
            None => validation::validate_url("source.url", &self.source.url)?,
        }

        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_range("source.timeout_seconds", timeout, 1, 3600)?;
        }

        validation::validate_path("load.database_path", &self.load.database_path)?;
        validation::validate_sql_identifier("load.table_name", &self.load.table_name)?;
        validation::validate_positive_number("load.batch_size", self.load.batch_size, 1)?;

        if self.log_format().is_none() {
            return Err(EtlError::InvalidConfigValueError {
                field: "logging.format".to_string(),
                value: self.logging.format.clone(),
                reason: "Unsupported format. Valid formats: compact, json".to_string(),
            });
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    pub fn log_format(&self) -> Option<LogFormat> {
        LogFormat::parse(&self.logging.format)
    }
}

impl ConfigProvider for EtlConfig {
    fn source_url(&self) -> &str {
        &self.source.url
    }

    fn table_name(&self) -> &str {
        &self.load.table_name
    }

    fn batch_size(&self) -> usize {
        self.load.batch_size
    }

    fn database_path(&self) -> &str {
        &self.load.database_path
    }

    fn null_values(&self) -> &[String] {
        &self.transform.null_values
    }

    fn tie_break(&self) -> TieBreak {
        self.transform.tie_break
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
