use crate::config::toml_config::EtlConfig;
use crate::domain::model::TieBreak;
use clap::{Parser, ValueEnum};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TieBreakArg {
    First,
    Last,
}

impl From<TieBreakArg> for TieBreak {
    fn from(value: TieBreakArg) -> Self {
        match value {
            TieBreakArg::First => TieBreak::FirstWins,
            TieBreakArg::Last => TieBreak::LastWins,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "gzcsv-etl")]
#[command(about = "Load a gzip-compressed CSV into SQLite with fuzzy column mapping")]
pub struct CliArgs {
    /// Path to TOML configuration file (optional; defaults apply when absent)
    #[arg(short, long, default_value = "etl-config.toml")]
    pub config: String,

    /// Override the source URL
    #[arg(long)]
    pub source_url: Option<String>,

    /// Read a local .csv.gz instead of downloading
    #[arg(long)]
    pub input: Option<String>,

    /// Override the SQLite database path
    #[arg(long)]
    pub database: Option<String>,

    /// Override the target table name
    #[arg(long)]
    pub table: Option<String>,

    /// Override the number of rows per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Which column wins when several match the same field
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreakArg>,

    /// Write logs to this file in addition to the console
    #[arg(long)]
    pub log_file: Option<String>,

    /// Disable the log file
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json_summary: bool,

    /// Log process CPU and memory usage
    #[arg(long)]
    pub monitor: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// 讀取設定檔（檔案不存在時使用預設值）並套用命令列覆蓋
    pub fn load_config(&self) -> crate::Result<EtlConfig> {
        let mut config = if Path::new(&self.config).exists() {
            EtlConfig::from_file(&self.config)?
        } else {
            EtlConfig::default()
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut EtlConfig) {
        if let Some(url) = &self.source_url {
            config.source.url = url.clone();
            config.source.path = None;
        }
        if let Some(input) = &self.input {
            config.source.path = Some(input.clone());
        }
        if let Some(database) = &self.database {
            config.load.database_path = database.clone();
        }
        if let Some(table) = &self.table {
            config.load.table_name = table.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.load.batch_size = batch_size;
        }
        if let Some(tie_break) = self.tie_break {
            config.transform.tie_break = tie_break.into();
        }
        if let Some(log_file) = &self.log_file {
            config.logging.file = Some(log_file.clone());
        }
        if self.no_log_file {
            config.logging.file = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;

    #[test]
    fn test_overrides_replace_config_values() {
        let args = CliArgs::parse_from([
            "gzcsv-etl",
            "--table",
            "people",
            "--batch-size",
            "250",
            "--tie-break",
            "first",
            "--no-log-file",
        ]);
        let mut config = EtlConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.table_name(), "people");
        assert_eq!(config.batch_size(), 250);
        assert_eq!(config.tie_break(), TieBreak::FirstWins);
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn test_source_url_override_clears_local_path() {
        let args = CliArgs::parse_from(["gzcsv-etl", "--source-url", "https://example.com/x.csv.gz"]);
        let mut config = EtlConfig::default();
        config.source.path = Some("local.csv.gz".to_string());
        args.apply_overrides(&mut config);

        assert_eq!(config.source.path, None);
        assert_eq!(config.source_url(), "https://example.com/x.csv.gz");
    }

    #[test]
    fn test_missing_config_file_falls_back_to_defaults() {
        let args = CliArgs::parse_from(["gzcsv-etl", "--config", "/no/such/etl-config.toml"]);
        let config = args.load_config().unwrap();
        assert_eq!(config.table_name(), "transformed_data");
    }
}
