use clap::Parser;
use gzcsv_etl::core::{RunSummary, Source};
use gzcsv_etl::utils::error::ErrorSeverity;
use gzcsv_etl::utils::logger::{self, LogFormat};
use gzcsv_etl::utils::validation::Validate;
use gzcsv_etl::{
    CliArgs, EtlConfig, EtlEngine, FileSource, HttpSource, PipelineDriver, SqliteStorage,
    TracingObserver,
};
use std::path::Path;
use std::sync::Arc;

async fn run_pipeline<S: Source>(
    source: S,
    config: &EtlConfig,
    monitor: bool,
) -> gzcsv_etl::Result<RunSummary> {
    let storage = SqliteStorage::new(&config.load.database_path, &config.load.table_name)?;
    let driver = PipelineDriver::new(source, storage, config, Arc::new(TracingObserver));
    EtlEngine::new_with_monitoring(driver, monitor).run().await
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let log_format = config.log_format().unwrap_or(LogFormat::Compact);
    if let Err(e) = logger::init_cli_logger(
        args.verbose,
        log_format,
        config.logging.file.as_deref().map(Path::new),
    ) {
        eprintln!("❌ Failed to open log file: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Starting gzcsv-etl");
    tracing::debug!("Effective config: {:?}", config);

    let result = match &config.source.path {
        Some(path) => run_pipeline(FileSource::new(path), &config, args.monitor).await,
        None => {
            let source = HttpSource::new(config.source.url.clone()).with_timeout(config.timeout());
            run_pipeline(source, &config, args.monitor).await
        }
    };

    match result {
        Ok(summary) => {
            println!("{}", summary.summary_line());
            if args.json_summary {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        let e = gzcsv_etl::EtlError::from(e);
                        tracing::warn!(
                            "Could not serialize run summary: {} (Severity: {:?})",
                            e,
                            e.severity()
                        );
                        eprintln!("⚠️ {}", e.recovery_suggestion());
                    }
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "CRITICAL Pipeline failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0, // 警告，但成功
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}
