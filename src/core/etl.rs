use crate::core::pipeline::PipelineDriver;
use crate::core::{RunSummary, Source, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::ProcessMonitor;

pub struct EtlEngine<S: Source, T: Storage> {
    driver: PipelineDriver<S, T>,
    monitor: ProcessMonitor,
}

impl<S: Source, T: Storage> EtlEngine<S, T> {
    pub fn new(driver: PipelineDriver<S, T>) -> Self {
        Self::new_with_monitoring(driver, false)
    }

    pub fn new_with_monitoring(driver: PipelineDriver<S, T>, monitor_enabled: bool) -> Self {
        Self {
            driver,
            monitor: ProcessMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting ETL process");
        self.monitor.log_stats("Start");

        let result = self.driver.run().await;

        self.monitor.log_stats("Load finished");
        self.monitor.log_final_stats();

        match &result {
            Ok(summary) => {
                tracing::info!(
                    "📦 {} rows read, {} dropped, {} of {} chunks skipped",
                    summary.rows_read,
                    summary.rows_dropped,
                    summary.chunks_skipped,
                    summary.chunks_processed
                );
            }
            Err(e) => {
                tracing::error!("Error during CSV processing: {}", e);
            }
        }

        result
    }
}
