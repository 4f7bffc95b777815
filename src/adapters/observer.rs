use crate::core::{PipelineEvent, PipelineObserver};

/// Forwards pipeline events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StateChanged(state) => tracing::debug!("Pipeline state: {}", state),
            PipelineEvent::FetchStarted { source } => {
                tracing::info!("📥 Fetching source data from {}", source)
            }
            PipelineEvent::FetchCompleted { bytes } => {
                tracing::info!("📥 Downloaded {} compressed bytes", bytes)
            }
            PipelineEvent::FetchFailed { source, error } => {
                tracing::error!("Failed to download file from {}: {}", source, error)
            }
            PipelineEvent::TableReady { storage } => tracing::info!("🗄️ Target table ready: {}", storage),
            PipelineEvent::ChunkStarted { index, rows } => {
                tracing::info!("Processing chunk {} ({} rows)", index, rows)
            }
            PipelineEvent::RawColumns(columns) => tracing::info!("Raw columns: {:?}", columns),
            PipelineEvent::NormalizedColumns(columns) => {
                tracing::info!("Normalized columns: {:?}", columns)
            }
            PipelineEvent::ColumnsMapped(map) => tracing::info!("Mapped columns: {}", map),
            PipelineEvent::ChunkRejected { missing } => {
                let missing: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
                tracing::warn!(
                    "One or more required fields are missing ({}), skipping chunk.",
                    missing.join(", ")
                )
            }
            PipelineEvent::ChunkTransformed {
                input_rows,
                output_rows,
            } => tracing::info!("Transformed chunk size: {} (from {})", output_rows, input_rows),
            PipelineEvent::ChunkSkipped { index } => {
                tracing::warn!("Chunk {} had no valid data.", index)
            }
            PipelineEvent::ChunkLoaded { index, rows, total } => {
                tracing::debug!("Chunk {} appended {} rows (running total {})", index, rows, total)
            }
            PipelineEvent::RunFailed { error } => tracing::error!("Pipeline aborted: {}", error),
            PipelineEvent::Completed { total_inserted } => {
                tracing::info!("✅ Done. Inserted total rows: {}", total_inserted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineState;
    use crate::domain::model::CanonicalField;

    #[test]
    fn test_handles_every_event_without_subscriber() {
        let observer = TracingObserver;
        let events = vec![
            PipelineEvent::StateChanged(PipelineState::Init),
            PipelineEvent::ChunkRejected {
                missing: vec![CanonicalField::Country],
            },
            PipelineEvent::ChunkSkipped { index: 3 },
            PipelineEvent::Completed { total_inserted: 0 },
        ];
        for event in &events {
            observer.on_event(event);
        }
    }
}
