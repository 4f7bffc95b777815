use crate::domain::model::{CanonicalField, CleanRecord, ColumnMap, TieBreak};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Where the compressed CSV comes from.
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetch the complete compressed payload. A single attempt, no retry.
    async fn fetch(&self) -> Result<Vec<u8>>;

    fn describe(&self) -> String;
}

/// Opens an exclusive session against the target database.
pub trait Storage {
    type Sink: RecordSink;

    fn open(&self) -> Result<Self::Sink>;

    fn describe(&self) -> String;
}

/// Append-only writer held by the driver for the whole run.
///
/// Dropping a sink without calling [`RecordSink::finish`] must still release the
/// underlying handle; rows from earlier successful `append` calls stay written.
pub trait RecordSink {
    /// Create the target table when it does not exist yet. Safe to call repeatedly.
    fn ensure_table(&mut self) -> Result<()>;

    fn append(&mut self, batch: &[CleanRecord]) -> Result<usize>;

    fn finish(self) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn source_url(&self) -> &str;
    fn table_name(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn database_path(&self) -> &str;
    fn null_values(&self) -> &[String];
    fn tie_break(&self) -> TieBreak;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Init,
    Streaming,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "INIT",
            PipelineState::Streaming => "STREAMING",
            PipelineState::Done => "DONE",
            PipelineState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StateChanged(PipelineState),
    FetchStarted { source: String },
    FetchCompleted { bytes: usize },
    FetchFailed { source: String, error: String },
    TableReady { storage: String },
    ChunkStarted { index: usize, rows: usize },
    RawColumns(Vec<String>),
    NormalizedColumns(Vec<String>),
    ColumnsMapped(ColumnMap),
    ChunkRejected { missing: Vec<CanonicalField> },
    ChunkTransformed { input_rows: usize, output_rows: usize },
    ChunkSkipped { index: usize },
    ChunkLoaded { index: usize, rows: usize, total: usize },
    RunFailed { error: String },
    Completed { total_inserted: usize },
}

/// Receives structured events from every pipeline component.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}
