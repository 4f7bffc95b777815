pub mod etl;
pub mod mapper;
pub mod pipeline;
pub mod reader;
pub mod transform;

pub use crate::domain::model::{CleanBatch, CleanRecord, ColumnMap, RawBatch, RunSummary};
pub use crate::domain::ports::{
    ConfigProvider, PipelineEvent, PipelineObserver, PipelineState, RecordSink, Source, Storage,
};
pub use crate::utils::error::Result;
