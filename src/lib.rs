pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::EtlConfig;

pub use adapters::{FileSource, HttpSource, SqliteStorage, TracingObserver};
pub use crate::core::{etl::EtlEngine, pipeline::PipelineDriver};
pub use utils::error::{EtlError, Result};
