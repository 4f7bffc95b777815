// Adapters layer: concrete implementations of the domain ports (HTTP, local file, SQLite, tracing).

pub mod file;
pub mod http;
pub mod observer;
pub mod sqlite;

pub use file::FileSource;
pub use http::HttpSource;
pub use observer::TracingObserver;
pub use sqlite::{SqliteSink, SqliteStorage};
