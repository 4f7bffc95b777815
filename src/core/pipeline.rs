use crate::core::mapper::ColumnMapper;
use crate::core::reader::BatchReader;
use crate::core::transform::ChunkTransformer;
use crate::core::{
    ConfigProvider, PipelineEvent, PipelineObserver, PipelineState, RecordSink, RunSummary, Source,
    Storage,
};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::io::Cursor;
use std::sync::Arc;

/// Drives one run: fetch, decode, transform and append batch by batch.
///
/// Runs are linear. A failure at any point aborts the run; batches appended
/// before the failure stay in the table.
pub struct PipelineDriver<S: Source, T: Storage> {
    source: S,
    storage: T,
    transformer: ChunkTransformer,
    observer: Arc<dyn PipelineObserver>,
    batch_size: usize,
    null_values: Vec<String>,
    table: String,
}

#[derive(Debug, Default)]
struct StreamStats {
    total_inserted: usize,
    rows_read: usize,
    chunks_processed: usize,
    chunks_skipped: usize,
}

impl<S: Source, T: Storage> PipelineDriver<S, T> {
    pub fn new<C: ConfigProvider>(
        source: S,
        storage: T,
        config: &C,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        let mapper = ColumnMapper::new(config.tie_break());
        Self {
            source,
            storage,
            transformer: ChunkTransformer::new(mapper, observer.clone()),
            observer,
            batch_size: config.batch_size(),
            null_values: config.null_values().to_vec(),
            table: config.table_name().to_string(),
        }
    }

    fn transition(&self, state: PipelineState) {
        self.observer.on_event(&PipelineEvent::StateChanged(state));
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        self.transition(PipelineState::Init);

        match self.execute(started_at).await {
            Ok(summary) => {
                self.transition(PipelineState::Done);
                self.observer.on_event(&PipelineEvent::Completed {
                    total_inserted: summary.total_inserted,
                });
                Ok(summary)
            }
            Err(e) => {
                self.observer.on_event(&PipelineEvent::RunFailed {
                    error: e.to_string(),
                });
                self.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&self, started_at: DateTime<Utc>) -> Result<RunSummary> {
        let source = self.source.describe();
        self.observer.on_event(&PipelineEvent::FetchStarted {
            source: source.clone(),
        });
        let payload = match self.source.fetch().await {
            Ok(payload) => payload,
            Err(e) => {
                self.observer.on_event(&PipelineEvent::FetchFailed {
                    source,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };
        self.observer.on_event(&PipelineEvent::FetchCompleted {
            bytes: payload.len(),
        });

        let mut reader =
            BatchReader::from_gzip(Cursor::new(payload), self.batch_size, &self.null_values)?;

        // sink 在任何離開路徑都會被 drop 釋放；已提交的批次不回滾
        let mut sink = self.storage.open()?;
        sink.ensure_table()?;
        self.observer.on_event(&PipelineEvent::TableReady {
            storage: self.storage.describe(),
        });

        self.transition(PipelineState::Streaming);
        let stats = self.stream(&mut reader, &mut sink)?;
        sink.finish()?;

        Ok(RunSummary {
            source,
            table: self.table.clone(),
            total_inserted: stats.total_inserted,
            rows_read: stats.rows_read,
            rows_dropped: stats.rows_read.saturating_sub(stats.total_inserted),
            chunks_processed: stats.chunks_processed,
            chunks_skipped: stats.chunks_skipped,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn stream<R: std::io::Read>(
        &self,
        reader: &mut BatchReader<R>,
        sink: &mut T::Sink,
    ) -> Result<StreamStats> {
        let mut stats = StreamStats::default();

        while let Some(batch) = reader.next_batch()? {
            stats.chunks_processed += 1;
            let index = stats.chunks_processed;
            stats.rows_read += batch.len();
            self.observer.on_event(&PipelineEvent::ChunkStarted {
                index,
                rows: batch.len(),
            });

            let cleaned = self.transformer.transform(batch);
            if cleaned.is_empty() {
                stats.chunks_skipped += 1;
                self.observer.on_event(&PipelineEvent::ChunkSkipped { index });
                continue;
            }

            let inserted = sink.append(&cleaned)?;
            stats.total_inserted += inserted;
            self.observer.on_event(&PipelineEvent::ChunkLoaded {
                index,
                rows: inserted,
                total: stats.total_inserted,
            });
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CleanRecord, TieBreak};
    use crate::utils::error::EtlError;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<PipelineEvent>>,
    }

    impl RecordingObserver {
        fn events(&self) -> Vec<PipelineEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl PipelineObserver for RecordingObserver {
        fn on_event(&self, event: &PipelineEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    struct StaticSource {
        payload: Option<Vec<u8>>,
    }

    #[async_trait::async_trait]
    impl Source for StaticSource {
        async fn fetch(&self) -> Result<Vec<u8>> {
            self.payload.clone().ok_or_else(|| EtlError::HttpStatusError {
                url: "mock://source".to_string(),
                status: 500,
            })
        }

        fn describe(&self) -> String {
            "mock://source".to_string()
        }
    }

    #[derive(Default)]
    struct MemoryState {
        opened: bool,
        tables_created: usize,
        rows: Vec<CleanRecord>,
        finished: bool,
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        state: Arc<Mutex<MemoryState>>,
        fail_on_append: Option<usize>,
        // append 回報的筆數比實際多幾筆
        over_report: usize,
    }

    struct MemorySink {
        state: Arc<Mutex<MemoryState>>,
        fail_on_append: Option<usize>,
        over_report: usize,
        appends: usize,
    }

    impl Storage for MemoryStorage {
        type Sink = MemorySink;

        fn open(&self) -> Result<MemorySink> {
            self.state.lock().unwrap().opened = true;
            Ok(MemorySink {
                state: self.state.clone(),
                fail_on_append: self.fail_on_append,
                over_report: self.over_report,
                appends: 0,
            })
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    impl RecordSink for MemorySink {
        fn ensure_table(&mut self) -> Result<()> {
            self.state.lock().unwrap().tables_created += 1;
            Ok(())
        }

        fn append(&mut self, batch: &[CleanRecord]) -> Result<usize> {
            self.appends += 1;
            if self.fail_on_append == Some(self.appends) {
                return Err(EtlError::DatabaseError(rusqlite::Error::InvalidQuery));
            }
            self.state.lock().unwrap().rows.extend_from_slice(batch);
            Ok(batch.len() + self.over_report)
        }

        fn finish(self) -> Result<()> {
            self.state.lock().unwrap().finished = true;
            Ok(())
        }
    }

    struct TestConfig {
        batch_size: usize,
        null_values: Vec<String>,
    }

    impl ConfigProvider for TestConfig {
        fn source_url(&self) -> &str {
            "mock://source"
        }

        fn table_name(&self) -> &str {
            "transformed_data"
        }

        fn batch_size(&self) -> usize {
            self.batch_size
        }

        fn database_path(&self) -> &str {
            ":memory:"
        }

        fn null_values(&self) -> &[String] {
            &self.null_values
        }

        fn tie_break(&self) -> TieBreak {
            TieBreak::LastWins
        }
    }

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn driver(
        payload: Option<Vec<u8>>,
        storage: MemoryStorage,
        batch_size: usize,
    ) -> (PipelineDriver<StaticSource, MemoryStorage>, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let config = TestConfig {
            batch_size,
            null_values: vec![String::new()],
        };
        let driver = PipelineDriver::new(StaticSource { payload }, storage, &config, observer.clone());
        (driver, observer)
    }

    #[tokio::test]
    async fn test_run_loads_all_valid_rows() {
        let csv = "Name,Age,Email,Country\nAlice,30,A@X.com,US\nBob,abc,b@x.com,UK\nCara,41,C@X.COM ,FR\n";
        let storage = MemoryStorage::default();
        let (driver, observer) = driver(Some(gzip(csv)), storage.clone(), 2);

        let summary = driver.run().await.unwrap();

        assert_eq!(summary.total_inserted, 2);
        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.rows_dropped, 1);
        assert_eq!(summary.chunks_processed, 2);
        assert_eq!(summary.chunks_skipped, 0);

        let state = storage.state.lock().unwrap();
        assert!(state.finished);
        assert_eq!(state.rows[0].email, "a@x.com");
        assert_eq!(state.rows[1].email, "c@x.com");

        let events = observer.events();
        assert_eq!(events.first(), Some(&PipelineEvent::StateChanged(PipelineState::Init)));
        assert!(events.contains(&PipelineEvent::StateChanged(PipelineState::Streaming)));
        assert!(events.contains(&PipelineEvent::Completed { total_inserted: 2 }));
        assert_eq!(
            events.iter().rev().nth(1),
            Some(&PipelineEvent::StateChanged(PipelineState::Done))
        );
    }

    #[tokio::test]
    async fn test_incomplete_columns_skip_chunk_without_failing() {
        let csv = "Name,Age,Email\nAlice,30,a@x.com\n";
        let storage = MemoryStorage::default();
        let (driver, observer) = driver(Some(gzip(csv)), storage.clone(), 10);

        let summary = driver.run().await.unwrap();

        assert_eq!(summary.total_inserted, 0);
        assert_eq!(summary.chunks_skipped, 1);
        assert!(storage.state.lock().unwrap().rows.is_empty());
        assert!(observer
            .events()
            .contains(&PipelineEvent::ChunkSkipped { index: 1 }));
    }

    #[tokio::test]
    async fn test_fetch_failure_never_opens_storage() {
        let storage = MemoryStorage::default();
        let (driver, observer) = driver(None, storage.clone(), 10);

        let err = driver.run().await.unwrap_err();

        assert!(matches!(err, EtlError::HttpStatusError { status: 500, .. }));
        let state = storage.state.lock().unwrap();
        assert!(!state.opened);
        assert_eq!(state.tables_created, 0);

        let events = observer.events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::FetchFailed { .. })));
        assert_eq!(events.last(), Some(&PipelineEvent::StateChanged(PipelineState::Failed)));
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_earlier_batches() {
        let csv = "name,age,email,country\na,1,a@x,US\nb,2,b@x,US\nc,3,c@x,US\n";
        let storage = MemoryStorage {
            fail_on_append: Some(2),
            ..MemoryStorage::default()
        };
        let (driver, _) = driver(Some(gzip(csv)), storage.clone(), 1);

        let err = driver.run().await.unwrap_err();

        assert!(matches!(err, EtlError::DatabaseError(_)));
        let state = storage.state.lock().unwrap();
        assert_eq!(state.rows.len(), 1);
        assert!(!state.finished);
    }

    #[tokio::test]
    async fn test_sink_over_reporting_inserts_never_underflows() {
        let csv = "name,age,email,country\na,1,a@x,US\nb,2,b@x,US\n";
        let storage = MemoryStorage {
            over_report: 5,
            ..MemoryStorage::default()
        };
        let (driver, _) = driver(Some(gzip(csv)), storage.clone(), 10);

        let summary = driver.run().await.unwrap();

        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.total_inserted, 7);
        assert_eq!(summary.rows_dropped, 0);
        assert_eq!(storage.state.lock().unwrap().rows.len(), 2);
    }

    #[tokio::test]
    async fn test_short_rows_load_with_null_tail() {
        let csv = "name,age,email,country\nAlice,30,a@x.com,US\nBob,25,b@x.com\n";
        let storage = MemoryStorage::default();
        let (driver, _) = driver(Some(gzip(csv)), storage.clone(), 10);

        let summary = driver.run().await.unwrap();

        assert_eq!(summary.total_inserted, 2);
        let state = storage.state.lock().unwrap();
        assert_eq!(state.rows[1].name.as_deref(), Some("Bob"));
        assert_eq!(state.rows[1].country, None);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_fatal() {
        let storage = MemoryStorage::default();
        let (driver, _) = driver(Some(b"not gzip at all".to_vec()), storage.clone(), 10);

        let err = driver.run().await.unwrap_err();

        assert!(matches!(err, EtlError::CsvError(_)));
        assert!(storage.state.lock().unwrap().rows.is_empty());
    }
}
