use crate::domain::model::RawBatch;
use crate::utils::error::{EtlError, Result};
use flate2::read::MultiGzDecoder;
use std::collections::HashSet;
use std::io::Read;

/// Null tokens recognised when none are configured.
pub const DEFAULT_NULL_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Streams a CSV source in bounded batches.
///
/// The header row is read once; every batch carries a copy of the labels so
/// the column map is inferred per batch.
pub struct BatchReader<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<String>,
    batch_size: usize,
    null_values: HashSet<String>,
    record: csv::StringRecord,
}

impl<R: Read> BatchReader<MultiGzDecoder<R>> {
    /// Wraps a gzip-compressed CSV stream.
    pub fn from_gzip(inner: R, batch_size: usize, null_values: &[String]) -> Result<Self> {
        Self::new(MultiGzDecoder::new(inner), batch_size, null_values)
    }
}

impl<R: Read> BatchReader<R> {
    pub fn new(source: R, batch_size: usize, null_values: &[String]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);
        let columns = reader.headers()?.iter().map(str::to_string).collect();

        Ok(Self {
            reader,
            columns,
            batch_size: batch_size.max(1),
            null_values: null_values.iter().cloned().collect(),
            record: csv::StringRecord::new(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Next batch of up to `batch_size` rows, `None` once the source is exhausted.
    ///
    /// Short rows are padded with nulls; a row wider than the header is an error.
    pub fn next_batch(&mut self) -> Result<Option<RawBatch>> {
        let mut batch = RawBatch::new(self.columns.clone());

        while batch.len() < self.batch_size {
            if !self.reader.read_record(&mut self.record)? {
                break;
            }
            if self.record.len() > self.columns.len() {
                return Err(EtlError::MalformedRowError {
                    line: self.record.position().map(|p| p.line()).unwrap_or_default(),
                    expected: self.columns.len(),
                    found: self.record.len(),
                });
            }
            let mut row: Vec<_> = self
                .record
                .iter()
                .map(|field| {
                    if self.null_values.contains(field) {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect();
            row.resize(self.columns.len(), None);
            batch.rows.push(row);
        }

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}
