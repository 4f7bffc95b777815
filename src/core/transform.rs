use crate::core::mapper::{normalize_label, ColumnMapper};
use crate::domain::model::{CanonicalField, CleanBatch, CleanRecord, RawBatch};
use crate::domain::ports::{PipelineEvent, PipelineObserver};
use std::sync::Arc;

/// Numeric coercion of a raw age cell. `None` when the cell does not parse as a number.
///
/// The value is kept as parsed; NaN counts as missing.
pub fn coerce_age(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|age| !age.is_nan())
}

pub fn clean_email(raw: Option<&str>) -> Option<String> {
    raw.map(|email| email.to_lowercase().trim().to_string())
}

/// Maps, cleans and filters one raw batch.
pub struct ChunkTransformer {
    mapper: ColumnMapper,
    observer: Arc<dyn PipelineObserver>,
}

impl ChunkTransformer {
    pub fn new(mapper: ColumnMapper, observer: Arc<dyn PipelineObserver>) -> Self {
        Self { mapper, observer }
    }

    /// Returns an empty batch when the columns cannot all be inferred; a
    /// zero-row result is never an error.
    pub fn transform(&self, batch: RawBatch) -> CleanBatch {
        self.observer
            .on_event(&PipelineEvent::RawColumns(batch.columns.clone()));
        self.observer.on_event(&PipelineEvent::NormalizedColumns(
            batch.columns.iter().map(|c| normalize_label(c)).collect(),
        ));

        let column_map = self.mapper.infer(batch.columns.as_slice());
        self.observer
            .on_event(&PipelineEvent::ColumnsMapped(column_map.clone()));

        // 任一欄位缺失就整批略過
        let (Some(name_idx), Some(age_idx), Some(email_idx), Some(country_idx)) = (
            column_map.get(CanonicalField::Name).map(|c| c.index),
            column_map.get(CanonicalField::Age).map(|c| c.index),
            column_map.get(CanonicalField::Email).map(|c| c.index),
            column_map.get(CanonicalField::Country).map(|c| c.index),
        ) else {
            self.observer.on_event(&PipelineEvent::ChunkRejected {
                missing: column_map.missing(),
            });
            return CleanBatch::new();
        };

        let input_rows = batch.len();
        let cell = |row: &[Option<String>], index: usize| -> Option<String> {
            row.get(index).cloned().flatten()
        };

        let cleaned: CleanBatch = batch
            .rows
            .iter()
            .filter_map(|row| {
                let email = clean_email(row.get(email_idx).and_then(|v| v.as_deref()))?;
                let age = coerce_age(row.get(age_idx).and_then(|v| v.as_deref()))?;
                Some(CleanRecord {
                    name: cell(row, name_idx),
                    age,
                    email,
                    country: cell(row, country_idx),
                })
            })
            .collect();

        self.observer.on_event(&PipelineEvent::ChunkTransformed {
            input_rows,
            output_rows: cleaned.len(),
        });

        cleaned
    }
}
