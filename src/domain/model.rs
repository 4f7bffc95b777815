use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four fields every loaded row must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Name,
    Age,
    Email,
    Country,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::Name,
        CanonicalField::Age,
        CanonicalField::Email,
        CanonicalField::Country,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Age => "age",
            CanonicalField::Email => "email",
            CanonicalField::Country => "country",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to resolve several labels matching the same canonical field.
///
/// `LastWins` keeps the right-most matching column and is the default, so a
/// later duplicate-like column (`name`, `name_2`) replaces an earlier one.
/// `FirstWins` keeps the left-most match instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    #[serde(alias = "last")]
    LastWins,
    #[serde(alias = "first")]
    FirstWins,
}

/// A raw cell; `None` when the source field was empty or a null token.
pub type RawValue = Option<String>;

/// One slice of the source file, rows aligned with `columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawBatch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedColumn {
    pub index: usize,
    pub label: String,
}

/// Canonical field to the normalized source column inferred to hold it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    entries: BTreeMap<CanonicalField, MappedColumn>,
}

impl ColumnMap {
    pub fn insert(&mut self, field: CanonicalField, column: MappedColumn) {
        self.entries.insert(field, column);
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn get(&self, field: CanonicalField) -> Option<&MappedColumn> {
        self.entries.get(&field)
    }

    pub fn label(&self, field: CanonicalField) -> Option<&str> {
        self.entries.get(&field).map(|c| c.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.entries.len() == CanonicalField::ALL.len()
    }

    pub fn missing(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| !self.entries.contains_key(f))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalField, &MappedColumn)> {
        self.entries.iter()
    }
}

impl fmt::Display for ColumnMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (field, column)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field, column.label)?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub name: Option<String>,
    /// Never NaN. Integral values load as INTEGER, others as REAL.
    pub age: f64,
    pub email: String,
    pub country: Option<String>,
}

pub type CleanBatch = Vec<CleanRecord>;

/// Outcome of one complete run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub table: String,
    pub total_inserted: usize,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub chunks_processed: usize,
    pub chunks_skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn summary_line(&self) -> String {
        format!("✅ Done. Inserted total rows: {}", self.total_inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_map_missing_fields() {
        let mut map = ColumnMap::default();
        map.insert(
            CanonicalField::Email,
            MappedColumn {
                index: 2,
                label: "email_address".to_string(),
            },
        );

        assert_eq!(map.len(), 1);
        assert!(!map.is_complete());
        assert_eq!(
            map.missing(),
            vec![CanonicalField::Name, CanonicalField::Age, CanonicalField::Country]
        );
        assert_eq!(map.to_string(), "{email: email_address}");
    }

    #[test]
    fn test_canonical_field_serializes_lowercase() {
        let json = serde_json::to_string(&CanonicalField::Country).unwrap();
        assert_eq!(json, "\"country\"");
    }
}
