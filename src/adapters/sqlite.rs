use crate::core::{CleanRecord, RecordSink, Storage};
use crate::utils::error::Result;
use crate::utils::validation::validate_sql_identifier;
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// SQLite database file holding the target table.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    path: PathBuf,
    table: String,
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P, table: &str) -> Result<Self> {
        validate_sql_identifier("load.table_name", table)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Storage for SqliteStorage {
    type Sink = SqliteSink;

    fn open(&self) -> Result<SqliteSink> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        tracing::debug!("Opening SQLite database at {}", self.path.display());
        let conn = Connection::open(&self.path)?;
        Ok(SqliteSink {
            conn,
            table: self.table.clone(),
        })
    }

    fn describe(&self) -> String {
        format!("sqlite://{}#{}", self.path.display(), self.table)
    }
}

/// Open connection; closed on drop when the run aborts.
pub struct SqliteSink {
    conn: Connection,
    table: String,
}

impl RecordSink for SqliteSink {
    fn ensure_table(&mut self) -> Result<()> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{}" (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT,
                age     INTEGER,
                email   TEXT,
                country TEXT
            );
            "#,
            self.table
        ))?;
        Ok(())
    }

    /// One transaction per batch, so a later failure leaves this batch committed.
    fn append(&mut self, batch: &[CleanRecord]) -> Result<usize> {
        let sql = format!(
            r#"INSERT INTO "{}" (name, age, email, country) VALUES (?1, ?2, ?3, ?4)"#,
            self.table
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for record in batch {
                stmt.execute(params![
                    record.name,
                    age_value(record.age),
                    record.email,
                    record.country
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Appended {} rows to {}", batch.len(), self.table);
        Ok(batch.len())
    }

    fn finish(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

/// Whole numbers bind as INTEGER, everything else as REAL.
fn age_value(age: f64) -> Value {
    if age.fract() == 0.0 && age >= i64::MIN as f64 && age < i64::MAX as f64 {
        Value::Integer(age as i64)
    } else {
        Value::Real(age)
    }
}
