//! Data sources for the OEE table.
//!
//! Every source answers the same fixed query (all rows of one table, every
//! column as text) and hands back `RawRecord`s; conversion into `Record`
//! happens once, in `load_records`.

mod column_helpers;
mod mysql;
mod snapshot;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::LoadError;
use crate::record::{RawRecord, Record};

pub use datafusion::error::DataFusionError;
pub use mysql::{MySqlSource, redact_url};
pub use snapshot::{SnapshotInput, SnapshotSource};

/// Column order of the fixed projection.
pub const COLUMNS: [&str; 11] = [
    "inicio",
    "linha",
    "producao",
    "rejeito",
    "oee",
    "performance",
    "disponibilidade",
    "qualidade",
    "produzindo",
    "parada",
    "disponivel",
];

/// The only column a table must have.
pub const TIMESTAMP_COLUMN: &str = "inicio";

/// A tabular source answering the fixed "all rows" query.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every row of the table. Must fail rather than return partial rows.
    async fn fetch(&self) -> Result<Vec<RawRecord>, LoadError>;

    /// Short description for logs. Never includes credentials.
    fn describe(&self) -> String;
}

/// Fixed rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<RawRecord>,
}

impl MemorySource {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch(&self) -> Result<Vec<RawRecord>, LoadError> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} rows)", self.rows.len())
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(name: &str) -> Result<(), LoadError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(LoadError::InvalidTable {
            name: name.to_string(),
        })
    }
}

/// The single query every source runs: the fixed columns of `table` cast to
/// `text_type`, matched case-insensitively against `available`. Missing
/// measure or line columns come back as NULL; `inicio` is required.
pub fn fixed_query(
    table: &str,
    text_type: &str,
    available: &[String],
    quote: char,
) -> Result<String, LoadError> {
    let mut projection = Vec::with_capacity(COLUMNS.len());
    let mut missing = 0usize;
    for col in COLUMNS {
        match available.iter().find(|a| a.eq_ignore_ascii_case(col)) {
            Some(actual) => {
                let escaped = actual.replace(quote, &format!("{quote}{quote}"));
                projection.push(format!(
                    "CAST({quote}{escaped}{quote} AS {text_type}) AS {col}"
                ));
            }
            None if col == TIMESTAMP_COLUMN => {
                return Err(LoadError::MissingColumn {
                    table: table.to_string(),
                    column: col.to_string(),
                });
            }
            None => {
                missing += 1;
                projection.push(format!("CAST(NULL AS {text_type}) AS {col}"));
            }
        }
    }
    if missing > 0 {
        tracing::debug!(table, missing, "projecting absent columns as NULL");
    }
    Ok(format!("SELECT {} FROM {table}", projection.join(", ")))
}

/// Fetch from `source`, drop rows without a usable timestamp and sort by time.
pub async fn load_records(source: &dyn RecordSource) -> Result<Arc<[Record]>, LoadError> {
    let timer = Instant::now();
    let raw = match source.fetch().await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(source = %source.describe(), error = %e, "load failed");
            return Err(e);
        }
    };

    let fetched = raw.len();
    let mut records: Vec<Record> = raw.iter().filter_map(Record::from_raw).collect();
    let dropped = fetched - records.len();
    if dropped > 0 {
        tracing::debug!(dropped, "dropped rows without a valid timestamp");
    }
    records.sort_by_key(|r| r.inicio);

    tracing::info!(
        source = %source.describe(),
        rows = records.len(),
        dropped,
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "records loaded"
    );
    Ok(records.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(inicio: Option<&str>, producao: &str) -> RawRecord {
        RawRecord {
            inicio: inicio.map(str::to_string),
            producao: Some(producao.to_string()),
            ..Default::default()
        }
    }

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn fixed_query_projects_every_column_as_text() {
        let sql = fixed_query("tbl_oee_moinho", "CHAR", &names(&COLUMNS), '`').unwrap();
        assert!(sql.starts_with("SELECT CAST(`inicio` AS CHAR) AS inicio, "));
        assert!(sql.contains("CAST(`disponivel` AS CHAR) AS disponivel"));
        assert!(sql.ends_with(" FROM tbl_oee_moinho"));
    }

    #[test]
    fn absent_measure_columns_are_projected_as_null() {
        let available = names(&["Inicio", "linha", "producao"]);
        let sql = fixed_query("tbl_oee_moinho", "VARCHAR", &available, '"').unwrap();
        assert!(sql.starts_with("SELECT CAST(\"Inicio\" AS VARCHAR) AS inicio, "));
        assert!(sql.contains("CAST(NULL AS VARCHAR) AS parada"));
        assert!(sql.contains("CAST(NULL AS VARCHAR) AS disponivel"));
    }

    #[test]
    fn table_without_timestamp_column_is_rejected() {
        let result = fixed_query("tbl_oee_moinho", "CHAR", &names(&["linha", "producao"]), '`');
        assert!(matches!(
            result,
            Err(LoadError::MissingColumn { column, .. }) if column == "inicio"
        ));
    }

    #[test]
    fn table_names_must_be_identifiers() {
        assert!(validate_table_name("tbl_oee_moinho").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("t; DROP TABLE x").is_err());
        assert!(validate_table_name("1table").is_err());
    }

    #[tokio::test]
    async fn load_drops_bad_timestamps_and_sorts() {
        let source = MemorySource::new(vec![
            raw(Some("2024-02-01 00:00:00"), "50"),
            raw(None, "999"),
            raw(Some("2024-01-01 00:00:00"), "100"),
            raw(Some("garbage"), "999"),
        ]);

        let records = load_records(&source).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].measure(crate::record::Measure::Producao), Some(100.0));
        assert_eq!(records[1].measure(crate::record::Measure::Producao), Some(50.0));
    }
}
