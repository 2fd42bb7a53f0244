//! Snapshot source: the OEE table exported to Parquet/CSV, or an Arrow batch,
//! queried through DataFusion with the same fixed projection as the database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::config::ConfigOptions;
use datafusion::datasource::MemTable;
use datafusion::error::DataFusionError;
use datafusion::prelude::*;

use super::column_helpers::col_opt_strings;
use super::{COLUMNS, RecordSource, fixed_query, validate_table_name};
use crate::error::LoadError;
use crate::record::RawRecord;

/// Where the snapshot rows come from
#[derive(Debug, Clone)]
pub enum SnapshotInput {
    Parquet(PathBuf),
    Csv(PathBuf),
    /// In-memory batch (tests, embedding)
    Batch(RecordBatch),
}

impl SnapshotInput {
    /// Pick the reader from the file extension; anything but `.csv` is Parquet.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            SnapshotInput::Csv(path)
        } else {
            SnapshotInput::Parquet(path)
        }
    }

    fn path(&self) -> &Path {
        match self {
            SnapshotInput::Parquet(p) | SnapshotInput::Csv(p) => p,
            SnapshotInput::Batch(_) => Path::new("<memory>"),
        }
    }
}

pub struct SnapshotSource {
    input: SnapshotInput,
    table: String,
}

/// Create a fresh SessionContext sized for a single small table
fn create_session_context() -> SessionContext {
    let mut config = ConfigOptions::new();
    config.execution.target_partitions = 1; // One small table; also keeps file row order
    config.execution.batch_size = 4096;
    SessionContext::new_with_config(config.into())
}

impl SnapshotSource {
    pub fn new(input: SnapshotInput, table: impl Into<String>) -> Result<Self, LoadError> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { input, table })
    }

    fn snapshot_error(&self, source: DataFusionError) -> LoadError {
        LoadError::Snapshot {
            path: self.input.path().to_path_buf(),
            source,
        }
    }

    async fn register(&self, ctx: &SessionContext) -> Result<(), DataFusionError> {
        match &self.input {
            SnapshotInput::Parquet(path) => {
                ctx.register_parquet(
                    self.table.as_str(),
                    path.to_string_lossy().as_ref(),
                    ParquetReadOptions::default(),
                )
                .await
            }
            SnapshotInput::Csv(path) => {
                let path = path.to_string_lossy().into_owned();
                // Header names only; every cell is read back as written
                let header = ctx
                    .read_csv(path.as_str(), CsvReadOptions::new().has_header(true))
                    .await?;
                let schema = Schema::new(
                    header
                        .schema()
                        .fields()
                        .iter()
                        .map(|f| Field::new(f.name(), DataType::Utf8, true))
                        .collect::<Vec<_>>(),
                );
                ctx.register_csv(
                    self.table.as_str(),
                    &path,
                    CsvReadOptions::new().has_header(true).schema(&schema),
                )
                .await
            }
            SnapshotInput::Batch(batch) => {
                let mem_table = MemTable::try_new(batch.schema(), vec![vec![batch.clone()]])?;
                ctx.register_table(self.table.as_str(), Arc::new(mem_table))?;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RecordSource for SnapshotSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>, LoadError> {
        // Fresh context per fetch: nothing cached inside DataFusion outlives a load
        let ctx = create_session_context();
        self.register(&ctx)
            .await
            .map_err(|e| self.snapshot_error(e))?;

        let available: Vec<String> = ctx
            .table(self.table.as_str())
            .await
            .map_err(|e| self.snapshot_error(e))?
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let sql = fixed_query(&self.table, "VARCHAR", &available, '"')?;

        let batches = ctx
            .sql(&sql)
            .await
            .map_err(|e| self.snapshot_error(e))?
            .collect()
            .await
            .map_err(|e| self.snapshot_error(e))?;

        let mut rows = Vec::new();
        for batch in &batches {
            let mut columns = Vec::with_capacity(COLUMNS.len());
            for idx in 0..COLUMNS.len() {
                columns.push(
                    col_opt_strings(batch, idx).map_err(|detail| LoadError::Decode { detail })?,
                );
            }
            for i in 0..batch.num_rows() {
                let cell = |c: usize| columns[c][i].clone();
                rows.push(RawRecord {
                    inicio: cell(0),
                    linha: cell(1),
                    producao: cell(2),
                    rejeito: cell(3),
                    oee: cell(4),
                    performance: cell(5),
                    disponibilidade: cell(6),
                    qualidade: cell(7),
                    produzindo: cell(8),
                    parada: cell(9),
                    disponivel: cell(10),
                });
            }
        }
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("snapshot {} ({})", self.input.path().display(), self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{ArrayRef, Float64Array, StringArray};
    use datafusion::parquet::arrow::ArrowWriter;

    use crate::record::{Measure, Record};

    fn oee_batch() -> RecordBatch {
        let text = |name: &str| Field::new(name, DataType::Utf8, true);
        let num = |name: &str| Field::new(name, DataType::Float64, true);
        let schema = Schema::new(vec![
            text("inicio"),
            text("linha"),
            num("producao"),
            num("rejeito"),
            num("oee"),
            num("performance"),
            num("disponibilidade"),
            num("qualidade"),
            num("produzindo"),
            num("parada"),
            num("disponivel"),
        ]);
        let nums = |v: [Option<f64>; 3]| Arc::new(Float64Array::from(v.to_vec())) as ArrayRef;
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![
                Some("2024-01-10 07:00:00"),
                None,
                Some("2024-02-03 07:00:00"),
            ])),
            Arc::new(StringArray::from(vec![Some("A"), Some("A"), Some("B")])),
            nums([Some(100.0), Some(5.0), None]),
            nums([Some(2.0), None, None]),
            nums([Some(72.4), None, Some(80.0)]),
            nums([None, None, None]),
            nums([None, None, None]),
            nums([None, None, None]),
            nums([Some(120.0), None, Some(60.0)]),
            nums([Some(30.0), None, None]),
            nums([Some(150.0), None, None]),
        ];
        RecordBatch::try_new(Arc::new(schema), columns).unwrap()
    }

    #[tokio::test]
    async fn batch_snapshot_answers_fixed_query() {
        let source =
            SnapshotSource::new(SnapshotInput::Batch(oee_batch()), "tbl_oee_moinho").unwrap();

        let rows = source.fetch().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].linha.as_deref(), Some("A"));
        assert_eq!(rows[1].inicio, None);
        assert_eq!(rows[2].producao, None);

        let records: Vec<Record> = rows.iter().filter_map(Record::from_raw).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].measure(Measure::Producao), Some(100.0));
        assert_eq!(records[0].measure(Measure::Oee), Some(72.4));
        assert_eq!(records[1].measure(Measure::Produzindo), Some(60.0));
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cori-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn csv_cells_come_back_as_written() {
        let dir = scratch_dir("csv-snapshot");
        let path = dir.join("oee.csv");
        std::fs::write(
            &path,
            "inicio,linha,producao,oee\n\
             2024-01-10 07:00:00,01,100,72.40\n\
             2024-01-11 07:00:00,02,50,\n",
        )
        .unwrap();

        let source = SnapshotSource::new(SnapshotInput::from_path(&path), "tbl_oee_moinho").unwrap();
        let rows = source.fetch().await.unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].inicio.as_deref(), Some("2024-01-10 07:00:00"));
        assert_eq!(rows[0].linha.as_deref(), Some("01"));
        assert_eq!(rows[0].oee.as_deref(), Some("72.40"));
        assert_eq!(rows[1].linha.as_deref(), Some("02"));
        assert_eq!(rows[1].oee, None);
        assert_eq!(rows[0].parada, None);

        let record = Record::from_raw(&rows[0]).unwrap();
        assert_eq!(record.linha.as_deref(), Some("01"));
        assert_eq!(record.measure(Measure::Oee), Some(72.4));
    }

    #[tokio::test]
    async fn parquet_file_loads_like_the_batch() {
        let dir = scratch_dir("parquet-snapshot");
        let path = dir.join("oee.parquet");
        let batch = oee_batch();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let source = SnapshotSource::new(SnapshotInput::from_path(&path), "tbl_oee_moinho").unwrap();
        let rows = source.fetch().await.unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].inicio.as_deref(), Some("2024-01-10 07:00:00"));
        let records: Vec<Record> = rows.iter().filter_map(Record::from_raw).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].measure(Measure::Disponivel), Some(150.0));
    }

    #[tokio::test]
    async fn table_with_only_some_measures_still_loads() {
        let schema = Schema::new(vec![
            Field::new("inicio", DataType::Utf8, true),
            Field::new("linha", DataType::Utf8, true),
            Field::new("producao", DataType::Float64, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![Some("2024-03-01 06:00:00")])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("A")])),
                Arc::new(Float64Array::from(vec![Some(42.0)])),
            ],
        )
        .unwrap();

        let source = SnapshotSource::new(SnapshotInput::Batch(batch), "tbl_oee_moinho").unwrap();
        let rows = source.fetch().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].disponivel, None);
        assert_eq!(rows[0].parada, None);

        let record = Record::from_raw(&rows[0]).unwrap();
        assert_eq!(record.measure(Measure::Producao), Some(42.0));
        assert_eq!(record.measure(Measure::Disponivel), None);
    }

    #[tokio::test]
    async fn snapshot_without_timestamp_is_rejected() {
        let schema = Schema::new(vec![Field::new("linha", DataType::Utf8, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec![Some("A")])) as ArrayRef],
        )
        .unwrap();

        let source = SnapshotSource::new(SnapshotInput::Batch(batch), "tbl_oee_moinho").unwrap();
        assert!(matches!(
            source.fetch().await,
            Err(LoadError::MissingColumn { column, .. }) if column == "inicio"
        ));
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let source = SnapshotSource::new(
            SnapshotInput::from_path("/nonexistent/oee.parquet"),
            "tbl_oee_moinho",
        )
        .unwrap();
        assert!(matches!(
            source.fetch().await,
            Err(LoadError::Snapshot { .. })
        ));
    }

    #[test]
    fn extension_selects_reader() {
        assert!(matches!(
            SnapshotInput::from_path("dump.CSV"),
            SnapshotInput::Csv(_)
        ));
        assert!(matches!(
            SnapshotInput::from_path("dump.parquet"),
            SnapshotInput::Parquet(_)
        ));
    }
}
