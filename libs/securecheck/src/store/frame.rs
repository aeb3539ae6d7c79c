//! In-process store backed by DataFusion, over a CSV or Parquet export of the
//! stop record table or over record batches held in memory.

use std::{path::Path, sync::Arc, time::Instant};

use arrow::{array::RecordBatch, datatypes::SchemaRef};
use async_trait::async_trait;
use datafusion::{
    common::TableReference,
    datasource::MemTable,
    error::DataFusionError,
    execution::context::SQLOptions,
    prelude::{CsvReadOptions, ParquetReadOptions, SessionConfig, SessionContext},
};
use tracing::{debug, info};

use super::{DataStore, select_all};
use crate::aggregation::Dialect;
use crate::error::{DataAccessError, QueryExecutionError};
use crate::model::{StopRecord, stop_record_schema};
use crate::table::Table;

#[derive(Clone)]
pub struct FrameStore {
    ctx: SessionContext,
    table: String,
}

impl FrameStore {
    /// Wraps a context that already has `table` registered.
    pub fn new(ctx: SessionContext, table: impl Into<String>) -> Self {
        FrameStore {
            ctx,
            table: table.into(),
        }
    }

    fn session() -> SessionContext {
        // a single partition keeps scans in file order
        let config = SessionConfig::new().with_target_partitions(1);
        SessionContext::new_with_config(config)
    }

    pub async fn from_csv(path: impl AsRef<Path>, table: &str) -> Result<Self, DataAccessError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataAccessError::FileNotFound(path.to_path_buf()));
        }
        let ctx = Self::session();
        let schema = stop_record_schema();
        let extension = file_extension(path);
        let options = CsvReadOptions::new()
            .has_header(true)
            .schema(&schema)
            .file_extension(&extension);
        ctx.register_csv(TableReference::bare(table), &path.to_string_lossy(), options)
            .await
            .map_err(|source| access_error(table, source))?;
        info!(path = %path.display(), table, "registered csv table");
        Ok(Self::new(ctx, table))
    }

    pub async fn from_parquet(
        path: impl AsRef<Path>,
        table: &str,
    ) -> Result<Self, DataAccessError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataAccessError::FileNotFound(path.to_path_buf()));
        }
        let ctx = Self::session();
        let extension = file_extension(path);
        let options = ParquetReadOptions {
            file_extension: &extension,
            ..Default::default()
        };
        ctx.register_parquet(TableReference::bare(table), &path.to_string_lossy(), options)
            .await
            .map_err(|source| access_error(table, source))?;
        info!(path = %path.display(), table, "registered parquet table");
        Ok(Self::new(ctx, table))
    }

    pub fn from_batches(
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
        table: &str,
    ) -> Result<Self, DataAccessError> {
        let ctx = Self::session();
        let mem_table = MemTable::try_new(schema, vec![batches])
            .map_err(|source| access_error(table, source))?;
        ctx.register_table(TableReference::bare(table), Arc::new(mem_table))
            .map_err(|source| access_error(table, source))?;
        Ok(Self::new(ctx, table))
    }

    pub fn from_records(records: &[StopRecord], table: &str) -> Result<Self, DataAccessError> {
        let batch = StopRecord::as_record_batch(records)?;
        Self::from_batches(batch.schema(), vec![batch], table)
    }

    async fn run(&self, sql: &str) -> Result<Table, DataFusionError> {
        let start = Instant::now();
        debug!(table = %self.table, sql, "executing query");
        let options = SQLOptions::new()
            .with_allow_ddl(false)
            .with_allow_dml(false)
            .with_allow_statements(false);
        let df = self.ctx.sql_with_options(sql, options).await?;
        let columns = df
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        let batches = df.collect().await?;
        let table = Table::from_batches(columns, &batches)?;
        debug!(rows = table.len(), elapsed = ?start.elapsed(), "query complete");
        Ok(table)
    }
}

#[async_trait]
impl DataStore for FrameStore {
    fn dialect(&self) -> Dialect {
        Dialect::DataFusion
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    async fn load_all(&self) -> Result<Table, DataAccessError> {
        self.run(&select_all(&self.table))
            .await
            .map_err(|source| access_error(&self.table, source))
    }

    async fn execute(&self, sql: &str) -> Result<Table, QueryExecutionError> {
        Ok(self.run(sql).await?)
    }
}

fn access_error(table: &str, source: DataFusionError) -> DataAccessError {
    DataAccessError::DataFusion {
        table: table.to_string(),
        source,
    }
}

fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
