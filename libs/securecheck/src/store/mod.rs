use std::sync::Arc;

use async_trait::async_trait;

use crate::aggregation::{Dialect, quote_ident};
use crate::config::{Config, SourceConfig};
use crate::error::{DataAccessError, QueryExecutionError};
use crate::table::Table;

mod frame;
#[cfg(feature = "postgres")]
mod postgres;

pub use frame::FrameStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

/// Read-only access to the stop record table.
#[async_trait]
pub trait DataStore: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn table_name(&self) -> &str;

    /// Every row of the table in the engine's natural order.
    async fn load_all(&self) -> Result<Table, DataAccessError>;

    async fn execute(&self, sql: &str) -> Result<Table, QueryExecutionError>;
}

pub(crate) fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", quote_ident(table))
}

/// Builds the store named by `config`: a file source when one is set,
/// postgres otherwise.
pub async fn open(config: &Config) -> Result<Arc<dyn DataStore>, DataAccessError> {
    let table = &config.database.table;
    match &config.source {
        Some(SourceConfig::Csv { path }) => Ok(Arc::new(FrameStore::from_csv(path, table).await?)),
        Some(SourceConfig::Parquet { path }) => {
            Ok(Arc::new(FrameStore::from_parquet(path, table).await?))
        }
        #[cfg(feature = "postgres")]
        None => Ok(Arc::new(PgStore::new(&config.database))),
        #[cfg(not(feature = "postgres"))]
        None => Err(DataAccessError::NoSource),
    }
}
