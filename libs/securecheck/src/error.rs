use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failure to reach the data store or to read the stop record table.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[cfg(feature = "postgres")]
    #[error("failed to connect to postgres: {0}")]
    Connect(#[source] tokio_postgres::Error),
    #[cfg(feature = "postgres")]
    #[error("failed to load table {table:?}: {source}")]
    Postgres {
        table: String,
        #[source]
        source: tokio_postgres::Error,
    },
    #[error("failed to load table {table:?}: {source}")]
    DataFusion {
        table: String,
        #[source]
        source: datafusion::error::DataFusionError,
    },
    #[error("arrow {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("missing column {0:?}")]
    MissingColumn(String),
    #[error("data file not found {0}")]
    FileNotFound(PathBuf),
    #[error("no data source configured")]
    NoSource,
}

/// Failure of a single aggregation statement at run time.
#[derive(Debug, Error)]
pub enum QueryExecutionError {
    #[cfg(feature = "postgres")]
    #[error("postgres: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("datafusion: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),
    #[error("unknown query {0:?}")]
    UnknownQuery(String),
    #[error("no query selected")]
    NoSelection,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load police logs: {0}")]
    DataAccess(#[from] DataAccessError),
    #[error("query execution: {0}")]
    QueryExecution(#[from] QueryExecutionError),
    #[error("config: {0}")]
    Config(#[from] config::ConfigError),
    #[error("render: {0}")]
    Render(#[from] minijinja::Error),
    #[error("io {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub description: String,
}

impl From<DataAccessError> for ErrorResponse {
    fn from(val: DataAccessError) -> Self {
        ErrorResponse {
            description: val.to_string(),
        }
    }
}

impl From<QueryExecutionError> for ErrorResponse {
    fn from(val: QueryExecutionError) -> Self {
        ErrorResponse {
            description: val.to_string(),
        }
    }
}
