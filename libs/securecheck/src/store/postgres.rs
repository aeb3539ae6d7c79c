use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info};

use super::{DataStore, select_all};
use crate::aggregation::Dialect;
use crate::config::DatabaseConfig;
use crate::error::{DataAccessError, QueryExecutionError};
use crate::table::Table;

/// Reads the stop record table from postgres.
///
/// Nothing is dialed on construction; the first query opens the connection
/// and a closed connection is reopened by the next query.
pub struct PgStore {
    options: tokio_postgres::Config,
    table: String,
    client: Mutex<Option<Arc<Client>>>,
}

impl PgStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        let mut options = tokio_postgres::Config::new();
        options
            .user(&config.user)
            .password(config.password.expose_secret())
            .host(&config.host)
            .port(config.port)
            .dbname(&config.name)
            .application_name("securecheck")
            .options("-c default_transaction_read_only=on");
        PgStore {
            options,
            table: config.table.clone(),
            client: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<Arc<Client>, tokio_postgres::Error> {
        let mut client = self.client.lock().await;
        if let Some(client) = client.as_ref().filter(|c| !c.is_closed()) {
            return Ok(client.clone());
        }
        info!(
            hosts = ?self.options.get_hosts(),
            dbname = ?self.options.get_dbname(),
            "connecting to postgres"
        );
        let (new_client, connection) = self.options.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(?err, "postgres connection terminated");
            }
        });
        let new_client = Arc::new(new_client);
        *client = Some(new_client.clone());
        Ok(new_client)
    }

    async fn run(client: &Client, sql: &str) -> Result<Table, tokio_postgres::Error> {
        let start = Instant::now();
        debug!(sql, "executing query");
        let mut table = Table::default();
        for message in client.simple_query(sql).await? {
            match message {
                SimpleQueryMessage::RowDescription(columns) => {
                    if table.columns.is_empty() {
                        table.columns = columns.iter().map(|c| c.name().to_string()).collect();
                    }
                }
                SimpleQueryMessage::Row(row) => {
                    if table.columns.is_empty() {
                        table.columns = row
                            .columns()
                            .iter()
                            .map(|c| c.name().to_string())
                            .collect();
                    }
                    let cells = (0..row.len()).map(|i| row.get(i).map(str::to_string)).collect();
                    table.rows.push(cells);
                }
                _ => {}
            }
        }
        debug!(rows = table.len(), elapsed = ?start.elapsed(), "query complete");
        Ok(table)
    }
}

#[async_trait]
impl DataStore for PgStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    async fn load_all(&self) -> Result<Table, DataAccessError> {
        let client = self.client().await.map_err(DataAccessError::Connect)?;
        Self::run(&client, &select_all(&self.table))
            .await
            .map_err(|source| DataAccessError::Postgres {
                table: self.table.clone(),
                source,
            })
    }

    async fn execute(&self, sql: &str) -> Result<Table, QueryExecutionError> {
        let client = self.client().await?;
        Ok(Self::run(&client, sql).await?)
    }
}
