use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use tokio::sync::Mutex;
use tracing::{info, trace};

use crate::error::DataAccessError;
use crate::store::DataStore;
use crate::table::Table;

/// Memoized full-table load.
///
/// The table lives until [`TableCache::refresh`] or process exit. Concurrent
/// first callers wait on a single load; a failed load is not cached.
#[derive(Default)]
pub struct TableCache {
    table: Mutex<Option<Arc<Table>>>,
    loads: AtomicU64,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, store: &dyn DataStore) -> Result<Arc<Table>, DataAccessError> {
        let mut cached = self.table.lock().await;
        if let Some(table) = cached.as_ref() {
            trace!(rows = table.len(), "table cache hit");
            return Ok(table.clone());
        }
        let load = self.loads.fetch_add(1, Ordering::Relaxed) + 1;
        let start = Instant::now();
        let table = Arc::new(store.load_all().await?);
        info!(
            table = store.table_name(),
            load,
            rows = table.len(),
            elapsed = ?start.elapsed(),
            "loaded table"
        );
        *cached = Some(table.clone());
        Ok(table)
    }

    pub async fn refresh(&self) {
        let mut cached = self.table.lock().await;
        if cached.take().is_some() {
            info!("table cache cleared");
        }
    }

    #[cfg(test)]
    pub(crate) fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}
