//! Dashboard state and the handlers bound to its controls.
//!
//! Selecting a query only resolves it; nothing touches the store until the
//! run trigger fires. The full table is read through the [`TableCache`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::TableCache;
use crate::catalog::{Catalog, Group, QueryDefinition};
use crate::error::{DataAccessError, QueryExecutionError};
use crate::store::DataStore;
use crate::summary::Summary;
use crate::table::Table;

pub const TITLE: &str = "SecureCheck Police Logs Dashboard";

pub struct Dashboard {
    store: Arc<dyn DataStore>,
    cache: TableCache,
    catalog: &'static Catalog,
}

/// A resolved selector choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Selected {
    pub label: &'static str,
    pub group: Group,
    pub sql: String,
}

/// Everything one render of the page shows, in display order.
#[derive(Debug)]
pub struct Page {
    pub title: &'static str,
    pub table: Arc<Table>,
    pub summary: Summary,
    pub options: Vec<(Group, Vec<&'static str>)>,
    pub selected: Option<Selected>,
    /// A label was requested that the catalog does not know.
    pub unknown_selection: Option<String>,
    /// Present only after the run trigger.
    pub result: Option<Result<Table, QueryExecutionError>>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Dashboard {
            store,
            cache: TableCache::new(),
            catalog: Catalog::global(),
        }
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    pub async fn table(&self) -> Result<Arc<Table>, DataAccessError> {
        self.cache.get(self.store.as_ref()).await
    }

    pub async fn summary(&self) -> Result<Summary, DataAccessError> {
        let table = self.table().await?;
        Summary::from_table(&table)
    }

    /// Selector handler.
    pub fn on_select(&self, label: Option<&str>) -> Option<Selected> {
        let definition = self.catalog.get(label?)?;
        Some(self.resolve(definition))
    }

    /// Run-trigger handler. Failures come back as values for inline display.
    pub async fn on_run(&self, label: Option<&str>) -> Result<Table, QueryExecutionError> {
        let label = label.ok_or(QueryExecutionError::NoSelection)?;
        let selected = self
            .on_select(Some(label))
            .ok_or_else(|| QueryExecutionError::UnknownQuery(label.to_string()))?;
        info!(label = selected.label, "running query");
        match self.store.execute(&selected.sql).await {
            Ok(table) => {
                info!(label = selected.label, rows = table.len(), "query finished");
                Ok(table)
            }
            Err(err) => {
                warn!(label = selected.label, %err, "query failed");
                Err(err)
            }
        }
    }

    /// Manual refresh hook for the memoized table.
    pub async fn on_refresh(&self) {
        self.cache.refresh().await;
    }

    pub async fn page(&self, label: Option<&str>) -> Result<Page, DataAccessError> {
        let table = self.table().await?;
        let summary = Summary::from_table(&table)?;
        let selected = self.on_select(label);
        let unknown_selection = match (label, &selected) {
            (Some(label), None) => Some(label.to_string()),
            _ => None,
        };
        Ok(Page {
            title: TITLE,
            table,
            summary,
            options: self
                .catalog
                .groups()
                .into_iter()
                .map(|(group, defs)| (group, defs.iter().map(|d| d.label).collect()))
                .collect(),
            selected,
            unknown_selection,
            result: None,
        })
    }

    /// Page after an explicit run of `label`.
    pub async fn run_page(&self, label: Option<&str>) -> Result<Page, DataAccessError> {
        let mut page = self.page(label).await?;
        page.result = Some(self.on_run(label).await);
        Ok(page)
    }

    fn resolve(&self, definition: &QueryDefinition) -> Selected {
        Selected {
            label: definition.label,
            group: definition.group,
            sql: definition.sql(self.store.table_name(), self.store.dialect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_TABLE, StopRecord};
    use crate::store::FrameStore;

    fn dashboard(records: &[StopRecord]) -> Dashboard {
        let store = FrameStore::from_records(records, DEFAULT_TABLE).unwrap();
        Dashboard::new(Arc::new(store))
    }

    fn record(vehicle: &str, search: bool, drugs: bool) -> StopRecord {
        StopRecord {
            driver_age: Some(41),
            driver_gender: Some("M".to_string()),
            violation: Some("Seatbelt".to_string()),
            search_conducted: Some(search),
            drugs_related_stop: Some(drugs),
            is_arrested: Some(false),
            vehicle_number: Some(vehicle.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_select_does_not_run() {
        let dashboard = dashboard(&[record("A1", false, false)]);
        let page = dashboard
            .page(Some("Most Frequently Searched Vehicles"))
            .await
            .unwrap();
        let selected = page.selected.unwrap();
        assert_eq!(selected.group, Group::Vehicle);
        assert!(selected.sql.contains("\"search_conducted\" = true"));
        assert!(page.result.is_none());
        assert!(page.unknown_selection.is_none());
    }

    #[tokio::test]
    async fn test_initial_state_has_no_selection() {
        let dashboard = dashboard(&[]);
        let page = dashboard.page(None).await.unwrap();
        assert!(page.selected.is_none());
        assert_eq!(page.summary, Summary::Empty);
        assert_eq!(page.options.len(), 6);
        let err = dashboard.on_run(None).await.unwrap_err();
        assert!(matches!(err, QueryExecutionError::NoSelection));
    }

    #[tokio::test]
    async fn test_unknown_label() {
        let dashboard = dashboard(&[record("A1", false, false)]);
        let page = dashboard.run_page(Some("Drop Tables")).await.unwrap();
        assert_eq!(page.unknown_selection.as_deref(), Some("Drop Tables"));
        assert!(matches!(
            page.result,
            Some(Err(QueryExecutionError::UnknownQuery(_)))
        ));
    }

    #[tokio::test]
    async fn test_summary_uses_first_row() {
        let dashboard = dashboard(&[record("A1", true, false), record("B2", false, true)]);
        let Summary::Stop(stop) = dashboard.summary().await.unwrap() else {
            panic!("expected a stop summary");
        };
        assert!(stop.search_conducted);
        assert!(!stop.drugs_related_stop);
        assert_eq!(stop.driver_age, "41");
    }

    #[tokio::test]
    async fn test_run_page_renders_result() {
        let dashboard = dashboard(&[
            record("A1", true, false),
            record("A1", true, false),
            record("B2", true, false),
            record("C3", false, false),
        ]);
        let page = dashboard
            .run_page(Some("Most Frequently Searched Vehicles"))
            .await
            .unwrap();
        let result = page.result.unwrap().unwrap();
        assert_eq!(result.columns, vec!["vehicle_number", "search_count"]);
        assert_eq!(
            result.rows[0],
            vec![Some("A1".to_string()), Some("2".to_string())]
        );
        assert_eq!(result.len(), 2);
        assert_eq!(dashboard.cache.loads(), 1);
    }
}
