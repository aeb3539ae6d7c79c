//! SecureCheck: a read-only dashboard over a table of police traffic stops.
//!
//! The full table is loaded once through a [`TableCache`] and shown alongside
//! a narrative [`Summary`] of its first row. A fixed [`Catalog`] of preset
//! aggregations can be selected and run against the same [`DataStore`].

pub mod aggregation;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod render;
pub mod store;
pub mod summary;
pub mod table;
pub mod web;

pub use aggregation::{Aggregation, Dialect};
pub use cache::TableCache;
pub use catalog::{Catalog, Group, QueryDefinition};
pub use config::Config;
pub use dashboard::{Dashboard, Page, Selected};
pub use error::{DataAccessError, Error, ErrorResponse, QueryExecutionError};
pub use model::{Column, DEFAULT_TABLE, StopRecord, stop_record_schema};
#[cfg(feature = "postgres")]
pub use store::PgStore;
pub use store::{DataStore, FrameStore};
pub use summary::Summary;
pub use table::Table;
