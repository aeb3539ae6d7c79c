use arrow::{
    array::{Array, RecordBatch},
    error::ArrowError,
    util::display::{ArrayFormatter, FormatOptions},
};
use serde::{Deserialize, Serialize};
use tabled::builder::Builder;

use crate::error::DataAccessError;

/// A query result with every value converted to its display text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    /// `None` is SQL NULL.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: vec![],
        }
    }

    pub fn from_batches(columns: Vec<String>, batches: &[RecordBatch]) -> Result<Self, ArrowError> {
        let options = FormatOptions::default();
        let mut table = Table::new(columns);
        for batch in batches {
            let formatters = batch
                .columns()
                .iter()
                .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
                .collect::<Result<Vec<_>, _>>()?;
            for row in 0..batch.num_rows() {
                let cells = batch
                    .columns()
                    .iter()
                    .zip(&formatters)
                    .map(|(col, fmt)| {
                        if col.is_null(row) {
                            None
                        } else {
                            Some(fmt.value(row).to_string())
                        }
                    })
                    .collect();
                table.rows.push(cells);
            }
        }
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `row` under the column `name`; missing columns are an access
    /// error, NULL cells are `Ok(None)`.
    pub fn cell(&self, row: usize, name: &str) -> Result<Option<&str>, DataAccessError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DataAccessError::MissingColumn(name.to_string()))?;
        Ok(self
            .rows
            .get(row)
            .and_then(|r| r.get(idx))
            .and_then(|c| c.as_deref()))
    }

    /// Terminal rendering for the CLI.
    pub fn to_tabled(&self) -> tabled::Table {
        let mut builder = Builder::default();
        builder.push_record(self.columns.clone());
        for row in &self.rows {
            builder.push_record(row.iter().map(|c| c.as_deref().unwrap_or("null").to_string()));
        }
        let mut table = builder.build();
        table.with(tabled::settings::style::Style::rounded());
        table
    }
}
