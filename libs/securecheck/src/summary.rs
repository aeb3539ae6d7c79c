use std::fmt;

use serde::Serialize;

use crate::error::DataAccessError;
use crate::model::Column;
use crate::table::Table;

pub const EMPTY_WARNING: &str = "No police logs found.";

/// Narrative summary of the first stop in the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    Stop(StopSummary),
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StopSummary {
    pub driver_age: String,
    pub driver_gender: String,
    pub violation: String,
    pub stop_time: String,
    pub search_conducted: bool,
    pub drugs_related_stop: bool,
}

impl Summary {
    pub fn from_table(table: &Table) -> Result<Self, DataAccessError> {
        if table.is_empty() {
            return Ok(Summary::Empty);
        }
        let text = |column: Column| -> Result<String, DataAccessError> {
            Ok(table
                .cell(0, column.name())?
                .unwrap_or("unknown")
                .to_string())
        };
        let flag = |column: Column| -> Result<bool, DataAccessError> {
            Ok(table.cell(0, column.name())?.is_some_and(parse_bool))
        };
        Ok(Summary::Stop(StopSummary {
            driver_age: text(Column::DriverAge)?,
            driver_gender: text(Column::DriverGender)?,
            violation: text(Column::Violation)?,
            stop_time: text(Column::StopTime)?,
            search_conducted: flag(Column::SearchConducted)?,
            drugs_related_stop: flag(Column::DrugsRelatedStop)?,
        }))
    }
}

impl StopSummary {
    pub fn headline(&self) -> String {
        format!(
            "A {}-year-old {} driver was stopped for {} at {}.",
            self.driver_age, self.driver_gender, self.violation, self.stop_time
        )
    }

    pub fn search_phrase(&self) -> &'static str {
        if self.search_conducted {
            "A search was conducted."
        } else {
            "No search was conducted."
        }
    }

    pub fn drug_phrase(&self) -> &'static str {
        if self.drugs_related_stop {
            "The stop was drug-related."
        } else {
            "It was not drug-related."
        }
    }
}

impl fmt::Display for StopSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.headline(),
            self.search_phrase(),
            self.drug_phrase()
        )
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Stop(stop) => stop.fmt(f),
            Summary::Empty => f.write_str(EMPTY_WARNING),
        }
    }
}

/// Postgres text protocol sends `t`/`f`, arrow formats `true`/`false`.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "t" | "true" | "1" | "y" | "yes"
    )
}
