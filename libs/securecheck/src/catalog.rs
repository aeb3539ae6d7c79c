//! The fixed set of preset insights offered in the dashboard's selector.

use std::sync::LazyLock;

use serde::Serialize;

use crate::aggregation::{Aggregation, Dialect, Dimension, Having, Measure, Predicate};
use crate::model::Column;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Group {
    Vehicle,
    Demographic,
    Time,
    Violation,
    Location,
    CrossCutting,
}

impl Group {
    pub fn title(self) -> &'static str {
        match self {
            Group::Vehicle => "Vehicle-Based",
            Group::Demographic => "Demographic-Based",
            Group::Time => "Time & Duration-Based",
            Group::Violation => "Violation-Based",
            Group::Location => "Location-Based",
            Group::CrossCutting => "Complex Analysis",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryDefinition {
    pub label: &'static str,
    pub group: Group,
    pub aggregation: Aggregation,
}

impl QueryDefinition {
    pub fn sql(&self, table: &str, dialect: Dialect) -> String {
        self.aggregation.to_sql(table, dialect)
    }
}

#[derive(Debug)]
pub struct Catalog {
    definitions: Vec<QueryDefinition>,
}

static CATALOG: LazyLock<Catalog> = LazyLock::new(Catalog::new);

impl Catalog {
    pub fn global() -> &'static Catalog {
        &CATALOG
    }

    fn new() -> Self {
        use Column::*;
        let def = |label, group, aggregation| QueryDefinition {
            label,
            group,
            aggregation,
        };
        let definitions = vec![
            def(
                "Top 10 Drug-Related Vehicle Numbers",
                Group::Vehicle,
                Aggregation::new()
                    .by_column(VehicleNumber)
                    .measure(Measure::count("count"))
                    .filter(Predicate::Contains(Violation, "drug"))
                    .desc("count")
                    .limit(10),
            ),
            def(
                "Most Frequently Searched Vehicles",
                Group::Vehicle,
                Aggregation::new()
                    .by_column(VehicleNumber)
                    .measure(Measure::count("search_count"))
                    .filter(Predicate::IsTrue(SearchConducted))
                    .desc("search_count")
                    .limit(10),
            ),
            def(
                "Highest Arrest Rate by Driver Age Group",
                Group::Demographic,
                Aggregation::new()
                    .by_column(DriverAge)
                    .measure(Measure::rate(IsArrested, "arrest_rate"))
                    .desc("arrest_rate")
                    .limit(5),
            ),
            def(
                "Gender Distribution by Country",
                Group::Demographic,
                Aggregation::new()
                    .by_column(CountryName)
                    .by_column(DriverGender)
                    .measure(Measure::count("count"))
                    .asc("country_name")
                    .desc("count"),
            ),
            def(
                "Race-Gender Combination with Highest Search Rate",
                Group::Demographic,
                Aggregation::new()
                    .by_column(DriverRace)
                    .by_column(DriverGender)
                    .measure(Measure::rate(SearchConducted, "search_rate"))
                    .desc("search_rate")
                    .limit(1),
            ),
            def(
                "Peak Traffic Stop Time of Day",
                Group::Time,
                Aggregation::new()
                    .by(Dimension::Hour(StopTime))
                    .measure(Measure::count("stop_count"))
                    .desc("stop_count"),
            ),
            def(
                "Average Stop Duration by Violation",
                Group::Time,
                Aggregation::new()
                    .by_column(Violation)
                    .measure(Measure::average(StopDuration, "avg_duration"))
                    .desc("avg_duration"),
            ),
            def(
                "Nighttime Stops Leading to Arrest",
                Group::Time,
                Aggregation::new()
                    .measure(Measure::count("night_arrests"))
                    .filter(Predicate::HourBetween(StopTime, 20, 23))
                    .filter(Predicate::IsTrue(IsArrested)),
            ),
            def(
                "Violations Most Associated with Searches or Arrests",
                Group::Violation,
                Aggregation::new()
                    .by_column(Violation)
                    .measure(Measure::count("total_stops"))
                    .measure(Measure::count_where(SearchConducted, "searches"))
                    .measure(Measure::count_where(IsArrested, "arrests"))
                    .desc("searches")
                    .desc("arrests")
                    .limit(5),
            ),
            def(
                "Most Common Violations Among Drivers Under 25",
                Group::Violation,
                Aggregation::new()
                    .by_column(Violation)
                    .measure(Measure::count("count"))
                    .filter(Predicate::LessThan(DriverAge, 25))
                    .desc("count")
                    .limit(5),
            ),
            def(
                "Violations That Rarely Lead to Search or Arrest",
                Group::Violation,
                Aggregation::new()
                    .by_column(Violation)
                    .measure(Measure::count("total"))
                    .measure(Measure::count_where(SearchConducted, "searches"))
                    .measure(Measure::count_where(IsArrested, "arrests"))
                    .having(Having::NoneWhere(SearchConducted))
                    .having(Having::NoneWhere(IsArrested))
                    .desc("total"),
            ),
            def(
                "Countries with Most Drug-Related Stops",
                Group::Location,
                Aggregation::new()
                    .by_column(CountryName)
                    .measure(Measure::count("drug_stops"))
                    .filter(Predicate::Contains(Violation, "drug"))
                    .desc("drug_stops"),
            ),
            def(
                "Arrest Rate by Country and Violation",
                Group::Location,
                Aggregation::new()
                    .by_column(CountryName)
                    .by_column(Violation)
                    .measure(Measure::rate(IsArrested, "arrest_rate"))
                    .desc("arrest_rate"),
            ),
            def(
                "Country with Most Searches Conducted",
                Group::Location,
                Aggregation::new()
                    .by_column(CountryName)
                    .measure(Measure::count("search_count"))
                    .filter(Predicate::IsTrue(SearchConducted))
                    .desc("search_count")
                    .limit(1),
            ),
            def(
                "Yearly Breakdown of Stops and Arrests by Country",
                Group::CrossCutting,
                Aggregation::new()
                    .by_column(CountryName)
                    .by(Dimension::Year(StopDate))
                    .measure(Measure::count("total_stops"))
                    .measure(Measure::count_where(IsArrested, "total_arrests"))
                    .measure(Measure::rate(IsArrested, "arrest_rate"))
                    .asc("year")
                    .asc("country_name"),
            ),
        ];
        Catalog { definitions }
    }

    pub fn definitions(&self) -> &[QueryDefinition] {
        &self.definitions
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.iter().map(|d| d.label)
    }

    /// Exact, case-sensitive label match.
    pub fn get(&self, label: &str) -> Option<&QueryDefinition> {
        self.definitions.iter().find(|d| d.label == label)
    }

    /// SQL for the selected label; `None` before anything is selected or for
    /// a label the catalog does not know.
    pub fn resolve(&self, selected: Option<&str>, table: &str, dialect: Dialect) -> Option<String> {
        let definition = self.get(selected?)?;
        Some(definition.sql(table, dialect))
    }

    /// Definitions bucketed by group, in catalog order.
    pub fn groups(&self) -> Vec<(Group, Vec<&QueryDefinition>)> {
        let mut groups: Vec<(Group, Vec<&QueryDefinition>)> = vec![];
        for definition in &self.definitions {
            match groups.iter_mut().find(|(g, _)| *g == definition.group) {
                Some((_, defs)) => defs.push(definition),
                None => groups.push((definition.group, vec![definition])),
            }
        }
        groups
    }
}
