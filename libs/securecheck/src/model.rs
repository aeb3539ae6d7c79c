//! The stop record table.
//!
//! Catalog queries and the summary refer to columns only through [`Column`],
//! whose names match the table verbatim.

use std::{fmt, sync::Arc};

use arrow::{
    array::{ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, RecordBatch, StringArray},
    datatypes::{DataType, Date32Type, Field, Schema, SchemaRef},
    error::ArrowError,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE: &str = "police_logs";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    CountryName,
    StopDate,
    StopTime,
    DriverGender,
    DriverAgeRaw,
    DriverAge,
    DriverRace,
    ViolationRaw,
    Violation,
    SearchConducted,
    SearchType,
    StopOutcome,
    IsArrested,
    StopDuration,
    DrugsRelatedStop,
    VehicleNumber,
}

impl Column {
    pub const ALL: [Column; 16] = [
        Column::CountryName,
        Column::StopDate,
        Column::StopTime,
        Column::DriverGender,
        Column::DriverAgeRaw,
        Column::DriverAge,
        Column::DriverRace,
        Column::ViolationRaw,
        Column::Violation,
        Column::SearchConducted,
        Column::SearchType,
        Column::StopOutcome,
        Column::IsArrested,
        Column::StopDuration,
        Column::DrugsRelatedStop,
        Column::VehicleNumber,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Column::CountryName => "country_name",
            Column::StopDate => "stop_date",
            Column::StopTime => "stop_time",
            Column::DriverGender => "driver_gender",
            Column::DriverAgeRaw => "driver_age_raw",
            Column::DriverAge => "driver_age",
            Column::DriverRace => "driver_race",
            Column::ViolationRaw => "violation_raw",
            Column::Violation => "violation",
            Column::SearchConducted => "search_conducted",
            Column::SearchType => "search_type",
            Column::StopOutcome => "stop_outcome",
            Column::IsArrested => "is_arrested",
            Column::StopDuration => "stop_duration",
            Column::DrugsRelatedStop => "drugs_related_stop",
            Column::VehicleNumber => "vehicle_number",
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            Column::StopDate => DataType::Date32,
            Column::DriverAgeRaw | Column::DriverAge => DataType::Int64,
            Column::StopDuration => DataType::Float64,
            Column::SearchConducted | Column::IsArrested | Column::DrugsRelatedStop => {
                DataType::Boolean
            }
            _ => DataType::Utf8,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arrow schema for the stop record table, in column order.
pub fn stop_record_schema() -> SchemaRef {
    let fields: Vec<Field> = Column::ALL
        .iter()
        .map(|c| Field::new(c.name(), c.data_type(), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// A single traffic stop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub country_name: Option<String>,
    pub stop_date: Option<NaiveDate>,
    pub stop_time: Option<NaiveTime>,
    pub driver_gender: Option<String>,
    pub driver_age_raw: Option<i64>,
    pub driver_age: Option<i64>,
    pub driver_race: Option<String>,
    pub violation_raw: Option<String>,
    pub violation: Option<String>,
    pub search_conducted: Option<bool>,
    pub search_type: Option<String>,
    pub stop_outcome: Option<String>,
    pub is_arrested: Option<bool>,
    pub stop_duration: Option<f64>,
    pub drugs_related_stop: Option<bool>,
    pub vehicle_number: Option<String>,
}

impl StopRecord {
    pub fn as_record_batch(records: &[StopRecord]) -> Result<RecordBatch, ArrowError> {
        let columns = Column::ALL
            .iter()
            .map(|&column| column_array(records, column))
            .collect::<Vec<_>>();
        RecordBatch::try_new(stop_record_schema(), columns)
    }
}

fn column_array(records: &[StopRecord], column: Column) -> ArrayRef {
    fn text(records: &[StopRecord], f: impl Fn(&StopRecord) -> Option<&str>) -> ArrayRef {
        Arc::new(records.iter().map(f).collect::<StringArray>())
    }
    fn int(records: &[StopRecord], f: impl Fn(&StopRecord) -> Option<i64>) -> ArrayRef {
        Arc::new(records.iter().map(f).collect::<Int64Array>())
    }
    fn boolean(records: &[StopRecord], f: impl Fn(&StopRecord) -> Option<bool>) -> ArrayRef {
        Arc::new(records.iter().map(f).collect::<BooleanArray>())
    }

    match column {
        Column::CountryName => text(records, |r| r.country_name.as_deref()),
        Column::StopDate => Arc::new(
            records
                .iter()
                .map(|r| r.stop_date.map(Date32Type::from_naive_date))
                .collect::<Date32Array>(),
        ),
        Column::StopTime => Arc::new(
            records
                .iter()
                .map(|r| r.stop_time.map(|t| t.format("%H:%M:%S").to_string()))
                .collect::<StringArray>(),
        ),
        Column::DriverGender => text(records, |r| r.driver_gender.as_deref()),
        Column::DriverAgeRaw => int(records, |r| r.driver_age_raw),
        Column::DriverAge => int(records, |r| r.driver_age),
        Column::DriverRace => text(records, |r| r.driver_race.as_deref()),
        Column::ViolationRaw => text(records, |r| r.violation_raw.as_deref()),
        Column::Violation => text(records, |r| r.violation.as_deref()),
        Column::SearchConducted => boolean(records, |r| r.search_conducted),
        Column::SearchType => text(records, |r| r.search_type.as_deref()),
        Column::StopOutcome => text(records, |r| r.stop_outcome.as_deref()),
        Column::IsArrested => boolean(records, |r| r.is_arrested),
        Column::StopDuration => Arc::new(
            records
                .iter()
                .map(|r| r.stop_duration)
                .collect::<Float64Array>(),
        ),
        Column::DrugsRelatedStop => boolean(records, |r| r.drugs_related_stop),
        Column::VehicleNumber => text(records, |r| r.vehicle_number.as_deref()),
    }
}
