//! Engine-agnostic description of a grouped aggregation over the stop record
//! table, rendered to SQL per [`Dialect`].

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::model::Column;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    Postgres,
    DataFusion,
}

impl Dialect {
    fn hour(self, column: Column) -> String {
        let col = quote_ident(column.name());
        match self {
            Dialect::Postgres => format!("EXTRACT(HOUR FROM CAST({col} AS TIME))"),
            // time of day is stored as `HH:MM:SS` text
            Dialect::DataFusion => {
                format!("CAST(split_part(CAST({col} AS VARCHAR), ':', 1) AS BIGINT)")
            }
        }
    }

    fn year(self, column: Column) -> String {
        let col = quote_ident(column.name());
        match self {
            Dialect::Postgres => format!("EXTRACT(YEAR FROM CAST({col} AS DATE))"),
            Dialect::DataFusion => format!("date_part('year', {col})"),
        }
    }

    fn round2(self, expr: &str) -> String {
        match self {
            // ROUND(double precision, int) does not exist in postgres
            Dialect::Postgres => format!("ROUND(CAST({expr} AS NUMERIC), 2)"),
            // fixed scale so whole numbers keep two decimals, as NUMERIC does
            Dialect::DataFusion => format!("CAST(ROUND({expr}, 2) AS DECIMAL(10, 2))"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Column(Column),
    /// Hour of day of a time column, aliased `hour`.
    Hour(Column),
    /// Year of a date column, aliased `year`.
    Year(Column),
}

impl Dimension {
    pub fn alias(&self) -> &'static str {
        match self {
            Dimension::Column(column) => column.name(),
            Dimension::Hour(_) => "hour",
            Dimension::Year(_) => "year",
        }
    }

    pub fn column(&self) -> Column {
        match *self {
            Dimension::Column(c) | Dimension::Hour(c) | Dimension::Year(c) => c,
        }
    }

    fn expr(&self, dialect: Dialect) -> String {
        match *self {
            Dimension::Column(c) => quote_ident(c.name()),
            Dimension::Hour(c) => dialect.hour(c),
            Dimension::Year(c) => dialect.year(c),
        }
    }

    fn select(&self, dialect: Dialect) -> String {
        match self {
            Dimension::Column(c) => quote_ident(c.name()),
            _ => format!("{} AS {}", self.expr(dialect), quote_ident(self.alias())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Measure {
    /// Number of rows in the group.
    Count { alias: &'static str },
    /// Number of rows in the group where a boolean column is true.
    CountWhere {
        column: Column,
        alias: &'static str,
    },
    /// Percentage of rows where a boolean column is true, rounded to 2 decimals.
    Rate {
        column: Column,
        alias: &'static str,
    },
    /// Mean of a numeric column, rounded to 2 decimals.
    Average {
        column: Column,
        alias: &'static str,
    },
}

impl Measure {
    pub fn count(alias: &'static str) -> Self {
        Measure::Count { alias }
    }

    pub fn count_where(column: Column, alias: &'static str) -> Self {
        Measure::CountWhere { column, alias }
    }

    pub fn rate(column: Column, alias: &'static str) -> Self {
        Measure::Rate { column, alias }
    }

    pub fn average(column: Column, alias: &'static str) -> Self {
        Measure::Average { column, alias }
    }

    pub fn alias(&self) -> &'static str {
        match *self {
            Measure::Count { alias }
            | Measure::CountWhere { alias, .. }
            | Measure::Rate { alias, .. }
            | Measure::Average { alias, .. } => alias,
        }
    }

    pub fn column(&self) -> Option<Column> {
        match *self {
            Measure::Count { .. } => None,
            Measure::CountWhere { column, .. }
            | Measure::Rate { column, .. }
            | Measure::Average { column, .. } => Some(column),
        }
    }

    fn expr(&self, dialect: Dialect) -> String {
        match *self {
            Measure::Count { .. } => "COUNT(*)".to_string(),
            Measure::CountWhere { column, .. } => format!("SUM({})", indicator(column)),
            Measure::Rate { column, .. } => {
                dialect.round2(&format!("AVG({}) * 100", indicator(column)))
            }
            Measure::Average { column, .. } => {
                dialect.round2(&format!("AVG({})", quote_ident(column.name())))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring match.
    Contains(Column, &'static str),
    IsTrue(Column),
    LessThan(Column, i64),
    /// Hour of day within an inclusive range.
    HourBetween(Column, u32, u32),
}

impl Predicate {
    pub fn column(&self) -> Column {
        match *self {
            Predicate::Contains(c, _)
            | Predicate::IsTrue(c)
            | Predicate::LessThan(c, _)
            | Predicate::HourBetween(c, _, _) => c,
        }
    }

    fn expr(&self, dialect: Dialect) -> String {
        match *self {
            Predicate::Contains(c, needle) => format!(
                "{} ILIKE {}",
                quote_ident(c.name()),
                quote_literal(&format!("%{needle}%"))
            ),
            Predicate::IsTrue(c) => format!("{} = true", quote_ident(c.name())),
            Predicate::LessThan(c, n) => format!("{} < {n}", quote_ident(c.name())),
            Predicate::HourBetween(c, lo, hi) => {
                format!("{} BETWEEN {lo} AND {hi}", dialect.hour(c))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Having {
    /// No row in the group has the boolean column set.
    NoneWhere(Column),
}

impl Having {
    pub fn column(&self) -> Column {
        match *self {
            Having::NoneWhere(c) => c,
        }
    }

    fn expr(&self) -> String {
        match *self {
            Having::NoneWhere(c) => format!("SUM({}) = 0", indicator(c)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub alias: &'static str,
    pub direction: Direction,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub dimensions: Vec<Dimension>,
    pub measures: Vec<Measure>,
    pub filters: Vec<Predicate>,
    pub having: Vec<Having>,
    pub order: Vec<OrderBy>,
    pub limit: Option<u64>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn by_column(self, column: Column) -> Self {
        self.by(Dimension::Column(column))
    }

    pub fn measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn having(mut self, having: Having) -> Self {
        self.having.push(having);
        self
    }

    pub fn asc(mut self, alias: &'static str) -> Self {
        self.order.push(OrderBy {
            alias,
            direction: Direction::Asc,
        });
        self
    }

    pub fn desc(mut self, alias: &'static str) -> Self {
        self.order.push(OrderBy {
            alias,
            direction: Direction::Desc,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Output column aliases in select order.
    pub fn aliases(&self) -> Vec<&'static str> {
        self.dimensions
            .iter()
            .map(Dimension::alias)
            .chain(self.measures.iter().map(Measure::alias))
            .collect()
    }

    /// Every table column the aggregation reads, deduplicated.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = self
            .dimensions
            .iter()
            .map(Dimension::column)
            .chain(self.measures.iter().filter_map(Measure::column))
            .chain(self.filters.iter().map(Predicate::column))
            .chain(self.having.iter().map(Having::column))
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }

    pub fn to_sql(&self, table: &str, dialect: Dialect) -> String {
        let selects = self
            .dimensions
            .iter()
            .map(|d| d.select(dialect))
            .chain(self.measures.iter().map(|m| {
                format!("{} AS {}", m.expr(dialect), quote_ident(m.alias()))
            }))
            .collect::<Vec<_>>()
            .join(",\n       ");

        let mut sql = format!("SELECT {selects}\nFROM {}", quote_ident(table));
        if !self.filters.is_empty() {
            let filters = self
                .filters
                .iter()
                .map(|p| p.expr(dialect))
                .collect::<Vec<_>>()
                .join("\n  AND ");
            let _ = write!(sql, "\nWHERE {filters}");
        }
        if !self.dimensions.is_empty() {
            let groups = self
                .dimensions
                .iter()
                .map(|d| d.expr(dialect))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(sql, "\nGROUP BY {groups}");
        }
        if !self.having.is_empty() {
            let having = self
                .having
                .iter()
                .map(Having::expr)
                .collect::<Vec<_>>()
                .join("\n   AND ");
            let _ = write!(sql, "\nHAVING {having}");
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {dir}", quote_ident(o.alias))
                })
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(sql, "\nORDER BY {order}");
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, "\nLIMIT {limit}");
        }
        sql
    }
}

fn indicator(column: Column) -> String {
    format!(
        "CASE WHEN {} = true THEN 1 ELSE 0 END",
        quote_ident(column.name())
    )
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}
