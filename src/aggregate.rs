use crate::error::CensusError;
use crate::types::{year_column, CensusYear, Cell, Record};
use serde::Serialize;

/// Ordered field-to-value projection of a single selected row.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    fields: Vec<(String, Cell)>,
}

impl AggregatedRow {
    pub fn from_record(record: &Record<'_>) -> Self {
        Self {
            fields: record
                .fields()
                .map(|(name, cell)| (name.to_string(), cell.clone()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.fields.iter().find(|(name, _)| name == field).map(|(_, cell)| cell)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Cell::as_f64)
    }
}

/// Population figures for one place in one census year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearStatistics {
    pub year: CensusYear,
    pub total: i64,
    pub female: i64,
    pub male: i64,
    /// Change relative to an earlier total, when one was given.
    pub delta: Option<i64>,
}

/// Fails with [`CensusError::NullValues`] if either figure is null or absent.
pub fn year_statistics(
    row: &AggregatedRow,
    year: CensusYear,
    prior_total: Option<i64>,
) -> Result<YearStatistics, CensusError> {
    let figure = |field: &str| {
        row.number(&year_column(year, field))
            .map(|n| n.trunc() as i64)
            .ok_or(CensusError::NullValues { year: year.value() })
    };

    let female = figure("Female")?;
    let male = figure("Male")?;
    let total = female + male;

    Ok(YearStatistics {
        year,
        total,
        female,
        male,
        delta: prior_total.map(|prior| total - prior),
    })
}
