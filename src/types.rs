use crate::error::CensusError;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The years the census was taken, in order.
pub const CENSUS_YEARS: [u16; 6] = [1841, 1851, 1861, 1871, 1881, 1891];

/// One of the six census years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct CensusYear(u16);

impl CensusYear {
    pub const FIRST: CensusYear = CensusYear(1841);

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = CensusYear> {
        CENSUS_YEARS.into_iter().map(CensusYear)
    }
}

impl Default for CensusYear {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u16> for CensusYear {
    type Error = String;
    fn try_from(year: u16) -> Result<Self, Self::Error> {
        if CENSUS_YEARS.contains(&year) {
            Ok(CensusYear(year))
        } else {
            Err(format!("{} is not a census year", year))
        }
    }
}

impl From<CensusYear> for u16 {
    fn from(year: CensusYear) -> u16 {
        year.0
    }
}

impl FromStr for CensusYear {
    type Err = String;
    fn from_str(input: &str) -> Result<CensusYear, Self::Err> {
        let year: u16 = input
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a year", input))?;
        CensusYear::try_from(year)
    }
}

impl fmt::Display for CensusYear {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which population figure a threshold is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    #[default]
    Total,
    Male,
    Female,
}

impl FromStr for Category {
    type Err = String;
    fn from_str(input: &str) -> Result<Category, Self::Err> {
        match input.to_lowercase().as_str() {
            "total" => Ok(Category::Total),
            "male" => Ok(Category::Male),
            "female" => Ok(Category::Female),
            _ => Err(format!("unknown category '{}'", input)),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = String;
    fn try_from(input: String) -> Result<Self, Self::Error> {
        input.parse()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Category::Total => write!(f, "Total"),
            Category::Male => write!(f, "Male"),
            Category::Female => write!(f, "Female"),
        }
    }
}

/// Column name for a sex or habitation figure in a given year, e.g. `1841 Male`.
pub fn year_column(year: CensusYear, field: &str) -> String {
    format!("{} {}", year, field)
}

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whole-number view of the cell, for identifier columns that may have
    /// been stored as floats or as digit strings.
    pub fn as_identifier(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|n| n.fract() == 0.0)
                        .map(|n| n as i64)
                })
            }
            _ => None,
        }
    }

    /// Parses a raw text field: blank is null, numeric text is a number.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Null
        } else if let Ok(n) = trimmed.parse::<f64>() {
            Cell::Number(n)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    /// Sort order used for table columns: numbers, then text, then nulls.
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Null, Cell::Null) => Ordering::Equal,
            (Cell::Null, _) => Ordering::Greater,
            (_, Cell::Null) => Ordering::Less,
            (Cell::Number(_), Cell::Text(_)) => Ordering::Less,
            (Cell::Text(_), Cell::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Null => write!(f, "null"),
        }
    }
}

/// A rectangular table with named columns. Every row has exactly one cell
/// per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, CensusError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CensusError::MissingColumn(name.to_string()))
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }

    /// Stable sort of the rows by one column.
    pub fn sort_by_column(&mut self, name: &str) -> Result<(), CensusError> {
        let idx = self.column_index(name)?;
        self.rows.sort_by(|a, b| a[idx].sort_cmp(&b[idx]));
        Ok(())
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let cells = self.cells;
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &cells[i])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> {
        let (columns, cells) = (self.columns, self.cells);
        columns.iter().map(String::as_str).zip(cells.iter())
    }
}

/// The raw controls as the presentation layer hands them over.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub townland: Option<String>,
    #[serde(default)]
    pub year: CensusYear,
    #[serde(default)]
    pub category: Category,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub threshold: Option<f64>,
}

/// An untouched number input arrives as `threshold=`; that means no threshold.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A validated selection: at most one filter mode is active.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Nothing,
    Place(String),
    Threshold {
        year: CensusYear,
        category: Category,
        threshold: f64,
    },
}

impl SelectionRequest {
    pub fn resolve(&self) -> Result<Selection, CensusError> {
        // Names are matched exactly, so surrounding whitespace is kept.
        let townland = self
            .townland
            .as_deref()
            .filter(|t| !t.trim().is_empty());

        if self.threshold.is_some_and(|t| !t.is_finite()) {
            return Err(CensusError::InvalidThreshold);
        }

        match (townland, self.threshold) {
            (Some(_), Some(_)) => Err(CensusError::SelectionConflict),
            (Some(name), None) => Ok(Selection::Place(name.to_string())),
            (None, Some(threshold)) => Ok(Selection::Threshold {
                year: self.year,
                category: self.category,
                threshold,
            }),
            (None, None) => Ok(Selection::Nothing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn census_year_rejects_non_census_years() {
        assert_eq!("1881".parse::<CensusYear>().unwrap().value(), 1881);
        assert!("1845".parse::<CensusYear>().is_err());
        assert!(CensusYear::try_from(1901).is_err());
        assert_eq!(CensusYear::all().count(), 6);
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("female".parse::<Category>().unwrap(), Category::Female);
        assert_eq!("TOTAL".parse::<Category>().unwrap(), Category::Total);
        assert!("children".parse::<Category>().is_err());
    }

    #[test]
    fn cell_parsing_and_display() {
        assert_eq!(Cell::parse(""), Cell::Null);
        assert_eq!(Cell::parse(" 42 "), Cell::Number(42.0));
        assert_eq!(Cell::parse("Ardglass"), Cell::Text("Ardglass".into()));
        assert_eq!(Cell::Number(90.0).to_string(), "90");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Null.to_string(), "null");
    }

    #[test]
    fn identifier_accepts_float_and_text_codes() {
        assert_eq!(Cell::Number(1234.0).as_identifier(), Some(1234));
        assert_eq!(Cell::Number(12.5).as_identifier(), None);
        assert_eq!(Cell::Text("1234.0".into()).as_identifier(), Some(1234));
        assert_eq!(Cell::Null.as_identifier(), None);
    }

    #[test]
    fn nulls_sort_last() {
        let mut cells = vec![Cell::Null, Cell::Number(3.0), Cell::Number(1.0)];
        cells.sort_by(Cell::sort_cmp);
        assert_eq!(cells, vec![Cell::Number(1.0), Cell::Number(3.0), Cell::Null]);
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Number(1.0)]],
        );
        let record = table.record(0).unwrap();
        assert_eq!(record.get("b"), Some(&Cell::Null));
        assert_eq!(record.get("c"), None);
    }

    #[test]
    fn place_and_threshold_together_conflict() {
        let request = SelectionRequest {
            townland: Some("Ardglass".into()),
            threshold: Some(10.0),
            ..Default::default()
        };
        assert_eq!(request.resolve(), Err(CensusError::SelectionConflict));
    }

    #[test]
    fn category_deserializes_like_it_parses() {
        let request: SelectionRequest =
            serde_json::from_str(r#"{"category": "female", "year": 1881}"#).unwrap();
        assert_eq!(request.category, Category::Female);
        assert!(serde_json::from_str::<SelectionRequest>(r#"{"category": "children"}"#).is_err());
    }

    #[test]
    fn blank_threshold_is_absent() {
        let request: SelectionRequest =
            serde_json::from_str(r#"{"townland": "Ardglass", "threshold": " "}"#).unwrap();
        assert_eq!(request.threshold, None);
        assert_eq!(request.resolve(), Ok(Selection::Place("Ardglass".into())));

        let request: SelectionRequest = serde_json::from_str(r#"{"threshold": "80"}"#).unwrap();
        assert_eq!(request.threshold, Some(80.0));
        let request: SelectionRequest = serde_json::from_str(r#"{"threshold": 80.5}"#).unwrap();
        assert_eq!(request.threshold, Some(80.5));
        assert!(serde_json::from_str::<SelectionRequest>(r#"{"threshold": "lots"}"#).is_err());
    }

    #[test]
    fn non_finite_thresholds_are_rejected() {
        for threshold in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let request = SelectionRequest {
                threshold: Some(threshold),
                ..Default::default()
            };
            assert_eq!(request.resolve(), Err(CensusError::InvalidThreshold));
        }
    }

    #[test]
    fn townland_is_passed_through_untrimmed() {
        let request = SelectionRequest {
            townland: Some(" Rush ".into()),
            ..Default::default()
        };
        assert_eq!(request.resolve(), Ok(Selection::Place(" Rush ".into())));
    }

    #[test]
    fn blank_townland_counts_as_absent() {
        let request = SelectionRequest {
            townland: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(request.resolve(), Ok(Selection::Nothing));
    }
}
