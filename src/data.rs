use crate::config::SourceConfig;
use crate::error::CensusError;
use crate::types::{Cell, Record, Table};
use anyhow::{Context, Result, anyhow};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use tracing::{debug, info};

pub const TOWNLAND: &str = "Townland";
pub const PARISH: &str = "Parish";
pub const CODE: &str = "Code";
/// Label of the synthetic row holding the sum over all townlands.
pub const TOTAL_ROW: &str = "TOTAL";

pub const OS_ID: &str = "OS_ID";
pub const CENTRE_LAT: &str = "CENTRE_LAT";
pub const CENTRE_LNG: &str = "CENTRE_LNG";

/// The census sheet, sorted by townland name with a name index.
#[derive(Debug, Clone)]
pub struct CensusTable {
    table: Table,
    townlands: HashMap<String, usize>,
}

impl CensusTable {
    pub fn from_table(mut table: Table) -> Result<Self, CensusError> {
        table.sort_by_column(TOWNLAND)?;

        let mut townlands = HashMap::new();
        for (row, record) in table.records().enumerate() {
            if let Some(Cell::Text(name)) = record.get(TOWNLAND) {
                townlands.entry(name.clone()).or_insert(row);
            }
        }

        Ok(Self { table, townlands })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// First row whose townland is exactly `name`.
    pub fn find_townland(&self, name: &str) -> Option<Record<'_>> {
        self.townlands
            .get(name)
            .and_then(|&row| self.table.record(row))
    }

    /// Sorted, de-duplicated townland names for the place selector.
    pub fn townland_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.townlands.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Modern place identifiers with their centre coordinates.
#[derive(Debug, Clone)]
pub struct GeoTable {
    pub(crate) table: Table,
}

impl GeoTable {
    pub fn from_table(table: Table) -> Self {
        Self { table }
    }
}

pub fn load_census(source: &SourceConfig) -> Result<CensusTable> {
    info!("Loading census table from {:?}", source.path);
    let table = read_table(source)?;
    let census = CensusTable::from_table(table)
        .with_context(|| format!("Census table {:?} is malformed", source.path))?;
    info!("Loaded {} census rows", census.table().len());
    Ok(census)
}

pub fn load_geo(source: &SourceConfig) -> Result<GeoTable> {
    info!("Loading place coordinates from {:?}", source.path);
    let table = read_table(source)?;
    info!("Loaded {} place rows", table.len());
    Ok(GeoTable::from_table(table))
}

fn read_table(source: &SourceConfig) -> Result<Table> {
    let extension = source.path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Input file {:?} has no extension", source.path))?;

    let (columns, rows) = match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(source)?,
        "csv" => read_csv(source)?,
        _ => return Err(anyhow!("Unsupported spreadsheet format: {}", extension)),
    };

    Ok(shape_table(source, columns, rows))
}

/// Applies the index-column and row-limit options.
fn shape_table(source: &SourceConfig, mut columns: Vec<String>, mut rows: Vec<Vec<Cell>>) -> Table {
    if let Some(limit) = source.max_rows {
        rows.truncate(limit);
    }
    if source.index_column && !columns.is_empty() {
        columns.remove(0);
        for row in &mut rows {
            if !row.is_empty() {
                row.remove(0);
            }
        }
    }
    debug!("{} columns: {:?}", columns.len(), columns);
    Table::new(columns, rows)
}

fn read_workbook(source: &SourceConfig) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut workbook = open_workbook_auto(&source.path)
        .with_context(|| format!("Failed to open workbook: {:?}", source.path))?;

    let sheet = match &source.sheet {
        Some(name) => name.clone(),
        None => workbook.sheet_names().first().cloned()
            .ok_or_else(|| anyhow!("Workbook {:?} has no sheets", source.path))?,
    };

    let range = workbook.worksheet_range(&sheet)
        .with_context(|| format!("Failed to read sheet '{}' of {:?}", sheet, source.path))?;

    let mut rows = range.rows();
    let columns: Vec<String> = rows.next()
        .ok_or_else(|| anyhow!("Sheet '{}' is empty", sheet))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let data = rows
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();

    Ok((columns, data))
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Null,
    }
}

fn read_csv(source: &SourceConfig) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let file = File::open(&source.path)
        .with_context(|| format!("Failed to open CSV file: {:?}", source.path))?;
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result
            .with_context(|| format!("Malformed CSV record in {:?}", source.path))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Ok((columns, rows))
}
