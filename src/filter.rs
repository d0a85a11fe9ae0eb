use crate::data::{CensusTable, TOTAL_ROW, TOWNLAND};
use crate::error::CensusError;
use crate::types::{year_column, Category, CensusYear, Cell, Record};

/// Threshold results are always ordered by this column, whichever year the
/// threshold was applied to.
pub const THRESHOLD_SORT_COLUMN: &str = "1841 Male";

/// Exact-match lookup of a townland by name.
pub fn by_place<'a>(census: &'a CensusTable, townland: &str) -> Option<Record<'a>> {
    census.find_townland(townland)
}

/// Rows whose population figure for `year`/`category` strictly exceeds
/// `threshold`, excluding the TOTAL row, sorted ascending by
/// [`THRESHOLD_SORT_COLUMN`] with nulls last.
pub fn by_threshold<'a>(
    census: &'a CensusTable,
    year: CensusYear,
    category: Category,
    threshold: f64,
) -> Result<Vec<Record<'a>>, CensusError> {
    let table = census.table();
    for column in comparison_columns(year, category) {
        table.column_index(&column)?;
    }
    table.column_index(THRESHOLD_SORT_COLUMN)?;

    let mut selected: Vec<Record<'a>> = table
        .records()
        .filter(|record| record.get(TOWNLAND).and_then(Cell::as_text) != Some(TOTAL_ROW))
        .filter(|record| {
            comparison_value(record, year, category).is_some_and(|value| value > threshold)
        })
        .collect();

    static NULL: Cell = Cell::Null;
    selected.sort_by(|a, b| {
        let a = a.get(THRESHOLD_SORT_COLUMN).unwrap_or(&NULL);
        let b = b.get(THRESHOLD_SORT_COLUMN).unwrap_or(&NULL);
        a.sort_cmp(b)
    });

    Ok(selected)
}

/// The figure a threshold is compared against; `None` when any input is null.
pub fn comparison_value(record: &Record<'_>, year: CensusYear, category: Category) -> Option<f64> {
    comparison_columns(year, category)
        .iter()
        .map(|column| record.get(column).and_then(Cell::as_f64))
        .sum()
}

fn comparison_columns(year: CensusYear, category: Category) -> Vec<String> {
    match category {
        Category::Total => vec![year_column(year, "Male"), year_column(year, "Female")],
        Category::Male | Category::Female => vec![year_column(year, &category.to_string())],
    }
}
