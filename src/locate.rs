use crate::aggregate::AggregatedRow;
use crate::config::SourceConfig;
use crate::data::{GeoTable, CENTRE_LAT, CENTRE_LNG, CODE, OS_ID};
use crate::store;
use crate::types::Cell;
use anyhow::Result;
use geo::Point;
use tracing::debug;

/// Anything that can turn a place identifier into a map position.
pub trait PlaceLocator {
    /// `Ok(None)` when the identifier is unknown or has no coordinates.
    fn locate(&self, os_id: i64) -> Result<Option<Point<f64>>>;
}

impl PlaceLocator for GeoTable {
    fn locate(&self, os_id: i64) -> Result<Option<Point<f64>>> {
        let table = &self.table;
        table.column_index(OS_ID)?;
        table.column_index(CENTRE_LAT)?;
        table.column_index(CENTRE_LNG)?;

        let Some(record) = table
            .records()
            .find(|record| record.get(OS_ID).and_then(Cell::as_identifier) == Some(os_id))
        else {
            debug!("no coordinates for place {}", os_id);
            return Ok(None);
        };

        let lat = record.get(CENTRE_LAT).and_then(Cell::as_f64);
        let lng = record.get(CENTRE_LNG).and_then(Cell::as_f64);
        Ok(lat.zip(lng).map(|(lat, lng)| Point::new(lng, lat)))
    }
}

/// Reads the coordinate table through the dataset store on first use, so a
/// view that never needs a map never touches the file.
pub struct LazyLocator<'a> {
    source: &'a SourceConfig,
}

impl<'a> LazyLocator<'a> {
    pub fn new(source: &'a SourceConfig) -> Self {
        Self { source }
    }
}

impl PlaceLocator for LazyLocator<'_> {
    fn locate(&self, os_id: i64) -> Result<Option<Point<f64>>> {
        store::geo(self.source)?.locate(os_id)
    }
}

/// Map position of the selected row, skipping rows without a usable code.
pub fn place_position(row: &AggregatedRow, locator: &dyn PlaceLocator) -> Result<Option<Point<f64>>> {
    match row.get(CODE).and_then(Cell::as_identifier) {
        Some(code) => locator.locate(code),
        None => Ok(None),
    }
}
