//! One interaction, start to finish: a selection goes in, everything the
//! page shows comes out. Nothing here keeps state between calls.

use crate::aggregate::{year_statistics, AggregatedRow, YearStatistics};
use crate::charts::{bar_chart, line_chart, BarChart, LineChart};
use crate::data::{CensusTable, CODE, PARISH};
use crate::error::CensusError;
use crate::filter::{by_place, by_threshold};
use crate::locate::{place_position, PlaceLocator};
use crate::types::{CensusYear, Cell, Record, Selection, SelectionRequest};
use anyhow::Result;
use geojson::{Feature, Geometry, JsonObject, Value};
use serde::Serialize;
use tracing::{debug, warn};

pub const TITLE: &str = "Historic Census of Ireland (1841-1881)";
pub const PAGE_TITLE: &str = "Census Dashboard";
pub const PROMPT: &str = "Select a filter below to search the census";

const NAVIGATION: [(&str, &str); 2] = [
    ("Return Home", "https://vrti-graph.adaptcentre.ie/census"),
    ("Census Map Explorer", "https://vrti-graph.adaptcentre.ie/census-map-explorer?view=townland"),
];

/// Columns shown to the user; identifiers and parish are internal.
const HIDDEN_COLUMNS: [&str; 2] = [CODE, PARISH];

/// Years summarised in the place statistics panels.
const STATISTICS_YEARS: [u16; 2] = [1841, 1881];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: i64,
    pub delta: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsPanel {
    pub heading: String,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub heading: String,
    pub lat: f64,
    pub lon: f64,
    pub feature: Feature,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub heading: String,
    pub bar: BarChart,
    pub line: LineChart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub page_title: String,
    pub title: String,
    pub links: Vec<Link>,
    pub prompt: String,
    pub warnings: Vec<String>,
    pub heading: Option<String>,
    pub result_count: Option<usize>,
    pub table: Option<TableView>,
    pub statistics: Vec<StatisticsPanel>,
    pub charts: Option<ChartPanel>,
    pub map: Option<MapView>,
}

impl ViewModel {
    fn empty() -> Self {
        Self {
            page_title: PAGE_TITLE.to_string(),
            title: TITLE.to_string(),
            links: NAVIGATION
                .iter()
                .map(|(label, url)| Link {
                    label: label.to_string(),
                    url: url.to_string(),
                })
                .collect(),
            prompt: PROMPT.to_string(),
            warnings: Vec::new(),
            heading: None,
            result_count: None,
            table: None,
            statistics: Vec::new(),
            charts: None,
            map: None,
        }
    }
}

/// Builds the page for one selection. Only load and schema failures are
/// errors; user-level problems become warnings on the returned view.
pub fn render(
    request: &SelectionRequest,
    census: &CensusTable,
    locator: &dyn PlaceLocator,
) -> Result<ViewModel> {
    let mut view = ViewModel::empty();

    let selection = match request.resolve() {
        Ok(selection) => selection,
        Err(conflict) => {
            warn!("rejected selection: {}", conflict);
            view.warnings.push(conflict.to_string());
            return Ok(view);
        }
    };

    match selection {
        Selection::Nothing => {}
        Selection::Threshold { year, category, threshold } => {
            let rows = by_threshold(census, year, category, threshold)?;
            debug!("{} rows above {} for {} {}", rows.len(), threshold, year, category);
            view.heading = Some(format!(
                "Census Results for {} {} Population greater than {}",
                year, category, threshold
            ));
            view.result_count = Some(rows.len());
            view.table = Some(table_view(census, rows));
        }
        Selection::Place(name) => render_place(&mut view, census, locator, &name)?,
    }

    Ok(view)
}

fn render_place(
    view: &mut ViewModel,
    census: &CensusTable,
    locator: &dyn PlaceLocator,
    name: &str,
) -> Result<()> {
    let Some(record) = by_place(census, name) else {
        view.warnings.push("No results found".to_string());
        return Ok(());
    };
    let display = title_case(name);
    view.heading = Some(display.clone());
    view.table = Some(table_view(census, vec![record]));

    let row = AggregatedRow::from_record(&record);

    // 1881 is compared against 1841 when the earlier total is known.
    let mut prior = None;
    for year in CensusYear::all().filter(|y| STATISTICS_YEARS.contains(&y.value())) {
        match year_statistics(&row, year, prior) {
            Ok(stats) => {
                prior = Some(stats.total);
                view.statistics.push(statistics_panel(&stats, &display));
            }
            Err(err @ CensusError::NullValues { .. }) => {
                prior = None;
                view.warnings.push(err.to_string());
            }
            Err(err) => return Err(err.into()),
        }
    }

    view.charts = Some(ChartPanel {
        heading: "Population and Habitation (1841-1891)".to_string(),
        bar: bar_chart(&row),
        line: line_chart(&row),
    });

    if let Some(point) = place_position(&row, locator)? {
        view.map = Some(map_view(&display, point.y(), point.x()));
    }

    Ok(())
}

fn table_view(census: &CensusTable, records: Vec<Record<'_>>) -> TableView {
    let visible = |name: &str| !HIDDEN_COLUMNS.contains(&name);
    TableView {
        columns: census
            .table()
            .columns()
            .iter()
            .filter(|c| visible(c))
            .cloned()
            .collect(),
        rows: records
            .iter()
            .map(|record| {
                record
                    .fields()
                    .filter(|(name, _)| visible(name))
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect(),
    }
}

fn statistics_panel(stats: &YearStatistics, place: &str) -> StatisticsPanel {
    let year = stats.year;
    StatisticsPanel {
        heading: format!("{} Statistics", year),
        metrics: vec![
            Metric {
                label: format!("Total {} in {}:", year, place),
                value: stats.total,
                delta: stats.delta,
            },
            Metric {
                label: format!("Female {} in {}:", year, place),
                value: stats.female,
                delta: None,
            },
            Metric {
                label: format!("Males {} in {}:", year, place),
                value: stats.male,
                delta: None,
            },
        ],
    }
}

fn map_view(place: &str, lat: f64, lon: f64) -> MapView {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), serde_json::Value::from(place));

    MapView {
        heading: format!("Map of {}", place),
        lat,
        lon,
        feature: Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        },
    }
}

/// Capitalises the first letter of every word and lowercases the rest.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
