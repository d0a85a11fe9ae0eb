use crate::aggregate::AggregatedRow;
use crate::types::{year_column, CensusYear, Cell};
use serde::Serialize;

/// Synthetic uninhabited-houses series, one slot per census year. The sheet
/// has no usable uninhabited figures, so this is placeholder data and not
/// derived from the selected row.
pub const UNINHABITED_PLACEHOLDER: [Option<f64>; 6] = [None, None, None, None, Some(1.0), None];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    /// One entry per chart label; `None` where the sheet has no figure.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub series: Vec<BarSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub color: String,
    pub dashed: bool,
    pub points: Vec<(u16, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub x_title: String,
    pub y_title: String,
    pub legend_title: String,
    pub series: Vec<LineSeries>,
}

/// Male and female population per census year, grouped under labels taken
/// from the `Inhabited` columns (`1841 Inhabited` becomes `1841 Population`).
pub fn bar_chart(row: &AggregatedRow) -> BarChart {
    let mut labels = Vec::new();
    let mut male = Vec::new();
    let mut female = Vec::new();

    for (field, _) in row.fields().filter(|(field, _)| field.contains("Inhabited")) {
        labels.push(field.replace("Inhabited", "Population"));
        male.push(figure(row, &field.replace("Inhabited", "Male")));
        female.push(figure(row, &field.replace("Inhabited", "Female")));
    }

    BarChart {
        labels,
        series: vec![
            BarSeries { name: "Male".to_string(), values: male },
            BarSeries { name: "Female".to_string(), values: female },
        ],
    }
}

/// Houses and population across the fixed census years.
pub fn line_chart(row: &AggregatedRow) -> LineChart {
    let by_year = |field: &str| -> Vec<(u16, Option<f64>)> {
        CensusYear::all()
            .map(|year| (year.value(), figure(row, &year_column(year, field))))
            .collect()
    };

    let uninhabited = CensusYear::all()
        .map(CensusYear::value)
        .zip(UNINHABITED_PLACEHOLDER)
        .collect();

    LineChart {
        x_title: "Year".to_string(),
        y_title: "Count".to_string(),
        legend_title: "Legend".to_string(),
        series: vec![
            line("Inhabited Houses", "blue", false, by_year("Inhabited")),
            line("Uninhabited Houses", "grey", true, uninhabited),
            line("Male Population", "green", false, by_year("Male")),
            line("Female Population", "red", false, by_year("Female")),
        ],
    }
}

fn line(name: &str, color: &str, dashed: bool, points: Vec<(u16, Option<f64>)>) -> LineSeries {
    LineSeries {
        name: name.to_string(),
        color: color.to_string(),
        dashed,
        points,
    }
}

fn figure(row: &AggregatedRow, field: &str) -> Option<f64> {
    row.get(field).and_then(Cell::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CENSUS_YEARS;
    use crate::filter::{by_place, tests::sample_census};

    fn row(name: &str) -> AggregatedRow {
        let census = sample_census();
        AggregatedRow::from_record(&by_place(&census, name).unwrap())
    }

    #[test]
    fn bar_labels_come_from_inhabited_columns() {
        let chart = bar_chart(&row("Rush"));
        assert_eq!(chart.labels, vec!["1841 Population", "1881 Population"]);
        assert_eq!(chart.series[0].name, "Male");
        assert_eq!(chart.series[0].values, vec![Some(10.0), Some(30.0)]);
        assert_eq!(chart.series[1].values, vec![Some(12.0), Some(31.0)]);
    }

    #[test]
    fn bar_series_stay_aligned_with_nulls() {
        for name in ["Ardglass", "Corduff", "TOTAL"] {
            let chart = bar_chart(&row(name));
            for series in &chart.series {
                assert_eq!(series.values.len(), chart.labels.len());
            }
        }
        let chart = bar_chart(&row("Corduff"));
        assert_eq!(chart.series[0].values, vec![Some(5.0), None]);
        assert_eq!(chart.series[1].values, vec![Some(200.0), Some(99.0)]);
    }

    #[test]
    fn line_chart_covers_every_census_year() {
        let chart = line_chart(&row("Ardglass"));
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Inhabited Houses", "Uninhabited Houses", "Male Population", "Female Population"]
        );
        for series in &chart.series {
            let years: Vec<u16> = series.points.iter().map(|(y, _)| *y).collect();
            assert_eq!(years, CENSUS_YEARS.to_vec());
        }
        assert_eq!(chart.series[0].points[0], (1841, Some(12.0)));
        assert_eq!(chart.series[0].points[4], (1881, None));
        assert_eq!(chart.series[2].points[0], (1841, Some(50.0)));
        assert_eq!(chart.series[3].points[1], (1851, None));
    }

    #[test]
    fn uninhabited_series_is_the_placeholder() {
        let chart = line_chart(&row("Baldongan"));
        let uninhabited = &chart.series[1];
        assert!(uninhabited.dashed);
        let values: Vec<Option<f64>> = uninhabited.points.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, UNINHABITED_PLACEHOLDER.to_vec());
    }
}
