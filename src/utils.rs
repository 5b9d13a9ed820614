use crate::schema::{FinancialTable, LabeledTable, YearTable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Header of the label column in keyword-matched tables.
pub const LABEL_COLUMN: &str = "Indicador";

/// Header of the year column in fixed-schema tables.
pub const YEAR_COLUMN: &str = "Ano";

/// Lists the years available in a table, oldest first.
///
/// For labeled tables these are the column keys other than `Indicador` that
/// read as numbers. For yearly tables they are the record years.
pub fn discover_years(table: &FinancialTable) -> Vec<String> {
    match table {
        FinancialTable::Labeled(t) => discover_labeled_years(t),
        FinancialTable::Yearly(t) => discover_record_years(t),
    }
}

pub fn discover_labeled_years(table: &LabeledTable) -> Vec<String> {
    let mut years: Vec<(f64, String)> = Vec::new();
    for row in &table.rows {
        for key in row.cells.keys() {
            if key == LABEL_COLUMN || years.iter().any(|(_, y)| y == key) {
                continue;
            }
            if let Some(n) = parse_year_key(key) {
                years.push((n, key.clone()));
            }
        }
    }
    sort_years(years)
}

pub fn discover_record_years(table: &YearTable) -> Vec<String> {
    let years = table
        .records
        .iter()
        .map(|r| (r.year as f64, r.year.to_string()))
        .collect();
    sort_years(years)
}

/// Column headers count as years when they read as numbers. Empty headers never do.
pub fn parse_year_key(key: &str) -> Option<f64> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn sort_years(mut years: Vec<(f64, String)>) -> Vec<String> {
    years.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    years.dedup_by(|a, b| a.1 == b.1);
    years.into_iter().map(|(_, y)| y).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct YearSelection {
    pub selected_year: String,

    #[schemars(
        description = "The year preceding the selected one, or the selected year itself when nothing precedes it"
    )]
    pub previous_year: String,
}

impl YearSelection {
    /// Selects `selected` and derives the comparison year from `years` (sorted oldest first).
    pub fn for_year(years: &[String], selected: &str) -> Self {
        let previous_year = match years.iter().position(|y| y == selected) {
            Some(idx) if idx > 0 => years[idx - 1].clone(),
            _ => selected.to_string(),
        };

        Self {
            selected_year: selected.to_string(),
            previous_year,
        }
    }

    /// Selects the most recent year, or `None` for a table without years.
    pub fn latest(years: &[String]) -> Option<Self> {
        years.last().map(|y| Self::for_year(years, y))
    }

    /// True when there is no earlier year to compare against.
    pub fn is_self_comparison(&self) -> bool {
        self.selected_year == self.previous_year
    }
}

/// Divides `numerator` by `denominator`, yielding `0` when the denominator is zero.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Percent change from `previous` to `current`, relative to `|previous|`.
/// A zero previous value yields `0`.
pub fn trend_percent(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    ((current - previous) / previous.abs()) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Plain numeric comparison used for trend arrows.
pub fn classify_trend_direction(current: f64, previous: f64) -> TrendDirection {
    if current > previous {
        TrendDirection::Up
    } else if current < previous {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LabeledRow, YearRecord};

    fn years(list: &[&str]) -> Vec<String> {
        list.iter().map(|y| y.to_string()).collect()
    }

    #[test]
    fn test_discover_years_labeled() {
        let table = FinancialTable::Labeled(LabeledTable::new(vec![LabeledRow::new(
            "Receita Líquida",
        )
        .with_cell("2023", 1.0)
        .with_cell("2021", 1.0)
        .with_cell("Notas", "x")
        .with_cell("2022", 1.0)]));

        assert_eq!(discover_years(&table), years(&["2021", "2022", "2023"]));
    }

    #[test]
    fn test_discover_years_yearly() {
        let table = FinancialTable::Yearly(YearTable::new(vec![
            YearRecord {
                year: 2023,
                ..Default::default()
            },
            YearRecord {
                year: 2019,
                ..Default::default()
            },
        ]));

        assert_eq!(discover_years(&table), years(&["2019", "2023"]));
    }

    #[test]
    fn test_year_selection_previous() {
        let available = years(&["2021", "2022", "2023"]);

        let selection = YearSelection::for_year(&available, "2023");
        assert_eq!(selection.previous_year, "2022");
        assert!(!selection.is_self_comparison());

        let earliest = YearSelection::for_year(&available, "2021");
        assert_eq!(earliest.previous_year, "2021");
        assert!(earliest.is_self_comparison());

        let unknown = YearSelection::for_year(&available, "1999");
        assert_eq!(unknown.previous_year, "1999");

        let latest = YearSelection::latest(&available).unwrap();
        assert_eq!(latest.selected_year, "2023");
        assert!(YearSelection::latest(&[]).is_none());
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(10.0, 4.0), 2.5);
    }

    #[test]
    fn test_trend_percent() {
        assert_eq!(trend_percent(123.0, 0.0), 0.0);
        assert_eq!(trend_percent(42.0, 42.0), 0.0);
        assert!((trend_percent(1200.0, 1000.0) - 20.0).abs() < 1e-9);

        // A negative base does not flip the sign of an improvement
        assert!((trend_percent(-50.0, -100.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify_trend_direction() {
        assert_eq!(classify_trend_direction(2.0, 1.0), TrendDirection::Up);
        assert_eq!(classify_trend_direction(1.0, 2.0), TrendDirection::Down);
        assert_eq!(classify_trend_direction(1.0, 1.0), TrendDirection::Flat);
    }
}
