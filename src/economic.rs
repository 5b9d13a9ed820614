use crate::accounts::value_of;
use crate::engine::RatioId;
use crate::schema::{IndicatorGroup, IndicatorResult, LabeledRow, LabeledTable, ValueFormat};
use crate::thresholds::ThresholdTable;
use crate::utils::YearSelection;
use log::{debug, info};

pub const ECONOMIC_CATEGORY: &str = "Indicadores Econômicos e Financeiros";

/// Pre-computed indicator rows a labeled table may carry, with the ratio each name stands for.
pub const ECONOMIC_INDICATORS: &[(&str, RatioId)] = &[
    ("Endividamento Geral (EG)", RatioId::GeneralIndebtedness),
    ("Liquidez Geral (LG)", RatioId::GeneralLiquidity),
    ("Liquidez Corrente (LC)", RatioId::CurrentLiquidity),
    ("Liquidez Seca (LS)", RatioId::QuickLiquidity),
    ("Giro do Ativo (GA)", RatioId::AssetTurnover),
    ("Rentabilidade do Ativo (ROA ou ROI)", RatioId::Roa),
];

/// Finds the economic indicator a row label names.
///
/// Matching is case-sensitive containment in either direction, so both
/// `"Liquidez Corrente (LC) - consolidado"` and `"Liquidez Corrente"` match.
/// Blank labels never match.
pub fn match_economic_indicator(label: &str) -> Option<(&'static str, RatioId)> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    ECONOMIC_INDICATORS
        .iter()
        .find(|(name, _)| label.contains(name) || name.contains(label))
        .copied()
}

/// The ratio whose thresholds classify a row, chosen from the family its own label names.
///
/// `Liquidez` wins over `Endividamento`, which wins over `ROA` and `Giro`.
/// A label naming none of them has no status, even when it matched an indicator.
pub fn status_ratio(label: &str, matched: RatioId) -> Option<RatioId> {
    if label.contains("Liquidez") {
        Some(match matched {
            RatioId::GeneralLiquidity | RatioId::CurrentLiquidity | RatioId::QuickLiquidity => {
                matched
            }
            _ => RatioId::GeneralLiquidity,
        })
    } else if label.contains("Endividamento") {
        Some(RatioId::GeneralIndebtedness)
    } else if label.contains("ROA") || label.contains("Giro") {
        Some(match matched {
            RatioId::Roa | RatioId::AssetTurnover => matched,
            _ if label.contains("ROA") => RatioId::Roa,
            _ => RatioId::AssetTurnover,
        })
    } else {
        None
    }
}

/// Rows of `table` that name an economic indicator, in table order.
pub fn economic_rows(table: &LabeledTable) -> Vec<(&LabeledRow, RatioId)> {
    table
        .rows
        .iter()
        .filter_map(|row| match_economic_indicator(&row.label).map(|(_, id)| (row, id)))
        .collect()
}

/// Reports the economic indicator rows as found, with their comparison-year values.
pub fn economic_indicators(
    table: &LabeledTable,
    selection: &YearSelection,
    thresholds: &ThresholdTable,
) -> IndicatorGroup {
    let rows = economic_rows(table);
    info!(
        "Found {} economic indicator row(s) for {}",
        rows.len(),
        selection.selected_year
    );

    let indicators = rows
        .into_iter()
        .map(|(row, id)| {
            let value = value_of(Some(row), &selection.selected_year);
            let previous = value_of(Some(row), &selection.previous_year);
            debug!("{}: {} (previous {})", row.label, value, previous);

            IndicatorResult {
                name: row.label.clone(),
                value,
                previous_value: Some(previous),
                format: ValueFormat::Decimal,
                status: status_ratio(&row.label, id)
                    .and_then(|family| thresholds.classify(family, value)),
                description: format!("Variação em relação a {}", selection.previous_year),
            }
        })
        .collect();

    IndicatorGroup {
        category: ECONOMIC_CATEGORY.to_string(),
        indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::Panel;
    use crate::schema::Status;
    use crate::utils::TrendDirection;

    fn table() -> LabeledTable {
        LabeledTable::new(vec![
            LabeledRow::new("Receita Líquida")
                .with_cell("2022", 1000.0)
                .with_cell("2023", 1200.0),
            LabeledRow::new("Liquidez Corrente (LC)")
                .with_cell("2022", 0.8)
                .with_cell("2023", 1.2),
            LabeledRow::new("Endividamento Geral")
                .with_cell("2022", 0.5)
                .with_cell("2023", 0.7),
            LabeledRow::new("Rentabilidade do Ativo (ROA ou ROI) ajustado")
                .with_cell("2022", 0.06)
                .with_cell("2023", "n/d"),
            LabeledRow::new(""),
        ])
    }

    fn years() -> Vec<String> {
        vec!["2022".to_string(), "2023".to_string()]
    }

    #[test]
    fn test_match_either_direction() {
        assert_eq!(
            match_economic_indicator("Liquidez Seca"),
            Some(("Liquidez Seca (LS)", RatioId::QuickLiquidity))
        );
        assert_eq!(
            match_economic_indicator("Giro do Ativo (GA) total"),
            Some(("Giro do Ativo (GA)", RatioId::AssetTurnover))
        );
        assert_eq!(match_economic_indicator("Receita Líquida"), None);
        assert_eq!(match_economic_indicator("   "), None);
    }

    #[test]
    fn test_economic_indicators_report_rows_as_found() {
        let t = table();
        let selection = YearSelection::for_year(&years(), "2023");
        let group = economic_indicators(
            &t,
            &selection,
            &ThresholdTable::defaults_for(Panel::Economic),
        );

        assert_eq!(group.category, ECONOMIC_CATEGORY);
        assert_eq!(group.indicators.len(), 3);

        let liquidity = group.find("Liquidez Corrente (LC)").unwrap();
        assert_eq!(liquidity.value, 1.2);
        assert_eq!(liquidity.previous_value, Some(0.8));
        assert_eq!(liquidity.status, Some(Status::Good));
        assert!((liquidity.trend() - 50.0).abs() < 1e-9);

        let debt = group.find("Endividamento Geral").unwrap();
        assert_eq!(debt.status, Some(Status::Bad));

        let roa = group
            .find("Rentabilidade do Ativo (ROA ou ROI) ajustado")
            .unwrap();
        assert_eq!(roa.value, 0.0);
        assert_eq!(roa.status, Some(Status::Bad));
    }

    #[test]
    fn test_status_follows_label_family() {
        assert_eq!(
            status_ratio("Liquidez Seca (LS)", RatioId::QuickLiquidity),
            Some(RatioId::QuickLiquidity)
        );
        assert_eq!(
            status_ratio("Liquidez", RatioId::GeneralIndebtedness),
            Some(RatioId::GeneralLiquidity)
        );
        assert_eq!(
            status_ratio("Giro do Ativo (GA)", RatioId::AssetTurnover),
            Some(RatioId::AssetTurnover)
        );
        assert_eq!(status_ratio("ROA", RatioId::GeneralIndebtedness), Some(RatioId::Roa));
        assert_eq!(status_ratio("Ativo", RatioId::AssetTurnover), None);
        assert_eq!(status_ratio("Geral", RatioId::GeneralIndebtedness), None);
    }

    #[test]
    fn test_rows_outside_any_family_have_no_status() {
        let t = LabeledTable::new(vec![
            LabeledRow::new("Rentabilidade do Ativo")
                .with_cell("2022", 0.02)
                .with_cell("2023", 0.2),
            LabeledRow::new("Ativo")
                .with_cell("2022", 0.5)
                .with_cell("2023", 0.9),
            LabeledRow::new("Geral")
                .with_cell("2022", 0.1)
                .with_cell("2023", 0.9),
        ]);
        let selection = YearSelection::for_year(&years(), "2023");
        let group = economic_indicators(
            &t,
            &selection,
            &ThresholdTable::defaults_for(Panel::Economic),
        );

        assert_eq!(group.indicators.len(), 3);
        for indicator in &group.indicators {
            assert_eq!(indicator.status, None, "{}", indicator.name);
            assert!(indicator.previous_value.is_some());
        }
        assert_eq!(group.find("Ativo").unwrap().value, 0.9);
    }

    #[test]
    fn test_variation_is_relative_to_previous_magnitude() {
        let t = LabeledTable::new(vec![LabeledRow::new("Giro do Ativo (GA)")
            .with_cell("2022", -0.2)
            .with_cell("2023", -0.1)]);
        let selection = YearSelection::for_year(&years(), "2023");
        let group = economic_indicators(
            &t,
            &selection,
            &ThresholdTable::defaults_for(Panel::Economic),
        );

        let turnover = group.find("Giro do Ativo (GA)").unwrap();
        assert!((turnover.trend() - 50.0).abs() < 1e-9);
        assert_eq!(turnover.direction(), Some(TrendDirection::Up));
        assert_eq!(turnover.status, Some(Status::Bad));
    }

    #[test]
    fn test_earliest_year_compares_with_itself() {
        let t = table();
        let selection = YearSelection::for_year(&years(), "2022");
        let group = economic_indicators(
            &t,
            &selection,
            &ThresholdTable::defaults_for(Panel::Economic),
        );

        let debt = group.find("Endividamento Geral").unwrap();
        assert_eq!(debt.previous_value, Some(0.5));
        assert_eq!(debt.trend(), 0.0);
        assert_eq!(debt.status, Some(Status::Warning));
    }
}
