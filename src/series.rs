//! Year-by-year series for trend charts. Rendering is left to the caller.

use crate::accounts::CanonicalField;
use crate::engine::{Measure, RatioEngine, RatioId};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const PROFITABILITY_MEASURES: &[Measure] = &[
    Measure::Ratio(RatioId::NetMargin),
    Measure::Ratio(RatioId::Roe),
    Measure::Ratio(RatioId::Roa),
];

pub const LIQUIDITY_MEASURES: &[Measure] = &[
    Measure::Ratio(RatioId::CurrentLiquidity),
    Measure::Ratio(RatioId::GeneralIndebtedness),
    Measure::Ratio(RatioId::ThirdPartyCapital),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesPoint {
    pub year: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MeasureSeries {
    pub measure: Measure,
    #[schemars(description = "One point per available year, oldest first; years without data read as 0")]
    pub points: Vec<SeriesPoint>,
}

impl MeasureSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GrowthPoint {
    pub year: String,
    #[schemars(description = "Net revenue change against the preceding year, in percent")]
    pub revenue_growth: f64,
    #[schemars(description = "Net income change against the preceding year, in percent")]
    pub profit_growth: f64,
}

/// Every chart of the dashboard, computed in one pass over the years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartSeries {
    pub revenue: MeasureSeries,
    pub profit: MeasureSeries,
    pub profitability: Vec<MeasureSeries>,
    pub liquidity: Vec<MeasureSeries>,
    pub efficiency: MeasureSeries,
    pub growth: Vec<GrowthPoint>,
}

pub fn measure_series(engine: &dyn RatioEngine, measures: &[Measure]) -> Vec<MeasureSeries> {
    let years = engine.years();
    let records: Vec<_> = years.iter().map(|y| (y, engine.record(y))).collect();

    measures
        .iter()
        .map(|measure| MeasureSeries {
            measure: *measure,
            points: records
                .iter()
                .map(|(year, record)| SeriesPoint {
                    year: (*year).clone(),
                    value: record
                        .as_ref()
                        .map(|r| measure.evaluate(r, None))
                        .unwrap_or(0.0),
                })
                .collect(),
        })
        .collect()
}

fn single_series(engine: &dyn RatioEngine, measure: Measure) -> MeasureSeries {
    measure_series(engine, &[measure])
        .pop()
        .unwrap_or(MeasureSeries {
            measure,
            points: Vec::new(),
        })
}

/// Revenue and profit growth for every year after the first.
/// A year whose own or preceding record is missing reads as `0`.
pub fn growth_series(engine: &dyn RatioEngine) -> Vec<GrowthPoint> {
    let years = engine.years();

    years
        .windows(2)
        .map(|pair| {
            let previous = engine.record(&pair[0]);
            let current = engine.record(&pair[1]);

            let (revenue_growth, profit_growth) = match (&current, &previous) {
                (Some(current), Some(previous)) => (
                    current.ratio_against(RatioId::RevenueGrowth, Some(previous)),
                    current.ratio_against(RatioId::ProfitGrowth, Some(previous)),
                ),
                _ => (0.0, 0.0),
            };

            GrowthPoint {
                year: pair[1].clone(),
                revenue_growth,
                profit_growth,
            }
        })
        .collect()
}

pub fn chart_series(engine: &dyn RatioEngine) -> ChartSeries {
    debug!("Building chart series with the {} engine", engine.name());

    ChartSeries {
        revenue: single_series(engine, Measure::Field(CanonicalField::NetRevenue)),
        profit: single_series(engine, Measure::Field(CanonicalField::NetIncome)),
        profitability: measure_series(engine, PROFITABILITY_MEASURES),
        liquidity: measure_series(engine, LIQUIDITY_MEASURES),
        efficiency: single_series(engine, Measure::Ratio(RatioId::AssetTurnover)),
        growth: growth_series(engine),
    }
}
