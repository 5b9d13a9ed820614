//! Declarative status thresholds.
//!
//! Each panel carries its own [`ThresholdTable`], mapping a ratio to a
//! `(good, warning, comparison)` triple consulted by one generic classifier.

use crate::engine::RatioId;
use crate::error::{RatioError, Result};
use crate::panels::Panel;
use crate::schema::Status;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[schemars(description = "Higher is better; a bound is met when the value is strictly greater")]
    Above,

    #[schemars(description = "Higher is better; a bound is met when the value is greater or equal")]
    AtLeast,

    #[schemars(description = "Lower is better; a bound is met when the value is strictly smaller")]
    Below,

    #[schemars(description = "Lower is better; a bound is met when the value is smaller or equal")]
    AtMost,
}

impl Comparison {
    fn meets(&self, value: f64, bound: f64) -> bool {
        match self {
            Comparison::Above => value > bound,
            Comparison::AtLeast => value >= bound,
            Comparison::Below => value < bound,
            Comparison::AtMost => value <= bound,
        }
    }

    fn higher_is_better(&self) -> bool {
        matches!(self, Comparison::Above | Comparison::AtLeast)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Threshold {
    #[schemars(description = "Bound a value must meet to be classified 'good'")]
    pub good: f64,

    #[schemars(description = "Bound a value must meet to be classified 'warning'; anything else is 'bad'")]
    pub warning: f64,

    pub comparison: Comparison,
}

impl Threshold {
    pub const fn above(good: f64, warning: f64) -> Self {
        Self {
            good,
            warning,
            comparison: Comparison::Above,
        }
    }

    pub const fn at_least(good: f64, warning: f64) -> Self {
        Self {
            good,
            warning,
            comparison: Comparison::AtLeast,
        }
    }

    pub const fn below(good: f64, warning: f64) -> Self {
        Self {
            good,
            warning,
            comparison: Comparison::Below,
        }
    }

    pub const fn at_most(good: f64, warning: f64) -> Self {
        Self {
            good,
            warning,
            comparison: Comparison::AtMost,
        }
    }

    /// Maps every number, NaN included, to exactly one status.
    pub fn classify(&self, value: f64) -> Status {
        if self.comparison.meets(value, self.good) {
            Status::Good
        } else if self.comparison.meets(value, self.warning) {
            Status::Warning
        } else {
            Status::Bad
        }
    }

    /// The warning bound must not be stricter than the good bound.
    pub fn validate(&self, key: &str) -> Result<()> {
        if !self.good.is_finite() || !self.warning.is_finite() {
            return Err(RatioError::InvalidThreshold {
                key: key.to_string(),
                details: "bounds must be finite numbers".to_string(),
            });
        }

        let ordered = if self.comparison.higher_is_better() {
            self.good >= self.warning
        } else {
            self.good <= self.warning
        };

        if !ordered {
            return Err(RatioError::InvalidThreshold {
                key: key.to_string(),
                details: format!(
                    "good bound {} is less strict than warning bound {} for {:?}",
                    self.good, self.warning, self.comparison
                ),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ThresholdTable(BTreeMap<RatioId, Threshold>);

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: RatioId, threshold: Threshold) -> Self {
        self.0.insert(id, threshold);
        self
    }

    pub fn insert(&mut self, id: RatioId, threshold: Threshold) -> Option<Threshold> {
        self.0.insert(id, threshold)
    }

    pub fn get(&self, id: RatioId) -> Option<&Threshold> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Status for a ratio, or `None` when the table has no entry for it.
    pub fn classify(&self, id: RatioId, value: f64) -> Option<Status> {
        self.get(id).map(|t| t.classify(value))
    }

    /// Entries of `other` replace entries of `self`; everything else is kept.
    pub fn merge(&mut self, other: &ThresholdTable) {
        for (id, threshold) in &other.0 {
            self.0.insert(*id, *threshold);
        }
    }

    pub fn validate(&self, panel: Panel) -> Result<()> {
        for (id, threshold) in &self.0 {
            threshold.validate(&format!("{:?}.{:?}", panel, id))?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RatioId, &Threshold)> {
        self.0.iter()
    }

    /// The literal thresholds each panel ships with.
    pub fn defaults_for(panel: Panel) -> Self {
        match panel {
            Panel::Advanced => advanced_defaults(),
            Panel::Margins => margins_defaults(),
            Panel::Simple => simple_defaults(),
            Panel::Metrics => ThresholdTable::new(),
            Panel::Economic => economic_defaults(),
        }
    }
}

fn advanced_defaults() -> ThresholdTable {
    ThresholdTable::new()
        .with(RatioId::GeneralIndebtedness, Threshold::below(50.0, 70.0))
        .with(RatioId::LeverageMultiplier, Threshold::below(2.0, 3.0))
        .with(RatioId::CurrentLiquidity, Threshold::above(1.2, 1.0))
        .with(RatioId::GeneralLiquidity, Threshold::above(1.0, 0.8))
        .with(RatioId::NetMargin, Threshold::above(10.0, 5.0))
        .with(RatioId::Roa, Threshold::above(8.0, 4.0))
        .with(RatioId::Roe, Threshold::above(15.0, 10.0))
        .with(RatioId::AssetTurnover, Threshold::above(1.0, 0.5))
        .with(RatioId::InventoryDays, Threshold::below(60.0, 90.0))
        .with(RatioId::ReceivablesDays, Threshold::below(30.0, 60.0))
        .with(RatioId::PayablesDays, Threshold::above(60.0, 30.0))
        .with(RatioId::OperatingCycle, Threshold::below(90.0, 120.0))
        .with(RatioId::CashConversionCycle, Threshold::below(30.0, 60.0))
}

fn margins_defaults() -> ThresholdTable {
    ThresholdTable::new()
        .with(RatioId::GrossMargin, Threshold::above(40.0, 25.0))
        .with(RatioId::EbitdaMargin, Threshold::above(20.0, 10.0))
        .with(RatioId::RecurringEbitdaMargin, Threshold::above(20.0, 10.0))
        .with(RatioId::CogsToRevenue, Threshold::below(60.0, 75.0))
}

fn simple_defaults() -> ThresholdTable {
    ThresholdTable::new()
        .with(RatioId::NetMargin, Threshold::above(10.0, 5.0))
        .with(RatioId::Roe, Threshold::above(15.0, 10.0))
        .with(RatioId::Roa, Threshold::above(5.0, 2.0))
        .with(RatioId::CurrentLiquidity, Threshold::above(1.5, 1.0))
        .with(RatioId::GeneralIndebtedness, Threshold::below(40.0, 60.0))
        .with(RatioId::ThirdPartyCapital, Threshold::below(50.0, 100.0))
        .with(RatioId::AssetTurnover, Threshold::above(1.0, 0.5))
        .with(RatioId::RevenueGrowth, Threshold::above(10.0, 0.0))
        .with(RatioId::ProfitGrowth, Threshold::above(10.0, 0.0))
}

// Economic rows hold fractions rather than percentages.
fn economic_defaults() -> ThresholdTable {
    ThresholdTable::new()
        .with(RatioId::GeneralLiquidity, Threshold::at_least(1.0, 0.5))
        .with(RatioId::CurrentLiquidity, Threshold::at_least(1.0, 0.5))
        .with(RatioId::QuickLiquidity, Threshold::at_least(1.0, 0.5))
        .with(RatioId::GeneralIndebtedness, Threshold::at_most(0.3, 0.6))
        .with(RatioId::Roa, Threshold::at_least(0.1, 0.05))
        .with(RatioId::AssetTurnover, Threshold::at_least(0.1, 0.05))
}
