//! # Financial Ratio Engine
//!
//! Computes categorized financial indicators (indebtedness, liquidity,
//! profitability, activity, margins and growth) from uploaded statement tables,
//! ready for a dashboard to display.
//!
//! ## Core Concepts
//!
//! - **Labeled tables**: free-text statement lines (`Indicador` column) with one
//!   column per year. Lines are matched to canonical fields by keyword.
//! - **Year tables**: one fixed-schema record per year (`Ano` column) whose
//!   ratios were already computed upstream.
//! - **Canonical records**: both shapes normalize to the same per-year record,
//!   so every panel works over either table.
//! - **Panels**: groups of [`IndicatorResult`]s for a selected year, compared
//!   against the preceding year where the panel shows trends.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_ratio_engine::*;
//!
//! let dashboard = RatioDashboard::from_csv_str(
//!     "Indicador,2022,2023\n\
//!      Receita Líquida,1000,1200\n\
//!      Lucro Líquido,100,150\n\
//!      Ativo Total,2000,2200\n",
//! )?;
//!
//! let selection = dashboard.default_selection().unwrap();
//! for group in dashboard.panel(Panel::Simple, &selection) {
//!     for indicator in &group.indicators {
//!         println!("{}: {}", indicator.name, dashboard.format(indicator));
//!     }
//! }
//! ```

pub mod accounts;
pub mod config;
pub mod economic;
pub mod engine;
pub mod error;
pub mod format;
pub mod ingestion;
pub mod panels;
pub mod schema;
pub mod series;
pub mod thresholds;
pub mod utils;

pub use accounts::{AccountMap, CanonicalField};
pub use config::DashboardConfig;
pub use economic::economic_indicators;
pub use engine::{
    engine_for, CanonicalRecord, FixedSchemaEngine, KeywordEngine, Measure, RatioEngine, RatioId,
};
pub use error::{RatioError, Result};
pub use format::{format_value, parse_percentage, CurrencyStyle, ValueFormatter};
pub use ingestion::{load_csv_file, parse_csv};
pub use panels::{
    compute_fixed_schema_indicators, compute_indicators, compute_margin_indicators,
    compute_panel, Panel,
};
pub use schema::*;
pub use series::{chart_series, ChartSeries, GrowthPoint, MeasureSeries, SeriesPoint};
pub use thresholds::{Comparison, Threshold, ThresholdTable};
pub use utils::*;

use log::{debug, info};
use std::path::Path;

/// A loaded table together with the settings used to present it.
///
/// Keyword resolution of a labeled table happens once, when the dashboard is built.
#[derive(Debug, Clone)]
pub struct RatioDashboard {
    table: FinancialTable,
    accounts: Option<AccountMap>,
    config: DashboardConfig,
}

impl RatioDashboard {
    pub fn new(table: FinancialTable) -> Self {
        let accounts = match &table {
            FinancialTable::Labeled(t) => {
                let map = AccountMap::resolve(t);
                debug!(
                    "Resolved {} of {} canonical fields",
                    map.resolved_count(),
                    accounts::KEYWORD_SYNONYMS.len()
                );
                Some(map)
            }
            FinancialTable::Yearly(_) => None,
        };

        let dashboard = Self {
            table,
            accounts,
            config: DashboardConfig::default(),
        };
        let years = dashboard.years();
        info!("Dashboard ready with {} year(s): {:?}", years.len(), years);
        dashboard
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        Ok(Self::new(parse_csv(text)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load_csv_file(path)?))
    }

    pub fn with_config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn table(&self) -> &FinancialTable {
        &self.table
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Keyword resolution of a labeled table; `None` for year tables.
    pub fn accounts(&self) -> Option<&AccountMap> {
        self.accounts.as_ref()
    }

    pub fn engine(&self) -> Box<dyn RatioEngine + '_> {
        match (&self.table, &self.accounts) {
            (FinancialTable::Labeled(t), Some(accounts)) => {
                Box::new(KeywordEngine::with_accounts(t, accounts.clone()))
            }
            _ => engine_for(&self.table),
        }
    }

    pub fn years(&self) -> Vec<String> {
        discover_years(&self.table)
    }

    /// The most recent year compared against the one before it.
    pub fn default_selection(&self) -> Option<YearSelection> {
        YearSelection::latest(&self.years())
    }

    pub fn selection_for(&self, year: &str) -> YearSelection {
        YearSelection::for_year(&self.years(), year)
    }

    pub fn panel(&self, panel: Panel, selection: &YearSelection) -> Vec<IndicatorGroup> {
        let engine = self.engine();
        compute_panel(
            &*engine,
            panel,
            selection,
            &self.config.thresholds_for(panel),
        )
    }

    /// Pre-computed economic indicator rows; `None` unless the table is labeled.
    pub fn economic(&self, selection: &YearSelection) -> Option<IndicatorGroup> {
        match &self.table {
            FinancialTable::Labeled(t) => Some(economic_indicators(
                t,
                selection,
                &self.config.thresholds_for(Panel::Economic),
            )),
            FinancialTable::Yearly(_) => None,
        }
    }

    pub fn chart_series(&self) -> ChartSeries {
        chart_series(&*self.engine())
    }

    pub fn format(&self, indicator: &IndicatorResult) -> String {
        self.config.formatter().format_indicator(indicator)
    }

    pub fn coverage_markdown(&self) -> Option<String> {
        match (&self.table, &self.accounts) {
            (FinancialTable::Labeled(t), Some(accounts)) => Some(accounts.to_markdown(t)),
            _ => None,
        }
    }
}
