use crate::error::Result;
use crate::format::{CurrencyStyle, ValueFormatter};
use crate::panels::Panel;
use crate::thresholds::ThresholdTable;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Presentation and classification settings of a dashboard.
///
/// The default is the pt-BR dashboard with its literal thresholds. Files
/// loaded with [`DashboardConfig::from_file`] only need to name what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardConfig {
    #[schemars(
        description = "Status thresholds per panel, keyed by ratio id (e.g. 'simple' -> 'roe' -> {good, warning, comparison})"
    )]
    pub thresholds: BTreeMap<Panel, ThresholdTable>,

    pub currency: CurrencyStyle,

    #[schemars(description = "Unit appended to day counts, e.g. 'dias'")]
    pub days_suffix: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            thresholds: Panel::ALL
                .iter()
                .map(|panel| (*panel, ThresholdTable::defaults_for(*panel)))
                .collect(),
            currency: CurrencyStyle::default(),
            days_suffix: "dias".to_string(),
        }
    }
}

/// Partial configuration as written in a file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    thresholds: BTreeMap<Panel, ThresholdTable>,
    currency: Option<CurrencyStyle>,
    days_suffix: Option<String>,
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;

        let mut config = Self::default();
        for (panel, overrides) in &file.thresholds {
            debug!(
                "Overriding {} threshold(s) of the {:?} panel",
                overrides.len(),
                panel
            );
            config.thresholds.entry(*panel).or_default().merge(overrides);
        }
        if let Some(currency) = file.currency {
            config.currency = currency;
        }
        if let Some(days_suffix) = file.days_suffix {
            config.days_suffix = days_suffix;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading dashboard configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        for (panel, table) in &self.thresholds {
            table.validate(*panel)?;
        }
        Ok(())
    }

    pub fn thresholds_for(&self, panel: Panel) -> ThresholdTable {
        self.thresholds.get(&panel).cloned().unwrap_or_default()
    }

    pub fn formatter(&self) -> ValueFormatter {
        ValueFormatter::new(self.currency.clone(), self.days_suffix.clone())
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(DashboardConfig);
        serde_json::to_string_pretty(&schema)
    }
}
