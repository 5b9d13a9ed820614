use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A single value cell of a labeled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Cell {
    #[schemars(description = "A numeric value (numeric-looking text is coerced at ingestion)")]
    Number(f64),

    #[schemars(description = "Text that could not be read as a number. Resolves to 0 in calculations.")]
    Text(String),
}

impl Cell {
    /// Returns the numeric value, or `None` when the cell holds text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabeledRow {
    #[schemars(
        description = "Free-text name of the financial statement line (the 'Indicador' column), e.g. 'Receita Líquida'"
    )]
    pub label: String,

    #[schemars(description = "One cell per year column, keyed by the year label")]
    pub cells: BTreeMap<String, Cell>,
}

impl LabeledRow {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn with_cell(mut self, year: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.cells.insert(year.into(), cell.into());
        self
    }
}

/// Keyword-matched table shape: one row per statement line, one column per year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabeledTable {
    pub rows: Vec<LabeledRow>,
}

impl LabeledTable {
    pub fn new(rows: Vec<LabeledRow>) -> Self {
        Self { rows }
    }

    /// Returns the first row (in table order) whose lower-cased label contains
    /// any of the lower-cased keywords. Keyword order carries no priority.
    pub fn lookup_by_keywords(&self, keywords: &[&str]) -> Option<&LabeledRow> {
        self.position_by_keywords(keywords).map(|idx| &self.rows[idx])
    }

    pub(crate) fn position_by_keywords(&self, keywords: &[&str]) -> Option<usize> {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

        self.rows.iter().position(|row| {
            let label = row.label.to_lowercase();
            keywords.iter().any(|keyword| label.contains(keyword.as_str()))
        })
    }
}

/// Fixed-schema table shape: one record per year with pre-named fields.
///
/// Field names follow the CSV headers of the upload (`Ano`, `Ativo_Circulante`, ...).
/// Missing columns and non-numeric cells read as `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearRecord {
    #[serde(rename = "Ano", deserialize_with = "lenient_year")]
    #[schemars(description = "Fiscal year of the record")]
    pub year: i32,

    #[serde(rename = "Ativo_Circulante", default, deserialize_with = "lenient_number")]
    pub current_assets: f64,

    #[serde(rename = "Passivo_Circulante", default, deserialize_with = "lenient_number")]
    pub current_liabilities: f64,

    #[serde(rename = "Patrimonio_Liquido", default, deserialize_with = "lenient_number")]
    pub equity: f64,

    #[serde(rename = "Ativo_Total", default, deserialize_with = "lenient_number")]
    pub total_assets: f64,

    #[serde(rename = "Passivo_Nao_Circulante", default, deserialize_with = "lenient_number")]
    pub non_current_liabilities: f64,

    #[serde(rename = "Receita_Liquida", default, deserialize_with = "lenient_number")]
    pub net_revenue: f64,

    #[serde(rename = "Lucro_Liquido", default, deserialize_with = "lenient_number")]
    pub net_income: f64,

    #[serde(rename = "Endividamento_Geral", default, deserialize_with = "lenient_number")]
    #[schemars(description = "General indebtedness, in percent")]
    pub general_indebtedness: f64,

    #[serde(
        rename = "Participacao_Capitais_Terceiros",
        default,
        deserialize_with = "lenient_number"
    )]
    #[schemars(description = "Third-party capital over equity, in percent")]
    pub third_party_capital: f64,

    #[serde(rename = "Composicao_Endividamento", default, deserialize_with = "lenient_number")]
    pub debt_composition: f64,

    #[serde(rename = "Grau_Imobilizacao_PL", default, deserialize_with = "lenient_number")]
    pub equity_immobilization: f64,

    #[serde(rename = "Grau_Imobilizacao_RNC", default, deserialize_with = "lenient_number")]
    pub non_current_resources_immobilization: f64,

    #[serde(rename = "Liquidez_Geral", default, deserialize_with = "lenient_number")]
    pub general_liquidity: f64,

    #[serde(rename = "Liquidez_Corrente", default, deserialize_with = "lenient_number")]
    pub current_liquidity: f64,

    #[serde(rename = "Liquidez_Seca", default, deserialize_with = "lenient_number")]
    pub quick_liquidity: f64,

    #[serde(rename = "Giro_Ativo", default, deserialize_with = "lenient_number")]
    pub asset_turnover: f64,

    #[serde(rename = "Margem_Liquida", default, deserialize_with = "lenient_number")]
    #[schemars(description = "Net margin, in percent")]
    pub net_margin: f64,

    #[serde(rename = "ROA", default, deserialize_with = "lenient_number")]
    pub roa: f64,

    #[serde(rename = "ROE", default, deserialize_with = "lenient_number")]
    pub roe: f64,

    #[serde(rename = "MAF", default, deserialize_with = "lenient_number")]
    #[schemars(description = "Financial leverage multiplier (total assets over equity)")]
    pub leverage_multiplier: f64,

    #[serde(rename = "ROI_DuPont", default, deserialize_with = "lenient_number")]
    pub roi_dupont: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearTable {
    pub records: Vec<YearRecord>,
}

impl YearTable {
    pub fn new(records: Vec<YearRecord>) -> Self {
        Self { records }
    }

    /// Finds the record whose year, rendered as a string, equals `year`.
    pub fn find_year_record(&self, year: &str) -> Option<&YearRecord> {
        self.records.iter().find(|r| r.year.to_string() == year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum FinancialTable {
    #[schemars(description = "Rows of free-text labeled statement lines with one column per year")]
    Labeled(LabeledTable),

    #[schemars(description = "One record per year with fixed, pre-named numeric fields")]
    Yearly(YearTable),
}

impl FinancialTable {
    pub fn is_empty(&self) -> bool {
        match self {
            FinancialTable::Labeled(t) => t.rows.is_empty(),
            FinancialTable::Yearly(t) => t.records.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    #[schemars(description = "Two decimal places followed by '%'")]
    Percentage,

    #[schemars(description = "Two decimal places, no unit")]
    Decimal,

    #[schemars(description = "Locale currency with no fractional digits")]
    Currency,

    #[schemars(description = "Rounded to whole days with a unit suffix")]
    Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Good,
    Warning,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndicatorResult {
    #[schemars(description = "Display name of the indicator, e.g. 'Margem Líquida'")]
    pub name: String,

    pub value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Value of the same indicator in the comparison year, when the panel compares years")]
    pub previous_value: Option<f64>,

    pub format: ValueFormat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    pub description: String,
}

impl IndicatorResult {
    /// Percent change against `previous_value`; `0` when there is no previous value or it is zero.
    pub fn trend(&self) -> f64 {
        self.previous_value
            .map(|previous| crate::utils::trend_percent(self.value, previous))
            .unwrap_or(0.0)
    }

    pub fn direction(&self) -> Option<crate::utils::TrendDirection> {
        self.previous_value
            .map(|previous| crate::utils::classify_trend_direction(self.value, previous))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndicatorGroup {
    #[schemars(description = "Category label, e.g. 'Liquidez' or 'Rentabilidade'")]
    pub category: String,

    pub indicators: Vec<IndicatorResult>,
}

impl IndicatorGroup {
    pub fn find(&self, name: &str) -> Option<&IndicatorResult> {
        self.indicators.iter().find(|i| i.name == name)
    }
}

/// Flattens grouped results into a single list, preserving order.
pub fn flatten_groups(groups: &[IndicatorGroup]) -> Vec<&IndicatorResult> {
    groups.iter().flat_map(|g| g.indicators.iter()).collect()
}

/// Reads a numeric-looking string the way the upload does: trimmed, empty is `0`,
/// and anything that does not parse to a finite number is `None`.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[allow(dead_code)]
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match RawValue::deserialize(deserializer)? {
        RawValue::Number(n) if n.is_finite() => n,
        RawValue::Text(s) => coerce_number(&s).unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(value)
}

fn lenient_year<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let number = match RawValue::deserialize(deserializer)? {
        RawValue::Number(n) => Some(n),
        RawValue::Text(s) if !s.trim().is_empty() => coerce_number(&s),
        _ => None,
    };

    match number {
        Some(n) if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 => {
            Ok(n as i32)
        }
        _ => Err(D::Error::custom("year must be an integer")),
    }
}

pub fn indicator_groups_schema_as_json() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(Vec<IndicatorGroup>);
    serde_json::to_string_pretty(&schema)
}
