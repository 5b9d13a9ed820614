use crate::schema::{IndicatorResult, ValueFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct CurrencyStyle {
    #[schemars(description = "Symbol written before the amount, separated by a space (e.g. 'R$')")]
    pub symbol: String,

    #[schemars(description = "Character grouping the integer digits in threes (e.g. '.')")]
    pub thousands_separator: char,
}

impl Default for CurrencyStyle {
    fn default() -> Self {
        Self {
            symbol: "R$".to_string(),
            thousands_separator: '.',
        }
    }
}

/// Renders indicator values for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFormatter {
    pub currency: CurrencyStyle,
    pub days_suffix: String,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self {
            currency: CurrencyStyle::default(),
            days_suffix: "dias".to_string(),
        }
    }
}

impl ValueFormatter {
    pub fn new(currency: CurrencyStyle, days_suffix: impl Into<String>) -> Self {
        Self {
            currency,
            days_suffix: days_suffix.into(),
        }
    }

    pub fn format(&self, value: f64, format: ValueFormat) -> String {
        match format {
            ValueFormat::Percentage => format!("{:.2}%", value),
            ValueFormat::Decimal => format!("{:.2}", value),
            ValueFormat::Currency => self.format_currency(value),
            ValueFormat::Days => format!("{} {}", value.round() as i64, self.days_suffix),
        }
    }

    pub fn format_indicator(&self, indicator: &IndicatorResult) -> String {
        self.format(indicator.value, indicator.format)
    }

    /// Whole currency units with grouped thousands; the sign goes before the symbol.
    /// Non-finite amounts are written as `NaN`, `inf` or `-inf` after the symbol.
    pub fn format_currency(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return format!("{} {}", self.currency.symbol, amount);
        }

        let whole = amount.abs().round();
        let sign = if amount < 0.0 && whole > 0.0 { "-" } else { "" };

        // `whole` is integral, so this prints every digit without rounding or saturation
        let digits = format!("{:.0}", whole);
        let mut grouped = String::new();
        for (i, ch) in digits.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                grouped.push(self.currency.thousands_separator);
            }
            grouped.push(ch);
        }
        let grouped: String = grouped.chars().rev().collect();

        format!("{}{} {}", sign, self.currency.symbol, grouped)
    }
}

/// Formats with the default pt-BR presentation.
pub fn format_value(value: f64, format: ValueFormat) -> String {
    ValueFormatter::default().format(value, format)
}

/// Reads back a percentage rendered by [`format_value`], e.g. `"12.50%"`.
pub fn parse_percentage(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}
