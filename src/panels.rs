use crate::accounts::CanonicalField;
use crate::economic::economic_indicators;
use crate::engine::{
    CanonicalRecord, FixedSchemaEngine, KeywordEngine, Measure, RatioEngine, RatioId,
};
use crate::schema::ValueFormat::{Days, Decimal, Percentage};
use crate::schema::{IndicatorGroup, IndicatorResult, LabeledTable, ValueFormat, YearTable};
use crate::thresholds::ThresholdTable;
use crate::utils::YearSelection;
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The indicator presentations the dashboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    #[schemars(description = "Indebtedness, liquidity, profitability and activity ratios derived from statement lines")]
    Advanced,

    #[schemars(description = "Gross, EBITDA and recurring EBITDA margins plus COGS over revenue")]
    Margins,

    #[schemars(description = "Key ratios with year-over-year comparison and growth")]
    Simple,

    #[schemars(description = "Headline amounts and ratios with their previous-year values, unclassified")]
    Metrics,

    #[schemars(description = "Pre-computed indicator rows reported as found in a labeled table")]
    Economic,
}

impl Panel {
    pub const ALL: [Panel; 5] = [
        Panel::Advanced,
        Panel::Margins,
        Panel::Simple,
        Panel::Metrics,
        Panel::Economic,
    ];

    /// Whether indicators of this panel carry the comparison year's value.
    pub fn compares_years(&self) -> bool {
        matches!(self, Panel::Simple | Panel::Metrics | Panel::Economic)
    }

    fn groups(&self) -> &'static [GroupDef] {
        match self {
            Panel::Advanced => ADVANCED,
            Panel::Margins => MARGINS,
            Panel::Simple => SIMPLE,
            Panel::Metrics => METRICS,
            Panel::Economic => &[],
        }
    }
}

struct IndicatorDef {
    measure: Measure,
    name: &'static str,
    format: ValueFormat,
    /// `{previous}` is replaced by the comparison year.
    description: &'static str,
}

struct GroupDef {
    category: &'static str,
    indicators: &'static [IndicatorDef],
}

const fn ratio(
    id: RatioId,
    name: &'static str,
    format: ValueFormat,
    description: &'static str,
) -> IndicatorDef {
    IndicatorDef {
        measure: Measure::Ratio(id),
        name,
        format,
        description,
    }
}

const fn amount(field: CanonicalField, name: &'static str, description: &'static str) -> IndicatorDef {
    IndicatorDef {
        measure: Measure::Field(field),
        name,
        format: ValueFormat::Currency,
        description,
    }
}

const ADVANCED: &[GroupDef] = &[
    GroupDef {
        category: "Endividamento",
        indicators: &[
            ratio(
                RatioId::GeneralIndebtedness,
                "Endividamento Geral",
                Percentage,
                "Percentual de recursos de terceiros em relação ao ativo total",
            ),
            ratio(
                RatioId::LeverageMultiplier,
                "Multiplicador de Alavancagem",
                Decimal,
                "Relação entre ativo total e patrimônio líquido",
            ),
        ],
    },
    GroupDef {
        category: "Liquidez",
        indicators: &[
            ratio(
                RatioId::CurrentLiquidity,
                "Liquidez Corrente",
                Decimal,
                "Capacidade de pagamento das obrigações de curto prazo",
            ),
            ratio(
                RatioId::GeneralLiquidity,
                "Liquidez Geral",
                Decimal,
                "Capacidade de pagamento das obrigações totais",
            ),
        ],
    },
    GroupDef {
        category: "Rentabilidade",
        indicators: &[
            ratio(
                RatioId::NetMargin,
                "Margem Líquida",
                Percentage,
                "Percentual de lucro sobre as vendas",
            ),
            ratio(
                RatioId::Roa,
                "ROA - Retorno sobre Ativos",
                Percentage,
                "Retorno gerado pelos ativos da empresa",
            ),
            ratio(
                RatioId::Roe,
                "ROE - Retorno sobre Patrimônio",
                Percentage,
                "Retorno sobre o investimento dos acionistas",
            ),
            ratio(
                RatioId::AssetTurnover,
                "Giro do Ativo",
                Decimal,
                "Eficiência na utilização dos ativos",
            ),
        ],
    },
    GroupDef {
        category: "Atividade",
        indicators: &[
            ratio(
                RatioId::InventoryDays,
                "PMRE - Prazo Médio Renovação Estoques",
                Days,
                "Tempo médio para renovar os estoques",
            ),
            ratio(
                RatioId::ReceivablesDays,
                "PMRV - Prazo Médio Recebimento",
                Days,
                "Tempo médio para receber vendas",
            ),
            ratio(
                RatioId::PayablesDays,
                "PMPC - Prazo Médio Pagamento Compras",
                Days,
                "Tempo médio para pagar fornecedores",
            ),
            ratio(
                RatioId::OperatingCycle,
                "Ciclo Operacional",
                Days,
                "Tempo entre compra e recebimento",
            ),
            ratio(
                RatioId::CashConversionCycle,
                "Ciclo Financeiro",
                Days,
                "Necessidade de capital de giro",
            ),
        ],
    },
];

const MARGINS: &[GroupDef] = &[GroupDef {
    category: "Margens",
    indicators: &[
        ratio(
            RatioId::GrossMargin,
            "Margem Bruta",
            Percentage,
            "Lucro bruto sobre a receita líquida",
        ),
        ratio(
            RatioId::EbitdaMargin,
            "Margem EBITDA",
            Percentage,
            "EBITDA sobre a receita líquida",
        ),
        ratio(
            RatioId::RecurringEbitdaMargin,
            "Margem EBITDA Recorrente",
            Percentage,
            "EBITDA recorrente sobre a receita líquida",
        ),
        ratio(
            RatioId::CogsToRevenue,
            "CMV / Receita",
            Percentage,
            "Participação do custo das mercadorias vendidas na receita",
        ),
    ],
}];

const SIMPLE: &[GroupDef] = &[
    GroupDef {
        category: "Rentabilidade",
        indicators: &[
            ratio(
                RatioId::NetMargin,
                "Margem Líquida",
                Percentage,
                "Percentual do lucro líquido sobre a receita líquida",
            ),
            ratio(
                RatioId::Roe,
                "ROE",
                Percentage,
                "Rentabilidade do patrimônio líquido",
            ),
            ratio(RatioId::Roa, "ROA", Percentage, "Rentabilidade do ativo"),
        ],
    },
    GroupDef {
        category: "Liquidez e Endividamento",
        indicators: &[
            ratio(
                RatioId::CurrentLiquidity,
                "Liquidez Corrente",
                Decimal,
                "Capacidade de pagar obrigações de curto prazo",
            ),
            ratio(
                RatioId::GeneralIndebtedness,
                "Endividamento Geral",
                Percentage,
                "Proporção do ativo financiada por capitais de terceiros",
            ),
            ratio(
                RatioId::ThirdPartyCapital,
                "Participação Capitais Terceiros",
                Percentage,
                "Relação entre capital de terceiros e patrimônio líquido",
            ),
        ],
    },
    GroupDef {
        category: "Eficiência e Crescimento",
        indicators: &[
            ratio(
                RatioId::AssetTurnover,
                "Giro do Ativo",
                Decimal,
                "Eficiência do uso dos ativos para gerar receita",
            ),
            ratio(
                RatioId::RevenueGrowth,
                "Crescimento da Receita",
                Percentage,
                "Crescimento da receita vs {previous}",
            ),
            ratio(
                RatioId::ProfitGrowth,
                "Crescimento do Lucro",
                Percentage,
                "Crescimento do lucro líquido vs {previous}",
            ),
        ],
    },
];

const METRICS: &[GroupDef] = &[GroupDef {
    category: "Visão Geral",
    indicators: &[
        amount(
            CanonicalField::NetRevenue,
            "Receita Líquida",
            "Valor total de vendas líquidas no período",
        ),
        amount(
            CanonicalField::NetIncome,
            "Lucro Líquido",
            "Lucro final após todas as despesas e impostos",
        ),
        ratio(
            RatioId::CurrentLiquidity,
            "Liquidez Corrente",
            Decimal,
            "Capacidade de pagar obrigações de curto prazo",
        ),
        ratio(
            RatioId::GeneralIndebtedness,
            "Endividamento Geral",
            Percentage,
            "Proporção do ativo financiada por capitais de terceiros",
        ),
        ratio(
            RatioId::ThirdPartyCapital,
            "Participação Capitais Terceiros",
            Percentage,
            "Relação entre capital de terceiros e patrimônio líquido",
        ),
        ratio(
            RatioId::NetMargin,
            "Margem Líquida",
            Percentage,
            "Percentual do lucro líquido sobre a receita líquida",
        ),
        ratio(RatioId::Roe, "ROE", Percentage, "Rentabilidade do patrimônio líquido"),
        ratio(RatioId::Roa, "ROA", Percentage, "Rentabilidade do ativo"),
        ratio(
            RatioId::AssetTurnover,
            "Giro do Ativo",
            Decimal,
            "Eficiência do uso dos ativos para gerar receita",
        ),
    ],
}];

/// Computes one panel for a year selection.
///
/// Returns no groups when the engine has no record for the selected year.
pub fn compute_panel(
    engine: &dyn RatioEngine,
    panel: Panel,
    selection: &YearSelection,
    thresholds: &ThresholdTable,
) -> Vec<IndicatorGroup> {
    info!(
        "Computing {:?} panel for {} (previous {}) with the {} engine",
        panel,
        selection.selected_year,
        selection.previous_year,
        engine.name()
    );

    if panel == Panel::Economic {
        return match engine.labeled_table() {
            Some(table) => vec![economic_indicators(table, selection, thresholds)],
            None => {
                warn!("Economic panel needs a labeled table; the {} engine has none", engine.name());
                Vec::new()
            }
        };
    }

    let Some(current) = engine.record(&selection.selected_year) else {
        warn!("No data for year {}", selection.selected_year);
        return Vec::new();
    };

    let previous = if panel.compares_years() {
        let previous = engine.record(&selection.previous_year);
        if previous.is_none() {
            warn!(
                "No data for comparison year {}; previous values read as zero",
                selection.previous_year
            );
        }
        previous
    } else {
        None
    };

    panel
        .groups()
        .iter()
        .map(|group| IndicatorGroup {
            category: group.category.to_string(),
            indicators: group
                .indicators
                .iter()
                .map(|def| {
                    build_indicator(def, panel, &current, previous.as_ref(), selection, thresholds)
                })
                .collect(),
        })
        .collect()
}

fn build_indicator(
    def: &IndicatorDef,
    panel: Panel,
    current: &CanonicalRecord,
    previous: Option<&CanonicalRecord>,
    selection: &YearSelection,
    thresholds: &ThresholdTable,
) -> IndicatorResult {
    let value = def.measure.evaluate(current, previous);

    let is_growth = def.measure.ratio_id().is_some_and(|id| id.is_comparison());
    let previous_value = if panel.compares_years() && !is_growth {
        Some(
            previous
                .map(|p| def.measure.evaluate(p, None))
                .unwrap_or(0.0),
        )
    } else {
        None
    };

    let status = def
        .measure
        .ratio_id()
        .and_then(|id| thresholds.classify(id, value));

    IndicatorResult {
        name: def.name.to_string(),
        value,
        previous_value,
        format: def.format,
        status,
        description: def
            .description
            .replace("{previous}", &selection.previous_year),
    }
}

/// Keyword-matched indicators (indebtedness, liquidity, profitability, activity) for one year.
pub fn compute_indicators(table: &LabeledTable, year: &str) -> Vec<IndicatorGroup> {
    let engine = KeywordEngine::new(table);
    let selection = YearSelection {
        selected_year: year.to_string(),
        previous_year: year.to_string(),
    };
    compute_panel(
        &engine,
        Panel::Advanced,
        &selection,
        &ThresholdTable::defaults_for(Panel::Advanced),
    )
}

/// Keyword-matched margin indicators for one year.
pub fn compute_margin_indicators(table: &LabeledTable, year: &str) -> Vec<IndicatorGroup> {
    let engine = KeywordEngine::new(table);
    let selection = YearSelection {
        selected_year: year.to_string(),
        previous_year: year.to_string(),
    };
    compute_panel(
        &engine,
        Panel::Margins,
        &selection,
        &ThresholdTable::defaults_for(Panel::Margins),
    )
}

/// Fixed-schema indicators for a selected year compared against `previous_year`.
pub fn compute_fixed_schema_indicators(
    table: &YearTable,
    selected_year: &str,
    previous_year: &str,
) -> Vec<IndicatorGroup> {
    let engine = FixedSchemaEngine::new(table);
    let selection = YearSelection {
        selected_year: selected_year.to_string(),
        previous_year: previous_year.to_string(),
    };
    compute_panel(
        &engine,
        Panel::Simple,
        &selection,
        &ThresholdTable::defaults_for(Panel::Simple),
    )
}
