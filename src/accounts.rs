use crate::schema::{LabeledRow, LabeledTable};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base quantities every ratio is derived from, independent of the table shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    NetRevenue,
    NetIncome,
    TotalAssets,
    Equity,
    TotalLiabilities,
    CurrentAssets,
    CurrentLiabilities,
    NonCurrentAssets,
    NonCurrentLiabilities,
    CostOfGoodsSold,
    Inventories,
    Receivables,
    Payables,
    GrossProfit,
    Ebitda,
    RecurringEbitda,
}

impl CanonicalField {
    pub fn display_name(&self) -> &'static str {
        match self {
            CanonicalField::NetRevenue => "Receita Líquida",
            CanonicalField::NetIncome => "Lucro Líquido",
            CanonicalField::TotalAssets => "Ativo Total",
            CanonicalField::Equity => "Patrimônio Líquido",
            CanonicalField::TotalLiabilities => "Passivo Total",
            CanonicalField::CurrentAssets => "Ativo Circulante",
            CanonicalField::CurrentLiabilities => "Passivo Circulante",
            CanonicalField::NonCurrentAssets => "Ativo Não Circulante",
            CanonicalField::NonCurrentLiabilities => "Passivo Não Circulante",
            CanonicalField::CostOfGoodsSold => "CMV",
            CanonicalField::Inventories => "Estoques",
            CanonicalField::Receivables => "Contas a Receber",
            CanonicalField::Payables => "Fornecedores",
            CanonicalField::GrossProfit => "Lucro Bruto",
            CanonicalField::Ebitda => "EBITDA",
            CanonicalField::RecurringEbitda => "EBITDA Recorrente",
        }
    }

    /// Costs may be stored as negative lines; their sign is dropped on read.
    pub fn is_absolute(&self) -> bool {
        matches!(self, CanonicalField::CostOfGoodsSold)
    }
}

/// Ordered `(field, synonyms)` pairs used to resolve labeled rows.
pub const KEYWORD_SYNONYMS: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::NetRevenue, &["receita líquida", "receita liquida"]),
    (CanonicalField::NetIncome, &["lucro líquido", "lucro liquido"]),
    (CanonicalField::TotalAssets, &["ativo total", "ativo"]),
    (CanonicalField::Equity, &["patrimônio líquido", "patrimonio liquido"]),
    (CanonicalField::TotalLiabilities, &["passivo total", "passivo"]),
    (CanonicalField::CurrentAssets, &["ativo circulante"]),
    (CanonicalField::CurrentLiabilities, &["passivo circulante"]),
    (CanonicalField::NonCurrentAssets, &["ativo não circulante", "ativo nao circulante"]),
    (
        CanonicalField::NonCurrentLiabilities,
        &["passivo não circulante", "passivo nao circulante"],
    ),
    (
        CanonicalField::CostOfGoodsSold,
        &["cmv", "custo mercadoria vendida", "custo dos produtos vendidos"],
    ),
    (CanonicalField::Inventories, &["estoques", "estoque"]),
    (CanonicalField::Receivables, &["contas a receber", "duplicatas a receber"]),
    (CanonicalField::Payables, &["fornecedores", "contas a pagar"]),
    (CanonicalField::GrossProfit, &["lucro bruto", "resultado bruto"]),
    (CanonicalField::Ebitda, &["ebitda", "lajida"]),
    (CanonicalField::RecurringEbitda, &["ebitda recorrente", "ebitda ajustado"]),
];

pub fn synonyms_for(field: CanonicalField) -> &'static [&'static str] {
    KEYWORD_SYNONYMS
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// Reads the numeric cell of `row` for `year`.
/// Absent rows, absent cells and text cells all read as `0`.
pub fn value_of(row: Option<&LabeledRow>, year: &str) -> f64 {
    row.and_then(|r| r.cells.get(year))
        .and_then(|cell| cell.as_number())
        .unwrap_or(0.0)
}

/// Canonical fields resolved to row positions of one labeled table.
///
/// Resolution happens once per table load; fields with no matching row are
/// kept as coverage gaps and read as `0` downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMap {
    resolved: BTreeMap<CanonicalField, usize>,
    missing: Vec<CanonicalField>,
}

impl AccountMap {
    pub fn resolve(table: &LabeledTable) -> Self {
        let mut resolved = BTreeMap::new();
        let mut missing = Vec::new();

        for (field, keywords) in KEYWORD_SYNONYMS {
            match table.position_by_keywords(keywords) {
                Some(idx) => {
                    debug!(
                        "Resolved {:?} to row '{}'",
                        field, table.rows[idx].label
                    );
                    resolved.insert(*field, idx);
                }
                None => missing.push(*field),
            }
        }

        if !missing.is_empty() {
            warn!(
                "{} canonical field(s) have no matching row and will read as zero: {:?}",
                missing.len(),
                missing
            );
        }

        Self { resolved, missing }
    }

    pub fn row<'t>(&self, table: &'t LabeledTable, field: CanonicalField) -> Option<&'t LabeledRow> {
        self.resolved.get(&field).and_then(|idx| table.rows.get(*idx))
    }

    pub fn value(&self, table: &LabeledTable, field: CanonicalField, year: &str) -> f64 {
        let value = value_of(self.row(table, field), year);
        if field.is_absolute() {
            value.abs()
        } else {
            value
        }
    }

    pub fn is_resolved(&self, field: CanonicalField) -> bool {
        self.resolved.contains_key(&field)
    }

    pub fn missing_fields(&self) -> &[CanonicalField] {
        &self.missing
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn to_markdown(&self, table: &LabeledTable) -> String {
        let mut output = String::new();

        output.push_str("# Account Coverage\n\n");
        output.push_str("| Field | Matched Row |\n");
        output.push_str("|---|---|\n");

        for (field, _) in KEYWORD_SYNONYMS {
            let matched = self
                .row(table, *field)
                .map(|r| r.label.as_str())
                .unwrap_or("**missing**");
            output.push_str(&format!("| {} | {} |\n", field.display_name(), matched));
        }
        output.push('\n');

        output.push_str(&format!(
            "**Resolved:** {} of {}\n",
            self.resolved.len(),
            KEYWORD_SYNONYMS.len()
        ));

        output
    }
}
