use crate::accounts::{AccountMap, CanonicalField};
use crate::schema::{FinancialTable, LabeledTable, YearRecord, YearTable};
use crate::utils::{discover_labeled_years, discover_record_years, safe_ratio, trend_percent};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DAYS_IN_YEAR: f64 = 365.0;

/// Every ratio the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatioId {
    /// Liabilities over total assets, in percent
    GeneralIndebtedness,
    /// Liabilities over equity, in percent
    ThirdPartyCapital,
    /// Current over total (current + non-current) liabilities, in percent
    DebtComposition,
    /// Non-current assets over equity, in percent
    EquityImmobilization,
    /// Non-current assets over equity plus non-current liabilities, in percent
    NonCurrentResourcesImmobilization,
    LeverageMultiplier,
    CurrentLiquidity,
    GeneralLiquidity,
    QuickLiquidity,
    AssetTurnover,
    NetMargin,
    Roa,
    Roe,
    RoiDuPont,
    /// PMRE: days to turn over inventory
    InventoryDays,
    /// PMRV: days to collect receivables
    ReceivablesDays,
    /// PMPC: days to pay suppliers
    PayablesDays,
    OperatingCycle,
    CashConversionCycle,
    GrossMargin,
    EbitdaMargin,
    RecurringEbitdaMargin,
    CogsToRevenue,
    /// Year-over-year change of net revenue, in percent
    RevenueGrowth,
    /// Year-over-year change of net income, in percent
    ProfitGrowth,
}

impl RatioId {
    /// Growth ratios compare two years and have no single-year value.
    pub fn is_comparison(&self) -> bool {
        matches!(self, RatioId::RevenueGrowth | RatioId::ProfitGrowth)
    }
}

/// What an indicator displays: a raw base quantity or a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Measure {
    Field(CanonicalField),
    Ratio(RatioId),
}

impl Measure {
    pub fn evaluate(&self, current: &CanonicalRecord, previous: Option<&CanonicalRecord>) -> f64 {
        match self {
            Measure::Field(field) => current.field(*field),
            Measure::Ratio(id) => current.ratio_against(*id, previous),
        }
    }

    pub fn ratio_id(&self) -> Option<RatioId> {
        match self {
            Measure::Ratio(id) => Some(*id),
            Measure::Field(_) => None,
        }
    }
}

/// One year of financial data normalized from either table shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub year: String,
    fields: BTreeMap<CanonicalField, f64>,
    stored: BTreeMap<RatioId, f64>,
}

impl CanonicalRecord {
    pub fn new(year: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            fields: BTreeMap::new(),
            stored: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: CanonicalField, value: f64) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub fn with_stored_ratio(mut self, id: RatioId, value: f64) -> Self {
        self.stored.insert(id, value);
        self
    }

    /// Base quantity, `0` when the source did not provide it.
    pub fn field(&self, field: CanonicalField) -> f64 {
        self.fields.get(&field).copied().unwrap_or(0.0)
    }

    /// Ratio value supplied by the source table, if any.
    pub fn stored_ratio(&self, id: RatioId) -> Option<f64> {
        self.stored.get(&id).copied()
    }

    /// Stored value when present, otherwise derived from the base quantities.
    pub fn ratio(&self, id: RatioId) -> f64 {
        self.stored_ratio(id).unwrap_or_else(|| self.derive(id))
    }

    /// Like [`ratio`](Self::ratio), but growth ratios are measured against `previous`.
    /// Without a previous record, growth is `0`.
    pub fn ratio_against(&self, id: RatioId, previous: Option<&CanonicalRecord>) -> f64 {
        match id {
            RatioId::RevenueGrowth => previous
                .map(|p| {
                    trend_percent(
                        self.field(CanonicalField::NetRevenue),
                        p.field(CanonicalField::NetRevenue),
                    )
                })
                .unwrap_or(0.0),
            RatioId::ProfitGrowth => previous
                .map(|p| {
                    trend_percent(
                        self.field(CanonicalField::NetIncome),
                        p.field(CanonicalField::NetIncome),
                    )
                })
                .unwrap_or(0.0),
            _ => self.ratio(id),
        }
    }

    /// Computes a ratio from base quantities. Zero denominators yield `0`.
    pub fn derive(&self, id: RatioId) -> f64 {
        use CanonicalField::*;

        let revenue = self.field(NetRevenue);
        let income = self.field(NetIncome);
        let assets = self.field(TotalAssets);
        let equity = self.field(Equity);
        let liabilities = self.field(TotalLiabilities);
        let current_assets = self.field(CurrentAssets);
        let current_liabilities = self.field(CurrentLiabilities);
        let non_current_assets = self.field(NonCurrentAssets);
        let non_current_liabilities = self.field(NonCurrentLiabilities);
        let cogs = self.field(CostOfGoodsSold);

        match id {
            RatioId::GeneralIndebtedness => safe_ratio(liabilities, assets) * 100.0,
            RatioId::ThirdPartyCapital => safe_ratio(liabilities, equity) * 100.0,
            RatioId::DebtComposition => {
                safe_ratio(current_liabilities, current_liabilities + non_current_liabilities)
                    * 100.0
            }
            RatioId::EquityImmobilization => safe_ratio(non_current_assets, equity) * 100.0,
            RatioId::NonCurrentResourcesImmobilization => {
                safe_ratio(non_current_assets, equity + non_current_liabilities) * 100.0
            }
            RatioId::LeverageMultiplier => safe_ratio(assets, equity),
            RatioId::CurrentLiquidity => safe_ratio(current_assets, current_liabilities),
            // Denominator adds current liabilities on top of total liabilities
            RatioId::GeneralLiquidity => safe_ratio(assets, liabilities + current_liabilities),
            RatioId::QuickLiquidity => {
                safe_ratio(current_assets - self.field(Inventories), current_liabilities)
            }
            RatioId::AssetTurnover => safe_ratio(revenue, assets),
            RatioId::NetMargin => safe_ratio(income, revenue) * 100.0,
            RatioId::Roa => safe_ratio(income, assets) * 100.0,
            RatioId::Roe => safe_ratio(income, equity) * 100.0,
            RatioId::RoiDuPont => {
                self.derive(RatioId::NetMargin) * self.derive(RatioId::AssetTurnover)
            }
            RatioId::InventoryDays => days_of(self.field(Inventories), cogs),
            RatioId::ReceivablesDays => days_of(self.field(Receivables), revenue),
            RatioId::PayablesDays => days_of(self.field(Payables), cogs),
            RatioId::OperatingCycle => {
                self.ratio(RatioId::InventoryDays) + self.ratio(RatioId::ReceivablesDays)
            }
            RatioId::CashConversionCycle => {
                self.ratio(RatioId::OperatingCycle) - self.ratio(RatioId::PayablesDays)
            }
            RatioId::GrossMargin => safe_ratio(self.field(GrossProfit), revenue) * 100.0,
            RatioId::EbitdaMargin => safe_ratio(self.field(Ebitda), revenue) * 100.0,
            RatioId::RecurringEbitdaMargin => {
                safe_ratio(self.field(RecurringEbitda), revenue) * 100.0
            }
            RatioId::CogsToRevenue => safe_ratio(cogs, revenue) * 100.0,
            RatioId::RevenueGrowth | RatioId::ProfitGrowth => 0.0,
        }
    }
}

/// `balance × 365 / flow`, only when both are non-zero.
fn days_of(balance: f64, flow: f64) -> f64 {
    if balance != 0.0 && flow != 0.0 {
        (balance * DAYS_IN_YEAR) / flow
    } else {
        0.0
    }
}

/// A source of canonical year records, whatever the shape of the uploaded table.
pub trait RatioEngine {
    fn name(&self) -> &'static str;

    /// Available years, oldest first.
    fn years(&self) -> Vec<String>;

    /// Normalizes one year. `None` means the table has no data for it.
    fn record(&self, year: &str) -> Option<CanonicalRecord>;

    /// The labeled table behind the engine, for panels that read rows directly.
    fn labeled_table(&self) -> Option<&LabeledTable> {
        None
    }
}

/// Engine over free-text labeled rows resolved by keyword.
pub struct KeywordEngine<'a> {
    table: &'a LabeledTable,
    accounts: AccountMap,
}

impl<'a> KeywordEngine<'a> {
    pub fn new(table: &'a LabeledTable) -> Self {
        Self {
            table,
            accounts: AccountMap::resolve(table),
        }
    }

    pub fn with_accounts(table: &'a LabeledTable, accounts: AccountMap) -> Self {
        Self { table, accounts }
    }

    pub fn accounts(&self) -> &AccountMap {
        &self.accounts
    }
}

impl RatioEngine for KeywordEngine<'_> {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn years(&self) -> Vec<String> {
        discover_labeled_years(self.table)
    }

    // Labeled tables always yield a record: absent cells simply read as zero.
    fn record(&self, year: &str) -> Option<CanonicalRecord> {
        let record = crate::accounts::KEYWORD_SYNONYMS.iter().fold(
            CanonicalRecord::new(year),
            |record, (field, _)| {
                let value = self.accounts.value(self.table, *field, year);
                record.with_field(*field, value)
            },
        );
        debug!("Normalized labeled data for year {}", year);
        Some(record)
    }

    fn labeled_table(&self) -> Option<&LabeledTable> {
        Some(self.table)
    }
}

/// Engine over fixed-schema year records whose ratios were computed upstream.
pub struct FixedSchemaEngine<'a> {
    table: &'a YearTable,
}

impl<'a> FixedSchemaEngine<'a> {
    pub fn new(table: &'a YearTable) -> Self {
        Self { table }
    }
}

impl RatioEngine for FixedSchemaEngine<'_> {
    fn name(&self) -> &'static str {
        "fixed_schema"
    }

    fn years(&self) -> Vec<String> {
        discover_record_years(self.table)
    }

    fn record(&self, year: &str) -> Option<CanonicalRecord> {
        self.table.find_year_record(year).map(normalize_year_record)
    }
}

/// Converts a fixed-schema record: raw lines become fields, pre-computed columns become stored ratios.
pub fn normalize_year_record(record: &YearRecord) -> CanonicalRecord {
    use CanonicalField::*;

    CanonicalRecord::new(record.year.to_string())
        .with_field(CurrentAssets, record.current_assets)
        .with_field(CurrentLiabilities, record.current_liabilities)
        .with_field(Equity, record.equity)
        .with_field(TotalAssets, record.total_assets)
        .with_field(NonCurrentLiabilities, record.non_current_liabilities)
        .with_field(
            TotalLiabilities,
            record.current_liabilities + record.non_current_liabilities,
        )
        .with_field(NetRevenue, record.net_revenue)
        .with_field(NetIncome, record.net_income)
        .with_stored_ratio(RatioId::GeneralIndebtedness, record.general_indebtedness)
        .with_stored_ratio(RatioId::ThirdPartyCapital, record.third_party_capital)
        .with_stored_ratio(RatioId::DebtComposition, record.debt_composition)
        .with_stored_ratio(RatioId::EquityImmobilization, record.equity_immobilization)
        .with_stored_ratio(
            RatioId::NonCurrentResourcesImmobilization,
            record.non_current_resources_immobilization,
        )
        .with_stored_ratio(RatioId::GeneralLiquidity, record.general_liquidity)
        .with_stored_ratio(RatioId::CurrentLiquidity, record.current_liquidity)
        .with_stored_ratio(RatioId::QuickLiquidity, record.quick_liquidity)
        .with_stored_ratio(RatioId::AssetTurnover, record.asset_turnover)
        .with_stored_ratio(RatioId::NetMargin, record.net_margin)
        .with_stored_ratio(RatioId::Roa, record.roa)
        .with_stored_ratio(RatioId::Roe, record.roe)
        .with_stored_ratio(RatioId::LeverageMultiplier, record.leverage_multiplier)
        .with_stored_ratio(RatioId::RoiDuPont, record.roi_dupont)
}

/// Picks the engine matching the table shape.
pub fn engine_for(table: &FinancialTable) -> Box<dyn RatioEngine + '_> {
    match table {
        FinancialTable::Labeled(t) => Box::new(KeywordEngine::new(t)),
        FinancialTable::Yearly(t) => Box::new(FixedSchemaEngine::new(t)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LabeledRow;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn balance_sheet() -> LabeledTable {
        LabeledTable::new(vec![
            LabeledRow::new("Receita Líquida").with_cell("2023", 3650.0),
            LabeledRow::new("Lucro Líquido").with_cell("2023", 365.0),
            LabeledRow::new("Ativo Total").with_cell("2023", 5000.0),
            LabeledRow::new("Ativo Circulante").with_cell("2023", 1500.0),
            LabeledRow::new("Ativo Não Circulante").with_cell("2023", 3500.0),
            LabeledRow::new("Passivo Total").with_cell("2023", 2000.0),
            LabeledRow::new("Passivo Circulante").with_cell("2023", 1000.0),
            LabeledRow::new("Passivo Não Circulante").with_cell("2023", 1000.0),
            LabeledRow::new("Patrimônio Líquido").with_cell("2023", 3000.0),
            LabeledRow::new("Custo dos Produtos Vendidos").with_cell("2023", -1825.0),
            LabeledRow::new("Estoques").with_cell("2023", 250.0),
            LabeledRow::new("Contas a Receber").with_cell("2023", 300.0),
            LabeledRow::new("Fornecedores").with_cell("2023", 150.0),
        ])
    }

    #[test]
    fn test_keyword_engine_ratios() {
        let table = balance_sheet();
        let engine = KeywordEngine::new(&table);
        let r = engine.record("2023").unwrap();

        assert!(close(r.ratio(RatioId::GeneralIndebtedness), 40.0));
        assert!(close(r.ratio(RatioId::CurrentLiquidity), 1.5));
        assert!(close(r.ratio(RatioId::GeneralLiquidity), 5000.0 / 3000.0));
        assert!(close(r.ratio(RatioId::AssetTurnover), 0.73));
        assert!(close(r.ratio(RatioId::NetMargin), 10.0));
        assert!(close(r.ratio(RatioId::Roa), 7.3));
        assert!(close(r.ratio(RatioId::Roe), 365.0 / 3000.0 * 100.0));
        assert!(close(r.ratio(RatioId::LeverageMultiplier), 5000.0 / 3000.0));
    }

    #[test]
    fn test_keyword_engine_structure_ratios() {
        let table = balance_sheet();
        let engine = KeywordEngine::new(&table);
        assert!(engine.accounts().is_resolved(CanonicalField::NonCurrentAssets));
        assert!(engine.accounts().is_resolved(CanonicalField::NonCurrentLiabilities));

        let r = engine.record("2023").unwrap();
        assert!(close(r.field(CanonicalField::NonCurrentAssets), 3500.0));
        assert!(close(r.field(CanonicalField::CurrentAssets), 1500.0));

        assert!(close(r.ratio(RatioId::ThirdPartyCapital), 2000.0 / 3000.0 * 100.0));
        assert!(close(r.ratio(RatioId::DebtComposition), 50.0));
        assert!(close(r.ratio(RatioId::EquityImmobilization), 3500.0 / 3000.0 * 100.0));
        assert!(close(r.ratio(RatioId::NonCurrentResourcesImmobilization), 87.5));
        assert!(close(r.ratio(RatioId::QuickLiquidity), 1.25));
        assert!(close(r.ratio(RatioId::RoiDuPont), 7.3));
    }

    #[test]
    fn test_activity_days() {
        let table = balance_sheet();
        let engine = KeywordEngine::new(&table);
        let r = engine.record("2023").unwrap();

        assert!(close(r.ratio(RatioId::InventoryDays), 50.0));
        assert!(close(r.ratio(RatioId::ReceivablesDays), 30.0));
        assert!(close(r.ratio(RatioId::PayablesDays), 30.0));
        assert!(close(r.ratio(RatioId::OperatingCycle), 80.0));
        assert!(close(r.ratio(RatioId::CashConversionCycle), 50.0));
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let empty = CanonicalRecord::new("2023").with_field(CanonicalField::NetIncome, 100.0);

        for id in [
            RatioId::GeneralIndebtedness,
            RatioId::ThirdPartyCapital,
            RatioId::DebtComposition,
            RatioId::EquityImmobilization,
            RatioId::NonCurrentResourcesImmobilization,
            RatioId::LeverageMultiplier,
            RatioId::CurrentLiquidity,
            RatioId::GeneralLiquidity,
            RatioId::QuickLiquidity,
            RatioId::AssetTurnover,
            RatioId::NetMargin,
            RatioId::Roa,
            RatioId::Roe,
            RatioId::RoiDuPont,
            RatioId::InventoryDays,
            RatioId::ReceivablesDays,
            RatioId::PayablesDays,
            RatioId::OperatingCycle,
            RatioId::CashConversionCycle,
            RatioId::GrossMargin,
            RatioId::EbitdaMargin,
            RatioId::RecurringEbitdaMargin,
            RatioId::CogsToRevenue,
        ] {
            let value = empty.ratio(id);
            assert_eq!(value, 0.0, "{:?} should be 0, got {}", id, value);
        }
    }

    #[test]
    fn test_days_need_both_operands() {
        let record = CanonicalRecord::new("2023")
            .with_field(CanonicalField::Inventories, 100.0)
            .with_field(CanonicalField::NetRevenue, 1000.0);

        assert_eq!(record.ratio(RatioId::InventoryDays), 0.0);
        assert_eq!(record.ratio(RatioId::ReceivablesDays), 0.0);
    }

    #[test]
    fn test_stored_ratio_wins_over_derivation() {
        let record = CanonicalRecord::new("2023")
            .with_field(CanonicalField::NetIncome, 100.0)
            .with_field(CanonicalField::NetRevenue, 1000.0)
            .with_stored_ratio(RatioId::NetMargin, 12.0);

        assert_eq!(record.ratio(RatioId::NetMargin), 12.0);
        assert_eq!(record.derive(RatioId::NetMargin), 10.0);
    }

    #[test]
    fn test_growth_against_previous() {
        let previous = CanonicalRecord::new("2022")
            .with_field(CanonicalField::NetRevenue, 1000.0)
            .with_field(CanonicalField::NetIncome, 0.0);
        let current = CanonicalRecord::new("2023")
            .with_field(CanonicalField::NetRevenue, 1200.0)
            .with_field(CanonicalField::NetIncome, 150.0);

        assert!(close(current.ratio_against(RatioId::RevenueGrowth, Some(&previous)), 20.0));
        assert_eq!(current.ratio_against(RatioId::ProfitGrowth, Some(&previous)), 0.0);
        assert_eq!(current.ratio_against(RatioId::RevenueGrowth, None), 0.0);
        assert_eq!(current.ratio(RatioId::RevenueGrowth), 0.0);
    }

    #[test]
    fn test_fixed_schema_engine_reads_stored_fields() {
        let table = YearTable::new(vec![YearRecord {
            year: 2023,
            net_revenue: 1000.0,
            net_income: 50.0,
            net_margin: 7.5,
            current_liabilities: 100.0,
            non_current_liabilities: 300.0,
            ..Default::default()
        }]);
        let engine = FixedSchemaEngine::new(&table);

        assert_eq!(engine.years(), vec!["2023".to_string()]);
        assert!(engine.record("2022").is_none());

        let record = engine.record("2023").unwrap();
        assert_eq!(record.ratio(RatioId::NetMargin), 7.5);
        assert_eq!(record.field(CanonicalField::TotalLiabilities), 400.0);
        // Not stored by the fixed schema, so it is derived
        assert!(close(record.ratio(RatioId::CogsToRevenue), 0.0));
    }

    #[test]
    fn test_engine_for_matches_shape() {
        let labeled = FinancialTable::Labeled(balance_sheet());
        let engine = engine_for(&labeled);
        assert_eq!(engine.name(), "keyword");
        assert_eq!(engine.years(), vec!["2023".to_string()]);
        assert!(engine.labeled_table().is_some());

        let yearly = FinancialTable::Yearly(YearTable::default());
        let engine = engine_for(&yearly);
        assert_eq!(engine.name(), "fixed_schema");
        assert!(engine.years().is_empty());
        assert!(engine.labeled_table().is_none());
    }
}
