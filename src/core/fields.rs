#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Field {
    pub id: &'static str,
    pub key: &'static str,
    pub label: &'static str,
}

const fn field(id: &'static str, key: &'static str, label: &'static str) -> Field {
    Field { id, key, label }
}

pub const TARGET_LIVING_EXPENSE: Field =
    field("targetLivingExpense", "target_living_expense", "目标生活费");
pub const CURRENT_LIVING_EXPENSE: Field =
    field("currentLivingExpense", "current_living_expense", "当前生活费余额");
pub const DEBT: Field = field("debt", "debt", "当前负债");
pub const NEW_INCOME: Field = field("newIncome", "new_income", "新增收入");

pub const BOND_FUND_HOLDING: Field = field("bondFundHolding", "bond_fund", "中短债基金");
pub const DIVIDEND_FUND_HOLDING: Field =
    field("dividendFundHolding", "dividend_fund", "红利低波/沪深300");
pub const US_INDEX_FUND_HOLDING: Field = field("usIndexFundHolding", "us_index_fund", "标普/纳指");
pub const GOLD_ETF_HOLDING: Field = field("goldEtfHolding", "gold_etf", "黄金ETF联接C");
pub const BANK_FIXED_INCOME_HOLDING: Field =
    field("bankFixedIncomeHolding", "bank_fixed_income", "银行固收R2");
pub const PHYSICAL_GOLD_HOLDING: Field = field("physicalGoldHolding", "physical_gold", "实体黄金");
pub const RESERVE_FUND_HOLDING: Field = field("reserveFundHolding", "reserve_fund", "备用金");

pub const FUND_PORTFOLIO_RATIO: Field = field("fundPortfolioRatio", "fund_portfolio", "基金组合");
pub const BANK_FIXED_INCOME_RATIO: Field =
    field("bankFixedIncomeRatio", "bank_fixed_income", "银行固收R2");
pub const PHYSICAL_GOLD_RATIO: Field = field("physicalGoldRatio", "physical_gold", "实体黄金");
pub const RESERVE_FUND_RATIO: Field = field("reserveFundRatio", "reserve_fund", "备用金");

pub const BOND_FUND_RATIO: Field = field("bondFundRatio", "bond_fund", "中短债基金");
pub const DIVIDEND_FUND_RATIO: Field =
    field("dividendFundRatio", "dividend_fund", "红利低波/沪深300");
pub const US_INDEX_FUND_RATIO: Field = field("usIndexFundRatio", "us_index_fund", "标普/纳指");
pub const GOLD_ETF_RATIO: Field = field("goldEtfRatio", "gold_etf", "黄金ETF联接C");

/// Validated in this order; the first failing field is reported.
pub const CALCULATOR_FIELDS: [Field; 4] = [
    TARGET_LIVING_EXPENSE,
    CURRENT_LIVING_EXPENSE,
    DEBT,
    NEW_INCOME,
];

pub const PORTFOLIO_FIELDS: [Field; 7] = [
    BOND_FUND_HOLDING,
    DIVIDEND_FUND_HOLDING,
    US_INDEX_FUND_HOLDING,
    GOLD_ETF_HOLDING,
    BANK_FIXED_INCOME_HOLDING,
    PHYSICAL_GOLD_HOLDING,
    RESERVE_FUND_HOLDING,
];

pub const FRAMEWORK_RATIO_FIELDS: [Field; 4] = [
    FUND_PORTFOLIO_RATIO,
    BANK_FIXED_INCOME_RATIO,
    PHYSICAL_GOLD_RATIO,
    RESERVE_FUND_RATIO,
];

pub const FUND_RATIO_FIELDS: [Field; 4] = [
    BOND_FUND_RATIO,
    DIVIDEND_FUND_RATIO,
    US_INDEX_FUND_RATIO,
    GOLD_ETF_RATIO,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn element_ids_are_unique() {
        let fields: Vec<Field> = CALCULATOR_FIELDS
            .into_iter()
            .chain(PORTFOLIO_FIELDS)
            .chain(FRAMEWORK_RATIO_FIELDS)
            .chain(FUND_RATIO_FIELDS)
            .collect();
        let ids: HashSet<&str> = fields.iter().map(|f| f.id).collect();
        assert_eq!(fields.len(), 19);
        assert_eq!(ids.len(), fields.len());
    }

    #[test]
    fn ratio_keys_match_the_config_payload() {
        let keys: Vec<&str> = FRAMEWORK_RATIO_FIELDS.iter().map(|f| f.key).collect();
        assert_eq!(
            keys,
            ["fund_portfolio", "bank_fixed_income", "physical_gold", "reserve_fund"]
        );
        assert_eq!(GOLD_ETF_RATIO.id, "goldEtfRatio");
        assert_eq!(GOLD_ETF_RATIO.key, "gold_etf");
    }
}
