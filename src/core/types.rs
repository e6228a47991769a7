use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub type CategoryMap<T> = IndexMap<String, T>;

// The backend sends `null` for an empty mapping in a few degraded replies.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<CategoryMap<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<CategoryMap<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum FundName {
    #[serde(rename = "红利低波/沪深300")]
    DividendLowVolatility,
    #[serde(rename = "标普/纳指")]
    UsIndex,
    #[serde(rename = "黄金ETF联接C")]
    GoldEtfFeeder,
}

impl FundName {
    const ALL: [FundName; 3] = [
        FundName::DividendLowVolatility,
        FundName::UsIndex,
        FundName::GoldEtfFeeder,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FundName::DividendLowVolatility => "红利低波/沪深300",
            FundName::UsIndex => "标普/纳指",
            FundName::GoldEtfFeeder => "黄金ETF联接C",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fund| fund.label() == label)
    }
}

impl fmt::Display for FundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Holding {
    pub fund_name: FundName,
    pub holding_cost: f64,
    pub current_nav: f64,
    pub holding_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalculationRequest {
    pub target_living_expense: f64,
    pub current_living_expense: f64,
    pub debt: f64,
    pub new_income: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holdings: Option<Vec<Holding>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalculationResult {
    pub living_expense_gap: f64,
    pub investable_amount: f64,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub framework_allocation: CategoryMap<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fund_allocation: CategoryMap<f64>,
    #[serde(default)]
    pub regular_investment_plan: Option<RegularInvestmentPlan>,
    #[serde(default)]
    pub suggestions: Option<Suggestions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegularInvestmentPlan {
    pub tuesday_amount: f64,
    pub thursday_amount: f64,
    pub weekly_total: f64,
    #[serde(default)]
    pub funds: Vec<PlannedFund>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlannedFund {
    pub name: String,
    pub amount: f64,
    pub day: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Suggestions {
    #[serde(default)]
    pub add_position_suggestions: Vec<AddPositionSuggestion>,
    #[serde(default)]
    pub take_profit_suggestions: Vec<TakeProfitSuggestion>,
    #[serde(default)]
    pub total_add_amount: f64,
    #[serde(default)]
    pub total_profit_amount: f64,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.add_position_suggestions.is_empty() && self.take_profit_suggestions.is_empty()
    }

    pub fn has_totals(&self) -> bool {
        self.total_add_amount > 0.0 || self.total_profit_amount > 0.0
    }
}

/// Rates, thresholds and ratios are percentages.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AddPositionSuggestion {
    pub fund_name: String,
    pub return_rate: f64,
    pub threshold: f64,
    pub add_ratio: f64,
    pub add_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TakeProfitSuggestion {
    pub fund_name: String,
    pub return_rate: f64,
    pub threshold: f64,
    pub profit_ratio: f64,
    pub profit_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct PortfolioHoldings {
    pub bond_fund: f64,
    pub dividend_fund: f64,
    pub us_index_fund: f64,
    pub gold_etf: f64,
    pub bank_fixed_income: f64,
    pub physical_gold: f64,
    pub reserve_fund: f64,
}

impl PortfolioHoldings {
    pub fn total(&self) -> f64 {
        self.bond_fund
            + self.dividend_fund
            + self.us_index_fund
            + self.gold_etf
            + self.bank_fixed_income
            + self.physical_gold
            + self.reserve_fund
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PortfolioAnalysisResult {
    pub total_amount: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub framework_analysis: CategoryMap<CategoryAnalysis>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fund_portfolio_analysis: CategoryMap<CategoryAnalysis>,
}

/// Ratios and deviation are percentages; amounts are in yuan.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryAnalysis {
    pub name: String,
    pub status: String,
    pub expected_ratio: f64,
    pub actual_ratio: f64,
    pub expected_amount: f64,
    pub actual_amount: f64,
    pub deviation: f64,
    #[serde(default)]
    pub need_adjustment: bool,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub adjust_amount: Option<f64>,
    #[serde(default)]
    pub diff_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FrameworkRatios {
    pub fund_portfolio: f64,
    pub bank_fixed_income: f64,
    pub physical_gold: f64,
    pub reserve_fund: f64,
}

impl FrameworkRatios {
    pub fn values(&self) -> [f64; 4] {
        [
            self.fund_portfolio,
            self.bank_fixed_income,
            self.physical_gold,
            self.reserve_fund,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FundPortfolioRatios {
    pub bond_fund: f64,
    pub dividend_fund: f64,
    pub us_index_fund: f64,
    pub gold_etf: f64,
}

impl FundPortfolioRatios {
    pub fn values(&self) -> [f64; 4] {
        [
            self.bond_fund,
            self.dividend_fund,
            self.us_index_fund,
            self.gold_etf,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AllocationConfig {
    pub framework: FrameworkRatios,
    pub fund_portfolio: FundPortfolioRatios,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TakeProfitRule {
    pub threshold: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub framework: Option<FrameworkRatios>,
    #[serde(default)]
    pub fund_portfolio: Option<FundPortfolioRatios>,
    #[serde(default)]
    pub add_position_rules: Option<CategoryMap<f64>>,
    #[serde(default)]
    pub take_profit: Option<TakeProfitRule>,
}

impl From<AllocationConfig> for ConfigSnapshot {
    fn from(value: AllocationConfig) -> Self {
        Self {
            framework: Some(value.framework),
            fund_portfolio: Some(value.fund_portfolio),
            add_position_rules: None,
            take_profit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigUpdate {
    pub message: String,
}
