mod controller;
pub mod fields;
mod form;
mod page;
mod types;
pub mod view;

pub use controller::{
    ANALYSIS_FAILED, CALCULATION_FAILED, CONFIG_FAILED, FormController, NETWORK_ERROR, Submission,
};
pub use form::{
    FormError, FormState, HoldingRow, HoldingRowId, HoldingRows, RATIO_SUM_TOLERANCE,
    allocation_config, calculation_request, parse_number, percent_text, portfolio_holdings,
    ratios_sum_to_one,
};
pub use page::{Page, Region, RegionId, ScrollTarget, Tool};
pub use types::{
    AddPositionSuggestion, AllocationConfig, CalculationRequest, CalculationResult,
    CategoryAnalysis, CategoryMap, ConfigSnapshot, ConfigUpdate, FrameworkRatios, FundName,
    FundPortfolioRatios, Holding, PlannedFund, PortfolioAnalysisResult, PortfolioHoldings,
    RegularInvestmentPlan, Suggestions, TakeProfitRule, TakeProfitSuggestion,
};
