use std::collections::HashMap;
use thiserror::Error;

use super::fields::{
    self, BANK_FIXED_INCOME_HOLDING, BOND_FUND_HOLDING, DIVIDEND_FUND_HOLDING, Field,
    GOLD_ETF_HOLDING, PHYSICAL_GOLD_HOLDING, RESERVE_FUND_HOLDING, US_INDEX_FUND_HOLDING,
};
use super::types::{
    AllocationConfig, CalculationRequest, FrameworkRatios, FundName, FundPortfolioRatios, Holding,
    PortfolioHoldings,
};

pub const RATIO_SUM_TOLERANCE: f64 = 0.0001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} 必须是有效的数字")]
    NotANumber(&'static str),
    #[error("{0} 不能为负数")]
    Negative(&'static str),
    #[error("请至少输入一项持仓金额")]
    NoHoldings,
    #[error("投资大框架分配比例总和必须为 100%")]
    FrameworkRatioSum,
    #[error("基金组合内部分配比例总和必须为 100%")]
    FundPortfolioRatioSum,
}

/// Blank, junk and non-finite input all read as "no number".
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn ratios_sum_to_one(values: &[f64]) -> bool {
    let sum: f64 = values.iter().sum();
    // NaN fails this comparison, so a missing input fails its group.
    (sum - 1.0).abs() <= RATIO_SUM_TOLERANCE
}

pub fn percent_text(fraction: f64) -> String {
    format!("{:.0}", (fraction * 100.0).round() + 0.0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: HashMap<&'static str, String>,
}

impl FormState {
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field.id, value.into());
    }

    pub fn get(&self, field: Field) -> &str {
        self.values.get(field.id).map(String::as_str).unwrap_or("")
    }

    pub fn clear(&mut self, field: Field) {
        self.values.remove(field.id);
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        parse_number(self.get(field))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct HoldingRowId(u64);

impl HoldingRowId {
    pub fn dom_id(self) -> String {
        format!("holding-{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingRow {
    pub fund_name: String,
    pub holding_cost: String,
    pub current_nav: String,
    pub holding_amount: String,
}

impl HoldingRow {
    pub fn to_holding(&self) -> Option<Holding> {
        Some(Holding {
            fund_name: FundName::from_label(self.fund_name.trim())?,
            holding_cost: parse_number(&self.holding_cost)?,
            current_nav: parse_number(&self.current_nav)?,
            holding_amount: parse_number(&self.holding_amount)?,
        })
    }
}

/// Arena of holding rows. Handles increase from 1 and are never reused.
#[derive(Debug, Clone, Default)]
pub struct HoldingRows {
    last_id: u64,
    rows: Vec<(HoldingRowId, HoldingRow)>,
}

impl HoldingRows {
    pub fn add(&mut self) -> HoldingRowId {
        self.last_id += 1;
        let id = HoldingRowId(self.last_id);
        self.rows.push((id, HoldingRow::default()));
        id
    }

    pub fn remove(&mut self, id: HoldingRowId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|(row_id, _)| *row_id != id);
        self.rows.len() != before
    }

    pub fn get(&self, id: HoldingRowId) -> Option<&HoldingRow> {
        self.rows.iter().find(|(row_id, _)| *row_id == id).map(|(_, row)| row)
    }

    pub fn get_mut(&mut self, id: HoldingRowId) -> Option<&mut HoldingRow> {
        self.rows
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, row)| row)
    }

    pub fn ids(&self) -> impl Iterator<Item = HoldingRowId> {
        self.rows.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Well-formed rows in insertion order, or `None` so the caller omits the field.
    pub fn collect(&self) -> Option<Vec<Holding>> {
        let holdings: Vec<Holding> = self
            .rows
            .iter()
            .filter_map(|(_, row)| row.to_holding())
            .collect();
        if holdings.is_empty() {
            None
        } else {
            Some(holdings)
        }
    }
}

fn non_negative(field: Field, value: Option<f64>) -> Result<f64, FormError> {
    match value {
        None => Err(FormError::NotANumber(field.label)),
        Some(v) if v < 0.0 => Err(FormError::Negative(field.label)),
        Some(v) => Ok(v),
    }
}

pub fn calculation_request(
    form: &FormState,
    rows: &HoldingRows,
) -> Result<CalculationRequest, FormError> {
    let mut amounts = [0.0; 4];
    for (slot, field) in amounts.iter_mut().zip(fields::CALCULATOR_FIELDS) {
        *slot = non_negative(field, form.number(field))?;
    }
    let [target, current, debt, income] = amounts;

    Ok(CalculationRequest {
        target_living_expense: target,
        current_living_expense: current,
        debt,
        new_income: income,
        holdings: rows.collect(),
    })
}

pub fn portfolio_holdings(form: &FormState) -> Result<PortfolioHoldings, FormError> {
    let amount = |field: Field| -> Result<f64, FormError> {
        let value = form.number(field).unwrap_or(0.0);
        if value < 0.0 {
            return Err(FormError::Negative(field.label));
        }
        Ok(value)
    };

    let holdings = PortfolioHoldings {
        bond_fund: amount(BOND_FUND_HOLDING)?,
        dividend_fund: amount(DIVIDEND_FUND_HOLDING)?,
        us_index_fund: amount(US_INDEX_FUND_HOLDING)?,
        gold_etf: amount(GOLD_ETF_HOLDING)?,
        bank_fixed_income: amount(BANK_FIXED_INCOME_HOLDING)?,
        physical_gold: amount(PHYSICAL_GOLD_HOLDING)?,
        reserve_fund: amount(RESERVE_FUND_HOLDING)?,
    };

    if holdings.total() == 0.0 {
        return Err(FormError::NoHoldings);
    }
    Ok(holdings)
}

fn fractions(form: &FormState, group: [Field; 4]) -> [f64; 4] {
    group.map(|field| form.number(field).unwrap_or(f64::NAN) / 100.0)
}

pub fn allocation_config(form: &FormState) -> Result<AllocationConfig, FormError> {
    let framework = fractions(form, fields::FRAMEWORK_RATIO_FIELDS);
    if !ratios_sum_to_one(&framework) {
        return Err(FormError::FrameworkRatioSum);
    }
    let fund = fractions(form, fields::FUND_RATIO_FIELDS);
    if !ratios_sum_to_one(&fund) {
        return Err(FormError::FundPortfolioRatioSum);
    }

    let [fund_portfolio, bank_fixed_income, physical_gold, reserve_fund] = framework;
    let [bond_fund, dividend_fund, us_index_fund, gold_etf] = fund;
    Ok(AllocationConfig {
        framework: FrameworkRatios {
            fund_portfolio,
            bank_fixed_income,
            physical_gold,
            reserve_fund,
        },
        fund_portfolio: FundPortfolioRatios {
            bond_fund,
            dividend_fund,
            us_index_fund,
            gold_etf,
        },
    })
}
