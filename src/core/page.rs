use super::fields::{FRAMEWORK_RATIO_FIELDS, FUND_RATIO_FIELDS, Field};
use super::form::{FormState, HoldingRows, percent_text};
use super::types::{
    CalculationResult, CategoryMap, ConfigSnapshot, PortfolioAnalysisResult, TakeProfitRule,
};
use super::view::{self, Node};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tool {
    Calculator,
    Portfolio,
    Config,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Calculator => "calculator",
            Tool::Portfolio => "portfolio",
            Tool::Config => "config",
        }
    }

    pub fn button_id(self) -> String {
        format!("btn-{}", self.name())
    }

    pub fn panel_id(self) -> String {
        format!("{}-tool", self.name())
    }

    fn error_region(self) -> RegionId {
        match self {
            Tool::Calculator => RegionId::ErrorMessage,
            Tool::Portfolio => RegionId::PortfolioErrorMessage,
            Tool::Config => RegionId::ConfigErrorMessage,
        }
    }

    fn result_region(self) -> RegionId {
        match self {
            Tool::Calculator => RegionId::ResultSection,
            Tool::Portfolio => RegionId::PortfolioResultSection,
            Tool::Config => RegionId::ConfigResultSection,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RegionId {
    ResultSection,
    ErrorMessage,
    LivingExpenseGap,
    InvestableAmount,
    WarningMessage,
    FrameworkAllocation,
    FundAllocation,
    TuesdayAmount,
    ThursdayAmount,
    WeeklyTotal,
    FundsList,
    SuggestionsCard,
    SuggestionsContent,
    PortfolioResultSection,
    PortfolioErrorMessage,
    PortfolioTotalAmount,
    FrameworkAnalysis,
    FundPortfolioAnalysis,
    ConfigResultSection,
    ConfigErrorMessage,
    ConfigStatus,
    StrategyRules,
}

impl RegionId {
    pub const ALL: [RegionId; 22] = [
        RegionId::ErrorMessage,
        RegionId::ResultSection,
        RegionId::LivingExpenseGap,
        RegionId::InvestableAmount,
        RegionId::WarningMessage,
        RegionId::FrameworkAllocation,
        RegionId::FundAllocation,
        RegionId::TuesdayAmount,
        RegionId::ThursdayAmount,
        RegionId::WeeklyTotal,
        RegionId::FundsList,
        RegionId::SuggestionsCard,
        RegionId::SuggestionsContent,
        RegionId::PortfolioErrorMessage,
        RegionId::PortfolioResultSection,
        RegionId::PortfolioTotalAmount,
        RegionId::FrameworkAnalysis,
        RegionId::FundPortfolioAnalysis,
        RegionId::StrategyRules,
        RegionId::ConfigErrorMessage,
        RegionId::ConfigResultSection,
        RegionId::ConfigStatus,
    ];

    pub fn dom_id(self) -> &'static str {
        match self {
            RegionId::ResultSection => "resultSection",
            RegionId::ErrorMessage => "errorMessage",
            RegionId::LivingExpenseGap => "livingExpenseGap",
            RegionId::InvestableAmount => "investableAmount",
            RegionId::WarningMessage => "warningMessage",
            RegionId::FrameworkAllocation => "frameworkAllocation",
            RegionId::FundAllocation => "fundAllocation",
            RegionId::TuesdayAmount => "tuesdayAmount",
            RegionId::ThursdayAmount => "thursdayAmount",
            RegionId::WeeklyTotal => "weeklyTotal",
            RegionId::FundsList => "fundsList",
            RegionId::SuggestionsCard => "suggestionsCard",
            RegionId::SuggestionsContent => "suggestionsContent",
            RegionId::PortfolioResultSection => "portfolioResultSection",
            RegionId::PortfolioErrorMessage => "portfolioErrorMessage",
            RegionId::PortfolioTotalAmount => "portfolioTotalAmount",
            RegionId::FrameworkAnalysis => "frameworkAnalysis",
            RegionId::FundPortfolioAnalysis => "fundPortfolioAnalysis",
            RegionId::ConfigResultSection => "configResultSection",
            RegionId::ConfigErrorMessage => "configErrorMessage",
            RegionId::ConfigStatus => "configStatus",
            RegionId::StrategyRules => "strategyRules",
        }
    }

    pub fn tool(self) -> Tool {
        match self {
            RegionId::PortfolioResultSection
            | RegionId::PortfolioErrorMessage
            | RegionId::PortfolioTotalAmount
            | RegionId::FrameworkAnalysis
            | RegionId::FundPortfolioAnalysis => Tool::Portfolio,
            RegionId::ConfigResultSection
            | RegionId::ConfigErrorMessage
            | RegionId::ConfigStatus
            | RegionId::StrategyRules => Tool::Config,
            _ => Tool::Calculator,
        }
    }

    pub fn parent(self) -> Option<RegionId> {
        match self {
            RegionId::LivingExpenseGap
            | RegionId::InvestableAmount
            | RegionId::WarningMessage
            | RegionId::FrameworkAllocation
            | RegionId::FundAllocation
            | RegionId::TuesdayAmount
            | RegionId::ThursdayAmount
            | RegionId::WeeklyTotal
            | RegionId::FundsList
            | RegionId::SuggestionsCard => Some(RegionId::ResultSection),
            RegionId::SuggestionsContent => Some(RegionId::SuggestionsCard),
            RegionId::PortfolioTotalAmount
            | RegionId::FrameworkAnalysis
            | RegionId::FundPortfolioAnalysis => Some(RegionId::PortfolioResultSection),
            RegionId::ConfigStatus => Some(RegionId::ConfigResultSection),
            _ => None,
        }
    }

    pub fn starts_hidden(self) -> bool {
        matches!(
            self,
            RegionId::ResultSection
                | RegionId::ErrorMessage
                | RegionId::WarningMessage
                | RegionId::SuggestionsCard
                | RegionId::PortfolioResultSection
                | RegionId::PortfolioErrorMessage
                | RegionId::ConfigResultSection
                | RegionId::ConfigErrorMessage
        )
    }

    pub fn caption(self) -> Option<&'static str> {
        match self {
            RegionId::LivingExpenseGap => Some("生活费缺口"),
            RegionId::InvestableAmount => Some("可投资金额"),
            RegionId::FrameworkAllocation => Some("投资大框架分配"),
            RegionId::FundAllocation => Some("基金组合分配"),
            RegionId::TuesdayAmount => Some("周二定投"),
            RegionId::ThursdayAmount => Some("周四定投"),
            RegionId::WeeklyTotal => Some("每周合计"),
            RegionId::SuggestionsContent => Some("操作建议"),
            RegionId::PortfolioTotalAmount => Some("总资产"),
            RegionId::FrameworkAnalysis => Some("投资大框架分析"),
            RegionId::FundPortfolioAnalysis => Some("基金组合内部分析"),
            RegionId::StrategyRules => Some("策略规则"),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    pub shown: bool,
    pub content: Vec<Node>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScrollTarget {
    Top,
    Start(RegionId),
    Center(RegionId),
}

#[derive(Debug, Clone)]
pub struct Page {
    active_tool: Tool,
    pub form: FormState,
    pub holdings: HoldingRows,
    regions: Vec<Region>,
    scroll: Option<ScrollTarget>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        let mut regions = vec![Region::default(); RegionId::ALL.len()];
        for id in RegionId::ALL {
            regions[id.index()].shown = !id.starts_hidden();
        }
        Self {
            active_tool: Tool::Calculator,
            form: FormState::default(),
            holdings: HoldingRows::default(),
            regions,
            scroll: None,
        }
    }

    pub fn active_tool(&self) -> Tool {
        self.active_tool
    }

    pub fn is_button_active(&self, tool: Tool) -> bool {
        self.active_tool == tool
    }

    pub fn is_panel_shown(&self, tool: Tool) -> bool {
        self.active_tool == tool
    }

    pub fn switch_tool(&mut self, tool: Tool) {
        self.active_tool = tool;
        self.scroll = Some(ScrollTarget::Top);
    }

    pub fn scroll_target(&self) -> Option<ScrollTarget> {
        self.scroll
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.index()]
    }

    fn region_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id.index()]
    }

    pub fn show(&mut self, id: RegionId) {
        self.region_mut(id).shown = true;
    }

    pub fn hide(&mut self, id: RegionId) {
        self.region_mut(id).shown = false;
    }

    pub fn set_content(&mut self, id: RegionId, content: Vec<Node>) {
        self.region_mut(id).content = content;
    }

    pub fn set_text(&mut self, id: RegionId, value: impl Into<String>) {
        self.set_content(id, vec![view::text(value)]);
    }

    pub fn is_displayed(&self, id: RegionId) -> bool {
        let mut current = Some(id);
        while let Some(region) = current {
            if !self.region(region).shown {
                return false;
            }
            current = region.parent();
        }
        true
    }

    pub fn text(&self, id: RegionId) -> String {
        view::render_text(&self.region(id).content)
    }

    pub fn input(&self, field: Field) -> &str {
        self.form.get(field)
    }

    pub fn hide_error(&mut self, tool: Tool) {
        self.hide(tool.error_region());
    }

    /// Shows `message` in the tool's error region and hides its result section.
    pub fn display_error(&mut self, tool: Tool, message: &str) {
        let error = tool.error_region();
        self.set_text(error, message);
        self.show(error);
        self.hide(tool.result_region());
        self.scroll = Some(ScrollTarget::Center(error));
    }

    pub fn show_calculation(&mut self, result: &CalculationResult) {
        self.show(RegionId::ResultSection);
        self.set_text(RegionId::LivingExpenseGap, view::money(result.living_expense_gap));
        self.set_text(RegionId::InvestableAmount, view::money(result.investable_amount));

        match result.warning.as_deref().filter(|w| !w.is_empty()) {
            Some(warning) => {
                self.set_text(RegionId::WarningMessage, warning);
                self.show(RegionId::WarningMessage);
            }
            None => self.hide(RegionId::WarningMessage),
        }

        self.set_content(
            RegionId::FrameworkAllocation,
            view::allocation_items(&result.framework_allocation),
        );
        self.set_content(
            RegionId::FundAllocation,
            view::allocation_items(&result.fund_allocation),
        );

        // Without a plan the previous plan figures stay in place.
        if let Some(plan) = &result.regular_investment_plan {
            self.set_text(RegionId::TuesdayAmount, view::money(plan.tuesday_amount));
            self.set_text(RegionId::ThursdayAmount, view::money(plan.thursday_amount));
            self.set_text(RegionId::WeeklyTotal, view::money(plan.weekly_total));
            self.set_content(RegionId::FundsList, view::funds_list(plan));
        }

        self.scroll = Some(ScrollTarget::Start(RegionId::ResultSection));

        match result.suggestions.as_ref().filter(|s| !s.is_empty()) {
            Some(suggestions) => {
                self.show(RegionId::SuggestionsCard);
                self.set_content(
                    RegionId::SuggestionsContent,
                    view::suggestion_blocks(suggestions),
                );
            }
            None => self.hide(RegionId::SuggestionsCard),
        }
    }

    pub fn show_portfolio_analysis(&mut self, result: &PortfolioAnalysisResult) {
        self.show(RegionId::PortfolioResultSection);
        self.set_text(RegionId::PortfolioTotalAmount, view::money(result.total_amount));
        self.set_content(
            RegionId::FrameworkAnalysis,
            view::analysis_items(&result.framework_analysis),
        );
        let fund_content = if result.fund_portfolio_analysis.is_empty() {
            vec![view::no_fund_portfolio_data()]
        } else {
            view::analysis_items(&result.fund_portfolio_analysis)
        };
        self.set_content(RegionId::FundPortfolioAnalysis, fund_content);
        self.scroll = Some(ScrollTarget::Start(RegionId::PortfolioResultSection));
    }

    pub fn show_config_status(&mut self, message: &str) {
        self.show(RegionId::ConfigResultSection);
        self.set_text(RegionId::ConfigStatus, message);
        self.scroll = Some(ScrollTarget::Start(RegionId::ConfigResultSection));
    }

    pub fn fill_config(&mut self, snapshot: &ConfigSnapshot) {
        if let Some(framework) = &snapshot.framework {
            for (field, value) in FRAMEWORK_RATIO_FIELDS.into_iter().zip(framework.values()) {
                self.form.set(field, percent_text(value));
            }
        }
        if let Some(fund) = &snapshot.fund_portfolio {
            for (field, value) in FUND_RATIO_FIELDS.into_iter().zip(fund.values()) {
                self.form.set(field, percent_text(value));
            }
        }
        if snapshot.add_position_rules.is_some() || snapshot.take_profit.is_some() {
            self.show_strategy_rules(
                snapshot.add_position_rules.as_ref(),
                snapshot.take_profit.as_ref(),
            );
        }
    }

    fn show_strategy_rules(
        &mut self,
        add_position: Option<&CategoryMap<f64>>,
        take_profit: Option<&TakeProfitRule>,
    ) {
        self.set_content(
            RegionId::StrategyRules,
            view::strategy_rules(add_position, take_profit),
        );
    }

    fn visible_regions(&self, tool: Tool) -> impl Iterator<Item = RegionId> + '_ {
        RegionId::ALL.into_iter().filter(move |id| {
            id.tool() == tool && self.is_displayed(*id) && !self.region(*id).content.is_empty()
        })
    }

    pub fn render_html(&self, tool: Tool) -> String {
        let mut out = String::new();
        for id in self.visible_regions(tool) {
            out.push_str(&format!("<div id=\"{}\">", id.dom_id()));
            out.push_str(&view::render_html(&self.region(id).content));
            out.push_str("</div>\n");
        }
        out
    }

    pub fn render_text(&self, tool: Tool) -> String {
        let mut blocks = Vec::new();
        for id in self.visible_regions(tool) {
            let body = self.text(id);
            let block = match id.caption() {
                Some(caption) if body.contains('\n') => format!("{caption}：\n{body}"),
                Some(caption) => format!("{caption}：{body}"),
                None => body,
            };
            blocks.push(block);
        }
        blocks.join("\n")
    }
}
