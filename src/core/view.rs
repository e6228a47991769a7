use super::types::{
    AddPositionSuggestion, CategoryAnalysis, CategoryMap, PlannedFund, RegularInvestmentPlan,
    Suggestions, TakeProfitRule, TakeProfitSuggestion,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: &'static str,
    classes: Vec<String>,
    children: Vec<Node>,
}

pub fn el(tag: &'static str) -> Element {
    Element {
        tag,
        classes: Vec::new(),
        children: Vec::new(),
    }
}

pub fn text(value: impl Into<String>) -> Node {
    Node::Text(value.into())
}

impl Element {
    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !class.is_empty() {
            self.classes.push(class);
        }
        self
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(text(value))
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn is_block(&self) -> bool {
        !matches!(self.tag, "span" | "strong" | "em")
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl Node {
    pub fn find_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        if let Node::Element(element) = self {
            if element.has_class(class) {
                found.push(element);
            }
            for child in &element.children {
                child.find_class(class, found);
            }
        }
    }
}

pub fn elements_with_class<'a>(nodes: &'a [Node], class: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    for node in nodes {
        node.find_class(class, &mut found);
    }
    found
}

fn write_html(node: &Node, out: &mut String) {
    match node {
        Node::Text(value) => {
            html_escape::encode_text_to_string(value, out);
        }
        Node::Element(element) => {
            out.push('<');
            out.push_str(element.tag);
            if !element.classes.is_empty() {
                out.push_str(" class=\"");
                let classes = element.classes.join(" ");
                html_escape::encode_double_quoted_attribute_to_string(classes, out);
                out.push('"');
            }
            out.push('>');
            for child in &element.children {
                write_html(child, out);
            }
            out.push_str("</");
            out.push_str(element.tag);
            out.push('>');
        }
    }
}

pub fn render_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_html(node, &mut out);
    }
    out
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn write_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(value) => out.push_str(value),
        Node::Element(element) => {
            let block = element.is_block();
            if block {
                break_line(out);
            } else if out.chars().last().is_some_and(|c| !c.is_whitespace()) {
                out.push(' ');
            }
            for child in &element.children {
                write_text(child, out);
            }
            if block {
                break_line(out);
            }
        }
    }
}

pub fn render_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_text(node, &mut out);
    }
    out.trim_end().to_string()
}

pub fn money(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

pub fn allocation_items(allocation: &CategoryMap<f64>) -> Vec<Node> {
    allocation
        .iter()
        .map(|(label, amount)| {
            el("div")
                .class("result-item")
                .child(el("span").class("label").text(format!("{label}：")))
                .child(el("span").class("value").text(money(*amount)))
                .child(el("span").class("unit").text("元"))
                .into()
        })
        .collect()
}

fn planned_fund(fund: &PlannedFund) -> Node {
    el("div")
        .class("fund-item")
        .child(el("span").class("fund-name").text(fund.name.as_str()))
        .child(
            el("span")
                .class("fund-amount")
                .text(format!("{} 元", money(fund.amount))),
        )
        .child(el("span").class("fund-day").text(fund.day.as_str()))
        .into()
}

pub fn funds_list(plan: &RegularInvestmentPlan) -> Vec<Node> {
    let mut nodes = vec![el("h4").text("基金明细：").into()];
    nodes.extend(plan.funds.iter().map(planned_fund));
    nodes
}

fn add_position_item(item: &AddPositionSuggestion) -> Node {
    el("div")
        .class("suggestion-item")
        .class("add-position")
        .child(el("div").class("fund-name").text(item.fund_name.as_str()))
        .child(
            el("div")
                .class("suggestion-detail")
                .text(format!("当前收益率: {}%", money(item.return_rate))),
        )
        .child(
            el("div")
                .class("suggestion-detail")
                .text(format!("触发阈值: {}%", money(item.threshold))),
        )
        .child(
            el("div")
                .class("suggestion-detail")
                .text(format!("建议加仓比例: {}%", money(item.add_ratio))),
        )
        .child(
            el("div")
                .class("suggestion-amount")
                .text(format!("建议加仓金额: {} 元", money(item.add_amount))),
        )
        .into()
}

fn take_profit_item(item: &TakeProfitSuggestion) -> Node {
    el("div")
        .class("suggestion-item")
        .class("take-profit")
        .child(el("div").class("fund-name").text(item.fund_name.as_str()))
        .child(
            el("div")
                .class("suggestion-detail")
                .text(format!("当前收益率: {}%", money(item.return_rate))),
        )
        .child(
            el("div")
                .class("suggestion-detail")
                .text(format!("触发阈值: {}%", money(item.threshold))),
        )
        .child(
            el("div")
                .class("suggestion-detail")
                .text(format!("建议止盈比例: {}%", money(item.profit_ratio))),
        )
        .child(
            el("div")
                .class("suggestion-amount")
                .text(format!("建议止盈金额: {} 元", money(item.profit_amount))),
        )
        .into()
}

fn summary_item(label: &str, amount: f64) -> Node {
    el("div")
        .class("suggestion-summary-item")
        .child(el("span").class("label").text(label))
        .child(
            el("span")
                .class("value")
                .text(format!("{} 元", money(amount))),
        )
        .into()
}

pub fn suggestion_blocks(suggestions: &Suggestions) -> Vec<Node> {
    let mut nodes = Vec::new();
    if !suggestions.add_position_suggestions.is_empty() {
        nodes.push(el("h4").class("add-position-title").text("⚠️ 加仓建议").into());
        nodes.extend(
            suggestions
                .add_position_suggestions
                .iter()
                .map(add_position_item),
        );
    }
    if !suggestions.take_profit_suggestions.is_empty() {
        nodes.push(el("h4").class("take-profit-title").text("✅ 止盈建议").into());
        nodes.extend(
            suggestions
                .take_profit_suggestions
                .iter()
                .map(take_profit_item),
        );
    }
    if suggestions.has_totals() {
        nodes.push(
            el("div")
                .class("suggestion-summary")
                .child(summary_item("总加仓金额", suggestions.total_add_amount))
                .child(summary_item("总止盈金额", suggestions.total_profit_amount))
                .into(),
        );
    }
    nodes
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusClass {
    Good,
    Warning,
    Danger,
    Neutral,
}

impl StatusClass {
    pub fn css_class(self) -> &'static str {
        match self {
            StatusClass::Good => "status-good",
            StatusClass::Warning => "status-warning",
            StatusClass::Danger => "status-danger",
            StatusClass::Neutral => "",
        }
    }
}

pub fn status_class(status: &str) -> StatusClass {
    match status {
        "配置合理" => StatusClass::Good,
        "建议增持" => StatusClass::Warning,
        "建议减持" => StatusClass::Danger,
        _ => StatusClass::Neutral,
    }
}

fn analysis_row(label: &str, value: String) -> Node {
    el("div")
        .class("analysis-row")
        .child(el("span").class("label").text(format!("{label}：")))
        .child(el("span").class("value").text(value))
        .into()
}

fn deviation_row(deviation: f64) -> Node {
    let class = if deviation > 0.0 {
        "positive"
    } else if deviation < 0.0 {
        "negative"
    } else {
        ""
    };
    let sign = if deviation > 0.0 { "+" } else { "" };
    el("div")
        .class("analysis-row")
        .child(el("span").class("label").text("偏差："))
        .child(
            el("span")
                .class("value")
                .class(class)
                .text(format!("{sign}{}%", money(deviation))),
        )
        .into()
}

fn adjustment_row(item: &CategoryAnalysis) -> Node {
    let action = item.action.as_deref().unwrap_or(item.status.as_str());
    el("div")
        .class("analysis-row")
        .class("adjust-row")
        .child(el("span").class("label").text(format!("{action}：")))
        .child(
            el("span")
                .class("value")
                .class("adjust-amount")
                .text(format!("{} 元", money(item.adjust_amount.unwrap_or(0.0)))),
        )
        .into()
}

pub fn analysis_item(item: &CategoryAnalysis) -> Node {
    let mut details = el("div")
        .class("analysis-details")
        .child(analysis_row("预期占比", format!("{}%", money(item.expected_ratio))))
        .child(analysis_row("实际占比", format!("{}%", money(item.actual_ratio))))
        .child(analysis_row(
            "预期金额",
            format!("{} 元", money(item.expected_amount)),
        ))
        .child(analysis_row(
            "实际金额",
            format!("{} 元", money(item.actual_amount)),
        ))
        .child(deviation_row(item.deviation));
    if item.need_adjustment {
        details = details.child(adjustment_row(item));
    }

    el("div")
        .class("analysis-item")
        .class(status_class(&item.status).css_class())
        .child(
            el("div")
                .class("analysis-header")
                .child(el("span").class("analysis-name").text(item.name.as_str()))
                .child(el("span").class("analysis-status").text(item.status.as_str())),
        )
        .child(details)
        .into()
}

pub fn analysis_items(analysis: &CategoryMap<CategoryAnalysis>) -> Vec<Node> {
    analysis.iter().map(|(_, item)| analysis_item(item)).collect()
}

pub fn no_fund_portfolio_data() -> Node {
    el("p")
        .class("no-data")
        .text("基金组合金额为0，暂无内部分析")
        .into()
}

/// Rule keys are return-rate thresholds as fractions, e.g. `"-0.05"`.
pub fn strategy_rules(
    add_position: Option<&CategoryMap<f64>>,
    take_profit: Option<&TakeProfitRule>,
) -> Vec<Node> {
    let mut nodes = Vec::new();
    if let Some(rules) = add_position.filter(|r| !r.is_empty()) {
        nodes.push(el("h4").text("加仓规则").into());
        for (threshold, ratio) in rules.iter() {
            let threshold = match threshold.trim().parse::<f64>() {
                Ok(value) => format!("{}%", money(value * 100.0)),
                Err(_) => threshold.to_string(),
            };
            nodes.push(
                el("div")
                    .class("rule-item")
                    .child(el("span").class("label").text(format!("收益率 ≤ {threshold}：")))
                    .child(
                        el("span")
                            .class("value")
                            .text(format!("加仓 {}%", money(ratio * 100.0))),
                    )
                    .into(),
            );
        }
    }
    if let Some(rule) = take_profit {
        nodes.push(el("h4").text("止盈规则").into());
        nodes.push(
            el("div")
                .class("rule-item")
                .child(
                    el("span")
                        .class("label")
                        .text(format!("收益率 ≥ {}%：", money(rule.threshold * 100.0))),
                )
                .child(
                    el("span")
                        .class("value")
                        .text(format!("止盈 {}%", money(rule.ratio * 100.0))),
                )
                .into(),
        );
    }
    nodes
}
