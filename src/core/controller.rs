use crate::api::{ApiError, Backend};

use super::form::{self, FormError, HoldingRowId};
use super::page::{Page, Tool};
use super::types::{
    AllocationConfig, CalculationRequest, CalculationResult, ConfigUpdate, Holding,
    PortfolioAnalysisResult, PortfolioHoldings,
};

pub const NETWORK_ERROR: &str = "网络错误，请检查服务器是否正常运行";
pub const CALCULATION_FAILED: &str = "计算失败，请重试";
pub const ANALYSIS_FAILED: &str = "分析失败，请重试";
pub const CONFIG_FAILED: &str = "设置失败，请重试";

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Completed,
    Blocked(FormError),
    Failed(String),
}

impl Submission {
    pub fn is_completed(&self) -> bool {
        matches!(self, Submission::Completed)
    }
}

fn failure_message(err: &ApiError, default: &str) -> String {
    if err.is_transport() {
        return NETWORK_ERROR.to_string();
    }
    match err {
        ApiError::Rejected(Some(message)) if !message.is_empty() => message.clone(),
        _ => default.to_string(),
    }
}

/// Binds the three tool forms to the backend and renders replies into the page.
///
/// Each flow is a synchronous `prepare_*` (validate, or show the validation
/// error), the backend call, and a synchronous `apply_*`. `submit_*` runs all
/// three; hosts that keep several requests in flight call the halves directly.
pub struct FormController<B> {
    backend: B,
    page: Page,
}

impl<B: Backend> FormController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            page: Page::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn switch_tool(&mut self, tool: Tool) {
        self.page.switch_tool(tool);
    }

    pub fn add_holding_input(&mut self) -> HoldingRowId {
        self.page.holdings.add()
    }

    pub fn remove_holding(&mut self, id: HoldingRowId) -> bool {
        self.page.holdings.remove(id)
    }

    pub fn collect_holdings(&self) -> Option<Vec<Holding>> {
        self.page.holdings.collect()
    }

    pub async fn initialize(&mut self) -> bool {
        self.load_current_config().await
    }

    /// Failures are logged and otherwise ignored; returns whether the form was filled.
    pub async fn load_current_config(&mut self) -> bool {
        match self.backend.fetch_config().await {
            Ok(snapshot) => {
                self.page.fill_config(&snapshot);
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load current config");
                false
            }
        }
    }

    fn block(&mut self, tool: Tool, err: FormError) -> FormError {
        tracing::debug!(tool = tool.name(), error = %err, "form blocked by validation");
        self.page.display_error(tool, &err.to_string());
        err
    }

    fn fail(&mut self, tool: Tool, err: &ApiError, default: &str) -> Submission {
        tracing::warn!(tool = tool.name(), error = %err, "backend request failed");
        let message = failure_message(err, default);
        self.page.display_error(tool, &message);
        Submission::Failed(message)
    }

    pub fn prepare_calculation(&mut self) -> Result<CalculationRequest, FormError> {
        self.page.hide_error(Tool::Calculator);
        form::calculation_request(&self.page.form, &self.page.holdings)
            .map_err(|err| self.block(Tool::Calculator, err))
    }

    pub fn apply_calculation(&mut self, reply: Result<CalculationResult, ApiError>) -> Submission {
        match reply {
            Ok(result) => {
                self.page.show_calculation(&result);
                Submission::Completed
            }
            Err(err) => self.fail(Tool::Calculator, &err, CALCULATION_FAILED),
        }
    }

    pub async fn submit_calculation(&mut self) -> Submission {
        let request = match self.prepare_calculation() {
            Ok(request) => request,
            Err(err) => return Submission::Blocked(err),
        };
        tracing::debug!(
            holdings = request.holdings.as_ref().map_or(0, Vec::len),
            "submitting calculation"
        );
        let reply = self.backend.calculate(&request).await;
        self.apply_calculation(reply)
    }

    pub fn prepare_portfolio(&mut self) -> Result<PortfolioHoldings, FormError> {
        self.page.hide_error(Tool::Portfolio);
        form::portfolio_holdings(&self.page.form).map_err(|err| self.block(Tool::Portfolio, err))
    }

    pub fn apply_portfolio(
        &mut self,
        reply: Result<PortfolioAnalysisResult, ApiError>,
    ) -> Submission {
        match reply {
            Ok(result) => {
                self.page.show_portfolio_analysis(&result);
                Submission::Completed
            }
            Err(err) => self.fail(Tool::Portfolio, &err, ANALYSIS_FAILED),
        }
    }

    pub async fn submit_portfolio(&mut self) -> Submission {
        let holdings = match self.prepare_portfolio() {
            Ok(holdings) => holdings,
            Err(err) => return Submission::Blocked(err),
        };
        tracing::debug!(total = holdings.total(), "submitting portfolio analysis");
        let reply = self.backend.analyze_portfolio(&holdings).await;
        self.apply_portfolio(reply)
    }

    pub fn prepare_config(&mut self) -> Result<AllocationConfig, FormError> {
        self.page.hide_error(Tool::Config);
        form::allocation_config(&self.page.form).map_err(|err| self.block(Tool::Config, err))
    }

    pub fn apply_config(&mut self, reply: Result<ConfigUpdate, ApiError>) -> Submission {
        match reply {
            Ok(update) => {
                self.page.show_config_status(&update.message);
                Submission::Completed
            }
            Err(err) => self.fail(Tool::Config, &err, CONFIG_FAILED),
        }
    }

    /// On success the persisted config is fetched again and redisplayed.
    pub async fn submit_config(&mut self) -> Submission {
        let config = match self.prepare_config() {
            Ok(config) => config,
            Err(err) => return Submission::Blocked(err),
        };
        tracing::debug!("submitting allocation config");
        let reply = self.backend.update_config(&config).await;
        let outcome = self.apply_config(reply);
        if outcome.is_completed() {
            self.load_current_config().await;
        }
        outcome
    }
}
