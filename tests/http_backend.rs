use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use idle_money::api::{ApiError, Backend, Envelope, HttpBackend};
use idle_money::core::fields;
use idle_money::core::{
    CALCULATION_FAILED, ConfigUpdate, FormController, NETWORK_ERROR, PortfolioHoldings, RegionId,
    Submission, Tool,
};
use idle_money::settings::Settings;

#[derive(Clone)]
struct StubState {
    config: Arc<Mutex<Value>>,
}

fn json_response<T: Serialize>(status: StatusCode, envelope: Envelope<T>) -> Response {
    (status, Json(envelope)).into_response()
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(status, Envelope::<Value>::rejected(msg))
}

async fn calculate_handler(Json(body): Json<Value>) -> Response {
    let number = |key: &str| body[key].as_f64().unwrap_or(0.0);
    let (target, current, debt, income) = (
        number("target_living_expense"),
        number("current_living_expense"),
        number("debt"),
        number("new_income"),
    );
    if income == 0.0 {
        return error_response(StatusCode::BAD_REQUEST, "新增收入必须大于0");
    }
    if target < 0.0 {
        return error_response(StatusCode::BAD_REQUEST, "");
    }

    let gap = (target - current).max(0.0);
    let investable = income - gap - debt;
    let total_add = 800.0 * body["holdings"].as_array().map_or(0, Vec::len) as f64;
    let add_position: Vec<Value> = body["holdings"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|h| {
            json!({
                "fund_name": h["fund_name"],
                "return_rate": -8.0,
                "threshold": -5.0,
                "add_ratio": 10.0,
                "add_amount": 800.0
            })
        })
        .collect();

    json_response(
        StatusCode::OK,
        Envelope::ok(json!({
            "living_expense_gap": gap,
            "investable_amount": investable,
            "warning": null,
            "framework_allocation": {
                "基金组合": investable * 0.3,
                "银行固收R2": investable * 0.6,
                "实体黄金": investable * 0.05,
                "备用金": investable * 0.05
            },
            "fund_allocation": {"中短债基金": investable * 0.12},
            "regular_investment_plan": {
                "tuesday_amount": 200.0,
                "thursday_amount": 200.0,
                "weekly_total": 400.0,
                "funds": [{"name": "标普/纳指", "amount": 200.0, "day": "周二"}]
            },
            "suggestions": {
                "add_position_suggestions": add_position,
                "take_profit_suggestions": [],
                "total_add_amount": total_add,
                "total_profit_amount": 0.0
            }
        })),
    )
}

async fn analyze_handler(Json(body): Json<Value>) -> Response {
    let holdings = &body["holdings"];
    let total: f64 = [
        "bond_fund",
        "dividend_fund",
        "us_index_fund",
        "gold_etf",
        "bank_fixed_income",
        "physical_gold",
        "reserve_fund",
    ]
    .iter()
    .map(|key| holdings[*key].as_f64().unwrap_or(0.0))
    .sum();
    let reserve = holdings["reserve_fund"].as_f64().unwrap_or(0.0);
    let actual_ratio = reserve / total * 100.0;

    json_response(
        StatusCode::OK,
        Envelope::ok(json!({
            "total_amount": total,
            "framework_analysis": {
                "reserve_fund": {
                    "name": "备用金",
                    "status": "建议减持",
                    "expected_ratio": 5.0,
                    "actual_ratio": actual_ratio,
                    "expected_amount": total * 0.05,
                    "actual_amount": reserve,
                    "deviation": actual_ratio - 5.0,
                    "need_adjustment": true,
                    "action": "建议减持",
                    "adjust_amount": reserve - total * 0.05
                }
            },
            "fund_portfolio_analysis": {}
        })),
    )
}

async fn get_config_handler(State(state): State<StubState>) -> Response {
    let mut config = state.config.lock().expect("config lock").clone();
    config["add_position_rules"] = json!({"-0.05": 0.1, "-0.1": 0.15, "-0.15": 0.2});
    config["take_profit"] = json!({"threshold": 0.3, "ratio": 0.2});
    json_response(StatusCode::OK, Envelope::ok(config))
}

async fn put_config_handler(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    let sum = |group: &str| -> f64 {
        body[group]
            .as_object()
            .map_or(0.0, |m| m.values().filter_map(Value::as_f64).sum())
    };
    if (sum("framework") - 1.0).abs() > 0.0001 {
        return error_response(StatusCode::BAD_REQUEST, "投资大框架分配比例总和必须为1");
    }
    *state.config.lock().expect("config lock") = json!({
        "framework": body["framework"],
        "fund_portfolio": body["fund_portfolio"]
    });
    let update = ConfigUpdate {
        message: "配置已更新".to_string(),
    };
    json_response(StatusCode::OK, Envelope::ok(update))
}

async fn gateway_error_handler() -> Response {
    let page = "<html><body><h1>502 Bad Gateway</h1></body></html>";
    (StatusCode::BAD_GATEWAY, Html(page)).into_response()
}

async fn spawn_stub() -> String {
    let state = StubState {
        config: Arc::new(Mutex::new(json!({
            "framework": {"fund_portfolio": 0.3, "bank_fixed_income": 0.6, "physical_gold": 0.05, "reserve_fund": 0.05},
            "fund_portfolio": {"bond_fund": 0.4, "dividend_fund": 0.3, "us_index_fund": 0.15, "gold_etf": 0.15}
        }))),
    };
    let app = Router::new()
        .route("/api/calculate", post(calculate_handler))
        .route("/api/analyze-portfolio", post(analyze_handler))
        .route("/api/config", get(get_config_handler).put(put_config_handler))
        .with_state(state);
    serve(app).await
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}")
}

async fn controller_for(base_url: &str) -> FormController<HttpBackend> {
    let settings = Settings::new(base_url, Some(5)).expect("valid settings");
    let backend = HttpBackend::new(settings).expect("client builds");
    FormController::new(backend)
}

fn fill_calculator(controller: &mut FormController<HttpBackend>, new_income: &str) {
    let form = &mut controller.page_mut().form;
    form.set(fields::TARGET_LIVING_EXPENSE, "15000");
    form.set(fields::CURRENT_LIVING_EXPENSE, "10000");
    form.set(fields::DEBT, "2000");
    form.set(fields::NEW_INCOME, new_income);
}

#[tokio::test]
async fn calculation_renders_backend_reply() {
    let base_url = spawn_stub().await;
    let mut controller = controller_for(&base_url).await;
    fill_calculator(&mut controller, "20000");
    let row = controller.add_holding_input();
    if let Some(typed) = controller.page_mut().holdings.get_mut(row) {
        typed.fund_name = "标普/纳指".to_string();
        typed.holding_cost = "1.2".to_string();
        typed.current_nav = "1.1".to_string();
        typed.holding_amount = "8000".to_string();
    }

    assert_eq!(controller.submit_calculation().await, Submission::Completed);
    let page = controller.page();
    assert_eq!(page.text(RegionId::LivingExpenseGap), "5000.00");
    assert_eq!(page.text(RegionId::InvestableAmount), "13000.00");
    assert!(!page.is_displayed(RegionId::WarningMessage));
    assert_eq!(page.text(RegionId::WeeklyTotal), "400.00");

    let framework = page.text(RegionId::FrameworkAllocation);
    let first_line = framework.lines().next().unwrap_or_default();
    assert_eq!(first_line, "基金组合： 3900.00 元");

    assert!(page.is_displayed(RegionId::SuggestionsCard));
    let suggestions = page.text(RegionId::SuggestionsContent);
    assert!(suggestions.contains("⚠️ 加仓建议"), "{suggestions}");
    assert!(suggestions.contains("总加仓金额 800.00 元"), "{suggestions}");
}

#[tokio::test]
async fn rejection_with_error_status_shows_server_message() {
    let base_url = spawn_stub().await;
    let mut controller = controller_for(&base_url).await;
    fill_calculator(&mut controller, "0");

    assert_eq!(
        controller.submit_calculation().await,
        Submission::Failed("新增收入必须大于0".to_string())
    );
    let page = controller.page();
    assert!(page.is_displayed(RegionId::ErrorMessage));
    assert!(!page.is_displayed(RegionId::ResultSection));
}

#[tokio::test]
async fn rejection_with_empty_message_falls_back_to_default() {
    let base_url = spawn_stub().await;
    let backend = HttpBackend::new(Settings::new(&base_url, None).expect("valid settings"))
        .expect("client builds");
    let mut request = idle_money::core::CalculationRequest {
        target_living_expense: -1.0,
        current_living_expense: 0.0,
        debt: 0.0,
        new_income: 100.0,
        holdings: None,
    };
    match backend.calculate(&request).await {
        Err(ApiError::Rejected(Some(message))) => assert!(message.is_empty()),
        other => panic!("unexpected reply: {other:?}"),
    }

    let mut controller = FormController::new(backend);
    request.target_living_expense = 0.0;
    let reply = controller.backend().calculate(&request).await;
    assert_eq!(controller.apply_calculation(reply), Submission::Completed);
    let reply = Err(ApiError::Rejected(Some(String::new())));
    assert_eq!(
        controller.apply_calculation(reply),
        Submission::Failed(CALCULATION_FAILED.to_string())
    );
}

#[tokio::test]
async fn unreachable_backend_shows_network_message() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);

    let mut controller = controller_for(&format!("http://{addr}")).await;
    assert!(!controller.initialize().await);
    fill_calculator(&mut controller, "20000");
    assert_eq!(
        controller.submit_calculation().await,
        Submission::Failed(NETWORK_ERROR.to_string())
    );
}

#[tokio::test]
async fn html_error_page_shows_network_message() {
    let app = Router::new().route("/api/calculate", post(gateway_error_handler));
    let base_url = serve(app).await;
    let backend = HttpBackend::new(Settings::new(&base_url, None).expect("valid settings"))
        .expect("client builds");
    let request = idle_money::core::CalculationRequest {
        target_living_expense: 0.0,
        current_living_expense: 0.0,
        debt: 0.0,
        new_income: 100.0,
        holdings: None,
    };
    match backend.calculate(&request).await {
        Err(ApiError::Decode { status, .. }) => assert_eq!(status, 502),
        other => panic!("unexpected reply: {other:?}"),
    }

    let mut controller = FormController::new(backend);
    fill_calculator(&mut controller, "20000");
    assert_eq!(
        controller.submit_calculation().await,
        Submission::Failed(NETWORK_ERROR.to_string())
    );
    let page = controller.page();
    assert_eq!(page.text(RegionId::ErrorMessage), NETWORK_ERROR);
    assert!(!page.is_displayed(RegionId::ResultSection));
}

#[tokio::test]
async fn portfolio_analysis_round_trip() {
    let base_url = spawn_stub().await;
    let backend = HttpBackend::new(Settings::new(&base_url, None).expect("valid settings"))
        .expect("client builds");
    let holdings = PortfolioHoldings {
        bank_fixed_income: 80_000.0,
        reserve_fund: 20_000.0,
        ..PortfolioHoldings::default()
    };
    let result = backend
        .analyze_portfolio(&holdings)
        .await
        .expect("analysis succeeds");
    assert_eq!(result.total_amount, 100_000.0);

    let mut controller = FormController::new(backend);
    controller.switch_tool(Tool::Portfolio);
    controller
        .page_mut()
        .form
        .set(fields::RESERVE_FUND_HOLDING, "20000");
    controller
        .page_mut()
        .form
        .set(fields::BANK_FIXED_INCOME_HOLDING, "80000");
    assert_eq!(controller.submit_portfolio().await, Submission::Completed);

    let text = controller.page().render_text(Tool::Portfolio);
    assert!(text.contains("总资产：100000.00"), "{text}");
    assert!(text.contains("偏差： +15.00%"), "{text}");
    assert!(text.contains("建议减持： 15000.00 元"), "{text}");
    assert!(text.contains("基金组合金额为0，暂无内部分析"), "{text}");
    let html = controller.page().render_html(Tool::Portfolio);
    assert!(html.contains("analysis-item status-danger"), "{html}");
}

#[tokio::test]
async fn config_round_trip_redisplays_saved_percentages() {
    let base_url = spawn_stub().await;
    let mut controller = controller_for(&base_url).await;
    assert!(controller.initialize().await);
    assert_eq!(controller.page().input(fields::FUND_PORTFOLIO_RATIO), "30");
    assert_eq!(controller.page().input(fields::GOLD_ETF_RATIO), "15");
    let rules = controller.page().text(RegionId::StrategyRules);
    assert!(rules.contains("收益率 ≥ 30.00%： 止盈 20.00%"), "{rules}");

    controller.switch_tool(Tool::Config);
    let form = &mut controller.page_mut().form;
    for (field, value) in fields::FRAMEWORK_RATIO_FIELDS
        .into_iter()
        .zip(["40", "30", "20", "10"])
    {
        form.set(field, value);
    }
    for field in fields::FUND_RATIO_FIELDS {
        form.set(field, "25");
    }

    assert_eq!(controller.submit_config().await, Submission::Completed);
    let page = controller.page();
    assert_eq!(page.text(RegionId::ConfigStatus), "配置已更新");
    assert!(page.is_displayed(RegionId::ConfigResultSection));

    let mut fresh = controller_for(&base_url).await;
    assert!(fresh.initialize().await);
    for (field, expected) in fields::FRAMEWORK_RATIO_FIELDS
        .into_iter()
        .zip(["40", "30", "20", "10"])
        .chain(fields::FUND_RATIO_FIELDS.into_iter().zip(["25"; 4]))
    {
        assert_eq!(fresh.page().input(field), expected, "{}", field.id);
    }
}
