use clap::{Args, Parser, Subcommand, ValueEnum};

use idle_money::api::HttpBackend;
use idle_money::core::fields::{self, Field};
use idle_money::core::view::{self, Node, el};
use idle_money::core::{FormController, HoldingRow, Page, Submission, Tool};
use idle_money::logging::init_logging;
use idle_money::settings::{DEFAULT_API_URL, Settings};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
}

#[derive(Parser, Debug)]
#[command(
    name = "idle-money",
    about = "Living-expense and allocation calculator client for the idle-money backend"
)]
struct Cli {
    #[arg(long, global = true, env = "IDLE_MONEY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    #[arg(
        long,
        global = true,
        env = "IDLE_MONEY_TIMEOUT_SECS",
        help = "Request timeout in seconds; requests wait indefinitely when unset"
    )]
    timeout_secs: Option<u64>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split new income into living expenses, allocations and a weekly plan.
    Calculate(CalculateArgs),
    /// Compare current holdings with the configured allocation.
    Analyze(AnalyzeArgs),
    /// Show or change the allocation ratios.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
struct CalculateArgs {
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    target_living_expense: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    current_living_expense: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    debt: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    new_income: String,
    #[arg(
        long = "holding",
        value_name = "NAME,COST,NAV,AMOUNT",
        value_parser = parse_holding,
        help = "Fund holding, e.g. 标普/纳指,1.2,1.5,8000; repeatable"
    )]
    holdings: Vec<HoldingRow>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    bond_fund: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    dividend_fund: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    us_index_fund: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    gold_etf: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    bank_fixed_income: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    physical_gold: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    reserve_fund: String,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the persisted ratios and the strategy rules.
    Show,
    /// Save new ratios, given in percent.
    Set(ConfigSetArgs),
}

#[derive(Args, Debug)]
struct ConfigSetArgs {
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    fund_portfolio: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    bank_fixed_income: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    physical_gold: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    reserve_fund: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    bond_fund: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    dividend_fund: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    us_index_fund: String,
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    gold_etf: String,
}

fn parse_holding(raw: &str) -> Result<HoldingRow, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [fund_name, holding_cost, current_nav, holding_amount] = parts.as_slice() else {
        return Err(format!(
            "expected NAME,COST,NAV,AMOUNT, got {} comma-separated values",
            parts.len()
        ));
    };
    Ok(HoldingRow {
        fund_name: fund_name.to_string(),
        holding_cost: holding_cost.to_string(),
        current_nav: current_nav.to_string(),
        holding_amount: holding_amount.to_string(),
    })
}

fn type_into(page: &mut Page, values: impl IntoIterator<Item = (Field, String)>) {
    for (field, value) in values {
        page.form.set(field, value);
    }
}

fn ratio_inputs(page: &Page) -> Vec<Node> {
    [
        ("投资大框架", fields::FRAMEWORK_RATIO_FIELDS),
        ("基金组合内部", fields::FUND_RATIO_FIELDS),
    ]
    .into_iter()
    .map(|(heading, group)| {
        el("div")
            .class("ratio-group")
            .child(el("h4").text(heading))
            .children(group.into_iter().map(|field| {
                el("div")
                    .class("ratio-item")
                    .child(el("span").class("label").text(format!("{}：", field.label)))
                    .child(el("span").class("value").text(format!("{}%", page.input(field))))
            }))
            .into()
    })
    .collect()
}

fn render(page: &Page, tool: Tool, format: OutputFormat, with_ratios: bool) -> String {
    let ratios = if with_ratios { ratio_inputs(page) } else { Vec::new() };
    match format {
        OutputFormat::Text => {
            let mut out = view::render_text(&ratios);
            let regions = page.render_text(tool);
            if !out.is_empty() && !regions.is_empty() {
                out.push('\n');
            }
            out.push_str(&regions);
            out
        }
        OutputFormat::Html => {
            let mut out = view::render_html(&ratios);
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&page.render_html(tool));
            out
        }
    }
}

async fn run(cli: Cli) -> Result<bool, String> {
    let settings = Settings::new(&cli.api_url, cli.timeout_secs).map_err(|e| e.to_string())?;
    tracing::info!(api = %settings.api_base_url, "using backend");
    let backend = HttpBackend::new(settings).map_err(|e| e.to_string())?;
    let mut controller = FormController::new(backend);
    let config_loaded = controller.initialize().await;

    let (tool, outcome, with_ratios) = match cli.command {
        Command::Calculate(args) => {
            controller.switch_tool(Tool::Calculator);
            type_into(
                controller.page_mut(),
                [
                    (fields::TARGET_LIVING_EXPENSE, args.target_living_expense),
                    (fields::CURRENT_LIVING_EXPENSE, args.current_living_expense),
                    (fields::DEBT, args.debt),
                    (fields::NEW_INCOME, args.new_income),
                ],
            );
            for typed in args.holdings {
                let id = controller.add_holding_input();
                if let Some(row) = controller.page_mut().holdings.get_mut(id) {
                    *row = typed;
                }
            }
            (Tool::Calculator, controller.submit_calculation().await, false)
        }
        Command::Analyze(args) => {
            controller.switch_tool(Tool::Portfolio);
            type_into(
                controller.page_mut(),
                [
                    (fields::BOND_FUND_HOLDING, args.bond_fund),
                    (fields::DIVIDEND_FUND_HOLDING, args.dividend_fund),
                    (fields::US_INDEX_FUND_HOLDING, args.us_index_fund),
                    (fields::GOLD_ETF_HOLDING, args.gold_etf),
                    (fields::BANK_FIXED_INCOME_HOLDING, args.bank_fixed_income),
                    (fields::PHYSICAL_GOLD_HOLDING, args.physical_gold),
                    (fields::RESERVE_FUND_HOLDING, args.reserve_fund),
                ],
            );
            (Tool::Portfolio, controller.submit_portfolio().await, false)
        }
        Command::Config(ConfigCommand::Show) => {
            controller.switch_tool(Tool::Config);
            if !config_loaded {
                return Err("could not load the current config".to_string());
            }
            (Tool::Config, Submission::Completed, true)
        }
        Command::Config(ConfigCommand::Set(args)) => {
            controller.switch_tool(Tool::Config);
            type_into(
                controller.page_mut(),
                [
                    (fields::FUND_PORTFOLIO_RATIO, args.fund_portfolio),
                    (fields::BANK_FIXED_INCOME_RATIO, args.bank_fixed_income),
                    (fields::PHYSICAL_GOLD_RATIO, args.physical_gold),
                    (fields::RESERVE_FUND_RATIO, args.reserve_fund),
                    (fields::BOND_FUND_RATIO, args.bond_fund),
                    (fields::DIVIDEND_FUND_RATIO, args.dividend_fund),
                    (fields::US_INDEX_FUND_RATIO, args.us_index_fund),
                    (fields::GOLD_ETF_RATIO, args.gold_etf),
                ],
            );
            let outcome = controller.submit_config().await;
            let completed = outcome.is_completed();
            (Tool::Config, outcome, completed)
        }
    };

    println!("{}", render(controller.page(), tool, cli.format, with_ratios));
    match outcome {
        Submission::Completed => Ok(true),
        Submission::Blocked(err) => {
            tracing::debug!(error = %err, "input rejected");
            Ok(false)
        }
        Submission::Failed(_) => Ok(false),
    }
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
