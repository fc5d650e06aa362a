pub mod cli;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Datelike, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    AccountPayoff, DebtAccount, ExtraSolveConfig, InvalidInputError, MAX_DEMO_ACCOUNTS,
    MonthSnapshot, PayoffStrategy, SimulationInputs, SimulationMilestone, compare_strategies,
    default_accounts, demo_accounts, demo_seed_for, run_monthly_trace, simulate,
    solve_monthly_extra,
};

use self::cli::{CliStrategy, GoalArgs, PlanArgs, default_goal_args, default_plan_args};

/// Upper bound on the horizon a single request may ask for (100 years).
const MAX_REQUEST_MONTHS: u32 = 1_200;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    #[error("{0}")]
    Request(String),
    #[error("failed to read accounts file {path}: {source}")]
    AccountsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "Snowball", alias = "smallest-first")]
    Snowball,
    #[serde(alias = "Avalanche", alias = "highest-rate-first")]
    Avalanche,
    #[serde(alias = "Hybrid")]
    Hybrid,
}

impl TryFrom<ApiStrategy> for CliStrategy {
    type Error = ApiError;

    fn try_from(value: ApiStrategy) -> Result<Self, Self::Error> {
        match value {
            ApiStrategy::Snowball => Ok(CliStrategy::Snowball),
            ApiStrategy::Avalanche => Ok(CliStrategy::Avalanche),
            ApiStrategy::Hybrid => Err(ApiError::Request(
                "hybrid strategy is not supported; choose snowball or avalanche".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    balance: f64,
    #[serde(default)]
    original_balance: Option<f64>,
    #[serde(default, alias = "minimumPayment", alias = "minPay")]
    min_payment: f64,
    #[serde(default, alias = "apr", alias = "rate")]
    interest_rate: f64,
}

impl From<AccountPayload> for DebtAccount {
    fn from(value: AccountPayload) -> Self {
        let name = value
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| value.id.clone());
        let account = DebtAccount::new(
            value.id,
            name,
            value.balance,
            value.min_payment,
            value.interest_rate,
        );
        match value.original_balance {
            Some(original) => account.with_original_balance(original),
            None => account,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    accounts: Option<Vec<AccountPayload>>,
    strategy: Option<ApiStrategy>,
    #[serde(alias = "extra", alias = "extraPayment")]
    monthly_extra: Option<f64>,
    max_months: Option<u32>,
    demo_seed: Option<u64>,
    demo_name: Option<String>,
    demo_count: Option<usize>,
    start_month: Option<String>,

    target_months: Option<u32>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
}

#[derive(Debug)]
pub(crate) struct ApiRequest {
    pub(crate) inputs: SimulationInputs,
    pub(crate) start_month: NaiveDate,
    pub(crate) goal: ExtraSolveConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct MilestoneResponse {
    #[serde(flatten)]
    milestone: SimulationMilestone,
    target_month: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SimulateResponse {
    strategy: PayoffStrategy,
    monthly_extra: f64,
    max_months: u32,
    start_month: String,
    total_months: u32,
    debt_free: bool,
    debt_free_month: Option<String>,
    total_interest: f64,
    total_paid: f64,
    milestones: Vec<MilestoneResponse>,
    accounts: Vec<AccountPayoff>,
    months: Vec<MonthSnapshot>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub(crate) fn build_request(
    plan: PlanArgs,
    goal: GoalArgs,
    inline_accounts: Option<Vec<AccountPayload>>,
) -> Result<ApiRequest, ApiError> {
    if plan.max_months == 0 || plan.max_months > MAX_REQUEST_MONTHS {
        return Err(ApiError::Request(format!(
            "--max-months must be between 1 and {MAX_REQUEST_MONTHS}"
        )));
    }

    if plan.demo_count == 0 || plan.demo_count > MAX_DEMO_ACCOUNTS {
        return Err(ApiError::Request(format!(
            "--demo-count must be between 1 and {MAX_DEMO_ACCOUNTS}"
        )));
    }

    if goal.target_months == 0 || goal.target_months > MAX_REQUEST_MONTHS {
        return Err(ApiError::Request(format!(
            "--target-months must be between 1 and {MAX_REQUEST_MONTHS}"
        )));
    }

    let start_month = match plan.start_month.as_deref() {
        Some(raw) => parse_month(raw)?,
        None => current_month(),
    };

    let accounts = resolve_accounts(&plan, inline_accounts)?;

    Ok(ApiRequest {
        inputs: SimulationInputs {
            accounts,
            strategy: plan.strategy.into(),
            monthly_extra: plan.monthly_extra,
            max_months: plan.max_months,
        },
        start_month,
        goal: ExtraSolveConfig {
            target_months: goal.target_months,
            search_min: 0.0,
            search_max: goal.search_max,
            tolerance: goal.tolerance,
            max_iterations: goal.max_iterations,
        },
    })
}

fn resolve_accounts(
    plan: &PlanArgs,
    inline_accounts: Option<Vec<AccountPayload>>,
) -> Result<Vec<DebtAccount>, ApiError> {
    if let Some(accounts) = inline_accounts.filter(|a| !a.is_empty()) {
        return Ok(accounts.into_iter().map(DebtAccount::from).collect());
    }

    if let Some(path) = &plan.accounts {
        let accounts = read_accounts_file(path)?;
        if !accounts.is_empty() {
            return Ok(accounts);
        }
        tracing::warn!(?path, "accounts file is empty; using default accounts");
    }

    let seed = plan
        .demo_seed
        .or_else(|| plan.demo_name.as_deref().map(demo_seed_for));
    Ok(match seed {
        Some(seed) => demo_accounts(seed, plan.demo_count),
        None => default_accounts(),
    })
}

fn read_accounts_file(path: &Path) -> Result<Vec<DebtAccount>, ApiError> {
    let raw = fs::read_to_string(path).map_err(|source| ApiError::AccountsFile {
        path: path.to_path_buf(),
        source,
    })?;
    let payload: Vec<AccountPayload> = serde_json::from_str(&raw)?;
    Ok(payload.into_iter().map(DebtAccount::from).collect())
}

fn parse_month(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| ApiError::Request(format!("invalid start month '{raw}', expected YYYY-MM")))
}

fn current_month() -> NaiveDate {
    let today = Local::now().date_naive();
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
}

fn month_label(start: NaiveDate, offset: u32) -> String {
    start
        .checked_add_months(Months::new(offset))
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

pub(crate) fn run_simulate(request: &ApiRequest) -> Result<SimulateResponse, ApiError> {
    let result = simulate(&request.inputs)?;
    let months = run_monthly_trace(&request.inputs)?;
    let start = request.start_month;

    let milestones = result
        .milestones
        .into_iter()
        .map(|milestone| MilestoneResponse {
            target_month: month_label(start, milestone.month_index),
            milestone,
        })
        .collect();

    Ok(SimulateResponse {
        strategy: request.inputs.strategy,
        monthly_extra: request.inputs.monthly_extra,
        max_months: request.inputs.max_months,
        start_month: month_label(start, 0),
        total_months: result.total_months,
        debt_free: result.debt_free,
        debt_free_month: result
            .debt_free
            .then(|| month_label(start, result.total_months)),
        total_interest: result.total_interest,
        total_paid: result.total_paid,
        milestones,
        accounts: result.accounts,
        months,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route("/api/solve", get(solve_get_handler).post(solve_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "payoff HTTP API listening");
    tracing::info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn compare_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    compare_handler_impl(payload)
}

async fn solve_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    solve_handler_impl(payload)
}

async fn solve_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    solve_handler_impl(payload)
}

fn simulate_handler_impl(payload: PlanPayload) -> Response {
    respond("simulate", api_request_from_payload(payload).and_then(|r| run_simulate(&r)))
}

fn compare_handler_impl(payload: PlanPayload) -> Response {
    let outcome = api_request_from_payload(payload).and_then(|request| {
        let inputs = &request.inputs;
        Ok(compare_strategies(
            &inputs.accounts,
            inputs.monthly_extra,
            inputs.max_months,
        )?)
    });
    respond("compare", outcome)
}

fn solve_handler_impl(payload: PlanPayload) -> Response {
    let outcome = api_request_from_payload(payload).and_then(|request| {
        Ok(solve_monthly_extra(
            &request.inputs.accounts,
            request.inputs.strategy,
            request.goal,
        )?)
    });
    respond("solve", outcome)
}

fn respond<T: Serialize>(route: &str, outcome: Result<T, ApiError>) -> Response {
    match outcome {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => {
            tracing::warn!(route, error = %err, "rejected request");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, ApiError> {
    let payload = serde_json::from_str::<PlanPayload>(json)?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: PlanPayload) -> Result<ApiRequest, ApiError> {
    let mut plan = default_plan_args();
    let mut goal = default_goal_args();

    if let Some(v) = payload.strategy {
        plan.strategy = v.try_into()?;
    }
    if let Some(v) = payload.monthly_extra {
        plan.monthly_extra = v;
    }
    if let Some(v) = payload.max_months {
        plan.max_months = v;
    }
    if let Some(v) = payload.demo_seed {
        plan.demo_seed = Some(v);
    }
    if let Some(v) = payload.demo_name.filter(|n| !n.trim().is_empty()) {
        plan.demo_name = Some(v);
    }
    if let Some(v) = payload.demo_count {
        plan.demo_count = v;
    }
    if let Some(v) = payload.start_month {
        plan.start_month = Some(v);
    }

    if let Some(v) = payload.target_months {
        goal.target_months = v;
    }
    if let Some(v) = payload.search_max {
        goal.search_max = v;
    }
    if let Some(v) = payload.tolerance {
        goal.tolerance = v;
    }

    build_request(plan, goal, payload.accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MilestoneKind;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "accounts": [
            {"id": "visa", "name": "Visa", "balance": 3200, "minimumPayment": 90, "apr": 22.9},
            {"id": "loan", "balance": 7000, "originalBalance": 9000, "minPayment": 180, "interestRate": 7.5}
          ],
          "strategy": "avalanche",
          "monthlyExtra": 150,
          "maxMonths": 240,
          "startMonth": "2026-03"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let inputs = request.inputs;

        assert_eq!(inputs.strategy, PayoffStrategy::Avalanche);
        assert_approx(inputs.monthly_extra, 150.0);
        assert_eq!(inputs.max_months, 240);
        assert_eq!(inputs.accounts.len(), 2);
        assert_eq!(inputs.accounts[0].name, "Visa");
        assert_approx(inputs.accounts[0].min_payment, 90.0);
        assert_approx(inputs.accounts[0].interest_rate, 22.9);
        assert_approx(inputs.accounts[0].original_balance, 3_200.0);
        assert_eq!(inputs.accounts[1].name, "loan");
        assert_approx(inputs.accounts[1].original_balance, 9_000.0);
        assert_eq!(
            request.start_month,
            NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
        );
    }

    #[test]
    fn hybrid_strategy_is_rejected() {
        let err = api_request_from_json(r#"{"strategy": "hybrid"}"#).expect_err("must reject");
        assert!(err.to_string().contains("hybrid"));
    }

    #[test]
    fn missing_or_empty_accounts_fall_back_to_defaults() {
        let request = api_request_from_json("{}").expect("defaults are valid");
        assert_eq!(request.inputs.accounts, default_accounts());

        let request = api_request_from_json(r#"{"accounts": []}"#).expect("defaults are valid");
        assert_eq!(request.inputs.accounts, default_accounts());
    }

    #[test]
    fn demo_seed_generates_deterministic_accounts() {
        let request =
            api_request_from_json(r#"{"demoSeed": 11, "demoCount": 4}"#).expect("valid");
        assert_eq!(request.inputs.accounts, demo_accounts(11, 4));

        let request =
            api_request_from_json(r#"{"demoName": "household", "demoCount": 3}"#).expect("valid");
        assert_eq!(
            request.inputs.accounts,
            demo_accounts(demo_seed_for("household"), 3)
        );
    }

    #[test]
    fn out_of_range_request_limits_are_rejected() {
        for (json, needle) in [
            (r#"{"maxMonths": 5000}"#, "--max-months"),
            (r#"{"maxMonths": 0}"#, "--max-months"),
            (r#"{"demoSeed": 1, "demoCount": 40}"#, "--demo-count"),
            (r#"{"targetMonths": 0}"#, "--target-months"),
            (r#"{"startMonth": "March"}"#, "start month"),
        ] {
            let err = api_request_from_json(json).expect_err("must reject");
            assert!(
                err.to_string().contains(needle),
                "{json}: expected '{needle}' in '{err}'"
            );
        }
    }

    #[test]
    fn negative_extra_surfaces_engine_error() {
        let request = api_request_from_json(r#"{"monthlyExtra": -10}"#).expect("builds");
        let err = run_simulate(&request).expect_err("engine must reject");
        assert!(matches!(
            err,
            ApiError::InvalidInput(InvalidInputError::MonthlyExtra(_))
        ));
        assert!(err.to_string().contains("monthly extra"));
    }

    #[test]
    fn simulate_response_labels_milestones_with_calendar_months() {
        let json = r#"{
          "accounts": [{"id": "card", "name": "Card", "balance": 1200, "minPayment": 100, "interestRate": 0}],
          "strategy": "snowball",
          "monthlyExtra": 0,
          "startMonth": "2026-01"
        }"#;
        let request = api_request_from_json(json).expect("valid");
        let response = run_simulate(&request).expect("simulates");

        assert_eq!(response.total_months, 12);
        assert_eq!(response.start_month, "2026-01");
        assert_eq!(response.debt_free_month.as_deref(), Some("2027-01"));
        assert_eq!(response.months.len(), 12);
        let last = response.milestones.last().expect("milestones");
        assert_eq!(last.milestone.kind, MilestoneKind::DebtFree);
        assert_eq!(last.target_month, "2027-01");
        assert_eq!(response.milestones[1].target_month, "2026-04");

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"totalMonths\":12"));
        assert!(json.contains("\"debtFree\":true"));
        assert!(json.contains("\"monthIndex\""));
        assert!(json.contains("\"targetMonth\":\"2027-01\""));
        assert!(json.contains("\"kind\":\"debt-free\""));
        assert!(json.contains("\"strategy\":\"snowball\""));
        assert!(json.contains("\"accountId\":\"card\""));
    }

    #[test]
    fn accounts_file_is_read_and_missing_file_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("accounts.json");
        fs::write(
            &path,
            r#"[{"id": "a", "name": "A", "balance": 500, "minPayment": 50, "interestRate": 0}]"#,
        )
        .expect("write accounts");

        let mut plan = default_plan_args();
        plan.accounts = Some(path);
        let request = build_request(plan.clone(), default_goal_args(), None).expect("valid");
        assert_eq!(request.inputs.accounts.len(), 1);
        assert_eq!(request.inputs.accounts[0].id, "a");

        plan.accounts = Some(dir.path().join("missing.json"));
        let err = build_request(plan, default_goal_args(), None).expect_err("missing file");
        assert!(matches!(err, ApiError::AccountsFile { .. }));
    }

    #[test]
    fn compare_and_solve_serialize_camel_case() {
        let request = api_request_from_json(r#"{"targetMonths": 48, "searchMax": 3000}"#)
            .expect("valid");
        let comparison = compare_strategies(
            &request.inputs.accounts,
            request.inputs.monthly_extra,
            request.inputs.max_months,
        )
        .expect("compares");
        let json = serde_json::to_string(&comparison).expect("serializes");
        assert!(json.contains("\"recommended\""));
        assert!(json.contains("\"interestSaved\""));
        assert!(json.contains("\"firstPaidId\""));

        let solved = solve_monthly_extra(
            &request.inputs.accounts,
            request.inputs.strategy,
            request.goal,
        )
        .expect("solves");
        assert!(solved.feasible);
        assert_eq!(solved.target_months, 48);
        let json = serde_json::to_string(&solved).expect("serializes");
        assert!(json.contains("\"solvedValue\""));
        assert!(json.contains("\"achievedMonths\""));
    }
}
