use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Debt, DeductionOptions, DeductionResult, Location, PayoffResult, PayoffStrategy,
    PensionContribution, PensionMode, PeriodBreakdown, StudentLoanPlan, TaxYearConfig,
    coerce_amount, compute_deductions, marginal_rate, parse_amount, parse_tax_code,
    simulate_payoff, solve_gross_from_net_detailed, supported_tax_years, tax_year,
};

const MAX_DEBTS: usize = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLocation {
    RestOfUk,
    Scotland,
}

impl From<CliLocation> for Location {
    fn from(value: CliLocation) -> Self {
        match value {
            CliLocation::RestOfUk => Location::RestOfUk,
            CliLocation::Scotland => Location::Scotland,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPensionMode {
    Percent,
    FixedMonthly,
}

impl From<CliPensionMode> for PensionMode {
    fn from(value: CliPensionMode) -> Self {
        match value {
            CliPensionMode::Percent => PensionMode::Percent,
            CliPensionMode::FixedMonthly => PensionMode::FixedMonthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStudentLoanPlan {
    None,
    Plan1,
    Plan2,
    Plan4,
    Plan5,
    Postgraduate,
}

impl From<CliStudentLoanPlan> for StudentLoanPlan {
    fn from(value: CliStudentLoanPlan) -> Self {
        match value {
            CliStudentLoanPlan::None => StudentLoanPlan::None,
            CliStudentLoanPlan::Plan1 => StudentLoanPlan::Plan1,
            CliStudentLoanPlan::Plan2 => StudentLoanPlan::Plan2,
            CliStudentLoanPlan::Plan4 => StudentLoanPlan::Plan4,
            CliStudentLoanPlan::Plan5 => StudentLoanPlan::Plan5,
            CliStudentLoanPlan::Postgraduate => StudentLoanPlan::Postgraduate,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Avalanche,
    Snowball,
}

impl From<CliStrategy> for PayoffStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => PayoffStrategy::Avalanche,
            CliStrategy::Snowball => PayoffStrategy::Snowball,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiLocation {
    #[serde(alias = "restOfUk", alias = "rest_of_uk", alias = "ruk", alias = "uk")]
    RestOfUk,
    Scotland,
}

impl From<ApiLocation> for CliLocation {
    fn from(value: ApiLocation) -> Self {
        match value {
            ApiLocation::RestOfUk => CliLocation::RestOfUk,
            ApiLocation::Scotland => CliLocation::Scotland,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPensionMode {
    #[serde(alias = "percentage")]
    Percent,
    #[serde(alias = "fixed", alias = "fixedMonthly", alias = "fixed_monthly")]
    FixedMonthly,
}

impl From<ApiPensionMode> for CliPensionMode {
    fn from(value: ApiPensionMode) -> Self {
        match value {
            ApiPensionMode::Percent => CliPensionMode::Percent,
            ApiPensionMode::FixedMonthly => CliPensionMode::FixedMonthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStudentLoanPlan {
    None,
    #[serde(alias = "plan-1", alias = "plan_1")]
    Plan1,
    #[serde(alias = "plan-2", alias = "plan_2")]
    Plan2,
    #[serde(alias = "plan-4", alias = "plan_4")]
    Plan4,
    #[serde(alias = "plan-5", alias = "plan_5")]
    Plan5,
    #[serde(alias = "postgrad", alias = "pg")]
    Postgraduate,
}

impl From<ApiStudentLoanPlan> for CliStudentLoanPlan {
    fn from(value: ApiStudentLoanPlan) -> Self {
        match value {
            ApiStudentLoanPlan::None => CliStudentLoanPlan::None,
            ApiStudentLoanPlan::Plan1 => CliStudentLoanPlan::Plan1,
            ApiStudentLoanPlan::Plan2 => CliStudentLoanPlan::Plan2,
            ApiStudentLoanPlan::Plan4 => CliStudentLoanPlan::Plan4,
            ApiStudentLoanPlan::Plan5 => CliStudentLoanPlan::Plan5,
            ApiStudentLoanPlan::Postgraduate => CliStudentLoanPlan::Postgraduate,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "highest-interest", alias = "highestInterest")]
    Avalanche,
    #[serde(alias = "smallest-balance", alias = "smallestBalance")]
    Snowball,
}

impl From<ApiStrategy> for CliStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Avalanche => CliStrategy::Avalanche,
            ApiStrategy::Snowball => CliStrategy::Snowball,
        }
    }
}

impl From<PayoffStrategy> for ApiStrategy {
    fn from(value: PayoffStrategy) -> Self {
        match value {
            PayoffStrategy::Avalanche => ApiStrategy::Avalanche,
            PayoffStrategy::Snowball => ApiStrategy::Snowball,
        }
    }
}

/// Form fields arrive as JSON numbers or as raw text such as `"£45,000"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FormNumber {
    Number(f64),
    Text(String),
}

impl FormNumber {
    fn amount(&self) -> f64 {
        match self {
            FormNumber::Number(value) => coerce_amount(*value),
            FormNumber::Text(raw) => parse_amount(raw),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SalaryPayload {
    #[serde(alias = "salary", alias = "gross")]
    gross_annual: Option<FormNumber>,
    #[serde(alias = "targetNet", alias = "net")]
    target_net_annual: Option<FormNumber>,
    tax_year: Option<String>,
    #[serde(alias = "advanced")]
    use_advanced_options: Option<bool>,
    location: Option<ApiLocation>,
    tax_code: Option<String>,
    other_allowances: Option<FormNumber>,
    pension_mode: Option<ApiPensionMode>,
    pension_value: Option<FormNumber>,
    student_loan_plan: Option<ApiStudentLoanPlan>,
    seis_investment: Option<FormNumber>,
    eis_investment: Option<FormNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DebtPayload {
    name: Option<String>,
    balance: Option<FormNumber>,
    #[serde(alias = "interestRate")]
    apr: Option<FormNumber>,
    #[serde(alias = "minPayment")]
    minimum_payment: Option<FormNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DebtPayoffPayload {
    debts: Vec<DebtPayload>,
    strategy: Option<ApiStrategy>,
    #[serde(alias = "extraPayment")]
    extra_monthly_payment: Option<FormNumber>,
}

#[derive(Parser, Debug)]
#[command(
    name = "ukcalc",
    about = "UK take-home pay, net-to-gross and debt payoff calculators"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
    /// Deductions and take-home pay for a gross annual salary
    TakeHome {
        #[arg(long, help = "Gross annual salary in pounds")]
        gross: f64,
        #[command(flatten)]
        salary: SalaryArgs,
    },
    /// Gross annual salary needed for a target take-home
    GrossFromNet {
        #[arg(long, help = "Target annual take-home pay in pounds")]
        net: f64,
        #[command(flatten)]
        salary: SalaryArgs,
    },
    /// Month-by-month debt payoff plan
    Debts(DebtArgs),
}

#[derive(Args, Debug, Clone)]
struct SalaryArgs {
    #[arg(long, default_value = "2025-26", help = "Tax year, e.g. 2025-26")]
    tax_year: String,
    #[arg(
        long,
        help = "Apply location, tax code, pension, student loan and investment relief settings"
    )]
    advanced: bool,
    #[arg(long, value_enum, default_value_t = CliLocation::RestOfUk)]
    location: CliLocation,
    #[arg(long, help = "Tax code such as 1257L; replaces the standard personal allowance")]
    tax_code: Option<String>,
    #[arg(long, default_value_t = 0.0, help = "Allowances added to the personal allowance")]
    other_allowances: f64,
    #[arg(long, value_enum, default_value_t = CliPensionMode::Percent)]
    pension_mode: CliPensionMode,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Pension contribution: percent of gross, or pounds per month with --pension-mode fixed-monthly"
    )]
    pension_value: f64,
    #[arg(long, value_enum, default_value_t = CliStudentLoanPlan::None)]
    student_loan_plan: CliStudentLoanPlan,
    #[arg(long, default_value_t = 0.0, help = "SEIS investment (50% income tax relief)")]
    seis_investment: f64,
    #[arg(long, default_value_t = 0.0, help = "EIS investment (30% income tax relief)")]
    eis_investment: f64,
}

#[derive(Args, Debug, Clone)]
struct DebtArgs {
    #[arg(
        long = "debt",
        value_parser = parse_debt_arg,
        help = "Debt as name:balance:apr:minimum-payment; repeat for each debt"
    )]
    debts: Vec<Debt>,
    #[arg(long, value_enum, default_value_t = CliStrategy::Avalanche)]
    strategy: CliStrategy,
    #[arg(long, default_value_t = 0.0, help = "Monthly budget on top of minimum payments")]
    extra_monthly_payment: f64,
}

#[derive(Debug)]
struct SalaryRequest {
    year: &'static TaxYearConfig,
    options: DeductionOptions,
}

#[derive(Debug)]
struct DebtRequest {
    debts: Vec<Debt>,
    strategy: PayoffStrategy,
    extra_monthly_payment: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TakeHomeResponse {
    tax_year: &'static str,
    advanced_options: bool,
    marginal_rate: f64,
    periods: PeriodBreakdown,
    result: DeductionResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrossFromNetResponse {
    tax_year: &'static str,
    target_net_annual: f64,
    gross_annual: f64,
    converged: bool,
    iterations: usize,
    residual: f64,
    result: DeductionResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DebtPayoffResponse {
    strategy: ApiStrategy,
    extra_monthly_payment: f64,
    debts_considered: usize,
    #[serde(flatten)]
    result: PayoffResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxYearsResponse {
    default_tax_year: &'static str,
    tax_years: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn parse_debt_arg(raw: &str) -> Result<Debt, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [name, balance, apr, minimum_payment] = parts.as_slice() else {
        return Err(format!(
            "expected name:balance:apr:minimum-payment, got '{raw}'"
        ));
    };
    Ok(Debt {
        name: name.trim().to_string(),
        balance: parse_amount(balance),
        apr: parse_amount(apr),
        minimum_payment: parse_amount(minimum_payment),
    })
}

fn build_salary_request(args: &SalaryArgs) -> Result<SalaryRequest, String> {
    let year = tax_year(&args.tax_year).map_err(|e| format!("--tax-year: {e}"))?;

    if args.pension_mode == CliPensionMode::Percent && args.pension_value > 100.0 {
        return Err("--pension-value must be between 0 and 100 in percent mode".to_string());
    }

    let tax_code_allowance = match args.tax_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => {
            let allowance = parse_tax_code(code);
            if allowance.is_none() {
                warn!("ignoring unrecognised tax code '{code}'");
            }
            allowance
        }
        _ => None,
    };

    Ok(SalaryRequest {
        year,
        options: DeductionOptions {
            location: args.location.into(),
            tax_code_allowance,
            other_allowances: coerce_amount(args.other_allowances),
            pension: PensionContribution {
                mode: args.pension_mode.into(),
                value: coerce_amount(args.pension_value),
            },
            student_loan_plan: args.student_loan_plan.into(),
            seis_investment: coerce_amount(args.seis_investment),
            eis_investment: coerce_amount(args.eis_investment),
            use_advanced_options: args.advanced,
        },
    })
}

fn build_debt_request(args: DebtArgs) -> Result<DebtRequest, String> {
    if args.debts.len() > MAX_DEBTS {
        return Err(format!("--debt may be given at most {MAX_DEBTS} times"));
    }

    let debts = args
        .debts
        .into_iter()
        .filter(|debt| coerce_amount(debt.balance) > 0.0)
        .collect();

    Ok(DebtRequest {
        debts,
        strategy: args.strategy.into(),
        extra_monthly_payment: coerce_amount(args.extra_monthly_payment),
    })
}

fn take_home_response(gross: f64, request: &SalaryRequest) -> TakeHomeResponse {
    let result = compute_deductions(gross, &request.options, request.year);
    TakeHomeResponse {
        tax_year: request.year.key,
        advanced_options: request.options.use_advanced_options,
        marginal_rate: marginal_rate(gross, &request.options, request.year),
        periods: result.periods(),
        result,
    }
}

fn gross_from_net_response(net: f64, request: &SalaryRequest) -> GrossFromNetResponse {
    let solve = solve_gross_from_net_detailed(net, &request.options, request.year);
    GrossFromNetResponse {
        tax_year: request.year.key,
        target_net_annual: solve.target_net_annual,
        gross_annual: solve.gross_annual,
        converged: solve.converged,
        iterations: solve.iterations.len(),
        residual: solve.residual,
        result: compute_deductions(solve.gross_annual, &request.options, request.year),
    }
}

fn debt_payoff_response(request: &DebtRequest) -> DebtPayoffResponse {
    DebtPayoffResponse {
        strategy: request.strategy.into(),
        extra_monthly_payment: request.extra_monthly_payment,
        debts_considered: request.debts.len(),
        result: simulate_payoff(
            &request.debts,
            request.strategy,
            request.extra_monthly_payment,
        ),
    }
}

pub async fn run(cli: Cli) -> Result<(), String> {
    let json = match cli.command {
        Command::Serve { port } => {
            return run_http_server(port)
                .await
                .map_err(|e| format!("server error: {e}"));
        }
        Command::TakeHome { gross, salary } => {
            let request = build_salary_request(&salary)?;
            to_pretty_json(&take_home_response(gross, &request))?
        }
        Command::GrossFromNet { net, salary } => {
            let request = build_salary_request(&salary)?;
            to_pretty_json(&gross_from_net_response(net, &request))?
        }
        Command::Debts(args) => {
            let request = build_debt_request(args)?;
            to_pretty_json(&debt_payoff_response(&request))?
        }
    };
    println!("{json}");
    Ok(())
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode response: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("ukcalc HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/tax-years");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/api/tax-years", get(tax_years_handler))
        .route(
            "/api/take-home",
            get(take_home_get_handler).post(take_home_post_handler),
        )
        .route(
            "/api/gross-from-net",
            get(gross_from_net_get_handler).post(gross_from_net_post_handler),
        )
        .route("/api/debt-payoff", post(debt_payoff_handler))
        .fallback(not_found_handler)
}

async fn tax_years_handler() -> Response {
    json_response(
        StatusCode::OK,
        TaxYearsResponse {
            default_tax_year: TaxYearConfig::current().key,
            tax_years: supported_tax_years(),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn take_home_get_handler(Query(payload): Query<SalaryPayload>) -> Response {
    take_home_handler_impl(payload)
}

async fn take_home_post_handler(Json(payload): Json<SalaryPayload>) -> Response {
    take_home_handler_impl(payload)
}

fn take_home_handler_impl(payload: SalaryPayload) -> Response {
    let gross = payload.gross_annual.as_ref().map(FormNumber::amount);
    let request = match build_salary_request(&salary_args_from_payload(payload)) {
        Ok(request) => request,
        Err(msg) => return rejected(&msg),
    };
    let Some(gross) = gross else {
        return rejected("grossAnnual is required");
    };
    json_response(StatusCode::OK, take_home_response(gross, &request))
}

async fn gross_from_net_get_handler(Query(payload): Query<SalaryPayload>) -> Response {
    gross_from_net_handler_impl(payload)
}

async fn gross_from_net_post_handler(Json(payload): Json<SalaryPayload>) -> Response {
    gross_from_net_handler_impl(payload)
}

fn gross_from_net_handler_impl(payload: SalaryPayload) -> Response {
    let net = payload.target_net_annual.as_ref().map(FormNumber::amount);
    let request = match build_salary_request(&salary_args_from_payload(payload)) {
        Ok(request) => request,
        Err(msg) => return rejected(&msg),
    };
    let Some(net) = net else {
        return rejected("targetNetAnnual is required");
    };
    json_response(StatusCode::OK, gross_from_net_response(net, &request))
}

async fn debt_payoff_handler(Json(payload): Json<DebtPayoffPayload>) -> Response {
    match build_debt_request(debt_args_from_payload(payload)) {
        Ok(request) => json_response(StatusCode::OK, debt_payoff_response(&request)),
        Err(msg) => rejected(&msg),
    }
}

fn rejected(msg: &str) -> Response {
    warn!("rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

fn default_salary_args() -> SalaryArgs {
    SalaryArgs {
        tax_year: TaxYearConfig::current().key.to_string(),
        advanced: false,
        location: CliLocation::RestOfUk,
        tax_code: None,
        other_allowances: 0.0,
        pension_mode: CliPensionMode::Percent,
        pension_value: 0.0,
        student_loan_plan: CliStudentLoanPlan::None,
        seis_investment: 0.0,
        eis_investment: 0.0,
    }
}

fn salary_args_from_payload(payload: SalaryPayload) -> SalaryArgs {
    let mut args = default_salary_args();

    if let Some(v) = payload.tax_year {
        args.tax_year = v;
    }
    if let Some(v) = payload.use_advanced_options {
        args.advanced = v;
    }
    if let Some(v) = payload.location {
        args.location = v.into();
    }
    if let Some(v) = payload.tax_code {
        args.tax_code = Some(v);
    }
    if let Some(v) = payload.other_allowances {
        args.other_allowances = v.amount();
    }
    if let Some(v) = payload.pension_mode {
        args.pension_mode = v.into();
    }
    if let Some(v) = payload.pension_value {
        args.pension_value = v.amount();
    }
    if let Some(v) = payload.student_loan_plan {
        args.student_loan_plan = v.into();
    }
    if let Some(v) = payload.seis_investment {
        args.seis_investment = v.amount();
    }
    if let Some(v) = payload.eis_investment {
        args.eis_investment = v.amount();
    }

    args
}

fn debt_args_from_payload(payload: DebtPayoffPayload) -> DebtArgs {
    let amount = |field: &Option<FormNumber>| field.as_ref().map_or(0.0, FormNumber::amount);
    let debts = payload
        .debts
        .iter()
        .enumerate()
        .map(|(index, debt)| Debt {
            name: debt
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map_or_else(|| format!("Debt {}", index + 1), str::to_string),
            balance: amount(&debt.balance),
            apr: amount(&debt.apr),
            minimum_payment: amount(&debt.minimum_payment),
        })
        .collect();

    DebtArgs {
        debts,
        strategy: payload.strategy.map_or(CliStrategy::Avalanche, Into::into),
        extra_monthly_payment: amount(&payload.extra_monthly_payment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn salary_payload_from_json(json: &str) -> SalaryPayload {
        serde_json::from_str(json).expect("json should parse")
    }

    #[test]
    fn build_salary_request_rejects_unknown_tax_year() {
        let mut args = default_salary_args();
        args.tax_year = "2019-20".to_string();

        let err = build_salary_request(&args).expect_err("must reject unknown year");
        assert!(err.contains("--tax-year"));
        assert!(err.contains("2019-20"));
    }

    #[test]
    fn build_salary_request_rejects_pension_percent_above_100() {
        let mut args = default_salary_args();
        args.pension_value = 120.0;

        let err = build_salary_request(&args).expect_err("must reject >100%");
        assert!(err.contains("--pension-value"));

        args.pension_mode = CliPensionMode::FixedMonthly;
        assert!(build_salary_request(&args).is_ok());
    }

    #[test]
    fn build_salary_request_ignores_unrecognised_tax_code() {
        let mut args = default_salary_args();
        args.tax_code = Some("BR".to_string());
        let request = build_salary_request(&args).expect("valid request");
        assert_eq!(request.options.tax_code_allowance, None);

        args.tax_code = Some("1100L".to_string());
        let request = build_salary_request(&args).expect("valid request");
        assert_eq!(request.options.tax_code_allowance, Some(11_000.0));
    }

    #[test]
    fn salary_payload_parses_web_keys_and_formatted_numbers() {
        let payload = salary_payload_from_json(
            r#"{
              "grossAnnual": "£45,000",
              "taxYear": "2024-25",
              "useAdvancedOptions": true,
              "location": "scotland",
              "taxCode": "1257L",
              "otherAllowances": 250,
              "pensionMode": "fixed-monthly",
              "pensionValue": "150",
              "studentLoanPlan": "plan2",
              "seisInvestment": "not a number",
              "eisInvestment": -100
            }"#,
        );
        let gross = payload.gross_annual.as_ref().map(FormNumber::amount);
        let request = build_salary_request(&salary_args_from_payload(payload)).expect("valid");

        assert_eq!(gross, Some(45_000.0));
        assert_eq!(request.year.key, "2024-25");
        let options = request.options;
        assert!(options.use_advanced_options);
        assert_eq!(options.location, Location::Scotland);
        assert_eq!(options.tax_code_allowance, Some(12_570.0));
        assert_approx(options.other_allowances, 250.0);
        assert_eq!(options.pension.mode, PensionMode::FixedMonthly);
        assert_approx(options.pension.value, 150.0);
        assert_eq!(options.student_loan_plan, StudentLoanPlan::Plan2);
        assert_approx(options.seis_investment, 0.0);
        assert_approx(options.eis_investment, 0.0);
    }

    #[test]
    fn salary_payload_parses_query_string() {
        let uri: Uri = "http://localhost/api/take-home?grossAnnual=52000&useAdvancedOptions=true&studentLoanPlan=postgraduate"
            .parse()
            .expect("valid uri");
        let Query(payload) = Query::<SalaryPayload>::try_from_uri(&uri).expect("query parses");
        let gross = payload.gross_annual.as_ref().map(FormNumber::amount);
        let args = salary_args_from_payload(payload);

        assert_eq!(gross, Some(52_000.0));
        assert!(args.advanced);
        assert_eq!(args.student_loan_plan, CliStudentLoanPlan::Postgraduate);
    }

    #[test]
    fn take_home_response_serialization_contains_expected_fields() {
        let request = build_salary_request(&default_salary_args()).expect("valid");
        let response = take_home_response(60_000.0, &request);
        assert_approx(response.result.take_home_annual, 45_357.4);
        assert_approx(response.marginal_rate, 0.42);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"taxYear\":\"2025-26\""));
        assert!(json.contains("\"takeHomeAnnual\""));
        assert!(json.contains("\"incomeTax\""));
        assert!(json.contains("\"bandName\":\"Basic rate\""));
        assert!(json.contains("\"nationalInsurance\""));
        assert!(json.contains("\"monthly\""));
    }

    #[test]
    fn gross_from_net_response_reports_convergence() {
        let request = build_salary_request(&default_salary_args()).expect("valid");
        let response = gross_from_net_response(45_357.4, &request);

        assert!(response.converged);
        assert!((response.gross_annual - 60_000.0).abs() < 0.05);
        assert!(response.iterations >= 1);
        assert!((response.result.take_home_annual - 45_357.4).abs() < 0.01);
    }

    #[test]
    fn debt_payload_names_unnamed_debts_and_drops_cleared_ones() {
        let payload: DebtPayoffPayload = serde_json::from_str(
            r#"{
              "strategy": "snowball",
              "extraPayment": "100",
              "debts": [
                {"name": "Card", "balance": "1,200", "apr": 12, "minimumPayment": 110},
                {"balance": 500, "interestRate": "5", "minPayment": 25},
                {"name": "Closed", "balance": 0, "apr": 20, "minimumPayment": 30}
              ]
            }"#,
        )
        .expect("json should parse");

        let request = build_debt_request(debt_args_from_payload(payload)).expect("valid");
        assert_eq!(request.strategy, PayoffStrategy::Snowball);
        assert_approx(request.extra_monthly_payment, 100.0);
        let names: Vec<&str> = request.debts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Card", "Debt 2"]);
        assert_approx(request.debts[0].balance, 1_200.0);
        assert_approx(request.debts[1].apr, 5.0);
    }

    #[test]
    fn debt_request_rejects_too_many_debts() {
        let args = DebtArgs {
            debts: (0..=MAX_DEBTS)
                .map(|i| Debt {
                    name: format!("D{i}"),
                    balance: 100.0,
                    apr: 10.0,
                    minimum_payment: 10.0,
                })
                .collect(),
            strategy: CliStrategy::Avalanche,
            extra_monthly_payment: 0.0,
        };
        let err = build_debt_request(args).expect_err("must reject");
        assert!(err.contains("--debt"));
    }

    #[test]
    fn debt_payoff_response_flattens_result_fields() {
        let request = DebtRequest {
            debts: vec![parse_debt_arg("Card:1200:12:110").expect("valid debt")],
            strategy: PayoffStrategy::Avalanche,
            extra_monthly_payment: 0.0,
        };
        let response = debt_payoff_response(&request);
        assert_eq!(response.result.total_months, 12);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"strategy\":\"avalanche\""));
        assert!(json.contains("\"totalMonths\":12"));
        assert!(json.contains("\"payoffOrder\""));
        assert!(json.contains("\"debtName\":\"Card\""));
        assert!(json.contains("\"interestSavings\""));
    }

    #[test]
    fn empty_debt_list_returns_zeroed_plan() {
        let request = build_debt_request(debt_args_from_payload(DebtPayoffPayload::default()))
            .expect("valid");
        let response = debt_payoff_response(&request);
        assert_eq!(response.debts_considered, 0);
        assert_eq!(response.result, PayoffResult::default());
    }

    #[test]
    fn parse_debt_arg_requires_four_fields() {
        let debt = parse_debt_arg("Car loan:6,400:8.9:210").expect("valid debt");
        assert_eq!(debt.name, "Car loan");
        assert_approx(debt.balance, 6_400.0);
        assert_approx(debt.apr, 8.9);
        assert_approx(debt.minimum_payment, 210.0);

        assert!(parse_debt_arg("Card:1200:12").is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "ukcalc",
            "take-home",
            "--gross",
            "50000",
            "--advanced",
            "--location",
            "scotland",
            "--pension-mode",
            "fixed-monthly",
            "--pension-value",
            "200",
        ])
        .expect("cli should parse");
        let Command::TakeHome { gross, salary } = cli.command else {
            panic!("expected take-home command");
        };
        assert_approx(gross, 50_000.0);
        assert!(salary.advanced);
        assert_eq!(salary.location, CliLocation::Scotland);
        assert_eq!(salary.pension_mode, CliPensionMode::FixedMonthly);
        assert_eq!(salary.tax_year, "2025-26");

        let cli = Cli::try_parse_from([
            "ukcalc",
            "debts",
            "--debt",
            "A:5000:25:150",
            "--debt",
            "B:500:5:10",
            "--strategy",
            "snowball",
            "--extra-monthly-payment",
            "200",
        ])
        .expect("cli should parse");
        let Command::Debts(args) = cli.command else {
            panic!("expected debts command");
        };
        assert_eq!(args.debts.len(), 2);
        assert_eq!(args.strategy, CliStrategy::Snowball);

        let cli = Cli::try_parse_from(["ukcalc", "serve"]).expect("cli should parse");
        assert!(matches!(cli.command, Command::Serve { port: 8080 }));
    }
}
