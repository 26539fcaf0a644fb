use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::{
    ChildSpec, Classification, Decomposer, Decomposition, Error, Grid, GridBuilder, GridMeasure,
    GridRequest, Metadata, ProgramComparison, ProgramDelta, ScenarioParams, Verdict, fixtures_json,
    income_axis, validate_state,
};
use crate::engine::{CalculationEngine, StylizedEngine};

const DEFAULT_YEAR: u16 = 2026;
const MAX_CHILDREN: usize = 10;
const MAX_GRID_STEPS: usize = 41;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMeasure {
    NetIncome,
    Benefits,
    RefundableCredits,
    TaxBeforeCredits,
}

impl From<CliMeasure> for GridMeasure {
    fn from(value: CliMeasure) -> Self {
        match value {
            CliMeasure::NetIncome => GridMeasure::NetIncome,
            CliMeasure::Benefits => GridMeasure::Benefits,
            CliMeasure::RefundableCredits => GridMeasure::RefundableCredits,
            CliMeasure::TaxBeforeCredits => GridMeasure::TaxBeforeCredits,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliClassification {
    Buckets,
    Binary,
    Raw,
}

impl From<CliClassification> for Classification {
    fn from(value: CliClassification) -> Self {
        match value {
            CliClassification::Buckets => Classification::Buckets,
            CliClassification::Binary => Classification::Binary,
            CliClassification::Raw => Classification::Raw,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiMeasure {
    #[serde(alias = "netIncome", alias = "net_income")]
    NetIncome,
    Benefits,
    #[serde(alias = "refundableCredits", alias = "refundable_credits", alias = "credits")]
    RefundableCredits,
    #[serde(alias = "taxBeforeCredits", alias = "tax_before_credits", alias = "taxes")]
    TaxBeforeCredits,
}

impl From<ApiMeasure> for CliMeasure {
    fn from(value: ApiMeasure) -> Self {
        match value {
            ApiMeasure::NetIncome => CliMeasure::NetIncome,
            ApiMeasure::Benefits => CliMeasure::Benefits,
            ApiMeasure::RefundableCredits => CliMeasure::RefundableCredits,
            ApiMeasure::TaxBeforeCredits => CliMeasure::TaxBeforeCredits,
        }
    }
}

impl From<GridMeasure> for ApiMeasure {
    fn from(value: GridMeasure) -> Self {
        match value {
            GridMeasure::NetIncome => ApiMeasure::NetIncome,
            GridMeasure::Benefits => ApiMeasure::Benefits,
            GridMeasure::RefundableCredits => ApiMeasure::RefundableCredits,
            GridMeasure::TaxBeforeCredits => ApiMeasure::TaxBeforeCredits,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiClassification {
    #[serde(alias = "bucket", alias = "bucketed")]
    Buckets,
    Binary,
    Raw,
}

impl From<ApiClassification> for CliClassification {
    fn from(value: ApiClassification) -> Self {
        match value {
            ApiClassification::Buckets => CliClassification::Buckets,
            ApiClassification::Binary => CliClassification::Binary,
            ApiClassification::Raw => CliClassification::Raw,
        }
    }
}

impl From<Classification> for ApiClassification {
    fn from(value: Classification) -> Self {
        match value {
            Classification::Buckets => ApiClassification::Buckets,
            Classification::Binary => ApiClassification::Binary,
            Classification::Raw => ApiClassification::Raw,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiVerdict {
    Bonus,
    Penalty,
    Neutral,
}

impl From<Verdict> for ApiVerdict {
    fn from(value: Verdict) -> Self {
        match value {
            Verdict::Bonus => ApiVerdict::Bonus,
            Verdict::Penalty => ApiVerdict::Penalty,
            Verdict::Neutral => ApiVerdict::Neutral,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    state: Option<String>,
    head_income: Option<f64>,
    spouse_income: Option<f64>,
    head_age: Option<u32>,
    spouse_age: Option<u32>,
    children: Option<usize>,
    child_ages: Option<AgeList>,
    year: Option<u16>,
}

// Child ages arrive as a JSON array in POST bodies and as a
// comma-separated string in query strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AgeList {
    Ages(Vec<u32>),
    Csv(String),
}

impl AgeList {
    fn into_ages(self) -> Result<Vec<u32>, String> {
        match self {
            AgeList::Ages(ages) => Ok(ages),
            AgeList::Csv(text) => text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse().map_err(|_| {
                        format!(
                            "--child-ages must be a comma-separated list of ages, got {part:?}"
                        )
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GridPayload {
    state: Option<String>,
    max_income: Option<f64>,
    steps: Option<usize>,
    children: Option<usize>,
    measure: Option<ApiMeasure>,
    classification: Option<ApiClassification>,
    year: Option<u16>,
    timeout_ms: Option<u64>,
    sequential: Option<bool>,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[arg(long, default_value = "CA", help = "Two-letter state code, e.g. CA or NY")]
    state: String,
    #[arg(long, default_value_t = 45_000.0, help = "Head's annual employment income")]
    head_income: f64,
    #[arg(long, default_value_t = 45_000.0, help = "Spouse's annual employment income")]
    spouse_income: f64,
    #[arg(long, help = "Head's age; defaults to 40")]
    head_age: Option<u32>,
    #[arg(long, help = "Spouse's age; defaults to 40")]
    spouse_age: Option<u32>,
    #[arg(
        long,
        default_value_t = 0,
        help = "Number of children at the default age of 10"
    )]
    children: usize,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated child ages; overrides --children"
    )]
    child_ages: Vec<u32>,
    #[arg(long, default_value_t = DEFAULT_YEAR)]
    year: u16,
}

#[derive(Args, Debug)]
pub struct GridArgs {
    #[arg(long, default_value = "CA", help = "Two-letter state code, e.g. CA or NY")]
    state: String,
    #[arg(long, default_value_t = 80_000.0, help = "Top of the income axis")]
    max_income: f64,
    #[arg(
        long,
        default_value_t = 9,
        help = "Number of points on each income axis"
    )]
    steps: usize,
    #[arg(
        long,
        default_value_t = 0,
        help = "Number of children at the default age of 10"
    )]
    children: usize,
    #[arg(long, value_enum, default_value_t = CliMeasure::NetIncome)]
    measure: CliMeasure,
    #[arg(
        long,
        value_enum,
        default_value_t = CliClassification::Buckets,
        help = "How cell deltas are reported: bucket scores, a binary flag, or raw dollars"
    )]
    classification: CliClassification,
    #[arg(long, default_value_t = DEFAULT_YEAR)]
    year: u16,
    #[arg(long, help = "Give up if the grid takes longer than this many milliseconds")]
    timeout_ms: Option<u64>,
    #[arg(long, help = "Compute cells one at a time instead of in parallel")]
    sequential: bool,
}

#[derive(Args, Debug)]
pub struct FixturesArgs {
    #[arg(long, default_value_t = DEFAULT_YEAR)]
    year: u16,
    #[arg(long, help = "Write the JSON to this path instead of stdout")]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    state: String,
    year: u16,
    verdict: ApiVerdict,
    summary: String,
    net_income_married: f64,
    net_income_head_only: f64,
    net_income_spouse_only: f64,
    net_income_separate: f64,
    bonus: f64,
    bonus_percent: Option<f64>,
    programs: Vec<ProgramDelta>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GridResponse {
    state: String,
    year: u16,
    measure: ApiMeasure,
    classification: ApiClassification,
    head_axis: Vec<f64>,
    spouse_axis: Vec<f64>,
    axis_labels: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
    unavailable: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_compare_args() -> CompareArgs {
    CompareArgs {
        state: "CA".to_string(),
        head_income: 45_000.0,
        spouse_income: 45_000.0,
        head_age: None,
        spouse_age: None,
        children: 0,
        child_ages: Vec::new(),
        year: DEFAULT_YEAR,
    }
}

fn default_grid_args() -> GridArgs {
    GridArgs {
        state: "CA".to_string(),
        max_income: 80_000.0,
        steps: 9,
        children: 0,
        measure: CliMeasure::NetIncome,
        classification: CliClassification::Buckets,
        year: DEFAULT_YEAR,
        timeout_ms: None,
        sequential: false,
    }
}

fn normalize_state(raw: &str) -> Result<String, String> {
    let state = raw.trim().to_ascii_uppercase();
    if validate_state(&state).is_err() {
        return Err(format!(
            "--state must be a two-letter state code such as CA, got {raw:?}"
        ));
    }
    Ok(state)
}

fn validate_year(year: u16) -> Result<(), String> {
    if (2000..=2100).contains(&year) {
        Ok(())
    } else {
        Err("--year must be between 2000 and 2100".to_string())
    }
}

fn child_specs(children: usize, child_ages: &[u32]) -> Result<Vec<ChildSpec>, String> {
    if !child_ages.is_empty() {
        if child_ages.len() > MAX_CHILDREN {
            return Err(format!("--child-ages accepts at most {MAX_CHILDREN} entries"));
        }
        return Ok(child_ages.iter().map(|&age| ChildSpec::aged(age)).collect());
    }
    if children > MAX_CHILDREN {
        return Err(format!("--children must be between 0 and {MAX_CHILDREN}"));
    }
    Ok(vec![ChildSpec::default(); children])
}

fn scenario_from_compare_args(args: &CompareArgs) -> Result<ScenarioParams, String> {
    let state = normalize_state(&args.state)?;
    if !args.head_income.is_finite() || args.head_income < 0.0 {
        return Err("--head-income must be >= 0".to_string());
    }
    if !args.spouse_income.is_finite() || args.spouse_income < 0.0 {
        return Err("--spouse-income must be >= 0".to_string());
    }
    validate_year(args.year)?;

    let mut params = ScenarioParams::new(state, args.head_income);
    params.spouse_income = Some(args.spouse_income);
    params.head_age = args.head_age;
    params.spouse_age = args.spouse_age;
    params.children = child_specs(args.children, &args.child_ages)?;
    Ok(params)
}

fn grid_request_from_args(args: &GridArgs) -> Result<GridRequest, String> {
    let state = normalize_state(&args.state)?;
    if !args.max_income.is_finite() || args.max_income < 0.0 {
        return Err("--max-income must be >= 0".to_string());
    }
    if args.steps == 0 || args.steps > MAX_GRID_STEPS {
        return Err(format!("--steps must be between 1 and {MAX_GRID_STEPS}"));
    }
    if args.children > MAX_CHILDREN {
        return Err(format!("--children must be between 0 and {MAX_CHILDREN}"));
    }
    validate_year(args.year)?;
    if args.timeout_ms == Some(0) {
        return Err("--timeout-ms must be > 0".to_string());
    }

    let mut request = GridRequest::new(state, income_axis(args.max_income, args.steps));
    request.children = args.children;
    request.measure = GridMeasure::from(args.measure);
    request.classification = Classification::from(args.classification);
    request.parallel = !args.sequential;
    request.timeout = args.timeout_ms.map(Duration::from_millis);
    Ok(request)
}

fn compare_request_from_payload(payload: ComparePayload) -> Result<(ScenarioParams, u16), String> {
    let mut args = default_compare_args();

    if let Some(v) = payload.state {
        args.state = v;
    }
    if let Some(v) = payload.head_income {
        args.head_income = v;
    }
    if let Some(v) = payload.spouse_income {
        args.spouse_income = v;
    }
    if let Some(v) = payload.head_age {
        args.head_age = Some(v);
    }
    if let Some(v) = payload.spouse_age {
        args.spouse_age = Some(v);
    }
    if let Some(v) = payload.children {
        args.children = v;
    }
    if let Some(v) = payload.child_ages {
        args.child_ages = v.into_ages()?;
    }
    if let Some(v) = payload.year {
        args.year = v;
    }

    let params = scenario_from_compare_args(&args)?;
    Ok((params, args.year))
}

fn grid_request_from_payload(payload: GridPayload) -> Result<(GridRequest, u16), String> {
    let mut args = default_grid_args();

    if let Some(v) = payload.state {
        args.state = v;
    }
    if let Some(v) = payload.max_income {
        args.max_income = v;
    }
    if let Some(v) = payload.steps {
        args.steps = v;
    }
    if let Some(v) = payload.children {
        args.children = v;
    }
    if let Some(v) = payload.measure {
        args.measure = v.into();
    }
    if let Some(v) = payload.classification {
        args.classification = v.into();
    }
    if let Some(v) = payload.year {
        args.year = v;
    }
    if let Some(v) = payload.timeout_ms {
        args.timeout_ms = Some(v);
    }
    if let Some(v) = payload.sequential {
        args.sequential = v;
    }

    let request = grid_request_from_args(&args)?;
    Ok((request, args.year))
}

#[derive(Clone)]
struct AppState {
    engine: Arc<dyn CalculationEngine>,
}

impl AppState {
    fn new(engine: Arc<dyn CalculationEngine>) -> Self {
        Self { engine }
    }

    // The evaluation year rides on each request, so decomposers are built per call.
    fn decomposer(&self, year: u16) -> Decomposer {
        Decomposer::new(self.engine.clone(), year)
    }
}

fn default_engine() -> Arc<dyn CalculationEngine> {
    Arc::new(StylizedEngine::new())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let state = AppState::new(default_engine());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "marriage calculator API listening");

    axum::serve(listener, app).await
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route("/api/grid", get(grid_get_handler).post(grid_post_handler))
        .route("/api/metadata", get(metadata_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn metadata_handler() -> Response {
    json_response(StatusCode::OK, Metadata::builtin())
}

async fn compare_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<ComparePayload>,
) -> Response {
    compare_handler_impl(state, payload)
}

async fn compare_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<ComparePayload>,
) -> Response {
    compare_handler_impl(state, payload)
}

fn compare_handler_impl(state: AppState, payload: ComparePayload) -> Response {
    let (params, year) = match compare_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match compare_response(&state.decomposer(year), &params) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(error) => core_error_response(&error),
    }
}

async fn grid_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<GridPayload>,
) -> Response {
    grid_handler_impl(state, payload)
}

async fn grid_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<GridPayload>,
) -> Response {
    grid_handler_impl(state, payload)
}

fn grid_handler_impl(state: AppState, payload: GridPayload) -> Response {
    let (request, year) = match grid_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let builder = GridBuilder::new(state.decomposer(year));
    match builder.build(&request) {
        Ok(grid) => json_response(StatusCode::OK, build_grid_response(&request, year, &grid)),
        Err(error) => core_error_response(&error),
    }
}

fn compare_response(
    decomposer: &Decomposer,
    params: &ScenarioParams,
) -> Result<CompareResponse, Error> {
    let decomposition = decomposer.decompose(params)?;
    let comparison =
        decomposer.compare_programs(params, &Metadata::builtin().comparison_descriptors())?;
    Ok(build_compare_response(
        params,
        decomposer.year(),
        &decomposition,
        &comparison,
    ))
}

fn build_compare_response(
    params: &ScenarioParams,
    year: u16,
    decomposition: &Decomposition,
    comparison: &ProgramComparison,
) -> CompareResponse {
    CompareResponse {
        state: params.state.clone(),
        year,
        verdict: decomposition.verdict().into(),
        summary: summary_sentence(&params.state, decomposition),
        net_income_married: decomposition.net_income_married,
        net_income_head_only: decomposition.net_income_head_only,
        net_income_spouse_only: decomposition.net_income_spouse_only,
        net_income_separate: decomposition.net_income_separate,
        bonus: decomposition.bonus,
        bonus_percent: decomposition.bonus_percent.map(|p| p * 100.0),
        programs: comparison.deltas(),
    }
}

fn build_grid_response(request: &GridRequest, year: u16, grid: &Grid) -> GridResponse {
    GridResponse {
        state: request.state.clone(),
        year,
        measure: request.measure.into(),
        classification: request.classification.into(),
        axis_labels: grid
            .head_axis
            .iter()
            .map(|&value| format_short_dollar(value))
            .collect(),
        head_axis: grid.head_axis.clone(),
        spouse_axis: grid.spouse_axis.clone(),
        cells: grid.cells.clone(),
        unavailable: grid.unavailable(),
    }
}

fn summary_sentence(state: &str, decomposition: &Decomposition) -> String {
    let amount = format_currency(decomposition.bonus.abs());
    let share = decomposition
        .bonus_percent
        .map(|fraction| format_percent(fraction.abs()));
    match decomposition.verdict() {
        Verdict::Bonus => match share {
            Some(share) => format!(
                "Marriage increases this couple's net income in {state} by {amount} per year ({share})."
            ),
            None => format!(
                "Marriage increases this couple's net income in {state} by {amount} per year."
            ),
        },
        Verdict::Penalty => match share {
            Some(share) => format!(
                "Marriage reduces this couple's net income in {state} by {amount} per year ({share})."
            ),
            None => format!(
                "Marriage reduces this couple's net income in {state} by {amount} per year."
            ),
        },
        Verdict::Neutral => {
            format!("Marriage does not change this couple's net income in {state}.")
        }
    }
}

fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let mut digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::new();
    while digits.len() > 3 {
        let split = digits.len() - 3;
        grouped = format!(",{}{}", &digits[split..], grouped);
        digits.truncate(split);
    }
    if rounded < 0.0 {
        format!("-${digits}{grouped}")
    } else {
        format!("${digits}{grouped}")
    }
}

fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn format_short_dollar(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let value = value.abs();
    if value >= 1_000.0 {
        let thousands = value / 1_000.0;
        if (thousands - thousands.round()).abs() < 1e-9 {
            format!("{sign}${thousands:.0}k")
        } else {
            format!("{sign}${thousands:.1}k")
        }
    } else {
        format!("{sign}${value:.0}")
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Engine { .. } => StatusCode::BAD_GATEWAY,
        Error::GridTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn core_error_response(error: &Error) -> Response {
    if !error.is_invalid_input() {
        error!(%error, "request failed");
    }
    error_response(status_for(error), &error.to_string())
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

pub fn run_compare(args: &CompareArgs) -> Result<(), String> {
    let params = scenario_from_compare_args(args)?;
    let decomposer = Decomposer::new(default_engine(), args.year);
    let response = compare_response(&decomposer, &params).map_err(|e| e.to_string())?;

    println!("{}", response.summary);
    println!();
    println!("  married:      {:>12}", format_currency(response.net_income_married));
    println!("  head alone:   {:>12}", format_currency(response.net_income_head_only));
    println!("  spouse alone: {:>12}", format_currency(response.net_income_spouse_only));
    println!("  separate:     {:>12}", format_currency(response.net_income_separate));
    println!("  bonus:        {:>12}", format_currency(response.bonus));
    println!();
    println!(
        "  {:<46} {:>12} {:>12} {:>12}",
        "program", "married", "separate", "delta"
    );
    for row in &response.programs {
        println!(
            "  {:<46} {:>12} {:>12} {:>12}",
            row.variable,
            format_currency(row.married),
            format_currency(row.separate),
            format_currency(row.delta)
        );
    }
    Ok(())
}

pub fn run_grid(args: &GridArgs) -> Result<(), String> {
    let request = grid_request_from_args(args)?;
    let builder = GridBuilder::new(Decomposer::new(default_engine(), args.year));
    let grid = builder.build(&request).map_err(|e| e.to_string())?;

    let mut header = format!("{:>10}", "");
    for &spouse in &grid.spouse_axis {
        header.push_str(&format!(" {:>9}", format_short_dollar(spouse)));
    }
    println!("{header}");
    for (i, row) in grid.cells.iter().enumerate() {
        let mut line = format!("{:>10}", format_short_dollar(grid.head_axis[i]));
        for cell in row {
            line.push_str(&format!(" {:>9}", format_cell(*cell, request.classification)));
        }
        println!("{line}");
    }
    let unavailable = grid.unavailable();
    if unavailable > 0 {
        println!("({unavailable} cells unavailable)");
    }
    Ok(())
}

pub fn run_fixtures(args: &FixturesArgs) -> Result<(), String> {
    validate_year(args.year)?;
    let json = fixtures_json(default_engine(), args.year).map_err(|e| e.to_string())?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .map_err(|e| format!("writing {}: {e}", path.display()))?,
        None => print!("{json}"),
    }
    Ok(())
}

fn format_cell(cell: Option<f64>, classification: Classification) -> String {
    match cell {
        None => "n/a".to_string(),
        Some(value) => match classification {
            Classification::Raw => format_currency(value),
            Classification::Buckets | Classification::Binary => format!("{value:.2}"),
        },
    }
}

#[cfg(test)]
fn compare_request_from_json(json: &str) -> Result<(ScenarioParams, u16), String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    compare_request_from_payload(payload)
}

#[cfg(test)]
fn grid_request_from_json(json: &str) -> Result<(GridRequest, u16), String> {
    let payload = serde_json::from_str::<GridPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    grid_request_from_payload(payload)
}

// Runs a query string through the same extractor the GET routes use.
#[cfg(test)]
fn compare_request_from_query(query: &str) -> Result<(ScenarioParams, u16), String> {
    let uri: axum::http::Uri = format!("/api/compare?{query}").parse().expect("test uri");
    let Query(payload) = Query::<ComparePayload>::try_from_uri(&uri)
        .map_err(|e| format!("Invalid query string: {e}"))?;
    compare_request_from_payload(payload)
}

#[cfg(test)]
fn grid_request_from_query(query: &str) -> Result<(GridRequest, u16), String> {
    let uri: axum::http::Uri = format!("/api/grid?{query}").parse().expect("test uri");
    let Query(payload) = Query::<GridPayload>::try_from_uri(&uri)
        .map_err(|e| format!("Invalid query string: {e}"))?;
    grid_request_from_payload(payload)
}
