use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{RateSeries, SolverConfig, project, simulate_drawdown, solve_max_withdrawal};
use crate::rates::{HistoricalReturns, MarketDataProvider, normalize_rates, parse_rate_list, parse_rates_csv};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRateMode {
    Fixed,
    Variable,
    Market,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRateMode {
    #[serde(alias = "fixedRate", alias = "fixed_rate")]
    Fixed,
    #[serde(alias = "variableRate", alias = "variable_rate")]
    Variable,
    #[serde(alias = "sp500", alias = "marketData", alias = "market_data")]
    Market,
    #[serde(alias = "csv", alias = "uploaded")]
    Upload,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResponseRateMode {
    Fixed,
    Variable,
    Market,
    Uploaded,
}

/// Resolved rate specification; the engine only ever sees the series this
/// produces once the request is normalized.
#[derive(Debug, Clone, PartialEq)]
enum RateSpec {
    Fixed(f64),
    Variable(Vec<f64>),
    Market { market_years: u32 },
    Uploaded(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
struct PlanInputs {
    principal: f64,
    years: u32,
    lifespan: u32,
    tolerance: f64,
    rates: RateSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    principal: Option<f64>,
    years: Option<u32>,
    lifespan: Option<u32>,
    rate_mode: Option<ApiRateMode>,
    fixed_rate: Option<f64>,
    variable_rates: Option<String>,
    market_years: Option<u32>,
    csv_rates: Option<String>,
    tolerance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MarketReturnsQuery {
    years: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Retirement projection API (compound accumulation + sustainable-withdrawal solver)"
)]
struct Cli {
    #[arg(long, default_value_t = 10_000.0, help = "Starting principal")]
    principal: f64,
    #[arg(
        long,
        default_value_t = 20,
        help = "Accumulation horizon in years before retirement"
    )]
    years: u32,
    #[arg(
        long,
        default_value_t = 30,
        help = "Drawdown horizon in years to fund after retirement"
    )]
    lifespan: u32,
    #[arg(long, value_enum, default_value_t = CliRateMode::Fixed)]
    rate_mode: CliRateMode,
    #[arg(
        long,
        default_value_t = 0.07,
        help = "Annual growth rate as a fraction, e.g. 0.07 for 7%"
    )]
    fixed_rate: f64,
    #[arg(
        long,
        default_value = "0.05, 0.06, 0.07, 0.08",
        help = "Comma-separated per-year rates; padded with the last value or truncated to the horizon"
    )]
    variable_rates: String,
    #[arg(
        long,
        default_value_t = 20,
        help = "Years of historical market returns to request"
    )]
    market_years: u32,
    #[arg(
        long,
        default_value_t = 0.01,
        help = "Bisection convergence tolerance for the withdrawal solver"
    )]
    tolerance: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    mode: ResponseRateMode,
    principal: f64,
    years: u32,
    lifespan: u32,
    balance_at_retirement: f64,
    effective_rate: f64,
    rates_used: Vec<f64>,
    max_annual_expense: f64,
    years_funded: u32,
    trajectory: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct MarketReturnsResponse {
    years: usize,
    returns: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<PlanInputs, String> {
    if !cli.principal.is_finite() || cli.principal <= 0.0 {
        return Err("--principal must be > 0".to_string());
    }

    if cli.years == 0 {
        return Err("--years must be > 0".to_string());
    }

    if cli.lifespan == 0 {
        return Err("--lifespan must be > 0".to_string());
    }

    if !cli.tolerance.is_finite() || cli.tolerance <= 0.0 {
        return Err("--tolerance must be > 0".to_string());
    }

    let rates = match cli.rate_mode {
        CliRateMode::Fixed => {
            if !cli.fixed_rate.is_finite() {
                return Err("--fixed-rate must be a finite number".to_string());
            }
            RateSpec::Fixed(cli.fixed_rate)
        }
        CliRateMode::Variable => RateSpec::Variable(parse_rate_list(&cli.variable_rates)?),
        CliRateMode::Market => {
            if cli.market_years == 0 {
                return Err("--market-years must be > 0".to_string());
            }
            RateSpec::Market {
                market_years: cli.market_years,
            }
        }
    };

    Ok(PlanInputs {
        principal: cli.principal,
        years: cli.years,
        lifespan: cli.lifespan,
        tolerance: cli.tolerance,
        rates,
    })
}

fn plan_inputs_from_payload(payload: PlanPayload) -> Result<PlanInputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.principal {
        cli.principal = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.lifespan {
        cli.lifespan = v;
    }
    if let Some(v) = payload.rate_mode {
        cli.rate_mode = match v {
            ApiRateMode::Fixed => CliRateMode::Fixed,
            ApiRateMode::Variable => CliRateMode::Variable,
            ApiRateMode::Market => CliRateMode::Market,
            // Upload carries its own data; resolved below.
            ApiRateMode::Upload => cli.rate_mode,
        };
    }
    if let Some(v) = payload.fixed_rate {
        cli.fixed_rate = v;
    }
    if let Some(v) = payload.variable_rates {
        cli.variable_rates = v;
    }
    if let Some(v) = payload.market_years {
        cli.market_years = v;
    }
    if let Some(v) = payload.tolerance {
        cli.tolerance = v;
    }

    let mut inputs = build_inputs(cli)?;

    // An uploaded rate table overrides whatever rate mode was selected,
    // matching the form behavior this API replaced.
    if let Some(csv) = payload.csv_rates {
        inputs.rates = RateSpec::Uploaded(parse_rates_csv(csv.as_bytes())?);
    } else if payload.rate_mode == Some(ApiRateMode::Upload) {
        return Err("rateMode 'upload' requires csvRates".to_string());
    }

    Ok(inputs)
}

fn default_cli_for_api() -> Cli {
    Cli {
        principal: 10_000.0,
        years: 20,
        lifespan: 30,
        rate_mode: CliRateMode::Fixed,
        fixed_rate: 0.07,
        variable_rates: "0.05, 0.06, 0.07, 0.08".to_string(),
        market_years: 20,
        tolerance: 0.01,
    }
}

fn resolve_rate_series(
    inputs: &PlanInputs,
    provider: &dyn MarketDataProvider,
) -> Result<(RateSeries, ResponseRateMode), String> {
    match &inputs.rates {
        RateSpec::Fixed(rate) => Ok((
            RateSeries::fixed(*rate, inputs.years),
            ResponseRateMode::Fixed,
        )),
        RateSpec::Variable(rates) => Ok((
            RateSeries::from_rates(normalize_rates(rates, inputs.years)),
            ResponseRateMode::Variable,
        )),
        RateSpec::Uploaded(rates) => Ok((
            RateSeries::from_rates(normalize_rates(rates, inputs.years)),
            ResponseRateMode::Uploaded,
        )),
        RateSpec::Market { market_years } => {
            let fetched = provider.annual_returns(*market_years).ok_or_else(|| {
                "No market data available; choose another rate source".to_string()
            })?;
            // Prefer the most recent window when more history came back
            // than the horizon needs.
            let horizon = inputs.years as usize;
            let trailing = if fetched.len() > horizon {
                fetched[fetched.len() - horizon..].to_vec()
            } else {
                fetched
            };
            Ok((
                RateSeries::from_rates(normalize_rates(&trailing, inputs.years)),
                ResponseRateMode::Market,
            ))
        }
    }
}

fn compute_plan(
    inputs: &PlanInputs,
    provider: &dyn MarketDataProvider,
) -> Result<PlanResponse, String> {
    let (series, mode) = resolve_rate_series(inputs, provider)?;
    let projection = project(inputs.principal, &series);
    let solution = solve_max_withdrawal(
        projection.balance.max(0.0),
        projection.effective_rate,
        SolverConfig {
            target_years: inputs.lifespan,
            tolerance: inputs.tolerance,
        },
    );
    let trajectory = simulate_drawdown(
        projection.balance,
        solution.annual_withdrawal,
        projection.effective_rate,
        Some(inputs.lifespan),
    );

    Ok(PlanResponse {
        mode,
        principal: inputs.principal,
        years: inputs.years,
        lifespan: inputs.lifespan,
        balance_at_retirement: projection.balance,
        effective_rate: projection.effective_rate,
        rates_used: series.rates().to_vec(),
        max_annual_expense: solution.annual_withdrawal,
        years_funded: trajectory.years_funded,
        trajectory: trajectory.balances,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .route("/api/market-returns", get(market_returns_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("nestegg HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_handler_impl(payload: PlanPayload) -> Response {
    let inputs = match plan_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match compute_plan(&inputs, &HistoricalReturns) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_GATEWAY, &msg),
    }
}

async fn market_returns_handler(Query(query): Query<MarketReturnsQuery>) -> Response {
    let years = query.years.unwrap_or(20);
    match HistoricalReturns.annual_returns(years) {
        Some(returns) => json_response(
            StatusCode::OK,
            MarketReturnsResponse {
                years: returns.len(),
                returns,
            },
        ),
        None => error_response(StatusCode::NOT_FOUND, "No market data available"),
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
