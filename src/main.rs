use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use quote_engine::config::AppConfig;
use quote_engine::error::AppError;
use quote_engine::telemetry;
use quote_engine::workflows::proposals::{
    compute_style_comparison, compute_summary, AllowAll, InMemoryProposalRepository,
    LogNotificationPublisher, ManufacturerSelection, PricingDefaults, PricingPolicy,
    ProposalService,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Quote Engine",
    about = "Run the proposal pricing and status engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a manufacturer selection from a JSON file without persisting
    Price(PriceArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct PriceArgs {
    /// Path to a JSON file containing one manufacturer selection
    file: PathBuf,
    /// Discount percent applied before tax
    #[arg(long, default_value = "0", value_parser = parse_decimal)]
    discount_percent: Decimal,
    /// Tax rate percent applied after discount
    #[arg(long, default_value = "0", value_parser = parse_decimal)]
    tax_rate: Decimal,
    /// Apply the combined multiplier to custom items
    #[arg(long)]
    apply_custom_multiplier: bool,
    /// Catalog price of the currently selected style, for a comparison run
    #[arg(long, value_parser = parse_decimal)]
    compare_current: Option<Decimal>,
    /// Catalog price of the alternative style, for a comparison run
    #[arg(long, value_parser = parse_decimal)]
    compare_alternative: Option<Decimal>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Price(args) => run_price(args),
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|err| format!("failed to parse '{raw}' as decimal ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let service = Arc::new(ProposalService::new(
        Arc::new(InMemoryProposalRepository::default()),
        Arc::new(LogNotificationPublisher),
        Arc::new(AllowAll),
        PricingDefaults {
            apply_multiplier_to_custom_items: config.pricing.apply_multiplier_to_custom_items,
            default_tax_rate: config.pricing.default_tax_rate,
        },
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/healthz", get(healthcheck))
        .route("/readyz", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(quote_engine::workflows::proposals::proposal_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "quote engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_price(args: PriceArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.file)?;
    let selection: ManufacturerSelection = serde_json::from_str(&raw)
        .map_err(|err| AppError::InvalidInput(format!("selection file: {err}")))?;

    let policy = PricingPolicy {
        apply_multiplier_to_custom_items: args.apply_custom_multiplier,
        discount_percent: args.discount_percent,
        tax_rate: args.tax_rate,
    };

    let summary = match (args.compare_current, args.compare_alternative) {
        (Some(current), Some(alternative)) => {
            compute_style_comparison(&selection, &policy, current, alternative)
                .map_err(|err| AppError::InvalidInput(err.to_string()))?
        }
        (None, None) => compute_summary(&selection, &policy)
            .map_err(|err| AppError::InvalidInput(err.to_string()))?,
        _ => {
            return Err(AppError::InvalidInput(
                "style comparison needs both --compare-current and --compare-alternative"
                    .to_string(),
            ))
        }
    };

    println!("Price breakdown");
    println!("- cabinets:       {}", summary.cabinets);
    println!("- assembly fee:   {}", summary.assembly_fee);
    println!("- modifications:  {}", summary.modifications_cost);
    println!("- style total:    {}", summary.style_total);
    println!(
        "- discount:       {} ({}%)",
        summary.discount_amount, summary.discount_percent
    );
    println!("- total:          {}", summary.total);
    println!(
        "- tax:            {} ({}%)",
        summary.tax_amount, summary.tax_rate
    );
    println!("- grand total:    {}", summary.grand_total);

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
