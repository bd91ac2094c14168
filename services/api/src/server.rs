use crate::cli::ServeArgs;
use crate::infra::{load_stores, AppState, DataFiles};
use crate::routes::with_valuation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use unit_valuation::config::AppConfig;
use unit_valuation::error::AppError;
use unit_valuation::telemetry;
use unit_valuation::valuation::ValuationService;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (ledger, book) = load_stores(DataFiles {
        transactions: config.valuation.transactions_csv.as_deref(),
        overrides: config.valuation.overrides_csv.as_deref(),
        buildings: config.valuation.buildings_csv.as_deref(),
    })?;
    let valuation_service = Arc::new(
        ValuationService::new(Arc::new(ledger), Arc::new(book))
            .with_sale_price_floor(config.valuation.sale_price_floor),
    );

    let app = with_valuation_routes(valuation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "unit valuation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
