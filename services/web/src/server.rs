use crate::cli::ServeArgs;
use crate::infra::{load_hierarchy, AppState};
use crate::routes::with_session_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use harpro::config::AppConfig;
use harpro::error::AppError;
use harpro::prediction::HttpPredictionClient;
use harpro::session::{SessionLimits, SessionRegistry};
use harpro::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let hierarchy = Arc::new(load_hierarchy(&config.locations)?);
    let client = Arc::new(HttpPredictionClient::new(&config.prediction.base_url)?);
    info!(endpoint = %client.endpoint(), "prediction client configured");
    let limits = SessionLimits {
        idle_ttl: config.sessions.idle_ttl,
        capacity: config.sessions.capacity,
    };
    let registry = Arc::new(SessionRegistry::with_limits(hierarchy, client, limits));

    let app = with_session_routes(registry)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "harpro estimate service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
