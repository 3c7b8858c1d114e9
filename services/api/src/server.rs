use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use readiness_lab::config::AppConfig;
use readiness_lab::error::AppError;
use readiness_lab::telemetry;
use readiness_lab::workflows::training::{CatalogDocumentSource, FsDocumentSource, ScenarioService};
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{scoring_config, AppState, ContentSource, LogEventSink, TextCertificateIssuer};
use crate::routes::with_scenario_routes;

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

    let documents = match config.content.dir.clone() {
        Some(dir) => {
            info!(content_dir = %dir.display(), "serving scenarios from content directory");
            ContentSource::Fs(FsDocumentSource::new(dir))
        }
        None => ContentSource::Catalog(CatalogDocumentSource::builtin()),
    };

    let scenario_service = Arc::new(ScenarioService::new(
        Arc::new(documents),
        Arc::new(LogEventSink),
        scoring_config(&config.training),
    ));
    let issuer = Arc::new(TextCertificateIssuer);

    let app = with_scenario_routes(scenario_service, issuer)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "readiness lab scenario service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
