use crate::cli::ServeArgs;
use crate::infra::{AppState, ProcessLauncher, RunService};
use crate::routes::with_run_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use staff_directory::config::AppConfig;
use staff_directory::error::AppError;
use staff_directory::telemetry::{self, LogSink};
use staff_directory::workflows::workspace::RunWorkspace;
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

    telemetry::init(&config.telemetry, LogSink::Console)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let workspace = RunWorkspace::new(config.crawler.workspace.clone());
    std::fs::create_dir_all(workspace.download_dir())?;
    let launcher = ProcessLauncher::current_exe(workspace.log_file().to_path_buf())?;
    let run_service = Arc::new(RunService::new(workspace, launcher));

    let app = with_run_routes(run_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "staff directory trigger service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
