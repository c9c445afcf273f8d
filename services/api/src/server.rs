use crate::cli::ServeArgs;
use crate::infra::{AppState, Collaborators, ProjectStore};
use crate::routes::with_estimate_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use reno_estimate::config::AppConfig;
use reno_estimate::error::AppError;
use reno_estimate::projects::{ProjectRepository, ProjectService};
use reno_estimate::sessions::EstimateWorkspace;
use reno_estimate::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

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
    let collaborators = Collaborators::from_config(&config);
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        collaborators: collaborators.clone(),
    };

    let store = ProjectStore::from_config(&config);
    if matches!(store, ProjectStore::Memory(_)) {
        warn!("supabase is not configured; saved projects live in process memory");
    }
    let store_label = store.label();
    let projects = Arc::new(ProjectService::with_pin(
        Arc::new(store),
        config.dashboard.pin.clone(),
    ));
    let workspace = Arc::new(EstimateWorkspace::new(
        projects.clone(),
        collaborators.photos,
        collaborators.analyzer,
        collaborators.labor,
    ));

    spawn_session_sweeper(workspace.clone(), config.server.session_idle);

    let app = with_estimate_routes(projects, workspace)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, projects = store_label, "renovation estimator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Closes idle editing sessions, checking a few times per idle window.
fn spawn_session_sweeper<R>(workspace: Arc<EstimateWorkspace<R>>, max_idle: Duration)
where
    R: ProjectRepository + 'static,
{
    let period = (max_idle / 4).max(Duration::from_secs(30));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let closed = workspace.sessions().sweep_idle(max_idle);
            if closed > 0 {
                debug!(closed, open = workspace.sessions().len(), "idle estimate sessions closed");
            }
        }
    });
}
