use axum::routing::{delete, get, patch};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scanboard_core::cache::ScanCache;
use scanboard_core::ingest::source::SheetsSource;
use scanboard_core::storage::snapshot::SnapshotStore;
use scanboard_core::storage::trackers::TrackerStore;

mod error;
mod scan;
mod trackers;

#[derive(Clone)]
pub struct AppState {
    /// None when no scan source is configured; the API then serves trackers
    /// and history in degraded mode and 503s the scan endpoints.
    pub cache: Option<Arc<ScanCache>>,
    pub history: Arc<SnapshotStore>,
    pub trackers: Arc<TrackerStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = scanboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let history = SnapshotStore::new(settings.history_dir());

    let cache = match SheetsSource::from_settings(&settings) {
        Ok(source) => Some(Arc::new(ScanCache::new(
            Arc::new(source),
            history.clone(),
            settings.cache_ttl(),
        ))),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "scan source not configured; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        cache,
        history: Arc::new(history),
        trackers: Arc::new(TrackerStore::new(settings.data_dir())),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/scan", get(scan::get_scan))
        .route("/api/refresh", get(scan::refresh_scan))
        .route("/api/history", get(scan::list_history))
        .route("/api/history/:scan_time", get(scan::get_history_entry))
        .route(
            "/api/settings",
            get(trackers::get_settings).put(trackers::put_settings),
        )
        .route(
            "/api/alerts",
            get(trackers::list_alerts).post(trackers::add_alert),
        )
        .route("/api/alerts/:id", delete(trackers::delete_alert))
        .route(
            "/api/positions",
            get(trackers::list_positions).post(trackers::add_position),
        )
        .route(
            "/api/positions/:id",
            patch(trackers::update_position).delete(trackers::delete_position),
        )
        .route(
            "/api/calls",
            get(trackers::list_calls).post(trackers::add_call),
        )
        .route(
            "/api/calls/:id",
            patch(trackers::close_call).delete(trackers::delete_call),
        )
        .route(
            "/api/routine/:date",
            get(trackers::get_routine).post(trackers::save_routine),
        )
        .route("/api/routine-dates", get(trackers::routine_dates))
        .route(
            "/api/earnings",
            get(trackers::get_earnings).post(trackers::set_earnings),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &scanboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
