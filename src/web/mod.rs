pub mod dashboard;
pub mod error;
pub mod views;
pub mod watcher;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use chrono::DateTime;
use chrono_tz::Tz;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::config::Config;
use crate::session::SessionStore;
use crate::stats::Alert;

/// What the background watcher saw on its last run.
#[derive(Debug, Clone, Default)]
pub(crate) struct WatcherSnapshot {
    pub(crate) last_check: Option<DateTime<Tz>>,
    pub(crate) alerts: Vec<Alert>,
    pub(crate) error: Option<String>,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<Config>,
    pub(crate) tz: Tz,
    pub(crate) client: ApiClient,
    pub(crate) snapshot: Arc<Mutex<WatcherSnapshot>>,
}

impl AppState {
    pub(crate) fn new(config: Config, client: ApiClient) -> Result<Self> {
        let tz = config.club.tz()?;
        Ok(Self {
            config: Arc::new(config),
            tz,
            client,
            snapshot: Arc::new(Mutex::new(WatcherSnapshot::default())),
        })
    }

    pub(crate) fn snapshot(&self) -> MutexGuard<'_, WatcherSnapshot> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::dashboard_handler))
        .route("/api/statistics", get(dashboard::statistics_handler))
        .route("/api/turns/{id}/slots", get(dashboard::slots_handler))
        .route("/api/turns/{id}/assign", post(dashboard::assign_handler))
        .route("/api/turns/{id}/remove", post(dashboard::remove_handler))
        .route("/api/turns/{id}/move", post(dashboard::move_handler))
        .route("/api/turns/{id}/axis", post(dashboard::axis_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, config_path: &Path, addr: &str) -> Result<()> {
    let session = SessionStore::load(&config.session_path(config_path))?;
    if session.token().is_none() {
        warn!("No live session: run `padel-admin login` so the dashboard can reach the backend");
    }
    let client = ApiClient::new(&config.api, Arc::new(session))?;
    let state = AppState::new(config, client)?;

    // Spawn background statistics watcher
    tokio::spawn(watcher::statistics_watcher(state.clone()));

    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
