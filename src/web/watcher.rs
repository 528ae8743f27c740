use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info, warn};

use super::{AppState, WatcherSnapshot};
use crate::calendar;
use crate::stats::{self, Alert, ClubStatistics, Severity};

const MIN_INTERVAL: Duration = Duration::from_secs(10);

/// Refresh club statistics every `refresh_secs`, and right away whenever a
/// new session is stored.
pub(crate) async fn statistics_watcher(state: AppState) {
    let interval = Duration::from_secs(state.config.dashboard.refresh_secs).max(MIN_INTERVAL);
    let mut session_rx = state.client.session().subscribe();
    info!("Statistics watcher started (every {}s)", interval.as_secs());

    loop {
        refresh(&state).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = session_rx.changed() => {
                if changed.is_err() {
                    tokio::time::sleep(interval).await;
                    continue;
                }
                let logged_in = session_rx.borrow_and_update().is_some();
                if logged_in {
                    info!("Statistics watcher: session changed, refreshing now");
                } else {
                    warn!("Statistics watcher: session cleared, waiting for a new login");
                }
            }
        }
    }
}

async fn refresh(state: &AppState) {
    let now = Utc::now().with_timezone(&state.tz);
    let result = if state.client.session().token().is_none() {
        Err("not logged in".to_string())
    } else {
        let today = calendar::today_in(state.tz);
        stats::fetch_club_statistics(&state.client, state.config.club.id, today)
            .await
            .map_err(|e| e.to_string())
    };

    if let Err(ref e) = result {
        error!("Statistics watcher: {}", e);
    }

    let raised = record(&mut state.snapshot(), result, now);
    for alert in raised {
        match alert.severity {
            Severity::Warning => warn!("Alert: {}", alert.message),
            Severity::Info => info!("Alert: {}", alert.message),
        }
    }
}

/// Store the outcome of one check and return the alerts that were not
/// present on the previous successful check.
pub(crate) fn record(
    snapshot: &mut WatcherSnapshot,
    result: Result<ClubStatistics, String>,
    at: DateTime<Tz>,
) -> Vec<Alert> {
    snapshot.last_check = Some(at);
    match result {
        Ok(stats) => {
            let raised = stats
                .alerts
                .iter()
                .filter(|a| !snapshot.alerts.contains(a))
                .cloned()
                .collect();
            snapshot.alerts = stats.alerts;
            snapshot.error = None;
            raised
        }
        Err(e) => {
            snapshot.error = Some(e);
            Vec::new()
        }
    }
}
