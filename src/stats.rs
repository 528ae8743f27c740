use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use crate::calendar::{self, WEEKDAY_LABELS};
use crate::client::{ApiClient, ApiResult};
use crate::models::{Club, Court, PregameTurn, TurnStatus};

/// Length of the revenue-by-day window, counted back from today.
pub const REVENUE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodayTurns {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub available: usize,
    pub ready_to_play: usize,
}

impl TodayTurns {
    fn from_turns(turns: &[PregameTurn]) -> Self {
        let count = |status: TurnStatus| turns.iter().filter(|t| t.status == status).count();
        Self {
            total: turns.len(),
            completed: count(TurnStatus::Completed),
            pending: count(TurnStatus::Pending),
            available: count(TurnStatus::Available),
            ready_to_play: count(TurnStatus::ReadyToPlay),
        }
    }
}

/// Raw turn count for one weekday. Not a percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayOccupancy {
    pub day: &'static str,
    pub occupancy: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRevenue {
    pub date: NaiveDate,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourtUsage {
    pub court_id: i64,
    pub court_name: String,
    pub turn_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: TurnStatus,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Maintenance,
    PendingTurns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubStatistics {
    pub today: NaiveDate,
    pub total_courts: usize,
    pub available_courts: usize,
    pub maintenance_courts: usize,
    pub today_turns: TodayTurns,
    /// Minor currency units.
    pub today_revenue: i64,
    /// Minor currency units.
    pub month_revenue: i64,
    pub unique_players_this_month: usize,
    pub occupancy_by_day_of_week: Vec<DayOccupancy>,
    pub revenue_by_day: Vec<DayRevenue>,
    pub most_used_court: Option<CourtUsage>,
    pub turns_by_status: Vec<StatusCount>,
    pub alerts: Vec<Alert>,
}

/// Raw data the aggregator reduces over.
#[derive(Debug, Clone, Default)]
pub struct StatsInput {
    pub club_id: i64,
    pub courts: Vec<Court>,
    pub today_turns: Vec<PregameTurn>,
    pub all_turns: Vec<PregameTurn>,
    pub club: Club,
}

pub fn compute_statistics(input: &StatsInput, today: NaiveDate) -> ClubStatistics {
    let courts: Vec<&Court> = input
        .courts
        .iter()
        .filter(|c| c.club_id == Some(input.club_id))
        .collect();
    let total_courts = courts.len();
    let available_courts = courts.iter().filter(|c| c.is_available).count();

    let price = input.club.price_per_turn.unwrap_or(0);
    let today_turns = TodayTurns::from_turns(&input.today_turns);
    let today_revenue = (today_turns.completed + today_turns.ready_to_play) as i64 * price;

    let month_start = calendar::start_of_month(today);
    let month_turns: Vec<PregameTurn> = input
        .all_turns
        .iter()
        .filter(|t| t.day().is_some_and(|d| d >= month_start))
        .cloned()
        .collect();
    let month_revenue =
        month_turns.iter().filter(|t| t.status.is_billable()).count() as i64 * price;

    let window_start = calendar::days_ago(today, REVENUE_WINDOW_DAYS);

    ClubStatistics {
        today,
        total_courts,
        available_courts,
        maintenance_courts: total_courts - available_courts,
        today_turns,
        today_revenue,
        month_revenue,
        unique_players_this_month: unique_players(&month_turns),
        occupancy_by_day_of_week: occupancy_by_day_of_week(&month_turns),
        revenue_by_day: revenue_by_day(&input.all_turns, price, window_start, today),
        most_used_court: most_used_court(&input.today_turns, &courts),
        turns_by_status: turns_by_status(&month_turns),
        alerts: alerts(&courts, &input.all_turns, today),
    }
}

pub fn unique_players(turns: &[PregameTurn]) -> usize {
    turns
        .iter()
        .flat_map(|t| t.player_ids())
        .collect::<HashSet<_>>()
        .len()
}

/// Turns per weekday, Monday first. Turns without a date are skipped.
pub fn occupancy_by_day_of_week(turns: &[PregameTurn]) -> Vec<DayOccupancy> {
    let mut buckets = [0usize; 7];
    for day in turns.iter().filter_map(|t| t.day()) {
        buckets[calendar::weekday_bucket(day)] += 1;
    }
    WEEKDAY_LABELS
        .iter()
        .zip(buckets)
        .map(|(day, occupancy)| DayOccupancy { day, occupancy })
        .collect()
}

/// One entry per day in `[from, to]`, zero when nothing billable happened.
pub fn revenue_by_day(
    turns: &[PregameTurn],
    price_per_turn: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DayRevenue> {
    let mut series: Vec<DayRevenue> = calendar::days_inclusive(from, to)
        .into_iter()
        .map(|date| DayRevenue { date, revenue: 0 })
        .collect();
    for turn in turns.iter().filter(|t| t.status.is_billable()) {
        let Some(day) = turn.day() else { continue };
        if day < from || day > to {
            continue;
        }
        let offset = (day - from).num_days() as usize;
        series[offset].revenue += price_per_turn;
    }
    series
}

/// Court with the strictly highest turn count. On ties the court seen first
/// wins. `None` when no turn references a court, or when the winner is not
/// one of `courts`.
pub fn most_used_court(turns: &[PregameTurn], courts: &[&Court]) -> Option<CourtUsage> {
    // (court id, count) in first-seen order
    let mut usage: Vec<(i64, usize)> = Vec::new();
    for turn in turns {
        let Some(id) = turn.court_id else { continue };
        match usage.iter_mut().find(|(c, _)| *c == id) {
            Some(entry) => entry.1 += 1,
            None => usage.push((id, 1)),
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for entry in usage {
        if best.map_or(true, |(_, max)| entry.1 > max) {
            best = Some(entry);
        }
    }

    let (court_id, turn_count) = best?;
    let court = courts.iter().find(|c| c.id == court_id)?;
    Some(CourtUsage {
        court_id,
        court_name: court.name.clone(),
        turn_count,
    })
}

/// Turn counts per status, in the order statuses first appear.
pub fn turns_by_status(turns: &[PregameTurn]) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = Vec::new();
    for turn in turns {
        match counts.iter_mut().find(|s| s.status == turn.status) {
            Some(entry) => entry.count += 1,
            None => counts.push(StatusCount {
                status: turn.status.clone(),
                count: 1,
            }),
        }
    }
    counts
}

fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Maintenance alert first, then pending turns due today or tomorrow. Each
/// rule fires at most once.
pub fn alerts(courts: &[&Court], turns: &[PregameTurn], today: NaiveDate) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let maintenance = courts.iter().filter(|c| !c.is_available).count();
    if maintenance > 0 {
        alerts.push(Alert {
            kind: AlertKind::Maintenance,
            message: format!("{} cancha{} en mantenimiento", maintenance, plural(maintenance)),
            severity: Severity::Warning,
        });
    }

    let tomorrow = today + Duration::days(1);
    let pending = turns
        .iter()
        .filter(|t| t.status == TurnStatus::Pending)
        .filter(|t| t.day().is_some_and(|d| d >= today && d <= tomorrow))
        .count();
    if pending > 0 {
        let s = plural(pending);
        alerts.push(Alert {
            kind: AlertKind::PendingTurns,
            message: format!("{pending} turno{s} pendiente{s} para hoy o mañana"),
            severity: Severity::Info,
        });
    }

    alerts
}

/// Statistics together with the day's turns they were computed from.
#[derive(Debug, Clone)]
pub struct ClubOverview {
    pub statistics: ClubStatistics,
    pub today_turns: Vec<PregameTurn>,
}

pub async fn fetch_club_statistics(
    client: &ApiClient,
    club_id: i64,
    today: NaiveDate,
) -> ApiResult<ClubStatistics> {
    Ok(fetch_club_overview(client, club_id, today).await?.statistics)
}

/// Fetch everything the aggregator needs in parallel and reduce it. Any
/// failed request fails the whole computation.
pub async fn fetch_club_overview(
    client: &ApiClient,
    club_id: i64,
    today: NaiveDate,
) -> ApiResult<ClubOverview> {
    debug!("Fetching statistics inputs for club {} ({})", club_id, today);
    let (courts, today_turns, all_turns, club) = tokio::try_join!(
        client.list_courts(),
        client.list_pregame_turns(club_id, Some(today)),
        client.list_pregame_turns(club_id, None),
        client.get_club(club_id),
    )?;

    let input = StatsInput {
        club_id,
        courts,
        today_turns: today_turns.pregame_turns,
        all_turns: all_turns.pregame_turns,
        club,
    };
    let statistics = compute_statistics(&input, today);
    info!(
        "Club {}: {} turns today, {} alerts",
        club_id,
        statistics.today_turns.total,
        statistics.alerts.len()
    );
    Ok(ClubOverview {
        statistics,
        today_turns: input.today_turns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn turn(date: &str, status: TurnStatus) -> PregameTurn {
        PregameTurn {
            id: 1,
            date: date.to_string(),
            status,
            ..Default::default()
        }
    }

    fn on_court(court_id: i64) -> PregameTurn {
        PregameTurn {
            court_id: Some(court_id),
            ..turn("2024-01-05", TurnStatus::Pending)
        }
    }

    fn court(id: i64, available: bool) -> Court {
        Court {
            id,
            name: format!("Cancha {id}"),
            description: None,
            club_id: Some(3),
            surface_type: None,
            is_indoor: false,
            has_lighting: false,
            is_available: available,
            created_at: None,
        }
    }

    #[test]
    fn test_revenue_counts_only_billable_turns() {
        let turns = vec![
            turn("2024-01-05", TurnStatus::Completed),
            turn("2024-01-05", TurnStatus::Pending),
        ];
        let series = revenue_by_day(&turns, 5000, d(2024, 1, 1), d(2024, 1, 7));
        assert_eq!(series.len(), 7);
        let jan5 = series.iter().find(|r| r.date == d(2024, 1, 5)).unwrap();
        assert_eq!(jan5.revenue, 5000);
        assert!(series
            .iter()
            .filter(|r| r.date != d(2024, 1, 5))
            .all(|r| r.revenue == 0));
    }

    #[test]
    fn test_revenue_ignores_turns_outside_window() {
        let turns = vec![
            turn("2023-12-31", TurnStatus::Completed),
            turn("2024-01-02T10:00:00", TurnStatus::ReadyToPlay),
            turn("2024-01-02", TurnStatus::Completed),
        ];
        let series = revenue_by_day(&turns, 100, d(2024, 1, 1), d(2024, 1, 3));
        let revenue: Vec<i64> = series.iter().map(|r| r.revenue).collect();
        assert_eq!(revenue, vec![0, 200, 0]);
    }

    #[test]
    fn test_most_used_court() {
        let turns = vec![on_court(1), on_court(1), on_court(2)];
        let mut central = court(1, true);
        central.name = "Central".into();
        let courts = [central, court(2, true)];
        let refs: Vec<&Court> = courts.iter().collect();
        let best = most_used_court(&turns, &refs).unwrap();
        assert_eq!(best.court_id, 1);
        assert_eq!(best.turn_count, 2);
        assert_eq!(best.court_name, "Central");
    }

    #[test]
    fn test_most_used_court_tie_keeps_first_seen() {
        let turns = vec![on_court(2), on_court(1), on_court(1), on_court(2)];
        let courts = [court(1, true), court(2, true)];
        let refs: Vec<&Court> = courts.iter().collect();
        let best = most_used_court(&turns, &refs).unwrap();
        assert_eq!(best.court_id, 2);
        assert_eq!(best.turn_count, 2);
    }

    #[test]
    fn test_most_used_court_ignores_foreign_winner() {
        let turns = vec![on_court(9), on_court(9), on_court(1)];
        let courts = [court(1, true)];
        let refs: Vec<&Court> = courts.iter().collect();
        assert_eq!(most_used_court(&turns, &refs), None);
    }

    #[test]
    fn test_compute_statistics_scopes_most_used_court_to_club() {
        let mut foreign = court(9, true);
        foreign.club_id = Some(99);
        let input = StatsInput {
            club_id: 3,
            courts: vec![court(1, true), foreign],
            today_turns: vec![on_court(9)],
            ..Default::default()
        };
        let stats = compute_statistics(&input, d(2024, 1, 5));
        assert_eq!(stats.most_used_court, None);
    }

    #[test]
    fn test_most_used_court_none_without_court_ids() {
        let turns = vec![turn("2024-01-05", TurnStatus::Pending)];
        assert_eq!(most_used_court(&turns, &[]), None);
    }

    #[test]
    fn test_single_maintenance_alert() {
        let courts = [court(1, false), court(2, true)];
        let refs: Vec<&Court> = courts.iter().collect();
        let alerts = alerts(&refs, &[], d(2024, 1, 5));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Maintenance);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[0].message, "1 cancha en mantenimiento");
    }

    #[test]
    fn test_pending_alert_covers_today_and_tomorrow() {
        let turns = vec![
            turn("2024-01-04", TurnStatus::Pending),
            turn("2024-01-05", TurnStatus::Pending),
            turn("2024-01-06T20:00:00", TurnStatus::Pending),
            turn("2024-01-07", TurnStatus::Pending),
            turn("2024-01-05", TurnStatus::Completed),
        ];
        let alerts = alerts(&[], &turns, d(2024, 1, 5));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::PendingTurns);
        assert_eq!(alerts[0].message, "2 turnos pendientes para hoy o mañana");
    }

    #[test]
    fn test_alert_order_is_maintenance_first() {
        let courts = [court(1, false), court(2, false)];
        let refs: Vec<&Court> = courts.iter().collect();
        let turns = vec![turn("2024-01-05", TurnStatus::Pending)];
        let kinds: Vec<AlertKind> = alerts(&refs, &turns, d(2024, 1, 5))
            .iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(kinds, vec![AlertKind::Maintenance, AlertKind::PendingTurns]);
    }

    #[test]
    fn test_occupancy_wednesday_bucket() {
        let turns = vec![
            turn("2024-01-03", TurnStatus::Pending), // Wednesday
            turn("2024-01-05", TurnStatus::Pending),
            turn("2024-01-06", TurnStatus::Pending),
        ];
        let occupancy = occupancy_by_day_of_week(&turns);
        assert_eq!(occupancy.len(), 7);
        assert_eq!(occupancy[2].day, "Miércoles");
        assert_eq!(occupancy[2].occupancy, 1);
        assert_eq!(occupancy[0].occupancy, 0);
        assert_eq!(occupancy[6].day, "Domingo");
    }

    #[test]
    fn test_turns_by_status_keeps_raw_unrecognised_statuses() {
        let archived = TurnStatus::parse("ARCHIVED");
        let expired = TurnStatus::parse("EXPIRED");
        let turns = vec![
            turn("2024-01-05", archived.clone()),
            turn("2024-01-05", expired.clone()),
            turn("2024-01-05", archived.clone()),
        ];
        let counts = turns_by_status(&turns);
        assert_eq!(
            counts,
            vec![
                StatusCount { status: archived, count: 2 },
                StatusCount { status: expired, count: 1 },
            ]
        );
        assert_eq!(counts[1].status.as_str(), "EXPIRED");
    }

    #[test]
    fn test_turns_by_status_first_seen_order() {
        let turns = vec![
            turn("2024-01-05", TurnStatus::Pending),
            turn("2024-01-05", TurnStatus::Completed),
            turn("2024-01-05", TurnStatus::Pending),
            turn("2024-01-05", TurnStatus::Unknown),
        ];
        let counts = turns_by_status(&turns);
        assert_eq!(
            counts,
            vec![
                StatusCount { status: TurnStatus::Pending, count: 2 },
                StatusCount { status: TurnStatus::Completed, count: 1 },
                StatusCount { status: TurnStatus::Unknown, count: 1 },
            ]
        );
    }

    #[test]
    fn test_compute_statistics() {
        let mut t1 = turn("2024-01-05", TurnStatus::Completed);
        t1.player1_id = Some(10);
        t1.player2_id = Some(11);
        let mut t2 = turn("2024-01-03", TurnStatus::ReadyToPlay);
        t2.player1_id = Some(10);
        let old = turn("2023-12-20", TurnStatus::Completed);

        let mut foreign = court(9, false);
        foreign.club_id = Some(99);

        let input = StatsInput {
            club_id: 3,
            courts: vec![court(1, true), court(2, false), foreign],
            today_turns: vec![t1.clone()],
            all_turns: vec![t1, t2, old],
            club: Club {
                id: 3,
                name: "Sur".into(),
                price_per_turn: Some(5000),
                ..Default::default()
            },
        };
        let stats = compute_statistics(&input, d(2024, 1, 5));

        assert_eq!(stats.total_courts, 2);
        assert_eq!(stats.maintenance_courts, 1);
        assert_eq!(stats.today_turns.completed, 1);
        assert_eq!(stats.today_revenue, 5000);
        assert_eq!(stats.month_revenue, 10000);
        assert_eq!(stats.unique_players_this_month, 2);
        assert_eq!(stats.revenue_by_day.len(), 31);
        assert_eq!(stats.revenue_by_day.iter().map(|r| r.revenue).sum::<i64>(), 15000);
        assert_eq!(stats.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_fails_when_any_request_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/courts/")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/pregame-turns/clubs/3/pregame-turns")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"pregame_turns": []}"#)
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/clubs/3")
            .with_status(500)
            .with_body(r#"{"detail": "boom"}"#)
            .create_async()
            .await;

        let client = logged_in_client_for(&server, "tok");
        let err = fetch_club_statistics(&client, 3, d(2024, 1, 5))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
    }
}
