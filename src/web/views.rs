use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use leptos::prelude::*;

use super::WatcherSnapshot;
use crate::commands::format_money;
use crate::models::PregameTurn;
use crate::slots::{self, TurnLabel};
use crate::stats::{Alert, ClubStatistics, Severity};

const STYLE: &str = include_str!("../style.css");

pub(super) fn render_page(
    club_id: i64,
    today: NaiveDate,
    stats: Result<&ClubStatistics, &String>,
    turns: Result<&[PregameTurn], &String>,
    snapshot: &WatcherSnapshot,
    tz: Tz,
) -> String {
    let now = Utc::now()
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string();
    let watcher_status = match (&snapshot.last_check, &snapshot.error) {
        (Some(t), None) => format!("Last watcher check: {}", t.format("%Y-%m-%d %H:%M:%S")),
        (Some(t), Some(e)) => format!(
            "Last watcher check: {} (failed: {})",
            t.format("%Y-%m-%d %H:%M:%S"),
            e
        ),
        (None, _) => "Watcher: waiting for first check...".to_string(),
    };
    let title = format!("Club {} · {}", club_id, today);

    let stats_html = match stats {
        Ok(s) => [
            render_alerts(&s.alerts),
            render_summary(s),
            render_occupancy(s),
            render_status_table(s),
            render_revenue_table(s),
        ]
        .concat(),
        Err(e) => render_error(e),
    };
    let turns_html = match turns {
        Ok(t) => render_turns(t),
        Err(e) => render_error(e),
    };

    view! {
        <html lang="es">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>"Padel Admin"</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <h1>"Padel Admin"</h1>
                <p class="subtitle">{title}</p>
                <p class="timestamp">"Updated: " {now}</p>
                <p class="watcher-status">{watcher_status}</p>
                <div inner_html=stats_html />
                <section>
                    <h2>"Turnos de hoy"</h2>
                    <div inner_html=turns_html />
                </section>
            </body>
        </html>
    }
    .to_html()
}

fn render_error(message: &str) -> String {
    let message = message.to_string();
    view! { <div class="error">{message}</div> }.to_html()
}

fn render_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return String::new();
    }
    let items: String = alerts
        .iter()
        .map(|a| {
            let css = match a.severity {
                Severity::Warning => "alert alert-warning",
                Severity::Info => "alert alert-info",
            };
            let message = a.message.clone();
            view! { <li class=css>{message}</li> }.to_html()
        })
        .collect();

    view! {
        <section>
            <h2>"Alertas"</h2>
            <ul class="alerts" inner_html=items />
        </section>
    }
    .to_html()
}

fn render_summary(s: &ClubStatistics) -> String {
    let t = &s.today_turns;
    let rows = [
        (
            "Canchas",
            format!(
                "{} ({} disponibles, {} en mantenimiento)",
                s.total_courts, s.available_courts, s.maintenance_courts
            ),
        ),
        (
            "Turnos hoy",
            format!(
                "{} ({} completados, {} listos, {} pendientes, {} disponibles)",
                t.total, t.completed, t.ready_to_play, t.pending, t.available
            ),
        ),
        ("Ingresos hoy", format_money(s.today_revenue)),
        ("Ingresos del mes", format_money(s.month_revenue)),
        ("Jugadores del mes", s.unique_players_this_month.to_string()),
        (
            "Cancha más usada",
            s.most_used_court
                .as_ref()
                .map(|c| format!("{} ({} turnos)", c.court_name, c.turn_count))
                .unwrap_or_else(|| "-".into()),
        ),
    ];

    let rows_html: String = rows
        .into_iter()
        .map(|(label, value)| {
            view! {
                <tr>
                    <th>{label}</th>
                    <td>{value}</td>
                </tr>
            }
            .to_html()
        })
        .collect();

    view! {
        <section>
            <h2>"Resumen"</h2>
            <table class="summary">
                <tbody inner_html=rows_html />
            </table>
        </section>
    }
    .to_html()
}

fn render_occupancy(s: &ClubStatistics) -> String {
    let max = s
        .occupancy_by_day_of_week
        .iter()
        .map(|d| d.occupancy)
        .max()
        .unwrap_or(0)
        .max(1);

    let rows_html: String = s
        .occupancy_by_day_of_week
        .iter()
        .map(|d| {
            let day = d.day;
            let count = d.occupancy;
            let width = format!("width: {}%", count * 100 / max);
            view! {
                <tr>
                    <td>{day}</td>
                    <td class="bar-cell"><span class="bar" style=width></span></td>
                    <td class="count">{count}</td>
                </tr>
            }
            .to_html()
        })
        .collect();

    view! {
        <section>
            <h2>"Turnos por día de la semana"</h2>
            <table>
                <tbody inner_html=rows_html />
            </table>
        </section>
    }
    .to_html()
}

fn render_status_table(s: &ClubStatistics) -> String {
    if s.turns_by_status.is_empty() {
        return String::new();
    }
    let rows_html: String = s
        .turns_by_status
        .iter()
        .map(|st| {
            let status = st.status.to_string();
            let css = format!("status-{}", status.to_lowercase());
            let count = st.count;
            view! {
                <tr>
                    <td class=css>{status}</td>
                    <td class="count">{count}</td>
                </tr>
            }
            .to_html()
        })
        .collect();

    view! {
        <section>
            <h2>"Turnos del mes por estado"</h2>
            <table>
                <thead>
                    <tr><th>"Estado"</th><th>"Turnos"</th></tr>
                </thead>
                <tbody inner_html=rows_html />
            </table>
        </section>
    }
    .to_html()
}

fn render_revenue_table(s: &ClubStatistics) -> String {
    let rows_html: String = s
        .revenue_by_day
        .iter()
        .rev()
        .map(|r| {
            let date = r.date.format("%d/%m").to_string();
            let css = if r.revenue > 0 { "money" } else { "money empty" };
            let amount = format_money(r.revenue);
            view! {
                <tr>
                    <td>{date}</td>
                    <td class=css>{amount}</td>
                </tr>
            }
            .to_html()
        })
        .collect();

    view! {
        <section>
            <h2>"Ingresos por día"</h2>
            <table class="revenue">
                <tbody inner_html=rows_html />
            </table>
        </section>
    }
    .to_html()
}

fn label_class(label: TurnLabel) -> &'static str {
    match label {
        TurnLabel::Completo => "label label-full",
        TurnLabel::Incompleto => "label label-partial",
        TurnLabel::Libre => "label label-free",
    }
}

fn render_turns(turns: &[PregameTurn]) -> String {
    if turns.is_empty() {
        return view! { <p class="empty">"No hay turnos para hoy."</p> }.to_html();
    }

    let mut sorted: Vec<&PregameTurn> = turns.iter().collect();
    sorted.sort_by(|a, b| a.start_time.cmp(&b.start_time));

    let rows_html: String = sorted
        .into_iter()
        .map(|t| {
            let time = format!("{}-{}", t.start_time, t.end_time);
            let court = t
                .court_name
                .clone()
                .or_else(|| t.court_id.map(|id| format!("Cancha {id}")))
                .unwrap_or_else(|| "-".into());
            let status = t.status.to_string();
            let label = slots::turn_label(t);
            let label_css = label_class(label);
            let label_text = label.as_str();
            let warn = if slots::consistency_report(t).is_empty() {
                ""
            } else {
                " ⚠"
            };
            let cells: String = slots::to_slots(t)
                .iter()
                .map(|slot| {
                    let (css, text) = match slot.player_id() {
                        Some(id) => ("slot taken", format!("#{id}")),
                        None => ("slot free", "libre".to_string()),
                    };
                    let title = format!("{}/{}", slot.position, slot.side);
                    view! { <span class=css title=title>{text}</span> }.to_html()
                })
                .collect();
            let id = t.id;

            view! {
                <tr>
                    <td>{id}</td>
                    <td>{time}</td>
                    <td>{court}</td>
                    <td>{status}</td>
                    <td><span class=label_css>{label_text}</span>{warn}</td>
                    <td class="slots" inner_html=cells />
                </tr>
            }
            .to_html()
        })
        .collect();

    view! {
        <table>
            <thead>
                <tr>
                    <th>"Turno"</th>
                    <th>"Horario"</th>
                    <th>"Cancha"</th>
                    <th>"Estado"</th>
                    <th>"Ocupación"</th>
                    <th>"Izq/Drive · Izq/Revés · Der/Drive · Der/Revés"</th>
                </tr>
            </thead>
            <tbody inner_html=rows_html />
        </table>
    }
    .to_html()
}
