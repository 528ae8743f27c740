use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::calendar;
use crate::client::{ApiClient, ApiResult};
use crate::config::{self, Config};
use crate::models::{
    ClubUpdate, CourtCreate, CourtUpdate, CreateTurnByClub, MatchFilters, PregameTurn,
    PregameTurnUpdate, TurnStatus, SURFACE_TYPES,
};
use crate::session::SessionStore;
use crate::slots::{self, AxisValue, SlotEdit, SlotError, SlotIssue};
use crate::stats;
use crate::{ClubCommand, CourtsCommand, InvitationsCommand, NotificationsCommand, TurnsCommand};

/// Config plus a client sharing the session stored next to it.
pub fn connect(config_path: &Path) -> Result<(Config, ApiClient)> {
    let cfg = config::load_config(config_path)?;
    let session = SessionStore::load(&cfg.session_path(config_path))?;
    let client = ApiClient::new(&cfg.api, Arc::new(session))?;
    Ok((cfg, client))
}

/// Like [`connect`], but fails early when there is no live session.
fn connect_logged_in(config_path: &Path) -> Result<(Config, ApiClient)> {
    let (cfg, client) = connect(config_path)?;
    if client.session().token().is_none() {
        bail!("Not logged in (or session expired). Run `padel-admin login` first.");
    }
    Ok((cfg, client))
}

/// Resolve username/password from CLI flags or the `[credentials]` section.
pub fn resolve_credentials(
    user_flag: Option<String>,
    pass_flag: Option<String>,
    cfg: &Config,
) -> Result<(String, String)> {
    let creds = cfg.credentials.as_ref();
    let user = user_flag
        .or_else(|| creds.map(|c| c.username.clone()))
        .context("No [credentials] in config and no --user provided")?;
    let pass = pass_flag
        .or_else(|| creds.map(|c| c.password.clone()))
        .context("No [credentials] in config and no --password provided")?;
    Ok((user, pass))
}

pub fn format_money(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

pub async fn run_login(
    config_path: &Path,
    user: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let (cfg, client) = connect(config_path)?;
    let (user, pass) = resolve_credentials(user, password, &cfg)?;

    println!("Logging in as {}...", user);
    let me = client.login(&user, &pass).await?;
    if !me.is_admin {
        warn!("{} is not a club admin; most commands will be rejected", me.email);
    }
    if me.club_id.is_some_and(|id| id != cfg.club.id) {
        warn!(
            "Logged-in admin belongs to club {:?} but config uses club {}",
            me.club_id, cfg.club.id
        );
    }
    if me.must_change_password == Some(true) {
        println!("The backend asks for a password change: run `padel-admin change-password`.");
    }
    println!("Logged in as {} <{}>", me.name, me.email);
    Ok(())
}

pub fn run_logout(config_path: &Path) -> Result<()> {
    let (_, client) = connect(config_path)?;
    client.logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn run_whoami(config_path: &Path) -> Result<()> {
    let (cfg, client) = connect(config_path)?;
    let Some(session) = client.session().current() else {
        println!("Not logged in.");
        return Ok(());
    };
    let user = &session.user;
    println!("{} <{}>", user.name, user.email);
    println!("  admin:  {}", user.is_admin);
    println!(
        "  club:   {}",
        user.club_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("- (config: {})", cfg.club.id))
    );
    match session.expires_at() {
        Some(exp) if session.is_expired(Utc::now()) => println!("  token:  expired at {}", exp),
        Some(exp) => println!("  token:  valid until {}", exp),
        None => println!("  token:  no expiry claim"),
    }
    Ok(())
}

pub async fn run_change_password(config_path: &Path, current: &str, new: &str) -> Result<()> {
    let (_, client) = connect_logged_in(config_path)?;
    client.change_password(current, new).await?;
    println!("Password changed.");
    Ok(())
}

pub async fn run_courts(config_path: &Path, cmd: CourtsCommand) -> Result<()> {
    let (cfg, client) = connect_logged_in(config_path)?;
    let club_id = cfg.club.id;

    match cmd {
        CourtsCommand::List => {
            let courts: Vec<_> = client
                .list_courts()
                .await?
                .into_iter()
                .filter(|c| c.club_id == Some(club_id))
                .collect();
            if courts.is_empty() {
                println!("No courts for club {}.", club_id);
            }
            for c in &courts {
                println!(
                    "  [{}] {:<20} {:<17} {}{}{}",
                    c.id,
                    c.name,
                    c.surface_type.as_deref().unwrap_or("-"),
                    if c.is_available { "available" } else { "MAINTENANCE" },
                    if c.is_indoor { ", indoor" } else { "" },
                    if c.has_lighting { ", lit" } else { "" },
                );
            }
        }
        CourtsCommand::Show { id } => {
            let c = client.get_court(id).await?;
            println!("{} ({})", c.name, c.id);
            if let Some(ref desc) = c.description {
                println!("  {}", desc);
            }
            println!("  surface:  {}", c.surface_type.as_deref().unwrap_or("-"));
            println!("  indoor:   {}", c.is_indoor);
            println!("  lighting: {}", c.has_lighting);
            println!(
                "  status:   {}",
                if c.is_available { "available" } else { "under maintenance" }
            );
        }
        CourtsCommand::Add {
            name,
            surface,
            description,
            indoor,
            lighting,
        } => {
            check_surface(&surface)?;
            let court = client
                .create_court(&CourtCreate {
                    name,
                    description,
                    club_id,
                    surface_type: surface,
                    is_indoor: indoor,
                    has_lighting: lighting,
                    is_available: true,
                })
                .await?;
            println!("Created court {} ({})", court.name, court.id);
        }
        CourtsCommand::Update {
            id,
            name,
            surface,
            description,
            indoor,
            lighting,
            available,
        } => {
            if let Some(ref s) = surface {
                check_surface(s)?;
            }
            let court = client
                .update_court(
                    id,
                    &CourtUpdate {
                        name,
                        description,
                        surface_type: surface,
                        is_indoor: indoor,
                        has_lighting: lighting,
                        is_available: available,
                    },
                )
                .await?;
            println!(
                "Updated court {} ({}): {}",
                court.name,
                court.id,
                if court.is_available { "available" } else { "under maintenance" }
            );
        }
        CourtsCommand::Delete { id } => {
            client.delete_court(id).await?;
            println!("Deleted court {}", id);
        }
    }
    Ok(())
}

fn check_surface(surface: &str) -> Result<()> {
    if !SURFACE_TYPES.contains(&surface) {
        bail!(
            "Unknown surface '{}' (expected one of: {})",
            surface,
            SURFACE_TYPES.join(", ")
        );
    }
    Ok(())
}

pub async fn run_club(config_path: &Path, cmd: ClubCommand) -> Result<()> {
    let (cfg, client) = connect_logged_in(config_path)?;
    let club_id = cfg.club.id;

    match cmd {
        ClubCommand::Show => {
            let club = client.get_club(club_id).await?;
            println!("{} ({})", club.name, club.id);
            println!("  address:  {}", club.address);
            if let Some(ref phone) = club.phone {
                println!("  phone:    {}", phone);
            }
            if let Some(ref email) = club.email {
                println!("  email:    {}", email);
            }
            println!(
                "  hours:    {} - {} ({} min turns)",
                club.opening_time.as_deref().unwrap_or("?"),
                club.closing_time.as_deref().unwrap_or("?"),
                club.turn_duration_minutes
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "?".into())
            );
            println!(
                "  price:    {}",
                club.price_per_turn
                    .map(format_money)
                    .unwrap_or_else(|| "not set".into())
            );
            let open: Vec<&str> = calendar::WEEKDAY_LABELS
                .iter()
                .zip(club.open_days())
                .filter(|(_, open)| *open)
                .map(|(day, _)| *day)
                .collect();
            println!("  open:     {}", open.join(", "));
        }
        ClubCommand::Update {
            name,
            address,
            phone,
            email,
            opening_time,
            closing_time,
            turn_duration,
            price,
        } => {
            let schedule_changed =
                opening_time.is_some() || closing_time.is_some() || turn_duration.is_some();
            let update = ClubUpdate {
                name,
                address,
                phone,
                email,
                opening_time,
                closing_time,
                turn_duration_minutes: turn_duration,
                price_per_turn: price,
            };
            let club = client.update_club(club_id, &update).await?;
            println!("Updated club {}", club.name);
            if schedule_changed {
                println!("Schedule changed: run `padel-admin club generate-turns` to apply it.");
            }
        }
        ClubCommand::GenerateTurns { days_ahead } => {
            client.generate_turns(club_id, days_ahead).await?;
            println!("Generated turns for the next {} days", days_ahead);
        }
    }
    Ok(())
}

fn player_name(turn: &PregameTurn, player_id: i64) -> String {
    turn.assigned_players
        .iter()
        .flatten()
        .find(|p| p.player_id == player_id)
        .and_then(|p| p.player_name.clone())
        .unwrap_or_else(|| format!("#{}", player_id))
}

fn print_turn_header(turn: &PregameTurn) {
    println!(
        "Turn {}  {} {}-{}  court {}  {} ({})",
        turn.id,
        turn.day()
            .map(|d| d.to_string())
            .unwrap_or_else(|| turn.date.clone()),
        turn.start_time,
        turn.end_time,
        turn.court_name
            .clone()
            .or_else(|| turn.court_id.map(|id| id.to_string()))
            .unwrap_or_else(|| "-".into()),
        turn.status,
        slots::turn_label(turn).as_str(),
    );
}

fn print_slots(turn: &PregameTurn) {
    for slot in slots::to_slots(turn) {
        let label = format!("{}/{}", slot.position, slot.side);
        match slot.player_id() {
            Some(id) => println!("  [{}] {:<17} {}", slot.index, label, player_name(turn, id)),
            None => println!("  [{}] {:<17} (libre)", slot.index, label),
        }
    }
    for issue in slots::consistency_report(turn) {
        warn_issue(turn.id, &issue);
    }
}

fn warn_issue(turn_id: i64, issue: &SlotIssue) {
    match issue {
        SlotIssue::HiddenDuplicate {
            field,
            player_id,
            slot_index,
            shown,
        } => warn!(
            "Turn {}: player {} ({:?}) shares slot {} with {:?} and is hidden",
            turn_id, player_id, field, slot_index, shown
        ),
        SlotIssue::Unplaced { field, player_id } => warn!(
            "Turn {}: player {} ({:?}) has no complete side/position and is not shown",
            turn_id, player_id, field
        ),
    }
}

/// Fetch a turn, compute an edit locally and submit it. Invalid edits are
/// refused before any write.
async fn edit_turn<F>(client: &ApiClient, turn_id: i64, build: F) -> Result<()>
where
    F: FnOnce(&PregameTurn) -> Result<SlotEdit, SlotError>,
{
    let turn = client.get_pregame_turn(turn_id).await?;
    let edit = build(&turn).with_context(|| format!("Refused edit on turn {}", turn_id))?;
    if edit.is_noop() {
        println!("Nothing to change.");
        print_turn_header(&turn);
        print_slots(&turn);
        return Ok(());
    }

    let update = edit.to_update();
    info!(
        "Turn {}: submitting {} intent(s): {}",
        turn_id,
        edit.intents().len(),
        serde_json::to_string(&update)?
    );
    let updated = client.update_pregame_turn(turn_id, &update).await?;
    print_turn_header(&updated);
    print_slots(&updated);
    Ok(())
}

pub async fn run_turns(config_path: &Path, cmd: TurnsCommand) -> Result<()> {
    let (cfg, client) = connect_logged_in(config_path)?;
    let club_id = cfg.club.id;

    match cmd {
        TurnsCommand::List { date, today } => {
            let date = if today {
                Some(calendar::today_in(cfg.club.tz()?))
            } else {
                date
            };
            let resp = client.list_pregame_turns(club_id, date).await?;
            let by_day = calendar::group_by_date(&resp.pregame_turns);
            if by_day.is_empty() {
                println!("No turns.");
            }
            for (day, turns) in &by_day {
                let weekday = calendar::WEEKDAY_LABELS[calendar::weekday_bucket(*day)];
                println!("\n{} {}", weekday, day);
                for t in turns {
                    println!(
                        "  [{}] {}-{}  {:<12} {:<14} {}/4 {}",
                        t.id,
                        t.start_time,
                        t.end_time,
                        t.court_name.as_deref().unwrap_or("-"),
                        t.status,
                        t.players_present(),
                        slots::turn_label(t).as_str(),
                    );
                }
            }
        }
        TurnsCommand::Show { id } => {
            let turn = client.get_pregame_turn(id).await?;
            print_turn_header(&turn);
            print_slots(&turn);
            if let Some(ref msg) = turn.cancellation_message {
                println!("  cancelled: {}", msg);
            }
            report_notifications_marked(id, client.mark_turn_notifications_read(id).await);
        }
        TurnsCommand::Create {
            date,
            start,
            court,
            player,
            side,
            position,
        } => {
            let resp = client
                .create_turn_by_club(&CreateTurnByClub {
                    club_id,
                    start_time: start,
                    target_date: date.format("%Y-%m-%d").to_string(),
                    court_id: court,
                    organizer_player_id: player,
                    player_side: side,
                    player_position: position,
                    category_restricted: None,
                    category_restriction_type: None,
                    is_mixed_match: None,
                    free_category: None,
                })
                .await?;
            if !resp.success {
                bail!("Turn was not created: {}", resp.message);
            }
            println!("Created turn {}", resp.pregame_turn.id);
            print_slots(&resp.pregame_turn);
        }
        TurnsCommand::Assign { turn, player, slot } => {
            edit_turn(&client, turn, |t| slots::assign_player(t, slot, player)).await?
        }
        TurnsCommand::Remove { turn, player } => {
            edit_turn(&client, turn, |t| slots::remove_player(t, player)).await?
        }
        TurnsCommand::SetSide { turn, player, side } => {
            edit_turn(&client, turn, |t| {
                slots::change_side_or_position(t, player, AxisValue::Side(side))
            })
            .await?
        }
        TurnsCommand::SetPosition {
            turn,
            player,
            position,
        } => {
            edit_turn(&client, turn, |t| {
                slots::change_side_or_position(t, player, AxisValue::Position(position))
            })
            .await?
        }
        TurnsCommand::Move { turn, from, to } => {
            edit_turn(&client, turn, |t| slots::drag_reorder(t, from, to)).await?
        }
        TurnsCommand::Cancel { id, message } => {
            let update = PregameTurnUpdate {
                status: Some(TurnStatus::Cancelled),
                cancellation_message: message,
                ..Default::default()
            };
            let turn = client.update_pregame_turn(id, &update).await?;
            println!("Turn {} is now {}", turn.id, turn.status);
        }
    }
    Ok(())
}

/// Clearing a turn's notifications is a side effect of viewing it; failures
/// are logged, not returned.
fn report_notifications_marked(turn_id: i64, result: ApiResult<usize>) -> usize {
    match result {
        Ok(0) => 0,
        Ok(marked) => {
            info!("Marked {} notification(s) about turn {} as read", marked, turn_id);
            marked
        }
        Err(e) => {
            warn!("Could not mark notifications of turn {} as read: {}", turn_id, e);
            0
        }
    }
}

pub async fn run_stats(config_path: &Path, json: bool) -> Result<()> {
    let (cfg, client) = connect_logged_in(config_path)?;
    let today = calendar::today_in(cfg.club.tz()?);
    let s = stats::fetch_club_statistics(&client, cfg.club.id, today).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&s)?);
        return Ok(());
    }

    println!("Statistics for club {} ({})\n", cfg.club.id, s.today);
    println!(
        "Courts:   {} total, {} available, {} in maintenance",
        s.total_courts, s.available_courts, s.maintenance_courts
    );
    let t = &s.today_turns;
    println!(
        "Today:    {} turns ({} completed, {} ready, {} pending, {} available)",
        t.total, t.completed, t.ready_to_play, t.pending, t.available
    );
    println!(
        "Revenue:  {} today, {} this month",
        format_money(s.today_revenue),
        format_money(s.month_revenue)
    );
    println!("Players:  {} unique this month", s.unique_players_this_month);
    if let Some(ref c) = s.most_used_court {
        println!("Busiest:  {} ({} turns today)", c.court_name, c.turn_count);
    }

    println!("\nTurns per weekday (this month):");
    for d in &s.occupancy_by_day_of_week {
        println!("  {:<10} {}", d.day, d.occupancy);
    }

    println!("\nTurns by status (this month):");
    for st in &s.turns_by_status {
        println!("  {:<14} {}", st.status, st.count);
    }

    let earning: Vec<_> = s.revenue_by_day.iter().filter(|r| r.revenue > 0).collect();
    if !earning.is_empty() {
        println!("\nRevenue by day (last {} days):", stats::REVENUE_WINDOW_DAYS);
        for r in earning {
            println!("  {}  {}", r.date, format_money(r.revenue));
        }
    }

    if !s.alerts.is_empty() {
        println!("\nAlerts:");
        for a in &s.alerts {
            println!("  [{:?}] {}", a.severity, a.message);
        }
    }
    Ok(())
}

pub async fn run_notifications(config_path: &Path, cmd: NotificationsCommand) -> Result<()> {
    let (_, client) = connect_logged_in(config_path)?;

    match cmd {
        NotificationsCommand::List { unread } => {
            let resp = client.list_notifications().await?;
            println!("{} unread\n", resp.unread_count);
            for n in resp.notifications.iter().filter(|n| !unread || !n.is_read) {
                println!(
                    "  {} [{}] {}: {}",
                    if n.is_read { " " } else { "*" },
                    n.id,
                    n.title,
                    n.message
                );
            }
        }
        NotificationsCommand::Read { id } => {
            let resp = client.mark_notification_read(id).await?;
            println!("{}", resp.message);
        }
        NotificationsCommand::ReadAll => {
            let resp = client.mark_all_notifications_read().await?;
            println!("{}", resp.message);
        }
        NotificationsCommand::Delete { id } => {
            let resp = client.delete_notification(id).await?;
            println!("{}", resp.message);
        }
        NotificationsCommand::RegisterDevice { token } => {
            let resp = client.register_device_token(&token).await?;
            println!("Registered {} device token ({})", resp.device_type, resp.id);
        }
    }
    Ok(())
}

pub async fn run_invitations(config_path: &Path, cmd: InvitationsCommand) -> Result<()> {
    let (_, client) = connect_logged_in(config_path)?;

    match cmd {
        InvitationsCommand::List { turn } => {
            let resp = client.list_invitations(turn).await?;
            if resp.invitations.is_empty() {
                println!("No invitations for turn {}.", turn);
            }
            for inv in &resp.invitations {
                println!(
                    "  [{}] {} -> {}  {}",
                    inv.id,
                    inv.inviter_name.as_deref().unwrap_or("?"),
                    inv.invited_player_name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", inv.invited_player_id)),
                    inv.status_label()
                );
            }
        }
        InvitationsCommand::Cancel { id } => {
            let resp = client.cancel_invitation(id).await?;
            println!("{}", resp.message);
        }
    }
    Ok(())
}

pub async fn run_players(
    config_path: &Path,
    query: Option<&str>,
    turn: Option<i64>,
    id: Option<i64>,
) -> Result<()> {
    let (_, client) = connect_logged_in(config_path)?;
    let players = match id {
        Some(id) => vec![client.get_player(id).await?],
        None => client.search_players(query, turn).await?,
    };
    if players.is_empty() {
        println!("No players found.");
    }
    for p in &players {
        println!(
            "  [{}] {:<24} {:<28} {}",
            p.id,
            p.full_name(),
            p.email,
            p.category.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn run_matches(
    config_path: &Path,
    id: Option<i64>,
    status: Option<String>,
    limit: Option<u32>,
) -> Result<()> {
    let (cfg, client) = connect_logged_in(config_path)?;
    if let Some(id) = id {
        let m = client.get_match(id).await?;
        println!(
            "Match {}  {} - {}  {}  {}",
            m.id,
            m.start_time,
            m.end_time,
            m.court_name.as_deref().unwrap_or("-"),
            m.status
        );
        if let Some(ref creator) = m.creator_name {
            println!("  created by {}", creator);
        }
        for p in &m.players {
            println!("  [{}] {} <{}>", p.id, p.name, p.email);
        }
        if let Some(ref score) = m.score {
            println!("  score: {}", score);
        }
        return Ok(());
    }
    let filters = MatchFilters {
        club_id: Some(cfg.club.id),
        status,
        limit,
        ..Default::default()
    };
    let matches = client.list_matches(&filters).await?;
    if matches.is_empty() {
        println!("No matches.");
    }
    for m in &matches {
        let players: Vec<&str> = m.players.iter().map(|p| p.name.as_str()).collect();
        println!(
            "  [{}] {}  {}  {}  {}{}",
            m.id,
            m.start_time,
            m.court_name.as_deref().unwrap_or("-"),
            m.status,
            players.join(", "),
            m.score
                .as_deref()
                .map(|s| format!("  ({})", s))
                .unwrap_or_default()
        );
    }
    Ok(())
}
