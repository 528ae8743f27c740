mod calendar;
mod client;
mod commands;
mod config;
mod models;
mod services;
mod session;
mod slots;
mod stats;
mod web;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use models::{CourtPosition, Side};

/// Padel club admin: courts, turns, player slots and club statistics.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short = 'c', long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Print request/response details
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session next to the config file
    Login {
        /// Override username from config
        #[arg(short = 'u', long)]
        user: Option<String>,

        /// Override password from config
        #[arg(short = 'p', long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in admin and token expiry
    Whoami,

    /// Change the admin password
    ChangePassword {
        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,
    },

    /// Manage courts
    #[command(subcommand)]
    Courts(CourtsCommand),

    /// Show or edit the club
    #[command(subcommand)]
    Club(ClubCommand),

    /// List turns and edit their player slots
    #[command(subcommand)]
    Turns(TurnsCommand),

    /// Club statistics and alerts
    Stats {
        /// Print the raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Admin notifications
    #[command(subcommand)]
    Notifications(NotificationsCommand),

    /// Invitations of a turn
    #[command(subcommand)]
    Invitations(InvitationsCommand),

    /// Search players
    Players {
        /// Name or email fragment
        query: Option<String>,

        /// Only players eligible for this turn
        #[arg(long)]
        turn: Option<i64>,

        /// Show a single player instead of searching
        #[arg(long, conflicts_with_all = ["query", "turn"])]
        id: Option<i64>,
    },

    /// List matches of the club, or show one
    Matches {
        id: Option<i64>,

        /// Filter by status (e.g. "scheduled", "finished")
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Start web dashboard server
    Serve {
        /// Listen address (e.g. "0.0.0.0:3000")
        #[arg(short = 'a', long, default_value = "0.0.0.0:3010")]
        addr: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourtsCommand {
    /// List the club's courts
    List,

    /// Show one court
    Show { id: i64 },

    /// Create a court
    Add {
        name: String,

        /// One of artificial_grass, cement, carpet
        #[arg(long, default_value = "artificial_grass")]
        surface: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        indoor: bool,

        #[arg(long)]
        lighting: bool,
    },

    /// Edit a court; only the given fields change
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        surface: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        indoor: Option<bool>,

        #[arg(long)]
        lighting: Option<bool>,

        /// false puts the court under maintenance
        #[arg(long)]
        available: Option<bool>,
    },

    /// Delete a court
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ClubCommand {
    /// Show club details and opening days
    Show,

    /// Edit club details; only the given fields change
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// HH:MM
        #[arg(long)]
        opening_time: Option<String>,

        /// HH:MM
        #[arg(long)]
        closing_time: Option<String>,

        #[arg(long)]
        turn_duration: Option<u32>,

        /// Minor currency units
        #[arg(long)]
        price: Option<i64>,
    },

    /// Regenerate bookable turns after a schedule change
    GenerateTurns {
        #[arg(long, default_value_t = services::clubs::DEFAULT_DAYS_AHEAD)]
        days_ahead: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum TurnsCommand {
    /// List turns grouped by day
    List {
        /// Only this day (YYYY-MM-DD); defaults to all turns
        #[arg(short = 'd', long)]
        date: Option<NaiveDate>,

        /// Only today's turns in the club timezone
        #[arg(long, conflicts_with = "date")]
        today: bool,
    },

    /// Show a turn with its four slots
    Show { id: i64 },

    /// Create a turn on behalf of a player
    Create {
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// HH:MM
        #[arg(long)]
        start: String,

        #[arg(long)]
        court: i64,

        /// Organizing player id
        #[arg(long)]
        player: i64,

        #[arg(long)]
        side: Option<Side>,

        #[arg(long)]
        position: Option<CourtPosition>,
    },

    /// Put a player on a slot (0..3: izq/drive, izq/reves, der/drive, der/reves)
    Assign {
        turn: i64,
        player: i64,
        #[arg(long)]
        slot: usize,
    },

    /// Take a player out of a turn
    Remove { turn: i64, player: i64 },

    /// Change a player's side, swapping with whoever holds the target slot
    SetSide { turn: i64, player: i64, side: Side },

    /// Change a player's court position, swapping with whoever holds the target slot
    SetPosition {
        turn: i64,
        player: i64,
        position: CourtPosition,
    },

    /// Move the player on slot FROM to slot TO
    Move { turn: i64, from: usize, to: usize },

    /// Cancel a turn
    Cancel {
        id: i64,

        /// Message shown to the players
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotificationsCommand {
    /// List notifications
    List {
        /// Only unread ones
        #[arg(long)]
        unread: bool,
    },

    /// Mark one notification as read
    Read { id: i64 },

    /// Mark every notification as read
    ReadAll,

    /// Delete a notification
    Delete { id: i64 },

    /// Register a push token for this admin
    RegisterDevice { token: String },
}

#[derive(Subcommand, Debug)]
pub enum InvitationsCommand {
    /// List invitations of a turn
    List { turn: i64 },

    /// Cancel an invitation
    Cancel { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let path = &cli.config;
    match cli.command {
        Command::Serve { addr } => {
            let cfg = config::load_config(path)?;
            web::serve(cfg, path, &addr).await?;
        }
        Command::Login { user, password } => commands::run_login(path, user, password).await?,
        Command::Logout => commands::run_logout(path)?,
        Command::Whoami => commands::run_whoami(path)?,
        Command::ChangePassword { current, new } => {
            commands::run_change_password(path, &current, &new).await?
        }
        Command::Courts(cmd) => commands::run_courts(path, cmd).await?,
        Command::Club(cmd) => commands::run_club(path, cmd).await?,
        Command::Turns(cmd) => commands::run_turns(path, cmd).await?,
        Command::Stats { json } => commands::run_stats(path, json).await?,
        Command::Notifications(cmd) => commands::run_notifications(path, cmd).await?,
        Command::Invitations(cmd) => commands::run_invitations(path, cmd).await?,
        Command::Players { query, turn, id } => {
            commands::run_players(path, query.as_deref(), turn, id).await?
        }
        Command::Matches { id, status, limit } => {
            commands::run_matches(path, id, status, limit).await?
        }
    }

    Ok(())
}
