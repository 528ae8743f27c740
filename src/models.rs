use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar;

/// Backend turn status. Values this tool does not know are kept verbatim in
/// `Other`; `Unknown` is only used when the status is missing or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TurnStatus {
    Available,
    Pending,
    ReadyToPlay,
    Cancelled,
    Completed,
    Other(String),
    #[default]
    Unknown,
}

impl TurnStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => TurnStatus::Unknown,
            "AVAILABLE" => TurnStatus::Available,
            "PENDING" => TurnStatus::Pending,
            "READY_TO_PLAY" => TurnStatus::ReadyToPlay,
            "CANCELLED" => TurnStatus::Cancelled,
            "COMPLETED" => TurnStatus::Completed,
            other => TurnStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TurnStatus::Available => "AVAILABLE",
            TurnStatus::Pending => "PENDING",
            TurnStatus::ReadyToPlay => "READY_TO_PLAY",
            TurnStatus::Cancelled => "CANCELLED",
            TurnStatus::Completed => "COMPLETED",
            TurnStatus::Other(raw) => raw,
            TurnStatus::Unknown => "UNKNOWN",
        }
    }

    /// Statuses that count towards revenue.
    pub fn is_billable(&self) -> bool {
        matches!(self, TurnStatus::Completed | TurnStatus::ReadyToPlay)
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for TurnStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TurnStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(TurnStatus::Unknown, TurnStatus::parse))
    }
}

/// Paddle-hand convention of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Drive,
    Reves,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Drive => "drive",
            Side::Reves => "reves",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drive" => Ok(Side::Drive),
            "reves" | "revés" => Ok(Side::Reves),
            other => Err(format!("unknown side '{other}' (expected drive or reves)")),
        }
    }
}

/// Half of the court a player stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtPosition {
    Izquierda,
    Derecha,
}

impl CourtPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourtPosition::Izquierda => "izquierda",
            CourtPosition::Derecha => "derecha",
        }
    }
}

impl fmt::Display for CourtPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CourtPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "izquierda" | "left" => Ok(CourtPosition::Izquierda),
            "derecha" | "right" => Ok(CourtPosition::Derecha),
            other => Err(format!(
                "unknown court position '{other}' (expected izquierda or derecha)"
            )),
        }
    }
}

/// One of the four `playerN_*` field groups of a turn record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlayerField {
    Player1,
    Player2,
    Player3,
    Player4,
}

impl PlayerField {
    /// Stored-field order, which is also first-match precedence.
    pub const ALL: [PlayerField; 4] = [
        PlayerField::Player1,
        PlayerField::Player2,
        PlayerField::Player3,
        PlayerField::Player4,
    ];

    pub fn index(&self) -> usize {
        match self {
            PlayerField::Player1 => 0,
            PlayerField::Player2 => 1,
            PlayerField::Player3 => 2,
            PlayerField::Player4 => 3,
        }
    }

    /// 1-based number used in the wire keys (`player3_id`).
    pub fn number(&self) -> usize {
        self.index() + 1
    }
}

/// The id/side/position triple stored in one player field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerEntry {
    pub player_id: Option<i64>,
    pub side: Option<Side>,
    pub court_position: Option<CourtPosition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssignedPlayer {
    pub position: String,
    pub player_id: i64,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub player_side: Option<Side>,
    #[serde(default)]
    pub player_court_position: Option<CourtPosition>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PregameTurn {
    pub id: i64,
    #[serde(default)]
    pub turn_id: Option<i64>,
    #[serde(default)]
    pub court_id: Option<i64>,
    #[serde(default)]
    pub court_name: Option<String>,
    #[serde(default)]
    pub selected_court_id: Option<i64>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// Minor currency units.
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub status: TurnStatus,
    #[serde(default)]
    pub player1_id: Option<i64>,
    #[serde(default)]
    pub player1_side: Option<Side>,
    #[serde(default)]
    pub player1_court_position: Option<CourtPosition>,
    #[serde(default)]
    pub player2_id: Option<i64>,
    #[serde(default)]
    pub player2_side: Option<Side>,
    #[serde(default)]
    pub player2_court_position: Option<CourtPosition>,
    #[serde(default)]
    pub player3_id: Option<i64>,
    #[serde(default)]
    pub player3_side: Option<Side>,
    #[serde(default)]
    pub player3_court_position: Option<CourtPosition>,
    #[serde(default)]
    pub player4_id: Option<i64>,
    #[serde(default)]
    pub player4_side: Option<Side>,
    #[serde(default)]
    pub player4_court_position: Option<CourtPosition>,
    #[serde(default)]
    pub category_restricted: Option<bool>,
    #[serde(default)]
    pub category_restriction_type: Option<String>,
    #[serde(default)]
    pub organizer_category: Option<String>,
    #[serde(default)]
    pub is_mixed_match: Option<bool>,
    #[serde(default)]
    pub free_category: Option<String>,
    #[serde(default)]
    pub cancellation_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub players_count: Option<u32>,
    #[serde(default)]
    pub players_needed: Option<u32>,
    #[serde(default)]
    pub assigned_players: Option<Vec<AssignedPlayer>>,
}

impl PregameTurn {
    pub fn entry(&self, field: PlayerField) -> PlayerEntry {
        let (player_id, side, court_position) = match field {
            PlayerField::Player1 => (
                self.player1_id,
                self.player1_side,
                self.player1_court_position,
            ),
            PlayerField::Player2 => (
                self.player2_id,
                self.player2_side,
                self.player2_court_position,
            ),
            PlayerField::Player3 => (
                self.player3_id,
                self.player3_side,
                self.player3_court_position,
            ),
            PlayerField::Player4 => (
                self.player4_id,
                self.player4_side,
                self.player4_court_position,
            ),
        };
        PlayerEntry {
            player_id,
            side,
            court_position,
        }
    }

    pub fn set_entry(&mut self, field: PlayerField, entry: PlayerEntry) {
        let (id, side, court_position) = match field {
            PlayerField::Player1 => (
                &mut self.player1_id,
                &mut self.player1_side,
                &mut self.player1_court_position,
            ),
            PlayerField::Player2 => (
                &mut self.player2_id,
                &mut self.player2_side,
                &mut self.player2_court_position,
            ),
            PlayerField::Player3 => (
                &mut self.player3_id,
                &mut self.player3_side,
                &mut self.player3_court_position,
            ),
            PlayerField::Player4 => (
                &mut self.player4_id,
                &mut self.player4_side,
                &mut self.player4_court_position,
            ),
        };
        *id = entry.player_id;
        *side = entry.side;
        *court_position = entry.court_position;
    }

    /// All four entries in stored-field order.
    pub fn entries(&self) -> [(PlayerField, PlayerEntry); 4] {
        PlayerField::ALL.map(|f| (f, self.entry(f)))
    }

    pub fn player_ids(&self) -> Vec<i64> {
        self.entries()
            .iter()
            .filter_map(|(_, e)| e.player_id)
            .collect()
    }

    pub fn players_present(&self) -> usize {
        self.player_ids().len()
    }

    pub fn field_of(&self, player_id: i64) -> Option<PlayerField> {
        self.entries()
            .iter()
            .find(|(_, e)| e.player_id == Some(player_id))
            .map(|(f, _)| *f)
    }

    /// Calendar day of the turn, ignoring any time component.
    pub fn day(&self) -> Option<NaiveDate> {
        calendar::parse_turn_date(&self.date)
    }

    /// Apply a partial update locally. Absent fields are left untouched.
    pub fn apply(&mut self, update: &PregameTurnUpdate) {
        if let Some(ref status) = update.status {
            self.status = status.clone();
        }
        if let Some(court) = update.selected_court_id {
            self.selected_court_id = Some(court);
        }
        if let Some(ref date) = update.date {
            self.date = date.clone();
        }
        if let Some(ref start) = update.start_time {
            self.start_time = start.clone();
        }
        if let Some(ref end) = update.end_time {
            self.end_time = end.clone();
        }
        if let Some(ref msg) = update.cancellation_message {
            self.cancellation_message = Some(msg.clone());
        }
        for field in PlayerField::ALL {
            let patch = &update.players.0[field.index()];
            if patch.is_empty() {
                continue;
            }
            let mut entry = self.entry(field);
            if let Some(id) = patch.player_id {
                entry.player_id = id;
            }
            if let Some(side) = patch.side {
                entry.side = side;
            }
            if let Some(pos) = patch.court_position {
                entry.court_position = pos;
            }
            self.set_entry(field, entry);
        }
    }
}

/// Tri-state change to one player field: `None` leaves the key out of the
/// payload, `Some(None)` sends `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerPatch {
    pub player_id: Option<Option<i64>>,
    pub side: Option<Option<Side>>,
    pub court_position: Option<Option<CourtPosition>>,
}

impl PlayerPatch {
    pub fn is_empty(&self) -> bool {
        self.player_id.is_none() && self.side.is_none() && self.court_position.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerPatches(pub [PlayerPatch; 4]);

impl Serialize for PlayerPatches {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for field in PlayerField::ALL {
            let patch = &self.0[field.index()];
            let n = field.number();
            if let Some(id) = &patch.player_id {
                map.serialize_entry(&format!("player{n}_id"), id)?;
            }
            if let Some(side) = &patch.side {
                map.serialize_entry(&format!("player{n}_side"), side)?;
            }
            if let Some(pos) = &patch.court_position {
                map.serialize_entry(&format!("player{n}_court_position"), pos)?;
            }
        }
        map.end()
    }
}

/// Body of `PUT /pregame-turns/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PregameTurnUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TurnStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_court_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_message: Option<String>,
    #[serde(flatten)]
    pub players: PlayerPatches,
}

impl PregameTurnUpdate {
    pub fn player_mut(&mut self, field: PlayerField) -> &mut PlayerPatch {
        &mut self.players.0[field.index()]
    }

    pub fn player(&self, field: PlayerField) -> &PlayerPatch {
        &self.players.0[field.index()]
    }

    pub fn is_empty(&self) -> bool {
        *self == PregameTurnUpdate::default()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PregameTurnsResponse {
    #[serde(default)]
    pub club_id: Option<i64>,
    #[serde(default)]
    pub club_name: Option<String>,
    #[serde(default)]
    pub pregame_turns: Vec<PregameTurn>,
    #[serde(default)]
    pub total_pregame_turns: Option<u32>,
}

/// Query parameters of `POST /pregame-turns/create-turn-by-club`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTurnByClub {
    pub club_id: i64,
    pub start_time: String,
    pub target_date: String,
    pub court_id: i64,
    pub organizer_player_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_position: Option<CourtPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_restricted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_restriction_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mixed_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTurnResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub turn_id: Option<i64>,
    pub pregame_turn: PregameTurn,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Court {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub club_id: Option<i64>,
    #[serde(default)]
    pub surface_type: Option<String>,
    #[serde(default)]
    pub is_indoor: bool,
    #[serde(default)]
    pub has_lighting: bool,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourtCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub club_id: i64,
    pub surface_type: String,
    pub is_indoor: bool,
    pub has_lighting: bool,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CourtUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_indoor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_lighting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

pub const SURFACE_TYPES: [&str; 3] = ["artificial_grass", "cement", "carpet"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Club {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub opening_time: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
    #[serde(default)]
    pub turn_duration_minutes: Option<u32>,
    /// Minor currency units.
    #[serde(default)]
    pub price_per_turn: Option<i64>,
    #[serde(default)]
    pub monday_open: Option<bool>,
    #[serde(default)]
    pub tuesday_open: Option<bool>,
    #[serde(default)]
    pub wednesday_open: Option<bool>,
    #[serde(default)]
    pub thursday_open: Option<bool>,
    #[serde(default)]
    pub friday_open: Option<bool>,
    #[serde(default)]
    pub saturday_open: Option<bool>,
    #[serde(default)]
    pub sunday_open: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Club {
    /// Opening flags Monday..Sunday; a missing flag counts as open.
    pub fn open_days(&self) -> [bool; 7] {
        [
            self.monday_open,
            self.tuesday_open,
            self.wednesday_open,
            self.thursday_open,
            self.friday_open,
            self.saturday_open,
            self.sunday_open,
        ]
        .map(|d| d.unwrap_or(true))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClubUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_turn: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub preferred_side: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchPlayer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Match {
    pub id: i64,
    pub court_id: i64,
    #[serde(default)]
    pub court_name: Option<String>,
    #[serde(default)]
    pub club_id: Option<i64>,
    #[serde(default)]
    pub club_name: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub players: Vec<MatchPlayer>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub title: String,
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Notification {
    /// Turn id carried in the notification payload, if any.
    pub fn turn_id(&self) -> Option<i64> {
        self.data
            .as_ref()
            .and_then(|d| d.get("turn_id"))
            .and_then(|v| v.as_i64())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsListResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceTokenCreate {
    pub token: String,
    pub device_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTokenResponse {
    pub id: i64,
    pub token: String,
    pub device_type: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Invitation {
    pub id: i64,
    pub turn_id: i64,
    pub inviter_id: i64,
    pub invited_player_id: i64,
    pub status: InvitationStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_external_request: bool,
    #[serde(default)]
    pub inviter_name: Option<String>,
    #[serde(default)]
    pub invited_player_name: Option<String>,
}

impl Invitation {
    pub fn status_label(&self) -> &'static str {
        match self.status {
            InvitationStatus::Pending if self.is_external_request => "Solicitud pendiente",
            InvitationStatus::Pending => "Invitación pendiente",
            InvitationStatus::Accepted => "Aceptada",
            InvitationStatus::Declined => "Rechazada",
            InvitationStatus::Expired => "Expirada",
            InvitationStatus::Cancelled => "Cancelada",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub invitations: Vec<Invitation>,
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionUser {
    pub id: serde_json::Value,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub club_id: Option<i64>,
    #[serde(default)]
    pub must_change_password: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_deserializes_flat_player_fields() {
        let json = r#"{
            "id": 7, "court_id": 2, "date": "2024-01-05T00:00:00",
            "start_time": "18:00", "end_time": "19:30", "price": 5000,
            "status": "READY_TO_PLAY",
            "player1_id": 11, "player1_side": "drive", "player1_court_position": "izquierda",
            "player3_id": 33, "player3_side": "reves", "player3_court_position": "derecha"
        }"#;
        let turn: PregameTurn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.status, TurnStatus::ReadyToPlay);
        assert_eq!(turn.player_ids(), vec![11, 33]);
        assert_eq!(
            turn.entry(PlayerField::Player3),
            PlayerEntry {
                player_id: Some(33),
                side: Some(Side::Reves),
                court_position: Some(CourtPosition::Derecha),
            }
        );
        assert_eq!(turn.day(), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn unrecognised_status_keeps_raw_value() {
        let turn: PregameTurn = serde_json::from_str(r#"{"id": 1, "status": "ARCHIVED"}"#).unwrap();
        assert_eq!(turn.status, TurnStatus::Other("ARCHIVED".into()));
        assert_eq!(turn.status.as_str(), "ARCHIVED");
        assert_eq!(serde_json::to_value(&turn.status).unwrap(), "ARCHIVED");
    }

    #[test]
    fn missing_or_empty_status_is_unknown() {
        let bodies = [
            r#"{"id": 1}"#,
            r#"{"id": 1, "status": ""}"#,
            r#"{"id": 1, "status": null}"#,
        ];
        for json in bodies {
            let turn: PregameTurn = serde_json::from_str(json).unwrap();
            assert_eq!(turn.status, TurnStatus::Unknown);
            assert_eq!(turn.status.as_str(), "UNKNOWN");
        }
        assert_eq!(TurnStatus::parse("READY_TO_PLAY"), TurnStatus::ReadyToPlay);
    }

    #[test]
    fn update_serializes_only_touched_fields() {
        let mut update = PregameTurnUpdate::default();
        update.player_mut(PlayerField::Player2).player_id = Some(None);
        update.player_mut(PlayerField::Player2).side = Some(None);
        update.player_mut(PlayerField::Player4).court_position =
            Some(Some(CourtPosition::Derecha));

        let value = serde_json::to_value(&update).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert!(obj["player2_id"].is_null());
        assert!(obj["player2_side"].is_null());
        assert_eq!(obj["player4_court_position"], "derecha");
    }

    #[test]
    fn apply_respects_tri_state_patch() {
        let mut turn = PregameTurn {
            id: 1,
            player1_id: Some(5),
            player1_side: Some(Side::Drive),
            player1_court_position: Some(CourtPosition::Izquierda),
            ..Default::default()
        };
        let mut update = PregameTurnUpdate::default();
        update.player_mut(PlayerField::Player1).side = Some(Some(Side::Reves));
        turn.apply(&update);
        assert_eq!(turn.player1_id, Some(5));
        assert_eq!(turn.player1_side, Some(Side::Reves));
        assert_eq!(turn.player1_court_position, Some(CourtPosition::Izquierda));

        update.player_mut(PlayerField::Player1).player_id = Some(None);
        turn.apply(&update);
        assert_eq!(turn.player1_id, None);
    }

    #[test]
    fn side_and_position_parse_from_cli_strings() {
        assert_eq!("Revés".parse::<Side>(), Ok(Side::Reves));
        assert_eq!("DRIVE".parse::<Side>(), Ok(Side::Drive));
        assert_eq!("left".parse::<CourtPosition>(), Ok(CourtPosition::Izquierda));
        assert!("middle".parse::<CourtPosition>().is_err());
    }

    #[test]
    fn club_open_days_default_to_open() {
        let club = Club {
            id: 1,
            name: "Club".into(),
            sunday_open: Some(false),
            ..Default::default()
        };
        assert_eq!(club.open_days(), [true, true, true, true, true, true, false]);
    }
}
