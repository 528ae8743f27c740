//! Mapping between a turn's four stored player fields and the four canonical
//! court slots, plus the edits (assign, remove, side/position change, drag)
//! expressed as typed intents that compile into one partial update.
//!
//! Slots are matched on (side, position), never on field index. When stored
//! data puts two players on the same combination the first field wins and the
//! other one is reported by [`consistency_report`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    CourtPosition, PlayerEntry, PlayerField, PlayerPatch, PregameTurn, PregameTurnUpdate, Side,
    TurnStatus,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("turn is full: all four player fields are taken")]
    TurnFull,

    #[error("player {0} is not in this turn")]
    PlayerNotInTurn(i64),

    #[error("player {0} is already in this turn")]
    AlreadyInTurn(i64),

    #[error("slot {0} is already occupied")]
    SlotOccupied(usize),

    #[error("slot index {0} is out of range (0..=3)")]
    InvalidSlot(usize),
}

/// One of the four fixed (position, side) combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalSlot {
    pub position: CourtPosition,
    pub side: Side,
}

/// Render order of the slots.
pub const CANONICAL_SLOTS: [CanonicalSlot; 4] = [
    CanonicalSlot {
        position: CourtPosition::Izquierda,
        side: Side::Drive,
    },
    CanonicalSlot {
        position: CourtPosition::Izquierda,
        side: Side::Reves,
    },
    CanonicalSlot {
        position: CourtPosition::Derecha,
        side: Side::Drive,
    },
    CanonicalSlot {
        position: CourtPosition::Derecha,
        side: Side::Reves,
    },
];

impl CanonicalSlot {
    pub fn at(index: usize) -> Result<Self, SlotError> {
        CANONICAL_SLOTS
            .get(index)
            .copied()
            .ok_or(SlotError::InvalidSlot(index))
    }

    pub fn index_of(position: CourtPosition, side: Side) -> usize {
        CANONICAL_SLOTS
            .iter()
            .position(|s| s.position == position && s.side == side)
            .unwrap_or_default()
    }

    /// True when the entry holds a player standing on this combination.
    fn holds(&self, entry: &PlayerEntry) -> bool {
        entry.player_id.is_some()
            && entry.side == Some(self.side)
            && entry.court_position == Some(self.position)
    }

    pub fn axis_value(&self, axis: Axis) -> AxisValue {
        match axis {
            Axis::Side => AxisValue::Side(self.side),
            Axis::Position => AxisValue::Position(self.position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupant {
    pub player_id: i64,
    pub field: PlayerField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub index: usize,
    pub position: CourtPosition,
    pub side: Side,
    pub occupant: Option<Occupant>,
}

impl Slot {
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn player_id(&self) -> Option<i64> {
        self.occupant.map(|o| o.player_id)
    }
}

/// Project a turn onto the four canonical slots, in canonical order.
pub fn to_slots(turn: &PregameTurn) -> [Slot; 4] {
    let entries = turn.entries();
    std::array::from_fn(|index| {
        let canonical = CANONICAL_SLOTS[index];
        let occupant = entries.iter().find_map(|(field, entry)| match entry.player_id {
            Some(player_id) if canonical.holds(entry) => Some(Occupant {
                player_id,
                field: *field,
            }),
            _ => None,
        });
        Slot {
            index,
            position: canonical.position,
            side: canonical.side,
            occupant,
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Side,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisValue {
    Side(Side),
    Position(CourtPosition),
}

impl AxisValue {
    pub fn axis(&self) -> Axis {
        match self {
            AxisValue::Side(_) => Axis::Side,
            AxisValue::Position(_) => Axis::Position,
        }
    }

    fn read(axis: Axis, entry: &PlayerEntry) -> Option<AxisValue> {
        match axis {
            Axis::Side => entry.side.map(AxisValue::Side),
            Axis::Position => entry.court_position.map(AxisValue::Position),
        }
    }

    fn side(&self) -> Option<Side> {
        match self {
            AxisValue::Side(s) => Some(*s),
            AxisValue::Position(_) => None,
        }
    }

    fn position(&self) -> Option<CourtPosition> {
        match self {
            AxisValue::Position(p) => Some(*p),
            AxisValue::Side(_) => None,
        }
    }
}

/// A single explicit change to the player fields of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotIntent {
    /// Put a player into an empty field, standing on `slot`.
    SetPlayer {
        field: PlayerField,
        player_id: i64,
        slot: CanonicalSlot,
    },
    /// Null the id, side and position of a field.
    ClearPlayer { field: PlayerField },
    /// Change one axis of one field.
    SetAxis { field: PlayerField, value: AxisValue },
    /// `field` takes `value`; `other` takes `displaced` on the same axis.
    SwapAxis {
        field: PlayerField,
        value: AxisValue,
        other: PlayerField,
        displaced: Option<AxisValue>,
    },
}

/// Ordered intents produced by one user action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotEdit {
    intents: Vec<SlotIntent>,
}

impl SlotEdit {
    fn single(intent: SlotIntent) -> Self {
        Self {
            intents: vec![intent],
        }
    }

    pub fn intents(&self) -> &[SlotIntent] {
        &self.intents
    }

    pub fn is_noop(&self) -> bool {
        self.intents.is_empty()
    }

    /// Compile the intents into the wire-level partial update.
    pub fn to_update(&self) -> PregameTurnUpdate {
        let mut update = PregameTurnUpdate::default();
        for intent in &self.intents {
            match *intent {
                SlotIntent::SetPlayer {
                    field,
                    player_id,
                    slot,
                } => {
                    let patch = update.player_mut(field);
                    patch.player_id = Some(Some(player_id));
                    patch.side = Some(Some(slot.side));
                    patch.court_position = Some(Some(slot.position));
                }
                SlotIntent::ClearPlayer { field } => {
                    *update.player_mut(field) = PlayerPatch {
                        player_id: Some(None),
                        side: Some(None),
                        court_position: Some(None),
                    };
                }
                SlotIntent::SetAxis { field, value } => {
                    write_axis(update.player_mut(field), value.axis(), Some(value));
                }
                SlotIntent::SwapAxis {
                    field,
                    value,
                    other,
                    displaced,
                } => {
                    write_axis(update.player_mut(field), value.axis(), Some(value));
                    write_axis(update.player_mut(other), value.axis(), displaced);
                }
            }
        }
        update
    }

    /// The turn as it would look once the update is accepted.
    pub fn preview(&self, turn: &PregameTurn) -> PregameTurn {
        let mut next = turn.clone();
        next.apply(&self.to_update());
        next
    }
}

fn write_axis(patch: &mut PlayerPatch, axis: Axis, value: Option<AxisValue>) {
    match axis {
        Axis::Side => patch.side = Some(value.and_then(|v| v.side())),
        Axis::Position => patch.court_position = Some(value.and_then(|v| v.position())),
    }
}

/// Place `player_id` on the canonical slot `slot_index`, using the first
/// empty player field.
pub fn assign_player(
    turn: &PregameTurn,
    slot_index: usize,
    player_id: i64,
) -> Result<SlotEdit, SlotError> {
    let slot = CanonicalSlot::at(slot_index)?;
    let field = turn
        .entries()
        .iter()
        .find(|(_, e)| e.player_id.is_none())
        .map(|(f, _)| *f)
        .ok_or(SlotError::TurnFull)?;
    if to_slots(turn)[slot_index].is_occupied() {
        return Err(SlotError::SlotOccupied(slot_index));
    }
    if turn.field_of(player_id).is_some() {
        return Err(SlotError::AlreadyInTurn(player_id));
    }
    Ok(SlotEdit::single(SlotIntent::SetPlayer {
        field,
        player_id,
        slot,
    }))
}

pub fn remove_player(turn: &PregameTurn, player_id: i64) -> Result<SlotEdit, SlotError> {
    let field = turn
        .field_of(player_id)
        .ok_or(SlotError::PlayerNotInTurn(player_id))?;
    Ok(SlotEdit::single(SlotIntent::ClearPlayer { field }))
}

/// Move a player to a new side or position. If another player already stands
/// on the resulting combination the two exchange their values on that axis.
pub fn change_side_or_position(
    turn: &PregameTurn,
    player_id: i64,
    value: AxisValue,
) -> Result<SlotEdit, SlotError> {
    let field = turn
        .field_of(player_id)
        .ok_or(SlotError::PlayerNotInTurn(player_id))?;
    let entry = turn.entry(field);
    let current = AxisValue::read(value.axis(), &entry);
    if current == Some(value) {
        return Ok(SlotEdit::default());
    }

    let target_side = value.side().or(entry.side);
    let target_position = value.position().or(entry.court_position);
    let collision = match (target_side, target_position) {
        (Some(side), Some(position)) => {
            let target = CanonicalSlot { position, side };
            turn.entries()
                .iter()
                .find(|(f, e)| *f != field && target.holds(e))
                .map(|(f, _)| *f)
        }
        _ => None,
    };

    let intent = match collision {
        Some(other) => SlotIntent::SwapAxis {
            field,
            value,
            other,
            displaced: current,
        },
        None => SlotIntent::SetAxis { field, value },
    };
    Ok(SlotEdit::single(intent))
}

/// Translate a drag from slot `from` to slot `to`. The dragged player takes
/// the destination's side and position; a player already there takes the
/// source's. Dragging onto itself or from an empty slot does nothing.
pub fn drag_reorder(turn: &PregameTurn, from: usize, to: usize) -> Result<SlotEdit, SlotError> {
    let source = CanonicalSlot::at(from)?;
    let destination = CanonicalSlot::at(to)?;
    if from == to {
        return Ok(SlotEdit::default());
    }
    let slots = to_slots(turn);
    let dragged = match slots[from].occupant {
        Some(o) => o,
        None => return Ok(SlotEdit::default()),
    };
    let displaced = slots[to].occupant;

    let mut edit = SlotEdit::default();
    for axis in [Axis::Side, Axis::Position] {
        let value = destination.axis_value(axis);
        let old = source.axis_value(axis);
        if value == old {
            continue;
        }
        let intent = match displaced {
            Some(other) => SlotIntent::SwapAxis {
                field: dragged.field,
                value,
                other: other.field,
                displaced: Some(old),
            },
            None => SlotIntent::SetAxis {
                field: dragged.field,
                value,
            },
        };
        edit.intents.push(intent);
    }
    Ok(edit)
}

/// Display classification of a turn, independent of the backend status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnLabel {
    Completo,
    Incompleto,
    Libre,
}

impl TurnLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnLabel::Completo => "completo",
            TurnLabel::Incompleto => "incompleto",
            TurnLabel::Libre => "libre",
        }
    }
}

pub fn turn_label(turn: &PregameTurn) -> TurnLabel {
    let present = turn.players_present();
    if turn.status == TurnStatus::ReadyToPlay || present >= 4 {
        TurnLabel::Completo
    } else if present == 0 {
        TurnLabel::Libre
    } else {
        TurnLabel::Incompleto
    }
}

/// Stored data that [`to_slots`] cannot show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotIssue {
    /// Shares its combination with an earlier field and is hidden behind it.
    HiddenDuplicate {
        field: PlayerField,
        player_id: i64,
        slot_index: usize,
        shown: PlayerField,
    },
    /// Has a player id but no complete side/position.
    Unplaced { field: PlayerField, player_id: i64 },
}

pub fn consistency_report(turn: &PregameTurn) -> Vec<SlotIssue> {
    let slots = to_slots(turn);
    let mut issues = Vec::new();
    for (field, entry) in turn.entries() {
        let Some(player_id) = entry.player_id else {
            continue;
        };
        match (entry.side, entry.court_position) {
            (Some(side), Some(position)) => {
                let slot_index = CanonicalSlot::index_of(position, side);
                if let Some(shown) = slots[slot_index].occupant {
                    if shown.field != field {
                        issues.push(SlotIssue::HiddenDuplicate {
                            field,
                            player_id,
                            slot_index,
                            shown: shown.field,
                        });
                    }
                }
            }
            _ => issues.push(SlotIssue::Unplaced { field, player_id }),
        }
    }
    issues
}
