use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::game::{EventView, GameStatusDto};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event with a raw string payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to the scorekeeper SSE client when it connects.
pub struct ScorekeeperHandshake {
    /// Token identifying the active scorekeeper connection.
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether storage is currently unreachable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a game's live score changes.
pub struct ScoreUpdatedEvent {
    /// Game whose score changed.
    pub game_id: Uuid,
    /// New home score.
    pub home: i64,
    /// New away score.
    pub away: i64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast for every appended log entry.
pub struct LogAppendedEvent {
    /// Game the entry belongs to.
    pub game_id: Uuid,
    /// The appended entry.
    pub entry: EventView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a substitution was committed.
pub struct SubstitutionEvent {
    /// Game the substitution happened in.
    pub game_id: Uuid,
    /// Player who left the court.
    pub out_id: String,
    /// Player who entered the court.
    pub in_id: String,
    /// Lineup after the swap, in position order.
    pub on_court: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a game's lifecycle status changes.
pub struct StatusChangedEvent {
    /// Game whose status changed.
    pub game_id: Uuid,
    /// New lifecycle status.
    pub status: GameStatusDto,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once a game has been finalized.
pub struct GameFinalizedEvent {
    /// Finalized game.
    pub game_id: Uuid,
    /// Persisted home score.
    pub home: i64,
    /// Persisted away score.
    pub away: i64,
    /// True when the log overrode the requested score.
    pub mismatch: bool,
}
