use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::GameEventEntity,
    dto::{
        game::{EventView, GameStatusDto},
        sse::{
            GameFinalizedEvent, LogAppendedEvent, ScoreUpdatedEvent, ServerEvent,
            StatusChangedEvent, SubstitutionEvent, SystemStatus,
        },
    },
    state::SharedState,
    tracker::score::{ReconciledScore, Score},
};

const EVENT_SCORE_UPDATED: &str = "score.updated";
const EVENT_LOG_APPENDED: &str = "log.appended";
const EVENT_SUBSTITUTION: &str = "lineup.substitution";
const EVENT_STATUS_CHANGED: &str = "status.changed";
const EVENT_GAME_FINALIZED: &str = "game.finalized";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast a live score change for one game.
pub fn broadcast_score_updated(state: &SharedState, game_id: Uuid, score: Score) {
    let payload = ScoreUpdatedEvent {
        game_id,
        home: score.home,
        away: score.away,
    };
    send_public_event(state, EVENT_SCORE_UPDATED, &payload);
}

/// Broadcast a freshly appended log entry.
pub fn broadcast_log_appended(state: &SharedState, game_id: Uuid, event: &GameEventEntity) {
    let payload = LogAppendedEvent {
        game_id,
        entry: EventView::from(event),
    };
    send_public_event(state, EVENT_LOG_APPENDED, &payload);
}

/// Broadcast a committed substitution.
pub fn broadcast_substitution(
    state: &SharedState,
    game_id: Uuid,
    out_id: &str,
    in_id: &str,
    on_court: &[String],
) {
    let payload = SubstitutionEvent {
        game_id,
        out_id: out_id.to_owned(),
        in_id: in_id.to_owned(),
        on_court: on_court.to_vec(),
    };
    send_public_event(state, EVENT_SUBSTITUTION, &payload);
}

/// Broadcast a lifecycle status change for one game.
pub fn broadcast_status_changed(state: &SharedState, game_id: Uuid, status: GameStatusDto) {
    let payload = StatusChangedEvent { game_id, status };
    send_public_event(state, EVENT_STATUS_CHANGED, &payload);
    send_scorekeeper_event(state, EVENT_STATUS_CHANGED, &payload);
}

/// Broadcast the reconciled outcome of a finalized game.
pub fn broadcast_game_finalized(state: &SharedState, game_id: Uuid, outcome: &ReconciledScore) {
    let payload = GameFinalizedEvent {
        game_id,
        home: outcome.score.home,
        away: outcome.score.away,
        mismatch: outcome.mismatch,
    };
    send_public_event(state, EVENT_GAME_FINALIZED, &payload);
    send_scorekeeper_event(state, EVENT_GAME_FINALIZED, &payload);
}

/// Broadcast the degraded flag to every connected client.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_scorekeeper_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_scorekeeper_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.scorekeeper_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize scorekeeper SSE payload"),
    }
}
