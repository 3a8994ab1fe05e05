use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tracker::{LogEntry, StatDelta};

/// Lifecycle status persisted with a game document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatusEntity {
    /// Not yet tracked.
    Scheduled,
    /// Tracking in progress.
    Live,
    /// Finalized with a reconciled score.
    Final,
}

/// Aggregate game document persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name, e.g. "vs Eagles".
    pub name: String,
    /// Opposing team name.
    pub opponent_name: String,
    /// Sport key used to select a stat-column profile.
    pub sport: String,
    /// When the game is scheduled to start.
    pub scheduled_at: SystemTime,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game document was updated.
    pub updated_at: SystemTime,
    /// Lifecycle status.
    pub status: GameStatusEntity,
    /// Live (or reconciled, once final) score for our team.
    pub home_score: i64,
    /// Live (or reconciled, once final) score for the opponent.
    pub away_score: i64,
    /// Set when finalization had to override the requested score.
    pub score_mismatch: bool,
    /// Current period label.
    pub period: String,
    /// Current game clock in milliseconds.
    pub clock_ms: i64,
    /// Stat columns tracked for this game, from the sport profile.
    pub stat_columns: Vec<String>,
    /// Every rostered player id.
    pub roster: Vec<String>,
    /// Active lineup, in court position order.
    pub on_court: Vec<String>,
    /// Rostered players currently off the court.
    pub bench: Vec<String>,
    /// Opponent counter record, lowercase keys.
    pub opponent_stats: IndexMap<String, i64>,
    /// Next sequence number to assign to an appended event.
    pub next_seq: u64,
}

/// Subset of [`GameEntity`] returned by list queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameListItemEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Opposing team name.
    pub opponent_name: String,
    /// Sport key.
    pub sport: String,
    /// Lifecycle status.
    pub status: GameStatusEntity,
    /// Current home score.
    pub home_score: i64,
    /// Current away score.
    pub away_score: i64,
    /// When the game is scheduled to start.
    pub scheduled_at: SystemTime,
    /// Last update time.
    pub updated_at: SystemTime,
}

impl From<GameEntity> for GameListItemEntity {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            opponent_name: entity.opponent_name,
            sport: entity.sport,
            status: entity.status,
            home_score: entity.home_score,
            away_score: entity.away_score,
            scheduled_at: entity.scheduled_at,
            updated_at: entity.updated_at,
        }
    }
}

/// One entry of a game's append-only event log as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEventEntity {
    /// Primary key of the event.
    pub id: Uuid,
    /// Game this event belongs to.
    pub game_id: Uuid,
    /// Server-assigned insertion order within the game.
    pub seq: u64,
    /// Human-readable description shown in the play-by-play feed.
    pub text: String,
    /// Period label at the moment of the event.
    pub period: Option<String>,
    /// Game clock in milliseconds at the moment of the event.
    pub game_clock_ms: Option<i64>,
    /// Server timestamp; absent for entries recorded offline until the
    /// client syncs one.
    pub created_at: Option<SystemTime>,
    /// Reversible effect of the action, when it has one.
    pub undo: Option<UndoEntity>,
}

/// Persisted undo payload. Only `kind == "stat"` payloads are meaningful to
/// the reconciliation core; other kinds are carried opaquely for the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UndoEntity {
    /// Payload kind discriminator.
    pub kind: String,
    /// Stat label, for stat payloads.
    pub stat_key: Option<String>,
    /// Signed counter delta.
    pub value: i64,
    /// Credited player, absent for opponent stats.
    pub player_id: Option<String>,
    /// True when the stat credits the opponent.
    pub is_opponent: bool,
}

/// Discriminator value of stat undo payloads.
pub const UNDO_KIND_STAT: &str = "stat";

fn system_time_millis(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok())
}

impl From<&GameEventEntity> for LogEntry {
    fn from(entity: &GameEventEntity) -> Self {
        let stat = entity.undo.as_ref().and_then(|undo| {
            if undo.kind != UNDO_KIND_STAT {
                return None;
            }
            Some(StatDelta {
                stat_key: undo.stat_key.clone().unwrap_or_default(),
                value: undo.value,
                player_id: undo.player_id.clone(),
                is_opponent: undo.is_opponent,
            })
        });

        LogEntry {
            period: entity.period.clone(),
            game_clock_ms: entity.game_clock_ms,
            created_at_ms: entity.created_at.and_then(system_time_millis),
            stat,
        }
    }
}

/// Project a persisted log slice into the shape the reconciliation core
/// consumes, preserving insertion order.
pub fn log_entries(events: &[GameEventEntity]) -> Vec<LogEntry> {
    events.iter().map(LogEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_event(kind: &str, stat_key: Option<&str>, value: i64) -> GameEventEntity {
        GameEventEntity {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            seq: 0,
            text: "test".into(),
            period: Some("Q1".into()),
            game_clock_ms: Some(1_000),
            created_at: Some(SystemTime::now()),
            undo: Some(UndoEntity {
                kind: kind.into(),
                stat_key: stat_key.map(Into::into),
                value,
                player_id: None,
                is_opponent: false,
            }),
        }
    }

    #[test]
    fn stat_undo_maps_to_a_stat_delta() {
        let entry = LogEntry::from(&stat_event(UNDO_KIND_STAT, Some("PTS"), 2));
        let stat = entry.stat.expect("stat payload");
        assert_eq!(stat.stat_key, "PTS");
        assert_eq!(stat.value, 2);
    }

    #[test]
    fn non_stat_undo_kinds_are_opaque_to_the_core() {
        let entry = LogEntry::from(&stat_event("snapshot", None, 0));
        assert!(entry.stat.is_none());
    }
}
