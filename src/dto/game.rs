use std::time::{Duration, SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{GameEventEntity, GameListItemEntity, GameStatusEntity, UndoEntity},
    dto::{
        format_system_time,
        validation::{validate_period_label, validate_player_id},
    },
    state::game::TrackerSession,
    tracker::{resume::ResumeState, score::ReconciledScore},
};

/// Lifecycle status as exposed over the API.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatusDto {
    /// Not yet tracked.
    Scheduled,
    /// Tracking in progress.
    Live,
    /// Finalized.
    Final,
}

impl From<GameStatusEntity> for GameStatusDto {
    fn from(value: GameStatusEntity) -> Self {
        match value {
            GameStatusEntity::Scheduled => GameStatusDto::Scheduled,
            GameStatusEntity::Live => GameStatusDto::Live,
            GameStatusEntity::Final => GameStatusDto::Final,
        }
    }
}

/// Payload used to schedule a brand-new game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    /// Display name, e.g. "vs Eagles".
    pub name: String,
    /// Opposing team name.
    pub opponent_name: String,
    /// Sport key selecting the stat-column profile.
    pub sport: String,
    /// Scheduled start as epoch milliseconds.
    pub scheduled_at_ms: i64,
    /// Rostered player ids.
    pub roster: Vec<String>,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            let mut err = validator::ValidationError::new("name_empty");
            err.message = Some("Game name must not be blank".into());
            errors.add("name", err);
        }
        if self.opponent_name.trim().is_empty() {
            let mut err = validator::ValidationError::new("opponent_empty");
            err.message = Some("Opponent name must not be blank".into());
            errors.add("opponent_name", err);
        }
        for id in &self.roster {
            if let Err(err) = validate_player_id(id) {
                errors.add("roster", err);
                break;
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Starting lineup supplied when tracking begins.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartTrackingRequest {
    /// Player ids on the court at tip-off, in position order.
    pub on_court: Vec<String>,
}

impl Validate for StartTrackingRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for id in &self.on_court {
            if let Err(err) = validate_player_id(id) {
                errors.add("on_court", err);
                break;
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Stat payload attached to an appended event.
#[serde_as]
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UndoInput {
    /// Payload kind; only `"stat"` payloads affect counters and scores.
    #[serde(default = "default_undo_kind")]
    pub kind: String,
    /// Stat label, e.g. `"PTS"`.
    #[serde(default)]
    pub stat_key: Option<String>,
    /// Signed counter delta. Malformed values coerce to 0 rather than
    /// rejecting the whole entry.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[schema(value_type = i64)]
    pub value: i64,
    /// Credited player id, absent for opponent stats.
    #[serde(default)]
    pub player_id: Option<String>,
    /// True when the stat credits the opponent.
    #[serde(default)]
    pub is_opponent: bool,
}

fn default_undo_kind() -> String {
    "stat".to_owned()
}

impl From<UndoInput> for UndoEntity {
    fn from(value: UndoInput) -> Self {
        Self {
            kind: value.kind,
            stat_key: value.stat_key,
            value: value.value,
            player_id: value.player_id,
            is_opponent: value.is_opponent,
        }
    }
}

/// One event appended to a game's log.
#[serde_as]
#[derive(Debug, Deserialize, ToSchema)]
pub struct AppendEventRequest {
    /// Human-readable description for the play-by-play feed.
    pub text: String,
    /// Period label at the moment of the event.
    #[serde(default)]
    pub period: Option<String>,
    /// Game clock in milliseconds at the moment of the event. Malformed
    /// values coerce to absent.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[schema(value_type = Option<i64>)]
    pub game_clock_ms: Option<i64>,
    /// True for entries recorded while disconnected; they are persisted
    /// without a server timestamp until the client syncs one.
    #[serde(default)]
    pub offline: bool,
    /// Client-side timestamp for synced offline entries, epoch milliseconds.
    #[serde(default)]
    pub created_at_ms: Option<i64>,
    /// Reversible effect, when the event was a stat.
    #[serde(default)]
    pub undo: Option<UndoInput>,
}

impl Validate for AppendEventRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            let mut err = validator::ValidationError::new("text_empty");
            err.message = Some("Event text must not be blank".into());
            errors.add("text", err);
        }
        if let Some(period) = &self.period
            && let Err(err) = validate_period_label(period)
        {
            errors.add("period", err);
        }
        if let Some(undo) = &self.undo
            && let Some(player_id) = &undo.player_id
            && let Err(err) = validate_player_id(player_id)
        {
            errors.add("undo", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Substitution request from the tracking console.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubstitutionRequest {
    /// Player leaving the court.
    pub out_id: String,
    /// Player entering the court.
    pub in_id: String,
}

impl Validate for SubstitutionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_player_id(&self.out_id) {
            errors.add("out_id", err);
        }
        if let Err(err) = validate_player_id(&self.in_id) {
            errors.add("in_id", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Verdict of a substitution attempt. Rejections are routine (mis-taps
/// during fast play) and come back as `applied == false`, not an error.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubstitutionResponse {
    /// Whether the swap was committed.
    pub applied: bool,
    /// Lineup after the attempt (unchanged when rejected).
    pub on_court: Vec<String>,
    /// Bench after the attempt (unchanged when rejected).
    pub bench: Vec<String>,
}

/// Replacement opponent counter record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OpponentStatsRequest {
    /// Lowercase counter names to values.
    #[schema(value_type = Object)]
    pub stats: IndexMap<String, i64>,
}

/// Requested final score submitted at the end of a game.
#[serde_as]
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FinalizeRequest {
    /// Final score for our team as shown by the tracking UI. Malformed
    /// values coerce to 0.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[schema(value_type = i64)]
    pub home: i64,
    /// Final score for the opponent as shown by the tracking UI.
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[schema(value_type = i64)]
    pub away: i64,
}

/// Reconciled final score. On `mismatch` the persisted score is the derived
/// one, not the requested one.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinalizeResponse {
    /// Persisted home score.
    pub home: i64,
    /// Persisted away score.
    pub away: i64,
    /// True when the log disagreed with the requested score.
    pub mismatch: bool,
    /// Home score replayed from the log.
    pub derived_home: i64,
    /// Away score replayed from the log.
    pub derived_away: i64,
    /// Lifecycle status after finalization.
    pub status: GameStatusDto,
}

impl FinalizeResponse {
    /// Assemble the response from a reconciliation outcome.
    pub fn from_reconciled(outcome: &ReconciledScore, status: GameStatusDto) -> Self {
        Self {
            home: outcome.score.home,
            away: outcome.score.away,
            mismatch: outcome.mismatch,
            derived_home: outcome.derived.home,
            derived_away: outcome.derived.away,
            status,
        }
    }
}

/// Summary returned by list queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    /// Game id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Opposing team name.
    pub opponent_name: String,
    /// Sport key.
    pub sport: String,
    /// Lifecycle status.
    pub status: GameStatusDto,
    /// Current home score.
    pub home_score: i64,
    /// Current away score.
    pub away_score: i64,
    /// RFC3339 scheduled start.
    pub scheduled_at: String,
    /// RFC3339 last update.
    pub updated_at: String,
}

impl From<GameListItemEntity> for GameSummary {
    fn from(value: GameListItemEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            opponent_name: value.opponent_name,
            sport: value.sport,
            status: value.status.into(),
            home_score: value.home_score,
            away_score: value.away_score,
            scheduled_at: format_system_time(value.scheduled_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Full projection of one tracked game.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameDetail {
    /// Game id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Opposing team name.
    pub opponent_name: String,
    /// Sport key.
    pub sport: String,
    /// Lifecycle status.
    pub status: GameStatusDto,
    /// Current home score.
    pub home_score: i64,
    /// Current away score.
    pub away_score: i64,
    /// Set when finalization overrode the requested score.
    pub score_mismatch: bool,
    /// Current period label.
    pub period: String,
    /// Current game clock in milliseconds.
    pub clock_ms: i64,
    /// Stat columns tracked for this game.
    pub stat_columns: Vec<String>,
    /// Rostered player ids.
    pub roster: Vec<String>,
    /// Active lineup in position order.
    pub on_court: Vec<String>,
    /// Players off the court.
    pub bench: Vec<String>,
    /// Opponent counter record.
    #[schema(value_type = Object)]
    pub opponent_stats: IndexMap<String, i64>,
    /// RFC3339 scheduled start.
    pub scheduled_at: String,
    /// RFC3339 creation time.
    pub created_at: String,
    /// RFC3339 last update.
    pub updated_at: String,
}

impl From<&TrackerSession> for GameDetail {
    fn from(session: &TrackerSession) -> Self {
        Self {
            id: session.id,
            name: session.name.clone(),
            opponent_name: session.opponent_name.clone(),
            sport: session.sport.clone(),
            status: GameStatusEntity::from(session.phase()).into(),
            home_score: session.score.home,
            away_score: session.score.away,
            score_mismatch: session.score_mismatch,
            period: session.clock.period.clone(),
            clock_ms: session.clock.clock_ms,
            stat_columns: session.stat_columns.clone(),
            roster: session.roster.clone(),
            on_court: session.lineup.on_court.clone(),
            bench: session.lineup.bench.clone(),
            opponent_stats: session.opponent_stats.clone(),
            scheduled_at: format_system_time(session.scheduled_at),
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
        }
    }
}

/// One persisted log entry as exposed over the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventView {
    /// Server-assigned insertion order.
    pub seq: u64,
    /// Play-by-play description.
    pub text: String,
    /// Period label at the moment of the event.
    pub period: Option<String>,
    /// Game clock at the moment of the event.
    pub game_clock_ms: Option<i64>,
    /// RFC3339 server timestamp, absent for unsynced offline entries.
    pub created_at: Option<String>,
    /// Stat payload, when the event was a stat.
    pub undo: Option<UndoView>,
}

/// Stat payload of a persisted log entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct UndoView {
    /// Payload kind discriminator.
    pub kind: String,
    /// Stat label.
    pub stat_key: Option<String>,
    /// Signed counter delta.
    pub value: i64,
    /// Credited player.
    pub player_id: Option<String>,
    /// True when the stat credits the opponent.
    pub is_opponent: bool,
}

impl From<&GameEventEntity> for EventView {
    fn from(entity: &GameEventEntity) -> Self {
        Self {
            seq: entity.seq,
            text: entity.text.clone(),
            period: entity.period.clone(),
            game_clock_ms: entity.game_clock_ms,
            created_at: entity.created_at.map(format_system_time),
            undo: entity.undo.as_ref().map(|undo| UndoView {
                kind: undo.kind.clone(),
                stat_key: undo.stat_key.clone(),
                value: undo.value,
                player_id: undo.player_id.clone(),
                is_opponent: undo.is_opponent,
            }),
        }
    }
}

/// Everything a reconnecting tracker needs to resume a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResumeResponse {
    /// Period to resume in.
    pub period: String,
    /// Game clock to resume at, in milliseconds.
    pub clock_ms: i64,
    /// False when the defaults were returned because the log held no usable
    /// clock candidates.
    pub restored: bool,
    /// Live home score.
    pub home_score: i64,
    /// Live away score.
    pub away_score: i64,
    /// Active lineup in position order.
    pub on_court: Vec<String>,
    /// Players off the court.
    pub bench: Vec<String>,
    /// Rehydrated opponent counter record.
    #[schema(value_type = Object)]
    pub opponent_stats: IndexMap<String, i64>,
    /// Full event log in insertion order.
    pub events: Vec<EventView>,
}

impl ResumeResponse {
    /// Assemble the resume payload from its reconstructed parts.
    pub fn new(
        clock: ResumeState,
        session: &TrackerSession,
        opponent_stats: IndexMap<String, i64>,
        events: &[GameEventEntity],
    ) -> Self {
        Self {
            period: clock.period,
            clock_ms: clock.clock_ms,
            restored: clock.restored,
            home_score: session.score.home,
            away_score: session.score.away,
            on_court: session.lineup.on_court.clone(),
            bench: session.lineup.bench.clone(),
            opponent_stats,
            events: events.iter().map(Into::into).collect(),
        }
    }
}

/// Epoch milliseconds to [`SystemTime`], clamping negative values to the
/// epoch instead of failing.
pub fn system_time_from_millis(millis: i64) -> SystemTime {
    if millis <= 0 {
        UNIX_EPOCH
    } else {
        UNIX_EPOCH + Duration::from_millis(millis as u64)
    }
}
