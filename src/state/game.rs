use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, GameStatusEntity},
    state::state_machine::{GamePhase, LifecycleMachine},
    tracker::{
        lineup::Lineup,
        opponent::{StatRecord, build_opponent_stat_defaults},
        resume::ClockState,
        score::Score,
    },
};

/// Runtime representation of one tracked game, mutated by the services and
/// persisted back through [`GameEntity`] snapshots.
#[derive(Debug, Clone)]
pub struct TrackerSession {
    /// Stable identifier of the game.
    pub id: Uuid,
    /// Display name, e.g. "vs Eagles".
    pub name: String,
    /// Opposing team name.
    pub opponent_name: String,
    /// Sport key that selected the stat-column profile.
    pub sport: String,
    /// Scheduled start time.
    pub scheduled_at: SystemTime,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the session was persisted.
    pub updated_at: SystemTime,
    /// Lifecycle machine guarding phase transitions.
    pub machine: LifecycleMachine,
    /// Live running score, kept in step with appended scoring events.
    pub score: Score,
    /// Set when finalization overrode the requested score.
    pub score_mismatch: bool,
    /// Current period and game clock.
    pub clock: ClockState,
    /// Stat columns tracked for this game.
    pub stat_columns: Vec<String>,
    /// Every rostered player id.
    pub roster: Vec<String>,
    /// Current lineup split.
    pub lineup: Lineup,
    /// Opponent counter record.
    pub opponent_stats: StatRecord,
    /// Sequence number the next appended event receives.
    pub next_seq: u64,
}

impl TrackerSession {
    /// Build a fresh scheduled session. The whole roster starts on the
    /// bench; the lineup is chosen when tracking begins.
    pub fn new(
        name: String,
        opponent_name: String,
        sport: String,
        scheduled_at: SystemTime,
        stat_columns: Vec<String>,
        roster: Vec<String>,
    ) -> Self {
        let timestamp = SystemTime::now();
        let opponent_stats = build_opponent_stat_defaults(&stat_columns);

        Self {
            id: Uuid::new_v4(),
            name,
            opponent_name,
            sport,
            scheduled_at,
            created_at: timestamp,
            updated_at: timestamp,
            machine: LifecycleMachine::default(),
            score: Score::default(),
            score_mismatch: false,
            clock: ClockState::default(),
            stat_columns,
            roster: roster.clone(),
            lineup: Lineup {
                on_court: Vec::new(),
                bench: roster,
            },
            opponent_stats,
            next_seq: 0,
        }
    }

    /// Allocate the next event sequence number.
    pub fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }
}

impl From<GamePhase> for GameStatusEntity {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Scheduled => GameStatusEntity::Scheduled,
            GamePhase::Live => GameStatusEntity::Live,
            GamePhase::Final => GameStatusEntity::Final,
        }
    }
}

impl From<GameStatusEntity> for GamePhase {
    fn from(value: GameStatusEntity) -> Self {
        match value {
            GameStatusEntity::Scheduled => GamePhase::Scheduled,
            GameStatusEntity::Live => GamePhase::Live,
            GameStatusEntity::Final => GamePhase::Final,
        }
    }
}

impl From<GameEntity> for TrackerSession {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            opponent_name: value.opponent_name,
            sport: value.sport,
            scheduled_at: value.scheduled_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
            machine: LifecycleMachine::new(value.status.into()),
            score: Score {
                home: value.home_score,
                away: value.away_score,
            },
            score_mismatch: value.score_mismatch,
            clock: ClockState {
                period: value.period,
                clock_ms: value.clock_ms,
            },
            stat_columns: value.stat_columns,
            roster: value.roster,
            lineup: Lineup {
                on_court: value.on_court,
                bench: value.bench,
            },
            opponent_stats: value.opponent_stats,
            next_seq: value.next_seq,
        }
    }
}

impl From<&TrackerSession> for GameEntity {
    fn from(value: &TrackerSession) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            opponent_name: value.opponent_name.clone(),
            sport: value.sport.clone(),
            scheduled_at: value.scheduled_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
            status: value.phase().into(),
            home_score: value.score.home,
            away_score: value.score.away,
            score_mismatch: value.score_mismatch,
            period: value.clock.period.clone(),
            clock_ms: value.clock.clock_ms,
            stat_columns: value.stat_columns.clone(),
            roster: value.roster.clone(),
            on_court: value.lineup.on_court.clone(),
            bench: value.lineup.bench.clone(),
            opponent_stats: value.opponent_stats.clone(),
            next_seq: value.next_seq,
        }
    }
}
