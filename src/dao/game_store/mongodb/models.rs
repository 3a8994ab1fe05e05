use indexmap::IndexMap;
use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    GameEntity, GameEventEntity, GameListItemEntity, GameStatusEntity, UndoEntity,
};

/// Game document as stored in the `games` collection. Timestamps are BSON
/// datetimes so range queries and sorts work server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    opponent_name: String,
    sport: String,
    scheduled_at: DateTime,
    created_at: DateTime,
    updated_at: DateTime,
    status: GameStatusEntity,
    home_score: i64,
    away_score: i64,
    #[serde(default)]
    score_mismatch: bool,
    period: String,
    clock_ms: i64,
    stat_columns: Vec<String>,
    roster: Vec<String>,
    on_court: Vec<String>,
    bench: Vec<String>,
    #[serde(default)]
    opponent_stats: IndexMap<String, i64>,
    #[serde(default)]
    next_seq: u64,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            opponent_name: value.opponent_name,
            sport: value.sport,
            scheduled_at: DateTime::from_system_time(value.scheduled_at),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            status: value.status,
            home_score: value.home_score,
            away_score: value.away_score,
            score_mismatch: value.score_mismatch,
            period: value.period,
            clock_ms: value.clock_ms,
            stat_columns: value.stat_columns,
            roster: value.roster,
            on_court: value.on_court,
            bench: value.bench,
            opponent_stats: value.opponent_stats,
            next_seq: value.next_seq,
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            opponent_name: value.opponent_name,
            sport: value.sport,
            scheduled_at: value.scheduled_at.to_system_time(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            status: value.status,
            home_score: value.home_score,
            away_score: value.away_score,
            score_mismatch: value.score_mismatch,
            period: value.period,
            clock_ms: value.clock_ms,
            stat_columns: value.stat_columns,
            roster: value.roster,
            on_court: value.on_court,
            bench: value.bench,
            opponent_stats: value.opponent_stats,
            next_seq: value.next_seq,
        }
    }
}

impl From<MongoGameDocument> for GameListItemEntity {
    fn from(value: MongoGameDocument) -> Self {
        GameEntity::from(value).into()
    }
}

/// Event document as stored in the `game_events` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameEventDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    game_id: Uuid,
    seq: u64,
    text: String,
    period: Option<String>,
    game_clock_ms: Option<i64>,
    created_at: Option<DateTime>,
    undo: Option<UndoEntity>,
}

impl From<GameEventEntity> for MongoGameEventDocument {
    fn from(value: GameEventEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            seq: value.seq,
            text: value.text,
            period: value.period,
            game_clock_ms: value.game_clock_ms,
            created_at: value.created_at.map(DateTime::from_system_time),
            undo: value.undo,
        }
    }
}

impl From<MongoGameEventDocument> for GameEventEntity {
    fn from(value: MongoGameEventDocument) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            seq: value.seq,
            text: value.text,
            period: value.period,
            game_clock_ms: value.game_clock_ms,
            created_at: value.created_at.map(DateTime::to_system_time),
            undo: value.undo,
        }
    }
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

/// Filter document selecting one game by primary key.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

/// Filter document selecting every event of one game.
pub fn doc_game_id(game_id: Uuid) -> Document {
    doc! {"game_id": uuid_as_binary(game_id)}
}
