use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB DAO operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors surfaced by the MongoDB game store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Client could not be constructed from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Initial connectivity ping kept failing.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of pings attempted before giving up.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: MongoError,
    },
    /// Health-check ping failed on an established connection.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Game upsert failed.
    #[error("failed to save game `{id}`")]
    SaveGame {
        /// Game id.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Game lookup failed.
    #[error("failed to load game `{id}`")]
    LoadGame {
        /// Game id.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Game listing failed.
    #[error("failed to list games")]
    ListGames {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Event append failed.
    #[error("failed to append event `{seq}` to game `{game_id}`")]
    AppendEvent {
        /// Game id.
        game_id: Uuid,
        /// Sequence number of the rejected event.
        seq: u64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Event-log fetch failed.
    #[error("failed to load the event log of game `{game_id}`")]
    LoadEvents {
        /// Game id.
        game_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
