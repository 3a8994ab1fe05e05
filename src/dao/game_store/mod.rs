#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{GameEntity, GameEventEntity, GameListItemEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for games and their event logs.
///
/// `save_game` is an upsert of the whole game document; events are
/// append-only and fetched back in `seq` order.
pub trait GameStore: Send + Sync {
    /// Insert or replace a game document.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch one game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// List game summaries, most recently scheduled first.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Append one entry to a game's event log.
    fn append_event(&self, event: GameEventEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game's full event log in insertion order.
    fn fetch_events(&self, game_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<GameEventEntity>>>;
    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
