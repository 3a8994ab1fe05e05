use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoGameDocument, MongoGameEventDocument, doc_game_id, doc_id},
};
use crate::dao::{
    game_store::GameStore,
    models::{GameEntity, GameEventEntity, GameListItemEntity},
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const EVENT_COLLECTION_NAME: &str = "game_events";

/// MongoDB implementation of [`GameStore`].
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn database(&self) -> Database {
        self.state.read().await.clone()
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = self.database().await;
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        *guard = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.inner.database().await;

        let games = database.collection::<MongoGameDocument>(GAME_COLLECTION_NAME);
        let schedule_index = IndexModel::builder()
            .keys(doc! {"scheduled_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_schedule_idx".to_owned()))
                    .build(),
            )
            .build();
        games
            .create_index(schedule_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "scheduled_at",
                source,
            })?;

        // The (game_id, seq) pair is the append-only log's insertion order;
        // a unique index makes duplicate appends fail loudly.
        let events = database.collection::<MongoGameEventDocument>(EVENT_COLLECTION_NAME);
        let seq_index = IndexModel::builder()
            .keys(doc! {"game_id": 1, "seq": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("event_seq_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        events
            .create_index(seq_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: EVENT_COLLECTION_NAME,
                index: "game_id,seq",
                source,
            })?;

        Ok(())
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.inner
            .database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn events(&self) -> Collection<MongoGameEventDocument> {
        self.inner
            .database()
            .await
            .collection::<MongoGameEventDocument>(EVENT_COLLECTION_NAME)
    }

    async fn save_game_document(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document = MongoGameDocument::from(game);
        self.games()
            .await
            .replace_one(doc_id(id), document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn find_game_document(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_game_documents(&self) -> MongoResult<Vec<GameListItemEntity>> {
        let cursor = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! {"scheduled_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        let documents: Vec<MongoGameDocument> = cursor
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn append_event_document(&self, event: GameEventEntity) -> MongoResult<()> {
        let game_id = event.game_id;
        let seq = event.seq;
        let document = MongoGameEventDocument::from(event);
        self.events()
            .await
            .insert_one(document)
            .await
            .map_err(|source| MongoDaoError::AppendEvent {
                game_id,
                seq,
                source,
            })?;
        Ok(())
    }

    async fn fetch_event_documents(&self, game_id: Uuid) -> MongoResult<Vec<GameEventEntity>> {
        let cursor = self
            .events()
            .await
            .find(doc_game_id(game_id))
            .sort(doc! {"seq": 1})
            .await
            .map_err(|source| MongoDaoError::LoadEvents { game_id, source })?;

        let documents: Vec<MongoGameEventDocument> = cursor
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadEvents { game_id, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl GameStore for MongoGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game_document(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game_document(id).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_game_documents().await.map_err(Into::into) })
    }

    fn append_event(&self, event: GameEventEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_event_document(event).await.map_err(Into::into) })
    }

    fn fetch_events(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.fetch_event_documents(game_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
