use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{SCORE_COLLECTION_NAME, ScoreDocument},
};
use crate::dao::{models::ScoreEntity, score_store::ScoreStore, storage::StorageResult};

/// Leaderboard store backed by a MongoDB collection with a unique index on
/// the player name.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("score_name_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "name",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<ScoreDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<ScoreDocument>(SCORE_COLLECTION_NAME)
    }

    /// One conditional write: `$max` keeps the stored score when it is
    /// already higher, and the upsert inserts the document (with its
    /// tie-break timestamp) on first submission. The server applies the
    /// whole update atomically per document, so concurrent submissions for
    /// the same name cannot lose the higher score.
    async fn submit_if_higher(&self, entry: ScoreEntity) -> MongoResult<()> {
        let collection = self.collection().await;
        collection
            .update_one(
                doc! { "name": &entry.name },
                doc! {
                    "$max": { "score": i64::from(entry.score) },
                    "$setOnInsert": { "created_at": DateTime::now() },
                },
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SubmitScore {
                name: entry.name,
                source,
            })?;

        Ok(())
    }

    /// Ranked read: score descending, then first-submitted, then `_id` so
    /// the order stays deterministic even for documents sharing a
    /// timestamp.
    async fn top_scores(&self, limit: usize) -> MongoResult<Vec<ScoreEntity>> {
        let collection = self.collection().await;

        let documents: Vec<ScoreDocument> = collection
            .find(doc! {})
            .sort(doc! { "score": -1, "created_at": 1, "_id": 1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl ScoreStore for MongoScoreStore {
    fn submit_if_higher(&self, entry: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.submit_if_higher(entry).await.map_err(Into::into) })
    }

    fn top_scores(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.top_scores(limit).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
