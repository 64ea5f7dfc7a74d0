//! Leaderboard storage backends.

#[cfg(feature = "mem-store")]
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::ScoreEntity;
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for leaderboard records.
pub trait ScoreStore: Send + Sync {
    /// Record `entry` unless the stored score for that name is already
    /// higher. The compare-and-write is atomic per name: concurrent
    /// submissions for the same player can never overwrite a higher score
    /// with a lower one. Lower or equal submissions are a silent no-op.
    fn submit_if_higher(&self, entry: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Return up to `limit` records ordered by score descending. Equal
    /// scores rank in submission order (first submitted wins). An empty
    /// store yields an empty vec.
    fn top_scores(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;

    /// Cheap liveness probe against the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
