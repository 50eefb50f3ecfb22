/// CouchDB driver.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// JSON-file driver.
pub mod file;
/// In-memory driver.
pub mod memory;

use crate::dao::models::{GameEntity, GameListItemEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer holding active and finished games.
pub trait GameStore: Send + Sync {
    /// Load an active game; without an id, the most recently updated one.
    fn load_game(&self, id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Insert or replace an active game.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Store a finished game in the history.
    fn append_history(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Drop an active game, returning whether it existed.
    fn remove_active(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Look up a finished game.
    fn find_history(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Summaries of every active game.
    fn list_active(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Summaries of every finished game.
    fn list_history(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Check that the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Most recently updated entity of a collection.
pub(crate) fn latest(games: impl IntoIterator<Item = GameEntity>) -> Option<GameEntity> {
    games.into_iter().max_by_key(|game| game.updated_at)
}
