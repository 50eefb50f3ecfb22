use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::{GameStore, latest},
    models::{GameEntity, GameListItemEntity},
    storage::StorageResult,
};

/// Process-local store, used for tests and ephemeral sessions.
#[derive(Clone, Default)]
pub struct InMemoryGameStore {
    active: Arc<DashMap<Uuid, GameEntity>>,
    history: Arc<DashMap<Uuid, GameEntity>>,
}

impl InMemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn list(map: &DashMap<Uuid, GameEntity>) -> Vec<GameListItemEntity> {
    map.iter()
        .map(|entry| entry.value().clone().into())
        .collect()
}

impl GameStore for InMemoryGameStore {
    fn load_game(&self, id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let found = match id {
            Some(id) => self.active.get(&id).map(|entry| entry.value().clone()),
            None => latest(self.active.iter().map(|entry| entry.value().clone())),
        };
        Box::pin(async move { Ok(found) })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.active.insert(game.id, game);
        Box::pin(async { Ok(()) })
    }

    fn append_history(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.history.insert(game.id, game);
        Box::pin(async { Ok(()) })
    }

    fn remove_active(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let removed = self.active.remove(&id).is_some();
        Box::pin(async move { Ok(removed) })
    }

    fn find_history(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let found = self.history.get(&id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn list_active(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let items = list(&self.active);
        Box::pin(async move { Ok(items) })
    }

    fn list_history(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let items = list(&self.history);
        Box::pin(async move { Ok(items) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::state::game::fixtures::*;

    fn entity(updated_secs: u64) -> GameEntity {
        let game = game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        GameEntity::from_game(game, UNIX_EPOCH + Duration::from_secs(updated_secs))
    }

    #[tokio::test]
    async fn load_without_id_returns_latest_active_game() {
        let store = InMemoryGameStore::new();
        let older = entity(10);
        let newer = entity(20);
        store.save_game(older.clone()).await.unwrap();
        store.save_game(newer.clone()).await.unwrap();

        assert_eq!(store.load_game(None).await.unwrap(), Some(newer));
        assert_eq!(store.load_game(Some(older.id)).await.unwrap(), Some(older));
    }

    #[tokio::test]
    async fn archive_moves_game_out_of_active_set() {
        let store = InMemoryGameStore::new();
        let game = entity(10);
        store.save_game(game.clone()).await.unwrap();
        store.append_history(game.clone()).await.unwrap();

        assert!(store.remove_active(game.id).await.unwrap());
        assert!(!store.remove_active(game.id).await.unwrap());
        assert_eq!(store.load_game(None).await.unwrap(), None);
        assert_eq!(store.find_history(game.id).await.unwrap(), Some(game));
        assert_eq!(store.list_history().await.unwrap().len(), 1);
        assert!(store.list_active().await.unwrap().is_empty());
    }
}
