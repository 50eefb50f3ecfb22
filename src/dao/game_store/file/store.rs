use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dao::{
    game_store::{GameStore, latest},
    models::{GameEntity, GameListItemEntity},
    storage::StorageResult,
};

use super::{
    config::FileStoreConfig,
    error::{FileDaoError, FileResult},
};

const EXTENSION: &str = "json";

/// Stores each game as `<root>/active/<id>.json` or `<root>/history/<id>.json`.
#[derive(Clone)]
pub struct FileGameStore {
    config: Arc<FileStoreConfig>,
}

impl FileGameStore {
    /// Open the store, creating its directories when missing.
    pub async fn open(config: FileStoreConfig) -> FileResult<Self> {
        let store = Self {
            config: Arc::new(config),
        };
        store.ensure_layout().await?;
        debug!(root = %store.config.root().display(), "file game store ready");
        Ok(store)
    }

    async fn ensure_layout(&self) -> FileResult<()> {
        for dir in [self.config.active_dir(), self.config.history_dir()] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|source| FileDaoError::CreateDir { path: dir, source })?;
        }
        Ok(())
    }

    fn document_path(dir: &Path, id: Uuid) -> PathBuf {
        dir.join(format!("{id}.{EXTENSION}"))
    }

    async fn read_document(path: &Path) -> FileResult<Option<GameEntity>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FileDaoError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| FileDaoError::Decode {
                path: path.display().to_string(),
                source,
            })
    }

    /// Write through a sibling temp file renamed over the target.
    async fn write_document(dir: &Path, game: &GameEntity) -> FileResult<()> {
        let payload = serde_json::to_vec_pretty(game).map_err(|source| FileDaoError::Encode {
            id: game.id,
            source,
        })?;

        let target = Self::document_path(dir, game.id);
        let temp = dir.join(format!(".{}.{}.tmp", game.id, Uuid::new_v4()));
        fs::write(&temp, payload)
            .await
            .map_err(|source| FileDaoError::Write {
                path: temp.clone(),
                source,
            })?;

        if let Err(source) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(FileDaoError::Write {
                path: target,
                source,
            });
        }
        Ok(())
    }

    async fn read_all(dir: &Path) -> FileResult<Vec<GameEntity>> {
        let mut entries = fs::read_dir(dir).await.map_err(|source| FileDaoError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut games = Vec::new();
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|source| FileDaoError::Read {
                    path: dir.to_path_buf(),
                    source,
                })?;
            let Some(entry) = entry else {
                break;
            };

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            match Self::read_document(&path).await {
                Ok(Some(game)) => games.push(game),
                Ok(None) => {}
                Err(FileDaoError::Decode { path, source }) => {
                    warn!(%path, error = %source, "skipping undecodable game document");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(games)
    }
}

impl GameStore for FileGameStore {
    fn load_game(&self, id: Option<Uuid>) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let dir = store.config.active_dir();
            match id {
                Some(id) => Ok(Self::read_document(&Self::document_path(&dir, id)).await?),
                None => Ok(latest(Self::read_all(&dir).await?)),
            }
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            Self::write_document(&store.config.active_dir(), &game)
                .await
                .map_err(Into::into)
        })
    }

    fn append_history(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            Self::write_document(&store.config.history_dir(), &game)
                .await
                .map_err(Into::into)
        })
    }

    fn remove_active(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let path = Self::document_path(&store.config.active_dir(), id);
            match fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
                Err(source) => Err(FileDaoError::Remove { path, source }.into()),
            }
        })
    }

    fn find_history(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let path = Self::document_path(&store.config.history_dir(), id);
            Ok(Self::read_document(&path).await?)
        })
    }

    fn list_active(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let games = Self::read_all(&store.config.active_dir()).await?;
            Ok(games.into_iter().map(Into::into).collect())
        })
    }

    fn list_history(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let games = Self::read_all(&store.config.history_dir()).await?;
            Ok(games.into_iter().map(Into::into).collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let dir = store.config.active_dir();
            fs::metadata(&dir)
                .await
                .map(|_| ())
                .map_err(|source| FileDaoError::Read { path: dir, source }.into())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_layout().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;
    use crate::{
        dao::storage::StorageError,
        state::game::fixtures::{game, round},
    };

    /// Scratch data directory removed on drop, even when an assertion fails.
    struct TempRoot(PathBuf);

    impl TempRoot {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!("trivia_store_{}", Uuid::new_v4())))
        }

        fn path(&self) -> &std::path::Path {
            &self.0
        }
    }

    impl Drop for TempRoot {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn entity(updated_secs: u64) -> GameEntity {
        let game = game(&["alice", "bob"], vec![round("r1", &[100], &[("t1", &["q1"])])]);
        GameEntity::from_game(game, UNIX_EPOCH + Duration::from_secs(updated_secs))
    }

    #[tokio::test]
    async fn save_then_load_from_disk() {
        let root = TempRoot::new();
        let store = FileGameStore::open(FileStoreConfig::new(root.path())).await.unwrap();
        let older = entity(100);
        let newer = entity(200);

        store.save_game(older.clone()).await.unwrap();
        store.save_game(newer.clone()).await.unwrap();

        let reopened = FileGameStore::open(FileStoreConfig::new(root.path())).await.unwrap();
        assert_eq!(reopened.load_game(Some(older.id)).await.unwrap(), Some(older));
        assert_eq!(reopened.load_game(None).await.unwrap(), Some(newer));
        assert_eq!(reopened.list_active().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn archive_and_remove() {
        let root = TempRoot::new();
        let store = FileGameStore::open(FileStoreConfig::new(root.path())).await.unwrap();
        let game = entity(100);

        store.save_game(game.clone()).await.unwrap();
        store.append_history(game.clone()).await.unwrap();
        assert!(store.remove_active(game.id).await.unwrap());
        assert!(!store.remove_active(game.id).await.unwrap());

        assert_eq!(store.load_game(Some(game.id)).await.unwrap(), None);
        assert_eq!(store.find_history(game.id).await.unwrap(), Some(game.clone()));
        assert!(
            fs::metadata(root.path().join("history").join(format!("{}.json", game.id)))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn corrupted_document_is_reported() {
        let root = TempRoot::new();
        let store = FileGameStore::open(FileStoreConfig::new(root.path())).await.unwrap();
        let id = Uuid::new_v4();
        fs::write(root.path().join("active").join(format!("{id}.json")), b"{not json")
            .await
            .unwrap();

        let err = store.load_game(Some(id)).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { .. }));
        assert!(store.list_active().await.unwrap().is_empty());
    }
}
